//! Per-tick feature frames read out of the audio graph.

use std::time::Duration;

use crate::audio::{GraphHandle, WAVEFORM_LEN};
use crate::Result;

/// Owns the two reusable frame buffers and mediates all per-tick reads from
/// the audio graph.
///
/// The frequency buffer is reallocated only when the analysis stage's bin
/// count changes; the waveform buffer is fixed at [`WAVEFORM_LEN`]. With no
/// source connected both getters return the default signal (all zeros /
/// all 128) instead of failing.
#[derive(Debug)]
pub struct FeatureExtractor {
    graph: GraphHandle,
    freq: Vec<u8>,
    wave: Vec<u8>,
}

impl FeatureExtractor {
    pub fn new(graph: GraphHandle) -> Self {
        Self {
            graph,
            freq: Vec::new(),
            wave: vec![128; WAVEFORM_LEN],
        }
    }

    /// The graph this extractor reads from.
    pub fn graph(&self) -> &GraphHandle {
        &self.graph
    }

    pub fn has_source(&self) -> Result<bool> {
        self.graph.has_source()
    }

    /// Advances the connected source by `delta` worth of samples. A no-op
    /// when nothing is connected.
    pub fn pump(&mut self, delta: Duration) -> Result<()> {
        self.graph.pump(delta)
    }

    /// Point-in-time spectral snapshot, sized to the current bin count.
    pub fn frequency_frame(&mut self) -> Result<&[u8]> {
        self.graph.write_frequency(&mut self.freq)?;
        Ok(&self.freq)
    }

    /// Point-in-time waveform snapshot, always [`WAVEFORM_LEN`] bytes.
    pub fn waveform_frame(&mut self) -> Result<&[u8]> {
        self.graph.write_waveform(&mut self.wave)?;
        Ok(&self.wave)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::FileSource;

    fn extractor_with_tone() -> FeatureExtractor {
        let graph = GraphHandle::new();
        let samples = (0..48_000).map(|n| (n as f32 * 0.1).sin()).collect();
        graph
            .connect_decoded(FileSource::from_samples(samples, 48_000))
            .unwrap();
        FeatureExtractor::new(graph)
    }

    #[test]
    fn frequency_frame_matches_half_the_fft_size() {
        let mut extractor = extractor_with_tone();
        for size in [32, 512, 2048, 32768] {
            extractor.graph().set_analysis_params(size, 0.8).unwrap();
            assert_eq!(extractor.frequency_frame().unwrap().len(), size / 2);
        }
    }

    #[test]
    fn buffer_is_reused_while_the_size_is_stable() {
        let mut extractor = extractor_with_tone();
        extractor.graph().set_analysis_params(1024, 0.8).unwrap();
        let first = extractor.frequency_frame().unwrap().as_ptr();
        let second = extractor.frequency_frame().unwrap().as_ptr();
        assert_eq!(first, second);
    }

    #[test]
    fn no_source_yields_the_default_signal() {
        let mut extractor = FeatureExtractor::new(GraphHandle::new());
        assert!(!extractor.has_source().unwrap());

        let freq = extractor.frequency_frame().unwrap();
        assert_eq!(freq.len(), 512);
        assert!(freq.iter().all(|&byte| byte == 0));

        let wave = extractor.waveform_frame().unwrap();
        assert_eq!(wave.len(), WAVEFORM_LEN);
        assert!(wave.iter().all(|&byte| byte == 128));
    }

    #[test]
    fn pumped_audio_shows_up_in_both_views() {
        let mut extractor = extractor_with_tone();
        extractor.graph().set_analysis_params(1024, 0.0).unwrap();
        extractor.pump(Duration::from_millis(50)).unwrap();

        assert!(extractor
            .frequency_frame()
            .unwrap()
            .iter()
            .any(|&byte| byte > 0));
        assert!(extractor
            .waveform_frame()
            .unwrap()
            .iter()
            .any(|&byte| byte != 128));
    }
}

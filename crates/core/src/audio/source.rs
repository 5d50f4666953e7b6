use std::path::Path;

use crate::{Result, VizError};

/// A pull-based stream of mono samples in [-1, 1].
pub trait SampleStream {
    /// Fills `out` from the front and returns how many samples were written.
    /// Returning less than `out.len()` means the stream has (for now) run
    /// dry; the graph treats the shortfall as silence.
    fn next_block(&mut self, out: &mut [f32]) -> usize;

    fn sample_rate(&self) -> u32;
}

/// A live-input stream whose underlying capture tracks must be released when
/// the source is torn down. Implementations should also stop on drop so that
/// a stream abandoned mid-switch does not keep the capture device open.
pub trait LiveStream: SampleStream {
    /// Stops capture and releases the underlying tracks. Idempotent.
    fn stop(&mut self);
}

/// Produces a live-input stream on demand. `request_stream` runs the host's
/// permission flow and therefore may block indefinitely; the graph never
/// calls it while holding its lock.
pub trait MicBackend {
    fn request_stream(&mut self) -> Result<Box<dyn LiveStream>>;
}

/// A fully decoded audio file, played back as a sample stream.
#[derive(Debug, Clone)]
pub struct FileSource {
    samples: Vec<f32>,
    cursor: usize,
    sample_rate: u32,
}

impl FileSource {
    /// Decodes a WAV file into memory, downmixing to mono. Any decode
    /// problem surfaces as [`VizError::SourceUnavailable`].
    pub fn open(path: &Path) -> Result<Self> {
        let decode_err =
            |err: hound::Error| VizError::unavailable(format!("{}: {err}", path.display()));

        let mut reader = hound::WavReader::open(path).map_err(decode_err)?;
        let spec = reader.spec();
        let channels = spec.channels.max(1) as usize;

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<std::result::Result<_, _>>()
                .map_err(decode_err)?,
            hound::SampleFormat::Int => {
                let full_scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|sample| sample.map(|value| value as f32 / full_scale))
                    .collect::<std::result::Result<_, _>>()
                    .map_err(decode_err)?
            }
        };

        let samples = interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect();

        Ok(Self {
            samples,
            cursor: 0,
            sample_rate: spec.sample_rate,
        })
    }

    /// Wraps already-decoded mono samples. Lets hosts that decode audio
    /// themselves hand the result straight to the graph.
    pub fn from_samples(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            cursor: 0,
            sample_rate,
        }
    }

    /// Seconds of audio remaining before the stream runs dry.
    pub fn remaining_seconds(&self) -> f32 {
        (self.samples.len() - self.cursor) as f32 / self.sample_rate.max(1) as f32
    }
}

impl SampleStream for FileSource {
    fn next_block(&mut self, out: &mut [f32]) -> usize {
        let available = self.samples.len() - self.cursor;
        let count = available.min(out.len());
        out[..count].copy_from_slice(&self.samples[self.cursor..self.cursor + count]);
        self.cursor += count;
        count
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn streams_decoded_samples_then_runs_dry() {
        let mut source = FileSource::from_samples(vec![0.5; 10], 10);
        assert!((source.remaining_seconds() - 1.0).abs() < f32::EPSILON);

        let mut block = [0.0f32; 8];
        assert_eq!(source.next_block(&mut block), 8);
        assert_eq!(source.next_block(&mut block), 2);
        assert_eq!(source.next_block(&mut block), 0);
    }

    #[test]
    fn missing_file_is_source_unavailable() {
        let err = FileSource::open(Path::new("/nonexistent/audio.wav")).unwrap_err();
        assert!(matches!(err, VizError::SourceUnavailable(_)));
    }
}

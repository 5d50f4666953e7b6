//! The audio-processing graph and its shared handle.
//!
//! One [`AudioSourceGraph`] owns the single mutable audio pipeline: the
//! currently connected source and the analysis stage behind it. The graph is
//! shared through [`GraphHandle`] between asynchronous source-switch requests
//! and the synchronous tick loop; the connect/disconnect sequence is the only
//! synchronization point, and at every lock boundary the graph is observable
//! in exactly one of two states: no source, or one fully connected source.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::{Result, VizError};

pub mod analyser;
mod source;

pub use analyser::{clamp_fft_size, Analyser, MAX_FFT_SIZE, MIN_FFT_SIZE, WAVEFORM_LEN};
pub use source::{FileSource, LiveStream, MicBackend, SampleStream};

/// Upper bound on samples pulled per pump so one slow tick cannot schedule
/// an unbounded catch-up.
const MAX_PUMP_SAMPLES: usize = 16384;

/// Fallback sample count pumped when no inter-frame delta is known yet.
const NOMINAL_FRAME: Duration = Duration::from_micros(16_667);

/// Lifecycle of the graph instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphLifecycle {
    /// Constructed but not yet touched; the processing context does not
    /// exist until a caller first needs it.
    Uninitialized,
    /// Processing context exists and operations are accepted.
    Ready,
    /// Torn down for good; connects fail, reads behave as "no source".
    Disposed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContextState {
    Suspended,
    Running,
}

/// The audio source currently feeding the analysis stage.
pub enum AudioSource {
    None,
    File(FileSource),
    Mic(Box<dyn LiveStream>),
}

impl AudioSource {
    fn is_none(&self) -> bool {
        matches!(self, AudioSource::None)
    }
}

impl std::fmt::Debug for AudioSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioSource::None => f.write_str("None"),
            AudioSource::File(_) => f.write_str("File"),
            AudioSource::Mic(_) => f.write_str("Mic"),
        }
    }
}

/// Exclusive owner of the audio pipeline: one source, one analysis stage.
#[derive(Debug)]
pub struct AudioSourceGraph {
    lifecycle: GraphLifecycle,
    context: ContextState,
    analyser: Analyser,
    source: AudioSource,
    block: Vec<f32>,
}

impl AudioSourceGraph {
    pub fn new() -> Self {
        Self {
            lifecycle: GraphLifecycle::Uninitialized,
            context: ContextState::Suspended,
            analyser: Analyser::new(),
            source: AudioSource::None,
            block: Vec::new(),
        }
    }

    pub fn lifecycle(&self) -> GraphLifecycle {
        self.lifecycle
    }

    fn ensure_ready(&mut self) -> Result<()> {
        match self.lifecycle {
            GraphLifecycle::Disposed => Err(VizError::msg("audio graph has been disposed")),
            GraphLifecycle::Uninitialized => {
                self.lifecycle = GraphLifecycle::Ready;
                tracing::debug!("audio graph initialized");
                Ok(())
            }
            GraphLifecycle::Ready => Ok(()),
        }
    }

    /// Stops live tracks and detaches whatever source is connected. Safe to
    /// call in any state, any number of times.
    fn teardown_source(&mut self) {
        match std::mem::replace(&mut self.source, AudioSource::None) {
            AudioSource::None => {}
            AudioSource::File(_) => tracing::debug!("file source disconnected"),
            AudioSource::Mic(mut stream) => {
                stream.stop();
                tracing::debug!("mic stream stopped and disconnected");
            }
        }
    }

    fn resume(&mut self) {
        if self.context == ContextState::Suspended {
            self.context = ContextState::Running;
            tracing::debug!("processing context resumed");
        }
    }

    fn attach(&mut self, source: AudioSource) {
        // Idempotent teardown in case anything connected since the caller
        // last held the lock.
        self.teardown_source();
        self.source = source;
        self.resume();
    }

    fn has_source(&self) -> bool {
        !self.source.is_none()
    }

    fn set_analysis_params(&mut self, fft_size: usize, smoothing: f32) -> Result<()> {
        self.ensure_ready()?;
        self.analyser.set_params(fft_size, smoothing);
        Ok(())
    }

    /// Advances the connected source by `delta` worth of samples and feeds
    /// the analysis stage. A stream that runs dry reads as silence.
    fn pump(&mut self, delta: Duration) {
        if self.context != ContextState::Running {
            return;
        }
        let stream: &mut dyn SampleStream = match &mut self.source {
            AudioSource::None => return,
            AudioSource::File(file) => file,
            AudioSource::Mic(mic) => mic.as_mut(),
        };

        let rate = stream.sample_rate().max(1) as f32;
        let wanted = ((delta.as_secs_f32() * rate) as usize).min(MAX_PUMP_SAMPLES);
        if wanted == 0 {
            return;
        }
        self.block.clear();
        self.block.resize(wanted, 0.0);
        // A shortfall from next_block leaves the zeroed tail in place, so a
        // dry stream feeds silence rather than stale samples.
        let _ = stream.next_block(&mut self.block);
        self.analyser.push_block(&self.block);
    }

    fn write_frequency(&mut self, out: &mut Vec<u8>) -> Result<()> {
        if self.has_source() {
            self.analyser.write_frequency(out)
        } else {
            let bins = self.analyser.bin_count();
            if out.len() != bins {
                out.resize(bins, 0);
            }
            out.fill(0);
            Ok(())
        }
    }

    fn write_waveform(&mut self, out: &mut Vec<u8>) {
        if self.has_source() {
            self.analyser.write_waveform(out);
        } else {
            if out.len() != analyser::WAVEFORM_LEN {
                out.resize(analyser::WAVEFORM_LEN, 128);
            }
            out.fill(128);
        }
    }

    fn dispose(&mut self) {
        self.teardown_source();
        self.analyser.reset();
        self.context = ContextState::Suspended;
        self.lifecycle = GraphLifecycle::Disposed;
        tracing::debug!("audio graph disposed");
    }
}

impl Default for AudioSourceGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared, thread-safe handle over the [`AudioSourceGraph`].
///
/// Source switches arrive through this handle asynchronously relative to the
/// tick loop. Every operation leaves the graph either with no source or with
/// exactly one fully connected source; a failed connect always resolves to
/// "no source".
#[derive(Clone)]
pub struct GraphHandle {
    shared: Arc<Mutex<AudioSourceGraph>>,
}

impl GraphHandle {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Mutex::new(AudioSourceGraph::new())),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, AudioSourceGraph>> {
        self.shared
            .lock()
            .map_err(|_| VizError::msg("audio graph lock has been poisoned"))
    }

    /// Decodes `path` and connects it as the active source, tearing down any
    /// previous source first. On decode failure the graph ends up with no
    /// active source and [`VizError::SourceUnavailable`] is returned.
    pub fn connect_file(&self, path: &Path) -> Result<()> {
        let mut graph = self.lock()?;
        graph.ensure_ready()?;
        graph.teardown_source();
        let source = FileSource::open(path)?;
        graph.attach(AudioSource::File(source));
        tracing::info!(path = %path.display(), "file source connected");
        Ok(())
    }

    /// Connects an already-decoded source, for hosts that do their own
    /// decoding.
    pub fn connect_decoded(&self, source: FileSource) -> Result<()> {
        let mut graph = self.lock()?;
        graph.ensure_ready()?;
        graph.attach(AudioSource::File(source));
        tracing::info!("decoded source connected");
        Ok(())
    }

    /// Requests a live-input stream from the backend and connects it.
    ///
    /// The previous source is torn down before the request so its tracks are
    /// released while the permission prompt is pending; the prompt may block
    /// this caller indefinitely but never the tick loop, which keeps
    /// rendering the no-signal state meanwhile. Denial resolves to
    /// [`VizError::SourceUnavailable`] with no active source.
    pub fn connect_mic(&self, backend: &mut dyn MicBackend) -> Result<()> {
        {
            let mut graph = self.lock()?;
            graph.ensure_ready()?;
            graph.teardown_source();
        }

        let stream = backend.request_stream()?;

        let mut graph = self.lock()?;
        if let Err(err) = graph.ensure_ready() {
            // Disposed while the prompt was pending; release the fresh
            // stream's tracks rather than leaking a live capture.
            let mut stream = stream;
            stream.stop();
            return Err(err);
        }
        graph.attach(AudioSource::Mic(stream));
        tracing::info!("mic source connected");
        Ok(())
    }

    /// Tears down the current source without establishing a new one.
    /// A no-op when nothing is connected.
    pub fn disconnect(&self) -> Result<()> {
        let mut graph = self.lock()?;
        graph.teardown_source();
        Ok(())
    }

    /// Permanently tears the graph down. Further connects fail and frame
    /// reads behave as if no source is connected.
    pub fn dispose(&self) -> Result<()> {
        let mut graph = self.lock()?;
        graph.dispose();
        Ok(())
    }

    /// Applies clamped analysis parameters; see [`clamp_fft_size`].
    pub fn set_analysis_params(&self, fft_size: usize, smoothing: f32) -> Result<()> {
        let mut graph = self.lock()?;
        graph.set_analysis_params(fft_size, smoothing)
    }

    /// Currently effective (clamped) analysis parameters.
    pub fn analysis_params(&self) -> Result<(usize, f32)> {
        let graph = self.lock()?;
        Ok((graph.analyser.fft_size(), graph.analyser.smoothing()))
    }

    pub fn has_source(&self) -> Result<bool> {
        let graph = self.lock()?;
        Ok(graph.has_source())
    }

    pub fn lifecycle(&self) -> Result<GraphLifecycle> {
        let graph = self.lock()?;
        Ok(graph.lifecycle())
    }

    pub(crate) fn pump(&self, delta: Duration) -> Result<()> {
        let mut graph = self.lock()?;
        graph.pump(if delta.is_zero() { NOMINAL_FRAME } else { delta });
        Ok(())
    }

    pub(crate) fn bin_count(&self) -> Result<usize> {
        let graph = self.lock()?;
        Ok(graph.analyser.bin_count())
    }

    pub(crate) fn write_frequency(&self, out: &mut Vec<u8>) -> Result<()> {
        let mut graph = self.lock()?;
        graph.write_frequency(out)
    }

    pub(crate) fn write_waveform(&self, out: &mut Vec<u8>) -> Result<()> {
        let mut graph = self.lock()?;
        graph.write_waveform(out);
        Ok(())
    }
}

impl Default for GraphHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for GraphHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphHandle").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct ProbeStream {
        stopped: Arc<AtomicBool>,
    }

    impl SampleStream for ProbeStream {
        fn next_block(&mut self, out: &mut [f32]) -> usize {
            out.fill(0.25);
            out.len()
        }

        fn sample_rate(&self) -> u32 {
            48_000
        }
    }

    impl LiveStream for ProbeStream {
        fn stop(&mut self) {
            self.stopped.store(true, Ordering::SeqCst);
        }
    }

    struct ProbeBackend {
        stopped: Arc<AtomicBool>,
        deny: bool,
    }

    impl MicBackend for ProbeBackend {
        fn request_stream(&mut self) -> Result<Box<dyn LiveStream>> {
            if self.deny {
                Err(VizError::unavailable("permission denied"))
            } else {
                Ok(Box::new(ProbeStream {
                    stopped: self.stopped.clone(),
                }))
            }
        }
    }

    fn tone(seconds: f32, rate: u32) -> FileSource {
        let count = (seconds * rate as f32) as usize;
        let samples = (0..count)
            .map(|n| (n as f32 * 0.05).sin() * 0.5)
            .collect();
        FileSource::from_samples(samples, rate)
    }

    #[test]
    fn first_use_initializes_the_graph() {
        let graph = GraphHandle::new();
        assert_eq!(graph.lifecycle().unwrap(), GraphLifecycle::Uninitialized);
        graph.set_analysis_params(1024, 0.8).unwrap();
        assert_eq!(graph.lifecycle().unwrap(), GraphLifecycle::Ready);
    }

    #[test]
    fn switching_sources_keeps_exactly_one_connected() {
        let graph = GraphHandle::new();
        graph.connect_decoded(tone(1.0, 48_000)).unwrap();
        assert!(graph.has_source().unwrap());

        let stopped = Arc::new(AtomicBool::new(false));
        let mut backend = ProbeBackend {
            stopped: stopped.clone(),
            deny: false,
        };
        graph.connect_mic(&mut backend).unwrap();
        assert!(graph.has_source().unwrap());
        assert!(!stopped.load(Ordering::SeqCst));

        // Switching away from the mic must release its tracks.
        graph.connect_decoded(tone(1.0, 48_000)).unwrap();
        assert!(graph.has_source().unwrap());
        assert!(stopped.load(Ordering::SeqCst));
    }

    #[test]
    fn denied_mic_leaves_no_active_source() {
        let graph = GraphHandle::new();
        graph.connect_decoded(tone(1.0, 48_000)).unwrap();

        let mut backend = ProbeBackend {
            stopped: Arc::new(AtomicBool::new(false)),
            deny: true,
        };
        let err = graph.connect_mic(&mut backend).unwrap_err();
        assert!(matches!(err, VizError::SourceUnavailable(_)));
        assert!(!graph.has_source().unwrap());
    }

    #[test]
    fn failed_file_decode_leaves_no_active_source() {
        let graph = GraphHandle::new();
        graph.connect_decoded(tone(1.0, 48_000)).unwrap();

        let err = graph
            .connect_file(Path::new("/nonexistent/audio.wav"))
            .unwrap_err();
        assert!(matches!(err, VizError::SourceUnavailable(_)));
        assert!(!graph.has_source().unwrap());
    }

    #[test]
    fn disconnect_is_idempotent() {
        let graph = GraphHandle::new();
        graph.disconnect().unwrap();
        graph.connect_decoded(tone(0.1, 48_000)).unwrap();
        graph.disconnect().unwrap();
        graph.disconnect().unwrap();
        assert!(!graph.has_source().unwrap());
    }

    #[test]
    fn disposed_graph_rejects_connects() {
        let graph = GraphHandle::new();
        graph.connect_decoded(tone(0.1, 48_000)).unwrap();
        graph.dispose().unwrap();
        assert_eq!(graph.lifecycle().unwrap(), GraphLifecycle::Disposed);
        assert!(graph.connect_decoded(tone(0.1, 48_000)).is_err());
        assert!(!graph.has_source().unwrap());
    }

    #[test]
    fn dispose_during_pending_mic_request_stops_the_stream() {
        let graph = GraphHandle::new();
        graph.set_analysis_params(1024, 0.8).unwrap();
        let stopped = Arc::new(AtomicBool::new(false));

        struct DisposingBackend {
            graph: GraphHandle,
            stopped: Arc<AtomicBool>,
        }
        impl MicBackend for DisposingBackend {
            fn request_stream(&mut self) -> Result<Box<dyn LiveStream>> {
                // The host tears the graph down while the prompt is open.
                self.graph.dispose().unwrap();
                Ok(Box::new(ProbeStream {
                    stopped: self.stopped.clone(),
                }))
            }
        }

        let mut backend = DisposingBackend {
            graph: graph.clone(),
            stopped: stopped.clone(),
        };
        assert!(graph.connect_mic(&mut backend).is_err());
        assert!(stopped.load(Ordering::SeqCst));
        assert!(!graph.has_source().unwrap());
    }

    #[test]
    fn analysis_params_are_clamped() {
        let graph = GraphHandle::new();
        graph.set_analysis_params(1000, 1.5).unwrap();
        let (fft_size, smoothing) = graph.analysis_params().unwrap();
        assert_eq!(fft_size, 1024);
        assert!((smoothing - 0.99).abs() < f32::EPSILON);
    }

    #[test]
    fn pump_feeds_the_analyser() {
        let graph = GraphHandle::new();
        graph.connect_decoded(tone(1.0, 48_000)).unwrap();
        graph.set_analysis_params(1024, 0.0).unwrap();
        graph.pump(Duration::from_millis(50)).unwrap();

        let mut freq = Vec::new();
        graph.write_frequency(&mut freq).unwrap();
        assert_eq!(freq.len(), 512);
        assert!(freq.iter().any(|&byte| byte > 0));
    }
}

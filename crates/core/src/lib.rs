//! Core library for the SoundWavez audio-reactive visualization engine.
//!
//! The crate consumes live audio through a single owned processing graph,
//! extracts spectral and time-domain feature frames once per display frame,
//! and renders one of several visual modes onto an abstract pixel surface.
//! Each module owns a distinct subsystem: the audio graph and its analysis
//! stage, feature extraction, per-mode renderers, the gradient cache, frame
//! timing, and the render loop that composes them.

pub mod audio;
pub mod error;
pub mod features;
pub mod palette;
pub mod perf;
pub mod render;
pub mod runloop;
pub mod settings;
pub mod surface;

pub use audio::{
    clamp_fft_size, AudioSource, AudioSourceGraph, FileSource, GraphHandle, GraphLifecycle,
    LiveStream, MicBackend, SampleStream, WAVEFORM_LEN,
};
pub use error::{Result, VizError};
pub use features::FeatureExtractor;
pub use palette::{solid_color, Color, Gradient, GradientCache, GradientKind};
pub use perf::{PerformanceReporter, PerformanceSample};
pub use render::{renderer_for, FrameKind, ModeRenderer};
pub use runloop::{LoopState, ManualScheduler, RenderLoop, Scheduler};
pub use settings::{SettingsSnapshot, VizMode};
pub use surface::{DrawCommand, Paint, RecordingSurface, Surface};

//! The per-frame orchestrator.
//!
//! One tick per display refresh: measure elapsed time, aggregate performance,
//! clear and repaint, read the feature frame the active mode needs, and
//! dispatch to its renderer. The loop holds at most one outstanding scheduled
//! callback and re-registers itself at the end of each tick, so ticks never
//! overlap and state touched only within a tick needs no locking.

use std::time::{Duration, Instant};

use crate::features::FeatureExtractor;
use crate::palette::GradientCache;
use crate::perf::PerformanceReporter;
use crate::render::{self, FrameKind, BACKGROUND};
use crate::settings::SettingsSnapshot;
use crate::surface::{Paint, Surface};
use crate::Result;

/// Registration point for "produce the next tick".
///
/// A scheduler holds at most one pending registration. The concrete primitive
/// (vsync callback, timer thread, manual pump) must preserve the ordering
/// guarantee that ticks run strictly sequentially.
pub trait Scheduler {
    /// Registers one pending tick, replacing any existing registration.
    fn request(&mut self);

    /// Withdraws the pending registration, if any.
    fn cancel(&mut self);
}

/// Scheduler for hosts that pump ticks themselves: `request` sets a flag the
/// host drains with [`ManualScheduler::take`] once per refresh interval.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    pending: bool,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes the pending registration, returning whether one was set.
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }
}

impl Scheduler for ManualScheduler {
    fn request(&mut self) {
        self.pending = true;
    }

    fn cancel(&mut self) {
        self.pending = false;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Stopped,
    Running,
}

/// Composes the feature extractor, gradient cache, renderers, and the
/// performance reporter into the per-frame loop.
#[derive(Debug)]
pub struct RenderLoop {
    state: LoopState,
    extractor: FeatureExtractor,
    gradients: GradientCache,
    reporter: PerformanceReporter,
    last_tick: Option<Instant>,
    last_backing: Option<(u32, u32)>,
}

impl RenderLoop {
    pub fn new(extractor: FeatureExtractor, reporter: PerformanceReporter) -> Self {
        Self {
            state: LoopState::Stopped,
            extractor,
            gradients: GradientCache::new(),
            reporter,
            last_tick: None,
            last_backing: None,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Transitions Stopped → Running and registers the first tick.
    pub fn start(&mut self, scheduler: &mut dyn Scheduler) {
        if self.state == LoopState::Running {
            return;
        }
        self.state = LoopState::Running;
        self.last_tick = None;
        scheduler.request();
        tracing::info!("render loop started");
    }

    /// Transitions Running → Stopped, withdraws the pending registration and
    /// detaches the resize tracking. Safe to call at any time; no tick runs
    /// afterwards until the next `start`.
    pub fn stop(&mut self, scheduler: &mut dyn Scheduler) {
        if self.state == LoopState::Stopped {
            return;
        }
        self.state = LoopState::Stopped;
        scheduler.cancel();
        self.last_tick = None;
        // With the resize tracking detached, a backing change while stopped
        // would go unseen; drop the cached gradients along with it.
        self.last_backing = None;
        self.gradients.clear();
        tracing::info!("render loop stopped");
    }

    /// Runs one tick. The host calls this when the scheduled callback fires;
    /// the tick re-registers itself at the end, keeping exactly one
    /// registration outstanding while running.
    pub fn tick(
        &mut self,
        now: Instant,
        settings: &SettingsSnapshot,
        surface: &mut dyn Surface,
        scheduler: &mut dyn Scheduler,
    ) -> Result<()> {
        if self.state != LoopState::Running {
            return Ok(());
        }

        let delta = self.last_tick.map(|previous| now.duration_since(previous));
        self.last_tick = Some(now);
        if let Some(delta) = delta {
            self.reporter.record(delta);
        }

        // Settings are immutable for the rest of the tick; parameter pushes
        // into the analysis stage are clamped and idempotent.
        self.extractor
            .graph()
            .set_analysis_params(settings.fft_size, settings.smoothing)?;

        // Invalidate gradients before anything reads the cache this tick.
        let backing = surface.backing_size();
        if self.last_backing.is_some() && self.last_backing != Some(backing) {
            self.gradients.clear();
            tracing::debug!(?backing, "surface backing changed, gradient cache cleared");
        }
        self.last_backing = Some(backing);

        surface.clear();
        let (w, h) = surface.logical_size();
        surface.set_paint(Paint::Solid(BACKGROUND));
        surface.fill_rect(0.0, 0.0, w, h);

        if !self.extractor.has_source()? {
            render::render_no_signal(surface);
        } else {
            self.extractor.pump(delta.unwrap_or(Duration::ZERO))?;
            match render::renderer_for(settings.mode) {
                Some(renderer) => {
                    let frame = match renderer.frame_kind() {
                        FrameKind::Frequency => self.extractor.frequency_frame()?,
                        FrameKind::Waveform => self.extractor.waveform_frame()?,
                    };
                    renderer.render(frame, settings, &mut self.gradients, surface);
                }
                None => {
                    tracing::warn!(mode = ?settings.mode, "unknown visualization mode");
                    render::render_placeholder(surface);
                }
            }
        }

        scheduler.request();
        Ok(())
    }
}

//! Frame-timing aggregation.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A tick is counted as dropped when its inter-frame delta exceeds this
/// threshold (the <50 fps line).
pub const DROP_THRESHOLD: Duration = Duration::from_millis(20);

/// Length of the rolling aggregation window.
const WINDOW: Duration = Duration::from_millis(1000);

/// One aggregated timing sample, emitted at most once per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceSample {
    pub fps: u32,
    pub dropped_frames: u32,
}

/// Pure aggregator of per-tick elapsed times.
///
/// Feeds each measured inter-frame delta into a rolling ~1000 ms window and
/// emits one `{fps, dropped_frames}` sample per window through the
/// caller-supplied callback, then resets. Knows nothing about rendering or
/// audio state.
pub struct PerformanceReporter {
    ticks: u32,
    dropped: u32,
    elapsed: Duration,
    callback: Box<dyn FnMut(PerformanceSample)>,
}

impl PerformanceReporter {
    pub fn new(callback: impl FnMut(PerformanceSample) + 'static) -> Self {
        Self {
            ticks: 0,
            dropped: 0,
            elapsed: Duration::ZERO,
            callback: Box::new(callback),
        }
    }

    /// Records one tick's inter-frame delta.
    pub fn record(&mut self, delta: Duration) {
        self.ticks += 1;
        if delta > DROP_THRESHOLD {
            self.dropped += 1;
        }
        self.elapsed += delta;

        if self.elapsed >= WINDOW {
            let window_ms = self.elapsed.as_secs_f64() * 1000.0;
            let fps = (self.ticks as f64 * 1000.0 / window_ms).round() as u32;
            (self.callback)(PerformanceSample {
                fps,
                dropped_frames: self.dropped,
            });
            self.ticks = 0;
            self.dropped = 0;
            self.elapsed = Duration::ZERO;
        }
    }
}

impl fmt::Debug for PerformanceReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PerformanceReporter")
            .field("ticks", &self.ticks)
            .field("dropped", &self.dropped)
            .field("elapsed", &self.elapsed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn collecting_reporter() -> (PerformanceReporter, Rc<RefCell<Vec<PerformanceSample>>>) {
        let samples = Rc::new(RefCell::new(Vec::new()));
        let sink = samples.clone();
        let reporter = PerformanceReporter::new(move |sample| sink.borrow_mut().push(sample));
        (reporter, samples)
    }

    #[test]
    fn steady_sixty_fps_emits_one_clean_sample() {
        let (mut reporter, samples) = collecting_reporter();
        for _ in 0..60 {
            reporter.record(Duration::from_micros(16_700));
        }
        let samples = samples.borrow();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].fps, 60);
        assert_eq!(samples[0].dropped_frames, 0);
    }

    #[test]
    fn thirty_fps_drops_every_tick() {
        let (mut reporter, samples) = collecting_reporter();
        let mut ticks = 0u32;
        while samples.borrow().is_empty() {
            reporter.record(Duration::from_millis(33));
            ticks += 1;
        }
        let samples = samples.borrow();
        assert_eq!(samples[0].dropped_frames, ticks);
        assert_eq!(samples[0].fps, 30);
    }

    #[test]
    fn counters_reset_between_windows() {
        let (mut reporter, samples) = collecting_reporter();
        for _ in 0..40 {
            reporter.record(Duration::from_millis(25));
        }
        for _ in 0..100 {
            reporter.record(Duration::from_millis(10));
        }
        let samples = samples.borrow();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].fps, 40);
        assert_eq!(samples[0].dropped_frames, 40);
        assert_eq!(samples[1].dropped_frames, 0);
        assert_eq!(samples[1].fps, 100);
    }

    #[test]
    fn exactly_twenty_ms_is_not_a_drop() {
        let (mut reporter, samples) = collecting_reporter();
        for _ in 0..50 {
            reporter.record(Duration::from_millis(20));
        }
        assert_eq!(samples.borrow()[0].dropped_frames, 0);
    }
}

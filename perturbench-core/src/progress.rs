//! Progress reporting for long scoring passes.
//!
//! Progress is cosmetic: it is only surfaced once a pass has been running for
//! longer than a threshold, and never influences results.

use std::time::{Duration, Instant};

/// Receives progress for one scoring pass.
pub trait ProgressObserver {
    /// The pass became slow enough to report; `completed` samples are already done.
    fn on_start(&mut self, total: usize, completed: usize);
    /// `delta` more samples finished.
    fn on_advance(&mut self, delta: usize);
    /// The pass ended (only called if `on_start` was).
    fn on_finish(&mut self);
}

/// Reports progress as `tracing` events.
#[derive(Debug, Default)]
pub struct TracingProgress {
    total: usize,
    completed: usize,
}

impl TracingProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressObserver for TracingProgress {
    fn on_start(&mut self, total: usize, completed: usize) {
        self.total = total;
        self.completed = completed;
        tracing::info!(completed, total, "scoring in progress");
    }

    fn on_advance(&mut self, delta: usize) {
        self.completed += delta;
        tracing::debug!(completed = self.completed, total = self.total, "scoring progress");
    }

    fn on_finish(&mut self) {
        tracing::info!(completed = self.completed, total = self.total, "scoring finished");
    }
}

/// Discards all progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_start(&mut self, _total: usize, _completed: usize) {}
    fn on_advance(&mut self, _delta: usize) {}
    fn on_finish(&mut self) {}
}

/// Decides when a pass has run long enough to start reporting.
#[derive(Debug)]
pub struct ProgressGate {
    threshold: Duration,
    started: Instant,
    active: bool,
    silent: bool,
}

impl ProgressGate {
    pub fn new(threshold: Duration, silent: bool) -> Self {
        Self {
            threshold,
            started: Instant::now(),
            active: false,
            silent,
        }
    }

    pub fn from_secs(threshold_secs: f64, silent: bool) -> Self {
        let threshold = Duration::try_from_secs_f64(threshold_secs.max(0.0)).unwrap_or(Duration::MAX);
        Self::new(threshold, silent)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Call after sample `index` (0-based) of `total` finished.
    pub fn sample_done(&mut self, index: usize, total: usize, observer: &mut dyn ProgressObserver) {
        if self.silent {
            return;
        }
        if self.active {
            observer.on_advance(1);
        } else if self.started.elapsed() > self.threshold {
            self.active = true;
            observer.on_start(total, index + 1);
        }
    }

    pub fn finish(&mut self, observer: &mut dyn ProgressObserver) {
        if self.active {
            observer.on_finish();
            self.active = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl ProgressObserver for Recorder {
        fn on_start(&mut self, total: usize, completed: usize) {
            self.events.push(format!("start {completed}/{total}"));
        }
        fn on_advance(&mut self, delta: usize) {
            self.events.push(format!("advance {delta}"));
        }
        fn on_finish(&mut self) {
            self.events.push("finish".into());
        }
    }

    #[test]
    fn test_fast_pass_reports_nothing() {
        let mut gate = ProgressGate::new(Duration::from_secs(3600), false);
        let mut rec = Recorder::default();
        for i in 0..3 {
            gate.sample_done(i, 3, &mut rec);
        }
        gate.finish(&mut rec);
        assert!(rec.events.is_empty());
    }

    #[test]
    fn test_slow_pass_starts_with_completed_count() {
        let mut gate = ProgressGate::new(Duration::ZERO, false);
        let mut rec = Recorder::default();
        std::thread::sleep(Duration::from_millis(2));
        for i in 0..3 {
            gate.sample_done(i, 3, &mut rec);
        }
        gate.finish(&mut rec);
        assert_eq!(rec.events, vec!["start 1/3", "advance 1", "advance 1", "finish"]);
    }

    #[test]
    fn test_silent_suppresses_everything() {
        let mut gate = ProgressGate::new(Duration::ZERO, true);
        let mut rec = Recorder::default();
        std::thread::sleep(Duration::from_millis(2));
        gate.sample_done(0, 1, &mut rec);
        gate.finish(&mut rec);
        assert!(rec.events.is_empty());
        assert!(!gate.is_active());
    }
}

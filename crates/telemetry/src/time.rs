// Path: crates/telemetry/src/time.rs
use crate::sinks::ModelMetricsSink;
use std::time::Instant;

/// Measures one training run. The duration reaches the model sink exactly
/// once: on [`Timer::finish`], or on drop if the run bailed out early.
pub struct Timer<'a> {
    sink: &'a dyn ModelMetricsSink,
    start: Instant,
    reported: bool,
}

impl<'a> Timer<'a> {
    pub fn new(sink: &'a dyn ModelMetricsSink) -> Self {
        Self {
            sink,
            start: Instant::now(),
            reported: false,
        }
    }

    /// Reports the elapsed time and returns it in seconds.
    pub fn finish(mut self) -> f64 {
        self.report()
    }

    fn report(&mut self) -> f64 {
        let secs = self.start.elapsed().as_secs_f64();
        if !self.reported {
            self.sink.observe_training_duration(secs);
            self.reported = true;
        }
        secs
    }
}

impl Drop for Timer<'_> {
    fn drop(&mut self) {
        self.report();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct Counting(AtomicUsize);

    impl ModelMetricsSink for Counting {
        fn inc_training_runs(&self, _result: &'static str) {}
        fn set_last_accuracy(&self, _accuracy: f64) {}
        fn observe_training_duration(&self, _duration_secs: f64) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
        fn inc_predictions(&self) {}
    }

    #[test]
    fn reports_once() {
        let sink = Counting::default();
        let secs = Timer::new(&sink).finish();
        assert!(secs >= 0.0);
        assert_eq!(sink.0.load(Ordering::SeqCst), 1);

        drop(Timer::new(&sink));
        assert_eq!(sink.0.load(Ordering::SeqCst), 2);
    }
}

//! Progress display for a batch of simulations.
//!
//! [`SweepProgress`] owns the `indicatif` bar of a sweep and the counts it shows:
//! runs finished, runs failed, and a moving average of the wall-clock time of one run,
//!
//! ```text
//! mean ← w·last + (1 − w)·mean,   w = RUN_TIME_WEIGHT
//! ```
//!
//! seeded with the first run. Only compiled with the `progress` feature.
use indicatif::{ProgressBar, ProgressStyle};
use std::time::{Duration, Instant};

/// Weight of the latest run in the moving average of run durations.
const RUN_TIME_WEIGHT: f64 = 0.25;

const TEMPLATE: &str = concat!(
    "{bar:40.cyan/blue} {pos}/{len} ({percent:>3}%) ",
    "| ETA {eta_precise} | {msg}"
);

pub struct SweepProgress {
    bar: ProgressBar,
    total: usize,
    finished: usize,
    failed: usize,
    mean_run: Option<Duration>,
    run_started: Option<Instant>,
}

impl SweepProgress {
    /// Visible bar for a sweep of `total` runs.
    pub fn new(total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::with_template(TEMPLATE) {
            bar.set_style(style);
        }
        bar.enable_steady_tick(Duration::from_millis(200));
        Self::with_bar(bar, total)
    }

    fn with_bar(bar: ProgressBar, total: usize) -> Self {
        SweepProgress {
            bar,
            total,
            finished: 0,
            failed: 0,
            mean_run: None,
            run_started: None,
        }
    }

    pub fn start_run(&mut self) {
        self.run_started = Some(Instant::now());
    }

    /// Close the run opened by [`start_run`](SweepProgress::start_run) and refresh the bar.
    pub fn finish_run(&mut self, failed: bool) {
        let elapsed = self
            .run_started
            .take()
            .map_or(Duration::ZERO, |start| start.elapsed());
        self.record(elapsed, failed);
        self.bar.set_message(self.message());
        self.bar.inc(1);
    }

    fn record(&mut self, elapsed: Duration, failed: bool) {
        self.finished += 1;
        if failed {
            self.failed += 1;
        }
        self.mean_run = Some(match self.mean_run {
            None => elapsed,
            Some(mean) => {
                elapsed.mul_f64(RUN_TIME_WEIGHT) + mean.mul_f64(1.0 - RUN_TIME_WEIGHT)
            }
        });
    }

    /// Moving average of the run durations, `None` before the first run.
    pub fn mean_run(&self) -> Option<Duration> {
        self.mean_run
    }

    pub fn message(&self) -> String {
        let mean = self.mean_run.unwrap_or_default();
        format!(
            "run {}/{}, {} failed, ~{:.1?} per run",
            self.finished, self.total, self.failed, mean
        )
    }

    /// Leave the bar on an interruption notice.
    pub fn interrupt(&self) {
        self.bar.set_message(format!("Interrupted: {}", self.message()));
    }

    pub fn finish(self) {
        self.bar.disable_steady_tick();
        self.bar.finish_and_clear();
    }
}

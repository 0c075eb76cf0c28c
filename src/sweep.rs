//! # Batch runs over independent simulations
//!
//! Runs a slice of [`Simulation`]s one after the other and collects one outcome per run:
//!
//! ```text
//! index → Result<Integration<12>, DuoSatError>
//! ```
//!
//! ## Overview
//! -----------------
//! * [`SimulationSweep::run_all`] – run every simulation.
//! * [`SimulationSweep::run_all_with_cancel`] – same, polling `should_cancel()` before the
//!   first run and then on a wall-clock interval of 20 ms, so the cancellation latency does
//!   not depend on how long each run takes.
//! * [`tolerance_sweep`] – copies of one simulation at several tolerances, the usual way
//!   to check that a result has converged.
//! * [`SweepSummary`] – completed / failed counts and total step statistics.
//!
//! Failures are isolated: a singular configuration or a step-size underflow in one run is
//! stored in its slot and the batch moves on. A cancelled batch returns the outcomes of the
//! runs started before the cancellation, in order.
//!
//! ### Progress UI (feature: `progress`)
//! With the `progress` feature, the batch renders an `indicatif` bar with the number of failed
//! runs and a moving average of the run duration (see [`crate::progress_bar::SweepProgress`]).
use log::{info, warn};
use std::{
    fmt,
    time::{Duration, Instant},
};

#[cfg(feature = "progress")]
use crate::progress_bar::SweepProgress;

use crate::{
    constants::STATE_DIM,
    duosat_errors::DuoSatError,
    integrator::{rkf45::Integration, RKF45Params},
    simulation::Simulation,
};

/// Outcome of one run of a sweep.
pub type RunResult = Result<Integration<STATE_DIM>, DuoSatError>;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

pub trait SimulationSweep {
    /// Run every simulation and return one outcome per simulation, in order.
    fn run_all(&self) -> Vec<RunResult>;

    /// Run the simulations in order until `should_cancel()` returns `true`.
    ///
    /// `should_cancel` is called before the first run, then at most once every 20 ms. The
    /// returned vector is a prefix of what [`run_all`](SimulationSweep::run_all) would return.
    fn run_all_with_cancel<F>(&self, should_cancel: F) -> Vec<RunResult>
    where
        F: FnMut() -> bool;
}

impl SimulationSweep for [Simulation] {
    fn run_all(&self) -> Vec<RunResult> {
        self.run_all_with_cancel(|| false)
    }

    fn run_all_with_cancel<F>(&self, mut should_cancel: F) -> Vec<RunResult>
    where
        F: FnMut() -> bool,
    {
        #[cfg(feature = "progress")]
        let mut progress = SweepProgress::new(self.len());

        let mut results = Vec::with_capacity(self.len());
        let mut last_poll: Option<Instant> = None;

        for (i, sim) in self.iter().enumerate() {
            if last_poll.map_or(true, |p| p.elapsed() >= POLL_INTERVAL) {
                if should_cancel() {
                    warn!("Sweep cancelled after {i} of {} runs", self.len());
                    #[cfg(feature = "progress")]
                    progress.interrupt();
                    break;
                }
                last_poll = Some(Instant::now());
            }

            #[cfg(feature = "progress")]
            progress.start_run();

            let res = sim.run();
            if let Err(e) = &res {
                warn!("Run {i} failed: {e}");
            }

            #[cfg(feature = "progress")]
            progress.finish_run(res.is_err());

            results.push(res);
        }

        #[cfg(feature = "progress")]
        progress.finish();

        info!("Sweep: {}", SweepSummary::from_results(&results));
        results
    }
}

/// Copies of `base` integrated at each of the given tolerances (relative and absolute).
pub fn tolerance_sweep(
    base: &Simulation,
    tolerances: &[f64],
) -> Result<Vec<Simulation>, DuoSatError> {
    tolerances
        .iter()
        .map(|&tol| {
            let params = RKF45Params {
                relative_tolerance: tol,
                absolute_tolerance: tol,
                ..base.params().clone()
            };
            base.with_params(params)
        })
        .collect()
}

/// Counts over the outcomes of a sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub completed: usize,
    pub failed: usize,
    pub accepted_steps: usize,
    pub rejected_steps: usize,
    pub rhs_evaluations: usize,
}

impl SweepSummary {
    pub fn from_results(results: &[RunResult]) -> Self {
        results
            .iter()
            .fold(SweepSummary::default(), |mut acc, res| {
                match res {
                    Ok(run) => {
                        acc.completed += 1;
                        acc.accepted_steps += run.stats.accepted_steps;
                        acc.rejected_steps += run.stats.rejected_steps;
                        acc.rhs_evaluations += run.stats.rhs_evaluations;
                    }
                    Err(_) => acc.failed += 1,
                }
                acc
            })
    }
}

impl fmt::Display for SweepSummary {
    /// Compact by default; multi-line when using the alternate flag (`{:#}`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "Sweep summary")?;
            writeln!(f, "-------------")?;
            writeln!(f, "completed       : {}", self.completed)?;
            writeln!(f, "failed          : {}", self.failed)?;
            writeln!(f, "accepted steps  : {}", self.accepted_steps)?;
            writeln!(f, "rejected steps  : {}", self.rejected_steps)?;
            write!(f, "rhs evaluations : {}", self.rhs_evaluations)
        } else {
            write!(
                f,
                "completed={}, failed={}, accepted={}, rejected={}, nfev={}",
                self.completed,
                self.failed,
                self.accepted_steps,
                self.rejected_steps,
                self.rhs_evaluations
            )
        }
    }
}

//! # RKF45 stepper
//!
//! Integrates `dy/dt = f(t, y)` from `t0` to `tf` with the embedded Runge–Kutta–Fehlberg 4(5)
//! pair, choosing each step so that the estimated local error stays within tolerance.
//!
//! ## Controller states
//!
//! ```text
//!            err ≤ 1                 t < tf
//! Stepping ───────────► Accepted ───────────► Stepping
//!    │                      │ t == tf
//!    │ err > 1              └───────────────► Converged
//!    ▼
//! Rejected ──── h > min_step ───────────────► Stepping (same t, y; smaller h)
//!
//! any ──► Failed: step budget exhausted, rejection at min_step, accepted step that
//!                 leaves t unchanged, fault raised by f, or a non-finite stage
//! ```
//!
//! Accepted steps advance with the 5th-order estimate (local extrapolation). The last step is
//! shortened to land exactly on `tf`.
//!
//! ## Right-hand side contract
//!
//! `f` returns `Result<SVector<f64, N>, DuoSatError>`; an `Err` aborts the integration and is
//! returned unchanged (e.g. [`DuoSatError::SingularConfiguration`] from
//! [`ThreeBodyDynamics::rates`](crate::dynamics::ThreeBodyDynamics::rates)). A derivative with
//! NaN or infinite components is reported as [`DuoSatError::NonFiniteState`], so no
//! non-finite value ever reaches the trajectory.
//!
//! ## Cost
//!
//! Six evaluations of `f` per attempted step; the first stage of a retry after a rejection is
//! reused, and the first stage of the next step is the derivative stored with the accepted
//! sample. Net cost is five evaluations per attempt plus one per accepted step.
use log::{debug, info, trace, warn};
use nalgebra::{DVector, SVector};
use std::fmt;

use crate::{
    constants::{MAX_STEP_SCALE, MIN_STEP_SCALE, STEP_EXPONENT, STEP_SAFETY},
    duosat_errors::DuoSatError,
    integrator::{
        norm::{all_finite, scaled_error_norm},
        tableau::{A, B4, B5, C, STAGES},
        RKF45Params,
    },
    trajectory::{Sample, Trajectory},
};

/// Outcome of one attempted step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Accepted,
    Rejected,
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepOutcome::Accepted => write!(f, "accepted"),
            StepOutcome::Rejected => write!(f, "rejected"),
        }
    }
}

/// Report passed to the monitor of [`integrate_with_monitor`] after every attempt.
///
/// * `t`, `step` – start time and size of the attempted step.
/// * `error` – normalized error estimate (`≤ 1` means within tolerance).
/// * `next_step` – trial size of the following attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    pub t: f64,
    pub step: f64,
    pub error: f64,
    pub next_step: f64,
    pub outcome: StepOutcome,
}

/// Result of evaluating the six stages at `(t, y)` with step `h`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepAttempt<const N: usize> {
    /// 5th-order estimate of `y(t + h)`.
    pub y5: SVector<f64, N>,
    /// 4th-order estimate of `y(t + h)`.
    pub y4: SVector<f64, N>,
    /// Normalized error of `y5 - y4`, see [`scaled_error_norm`].
    pub error: f64,
}

/// Counters collected while integrating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegrationStats {
    pub accepted_steps: usize,
    pub rejected_steps: usize,
    pub rhs_evaluations: usize,
    /// Largest normalized error among accepted steps (never above 1).
    pub max_accepted_error: f64,
    /// Smallest accepted step, `+∞` when no step was taken.
    pub smallest_step: f64,
    /// Largest accepted step, `0` when no step was taken.
    pub largest_step: f64,
}

impl IntegrationStats {
    fn new() -> Self {
        IntegrationStats {
            accepted_steps: 0,
            rejected_steps: 0,
            rhs_evaluations: 0,
            max_accepted_error: 0.0,
            smallest_step: f64::INFINITY,
            largest_step: 0.0,
        }
    }

    /// Attempted steps, accepted or not.
    pub fn attempted_steps(&self) -> usize {
        self.accepted_steps + self.rejected_steps
    }
}

impl fmt::Display for IntegrationStats {
    /// Compact by default; multi-line when using the alternate flag (`{:#}`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "RKF45 integration statistics")?;
            writeln!(f, "----------------------------")?;
            writeln!(f, "accepted steps     : {}", self.accepted_steps)?;
            writeln!(f, "rejected steps     : {}", self.rejected_steps)?;
            writeln!(f, "rhs evaluations    : {}", self.rhs_evaluations)?;
            writeln!(f, "max accepted error : {:.3e}", self.max_accepted_error)?;
            writeln!(f, "smallest step      : {:.6e}", self.smallest_step)?;
            write!(f, "largest step       : {:.6e}", self.largest_step)
        } else {
            write!(
                f,
                "accepted={}, rejected={}, nfev={}, max_err={:.3e}, h=[{:.3e}, {:.3e}]",
                self.accepted_steps,
                self.rejected_steps,
                self.rhs_evaluations,
                self.max_accepted_error,
                self.smallest_step,
                self.largest_step
            )
        }
    }
}

/// A completed integration: the sealed trajectory and the controller statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct Integration<const N: usize> {
    pub trajectory: Trajectory<N>,
    pub stats: IntegrationStats,
}

/// Evaluate `f` and reject non-finite derivatives.
fn checked_rates<F, const N: usize>(
    f: &mut F,
    t: f64,
    y: &SVector<f64, N>,
) -> Result<SVector<f64, N>, DuoSatError>
where
    F: FnMut(f64, &SVector<f64, N>) -> Result<SVector<f64, N>, DuoSatError>,
{
    let dydt = f(t, y)?;
    if !all_finite(&dydt) {
        return Err(DuoSatError::NonFiniteState { t });
    }
    Ok(dydt)
}

/// Perform one RKF45 attempt from `(t, y)` with step `h`, without deciding acceptance.
///
/// Arguments
/// -----------------
/// * `f`: Right-hand side.
/// * `t`, `y`: Current time and state.
/// * `dydt`: `f(t, y)`, the first stage, supplied by the caller so it can be reused.
/// * `h`: Trial step.
/// * `params`: Tolerances used by the error norm.
///
/// Return
/// ----------
/// * The two embedded estimates and the normalized error.
/// * `Err` if `f` fails at a stage or any stage or estimate is non-finite.
pub fn try_step<F, const N: usize>(
    f: &mut F,
    t: f64,
    y: &SVector<f64, N>,
    dydt: &SVector<f64, N>,
    h: f64,
    params: &RKF45Params,
) -> Result<StepAttempt<N>, DuoSatError>
where
    F: FnMut(f64, &SVector<f64, N>) -> Result<SVector<f64, N>, DuoSatError>,
{
    let mut k = [SVector::<f64, N>::zeros(); STAGES];
    k[0] = *dydt;

    for i in 1..STAGES {
        let mut yi = *y;
        for j in 0..i {
            if A[i][j] != 0.0 {
                yi += k[j] * (h * A[i][j]);
            }
        }
        k[i] = checked_rates(f, t + C[i] * h, &yi)?;
    }

    let mut incr5 = SVector::<f64, N>::zeros();
    let mut incr4 = SVector::<f64, N>::zeros();
    for i in 0..STAGES {
        incr5 += k[i] * B5[i];
        incr4 += k[i] * B4[i];
    }

    let y5 = y + incr5 * h;
    let y4 = y + incr4 * h;
    if !all_finite(&y5) || !all_finite(&y4) {
        return Err(DuoSatError::NonFiniteState { t: t + h });
    }

    let diff = (incr5 - incr4) * h;
    let error = scaled_error_norm(
        y,
        &y5,
        &diff,
        params.relative_tolerance,
        params.absolute_tolerance,
    );

    Ok(StepAttempt { y5, y4, error })
}

/// Step-size factor `0.84 · err^(-1/5)`, clamped to `[0.1, 4.0]`.
pub fn step_scale(error: f64) -> f64 {
    if error == 0.0 {
        return MAX_STEP_SCALE;
    }
    (STEP_SAFETY * error.powf(-STEP_EXPONENT)).clamp(MIN_STEP_SCALE, MAX_STEP_SCALE)
}

/// Integrate `dy/dt = f(t, y)` from `t0` to `tf`.
///
/// Arguments
/// -----------------
/// * `f`: Right-hand side, `f(t, y) -> Result<dy/dt, DuoSatError>`.
/// * `t0`, `tf`: Time span, `tf ≥ t0`.
/// * `y0`: Initial state (finite components).
/// * `params`: Tolerances, step bounds, step budget and optional output grid.
///
/// Return
/// ----------
/// * `Ok(Integration)` whose trajectory starts at `(t0, y0)` and ends at `tf` exactly. With
///   `t0 == tf` it holds a single sample and no step is attempted.
/// * `Err(DuoSatError::InvalidConfiguration)` before any work for invalid inputs.
/// * `Err(DuoSatError::StepSizeUnderflow)` / `TimeResolutionExceeded` / `StepBudgetExceeded` /
///   `NonFiniteState`, or the error raised by `f`, when the integration cannot complete.
///   A truncated trajectory is never returned as a success.
///
/// See also
/// ------------
/// * [`integrate_with_monitor`] – Same, reporting every attempted step.
/// * [`RKF45Params`] – Controller configuration and defaults.
pub fn integrate<F, const N: usize>(
    f: F,
    t0: f64,
    tf: f64,
    y0: &SVector<f64, N>,
    params: &RKF45Params,
) -> Result<Integration<N>, DuoSatError>
where
    F: FnMut(f64, &SVector<f64, N>) -> Result<SVector<f64, N>, DuoSatError>,
{
    integrate_with_monitor(f, t0, tf, y0, params, |_| {})
}

/// Integrate like [`integrate`], calling `monitor` after every attempted step.
pub fn integrate_with_monitor<F, M, const N: usize>(
    mut f: F,
    t0: f64,
    tf: f64,
    y0: &SVector<f64, N>,
    params: &RKF45Params,
    mut monitor: M,
) -> Result<Integration<N>, DuoSatError>
where
    F: FnMut(f64, &SVector<f64, N>) -> Result<SVector<f64, N>, DuoSatError>,
    M: FnMut(&StepReport),
{
    validate_inputs(t0, tf, y0, params)?;

    match run_stepper(&mut f, t0, tf, y0, params, &mut monitor) {
        Ok(integration) => {
            info!(
                "RKF45 reached t = {} with {} samples ({})",
                integration.trajectory.end_time(),
                integration.trajectory.len(),
                integration.stats
            );
            Ok(integration)
        }
        Err(err) => {
            warn!("RKF45 integration failed: {err}");
            Err(err)
        }
    }
}

fn validate_inputs<const N: usize>(
    t0: f64,
    tf: f64,
    y0: &SVector<f64, N>,
    params: &RKF45Params,
) -> Result<(), DuoSatError> {
    params.validate()?;
    if !t0.is_finite() || !tf.is_finite() {
        return Err(DuoSatError::InvalidConfiguration(format!(
            "t0 and tf must be finite, got {t0} and {tf}"
        )));
    }
    if tf < t0 {
        return Err(DuoSatError::InvalidConfiguration(format!(
            "tf ({tf}) must not precede t0 ({t0})"
        )));
    }
    if let Some(i) = y0.iter().position(|v| !v.is_finite()) {
        return Err(DuoSatError::InvalidConfiguration(format!(
            "initial state component {i} is not finite"
        )));
    }
    Ok(())
}

fn run_stepper<F, M, const N: usize>(
    f: &mut F,
    t0: f64,
    tf: f64,
    y0: &SVector<f64, N>,
    params: &RKF45Params,
    monitor: &mut M,
) -> Result<Integration<N>, DuoSatError>
where
    F: FnMut(f64, &SVector<f64, N>) -> Result<SVector<f64, N>, DuoSatError>,
    M: FnMut(&StepReport),
{
    let mut stats = IntegrationStats::new();

    let mut t = t0;
    let mut y = *y0;
    let mut dydt = checked_rates(f, t0, y0)?;
    stats.rhs_evaluations += 1;

    let mut trajectory = Trajectory::new(Sample::new(t0, y, dydt));
    if tf == t0 {
        return Ok(Integration { trajectory, stats });
    }

    let mut h = params.first_step(tf - t0);

    loop {
        if stats.attempted_steps() >= params.max_steps {
            return Err(DuoSatError::StepBudgetExceeded {
                max_steps: params.max_steps,
                t,
                partial: trajectory.to_partial_samples(),
            });
        }

        let remaining = tf - t;
        let last = h >= remaining || remaining - h < params.min_step;
        let h_try = if last { remaining } else { h };

        let attempt = try_step(f, t, &y, &dydt, h_try, params)?;
        stats.rhs_evaluations += STAGES - 1;
        if attempt.error.is_nan() {
            return Err(DuoSatError::NonFiniteState { t });
        }
        let scale = step_scale(attempt.error);

        if attempt.error <= 1.0 {
            let t_new = if last { tf } else { t + h_try };
            if t_new <= t {
                return Err(DuoSatError::TimeResolutionExceeded {
                    t,
                    state: DVector::from_column_slice(y.as_slice()),
                    step: h_try,
                });
            }

            let dydt_new = checked_rates(f, t_new, &attempt.y5)?;
            stats.rhs_evaluations += 1;
            stats.accepted_steps += 1;
            stats.max_accepted_error = stats.max_accepted_error.max(attempt.error);
            stats.smallest_step = stats.smallest_step.min(h_try);
            stats.largest_step = stats.largest_step.max(h_try);

            h = (h_try * scale).clamp(params.min_step, params.max_step);
            let report = StepReport {
                t,
                step: h_try,
                error: attempt.error,
                next_step: h,
                outcome: StepOutcome::Accepted,
            };
            trace!(
                "t = {t:.6}, h = {h_try:.6e}, err = {:.3e}: {}",
                report.error,
                report.outcome
            );
            monitor(&report);

            t = t_new;
            y = attempt.y5;
            dydt = dydt_new;
            trajectory.push(Sample::new(t, y, dydt));

            if last {
                break;
            }
        } else {
            stats.rejected_steps += 1;
            if h_try <= params.min_step {
                return Err(underflow(t, &y, h_try, attempt.error, params));
            }

            h = (h_try * scale).clamp(params.min_step, params.max_step);
            let report = StepReport {
                t,
                step: h_try,
                error: attempt.error,
                next_step: h,
                outcome: StepOutcome::Rejected,
            };
            debug!(
                "t = {t:.6}, h = {h_try:.6e}, err = {:.3e}: {}, retrying with h = {h:.6e}",
                report.error, report.outcome
            );
            monitor(&report);
        }
    }

    let trajectory = match params.output_step {
        Some(dt) => trajectory.resample(dt)?,
        None => trajectory,
    };

    Ok(Integration { trajectory, stats })
}

fn underflow<const N: usize>(
    t: f64,
    y: &SVector<f64, N>,
    step: f64,
    error: f64,
    params: &RKF45Params,
) -> DuoSatError {
    DuoSatError::StepSizeUnderflow {
        t,
        state: DVector::from_column_slice(y.as_slice()),
        step,
        min_step: params.min_step,
        max_step: params.max_step,
        error,
        relative_tolerance: params.relative_tolerance,
        absolute_tolerance: params.absolute_tolerance,
    }
}

//! # Adaptive Runge–Kutta–Fehlberg 4(5) integration
//!
//! This module defines the [`RKF45Params`] configuration struct and its builder, which control
//! how the embedded RKF45 stepper in [`rkf45`](crate::integrator::rkf45) chooses its step sizes
//! and when it gives up.
//!
//! ## Pipeline overview
//!
//! 1. **Stage evaluation**
//!    Six evaluations of the right-hand side at the Fehlberg nodes `0, 1/4, 3/8, 12/13, 1, 1/2`
//!    ([`tableau`](crate::integrator::tableau)).
//!
//! 2. **Embedded estimates**
//!    A 5th-order and a 4th-order solution are formed from the same stages; their difference is
//!    the local truncation error estimate.
//!
//! 3. **Error norm**
//!    The difference is measured with the mixed absolute/relative infinity norm of
//!    [`norm::scaled_error_norm`](crate::integrator::norm::scaled_error_norm):
//!
//!    ```text
//!    err = max_i |y5_i − y4_i| / (atol + rtol · max(|y_i|, |y5_i|))
//!    ```
//!
//!    so that km-scale positions and km/s-scale velocities are each held to the same relative
//!    accuracy. A step is accepted iff `err ≤ 1`.
//!
//! 4. **Step control**
//!    The next trial step is `h · clamp(0.84 · err^(-1/5), 0.1, 4.0)`, bounded by
//!    `min_step`, `max_step`, and the remaining span.
//!
//! ## Defaults
//!
//! | Parameter | Default |
//! |---|---|
//! | `relative_tolerance` | `1e-8` |
//! | `absolute_tolerance` | `1e-8` |
//! | `initial_step` | `1e-3 · (tf − t0)` |
//! | `min_step` | `1e-9` |
//! | `max_step` | `∞` |
//! | `max_steps` | `1_000_000` attempted steps |
//! | `output_step` | none (raw adaptive samples) |
//!
//! ## Example
//!
//! ```rust,no_run
//! use duosat::integrator::RKF45Params;
//!
//! let params = RKF45Params::builder()
//!     .tolerance(1e-10)
//!     .max_step(500.0)
//!     .output_step(60.0)
//!     .build()
//!     .unwrap();
//! ```
//!
//! ## See also
//!
//! * [`rkf45::integrate`](crate::integrator::rkf45::integrate) – main integration entry point.
//! * [`crate::trajectory::Trajectory`] – result type.
use log::debug;
use std::fmt;

use crate::{
    constants::{
        DEFAULT_ABSOLUTE_TOLERANCE, DEFAULT_INITIAL_STEP_FRACTION, DEFAULT_MAX_STEP,
        DEFAULT_MAX_STEPS, DEFAULT_MIN_STEP, DEFAULT_RELATIVE_TOLERANCE,
    },
    duosat_errors::DuoSatError,
};

pub mod norm;
pub mod rkf45;
pub mod tableau;

/// Configuration of the adaptive RKF45 stepper.
///
/// Fields
/// -----------------
/// * `relative_tolerance` – relative part of the per-component error scale.
/// * `absolute_tolerance` – absolute part of the per-component error scale, in the units of
///   each component. Must be positive so that components crossing zero stay controlled.
/// * `initial_step` – first trial step; when `None`, a fraction
///   ([`DEFAULT_INITIAL_STEP_FRACTION`]) of the span is used.
/// * `min_step` – floor of the step size. A rejected step at this floor is fatal
///   ([`DuoSatError::StepSizeUnderflow`]). The final step landing on `tf` may be shorter.
/// * `max_step` – ceiling of the step size.
/// * `max_steps` – ceiling on attempted (accepted + rejected) steps
///   ([`DuoSatError::StepBudgetExceeded`]).
/// * `output_step` – when set, the trajectory returned by
///   [`integrate`](crate::integrator::rkf45::integrate) is resampled on the uniform grid
///   `t0, t0 + output_step, …, tf`.
#[derive(Debug, Clone, PartialEq)]
pub struct RKF45Params {
    pub relative_tolerance: f64,
    pub absolute_tolerance: f64,
    pub initial_step: Option<f64>,
    pub min_step: f64,
    pub max_step: f64,
    pub max_steps: usize,
    pub output_step: Option<f64>,
}

impl RKF45Params {
    /// Create a new [`RKF45Params`] with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new [`RKF45ParamsBuilder`] to configure custom parameters.
    pub fn builder() -> RKF45ParamsBuilder {
        RKF45ParamsBuilder::new()
    }

    /// Check every validation rule listed in [`RKF45ParamsBuilder::build`].
    pub fn validate(&self) -> Result<(), DuoSatError> {
        let positive = |x: f64| x.is_finite() && x > 0.0;

        if !positive(self.relative_tolerance) && self.relative_tolerance != 0.0 {
            return Err(DuoSatError::InvalidConfiguration(format!(
                "relative_tolerance must be non-negative and finite, got {}",
                self.relative_tolerance
            )));
        }
        if !positive(self.absolute_tolerance) {
            return Err(DuoSatError::InvalidConfiguration(format!(
                "absolute_tolerance must be positive and finite, got {}",
                self.absolute_tolerance
            )));
        }
        if !positive(self.min_step) {
            return Err(DuoSatError::InvalidConfiguration(format!(
                "min_step must be positive and finite, got {}",
                self.min_step
            )));
        }
        if self.max_step.is_nan() || self.max_step <= 0.0 {
            return Err(DuoSatError::InvalidConfiguration(format!(
                "max_step must be positive, got {}",
                self.max_step
            )));
        }
        if self.min_step > self.max_step {
            return Err(DuoSatError::InvalidConfiguration(format!(
                "min_step ({}) must not exceed max_step ({})",
                self.min_step, self.max_step
            )));
        }
        if let Some(h0) = self.initial_step {
            if !positive(h0) {
                return Err(DuoSatError::InvalidConfiguration(format!(
                    "initial_step must be positive and finite, got {h0}"
                )));
            }
        }
        if self.max_steps == 0 {
            return Err(DuoSatError::InvalidConfiguration(
                "max_steps must be at least 1".into(),
            ));
        }
        if let Some(dt) = self.output_step {
            if !positive(dt) {
                return Err(DuoSatError::InvalidConfiguration(format!(
                    "output_step must be positive and finite, got {dt}"
                )));
            }
        }
        Ok(())
    }

    /// First trial step for a span `tf - t0`, clamped into `[min_step, max_step]`.
    pub fn first_step(&self, span: f64) -> f64 {
        self.initial_step
            .unwrap_or(span * DEFAULT_INITIAL_STEP_FRACTION)
            .clamp(self.min_step, self.max_step)
    }
}

impl Default for RKF45Params {
    fn default() -> Self {
        RKF45Params {
            relative_tolerance: DEFAULT_RELATIVE_TOLERANCE,
            absolute_tolerance: DEFAULT_ABSOLUTE_TOLERANCE,
            initial_step: None,
            min_step: DEFAULT_MIN_STEP,
            max_step: DEFAULT_MAX_STEP,
            max_steps: DEFAULT_MAX_STEPS,
            output_step: None,
        }
    }
}

/// Builder for [`RKF45Params`], with validation.
#[derive(Debug, Clone)]
pub struct RKF45ParamsBuilder {
    params: RKF45Params,
}

impl Default for RKF45ParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RKF45ParamsBuilder {
    /// Start from default parameters.
    pub fn new() -> Self {
        Self {
            params: RKF45Params::default(),
        }
    }

    /// Set both the relative and the absolute tolerance to `v`.
    pub fn tolerance(mut self, v: f64) -> Self {
        self.params.relative_tolerance = v;
        self.params.absolute_tolerance = v;
        self
    }
    pub fn relative_tolerance(mut self, v: f64) -> Self {
        self.params.relative_tolerance = v;
        self
    }
    pub fn absolute_tolerance(mut self, v: f64) -> Self {
        self.params.absolute_tolerance = v;
        self
    }

    // --- Step bounds ---
    pub fn initial_step(mut self, v: f64) -> Self {
        self.params.initial_step = Some(v);
        self
    }
    pub fn min_step(mut self, v: f64) -> Self {
        self.params.min_step = v;
        self
    }
    pub fn max_step(mut self, v: f64) -> Self {
        self.params.max_step = v;
        self
    }
    pub fn max_steps(mut self, v: usize) -> Self {
        self.params.max_steps = v;
        self
    }

    // --- Output ---
    pub fn output_step(mut self, v: f64) -> Self {
        self.params.output_step = Some(v);
        self
    }

    /// Finalize the builder and produce an [`RKF45Params`] instance.
    ///
    /// Validation rules
    /// -----------------
    /// * `relative_tolerance ≥ 0`, `absolute_tolerance > 0`, both finite.
    /// * `0 < min_step ≤ max_step` (`max_step` may be `+∞`).
    /// * `initial_step > 0` when given.
    /// * `max_steps ≥ 1`.
    /// * `output_step > 0` when given.
    ///
    /// Returns
    /// -----------------
    /// * `Ok(RKF45Params)` if all values are valid.
    /// * `Err(DuoSatError::InvalidConfiguration)` naming the first rule that failed.
    pub fn build(self) -> Result<RKF45Params, DuoSatError> {
        self.params.validate()?;
        debug!("RKF45 parameters: {}", self.params);
        Ok(self.params)
    }
}

impl fmt::Display for RKF45Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "RKF45 parameters")?;
            writeln!(f, "----------------")?;
            writeln!(f, "relative_tolerance : {:e}", self.relative_tolerance)?;
            writeln!(f, "absolute_tolerance : {:e}", self.absolute_tolerance)?;
            match self.initial_step {
                Some(h0) => writeln!(f, "initial_step       : {h0:e}")?,
                None => writeln!(f, "initial_step       : auto")?,
            }
            writeln!(f, "min_step           : {:e}", self.min_step)?;
            writeln!(f, "max_step           : {:e}", self.max_step)?;
            writeln!(f, "max_steps          : {}", self.max_steps)?;
            match self.output_step {
                Some(dt) => write!(f, "output_step        : {dt:e}"),
                None => write!(f, "output_step        : adaptive"),
            }
        } else {
            write!(
                f,
                "rtol={:e}, atol={:e}, h0={:?}, min_step={:e}, max_step={:e}, \
                 max_steps={}, output_step={:?}",
                self.relative_tolerance,
                self.absolute_tolerance,
                self.initial_step,
                self.min_step,
                self.max_step,
                self.max_steps,
                self.output_step
            )
        }
    }
}

#[cfg(test)]
mod rkf45_params_test {
    use super::*;

    #[test]
    fn test_defaults() {
        let p = RKF45Params::builder().build().unwrap();
        assert_eq!(p, RKF45Params::default());
        assert_eq!(p.relative_tolerance, 1e-8);
        assert_eq!(p.min_step, 1e-9);
        assert_eq!(p.max_steps, 1_000_000);
        assert_eq!(p.first_step(100000.0), 100.0);
    }

    #[test]
    fn test_tolerance_sets_both() {
        let p = RKF45Params::builder().tolerance(1e-11).build().unwrap();
        assert_eq!(p.relative_tolerance, 1e-11);
        assert_eq!(p.absolute_tolerance, 1e-11);
    }

    #[test]
    fn test_first_step_is_clamped() {
        let p = RKF45Params::builder()
            .min_step(1.0)
            .max_step(10.0)
            .build()
            .unwrap();
        assert_eq!(p.first_step(1e6), 10.0);
        assert_eq!(p.first_step(10.0), 1.0);

        let p = RKF45Params::builder().initial_step(0.5).build().unwrap();
        assert_eq!(p.first_step(1e6), 0.5);
    }

    #[test]
    fn test_invalid_parameters() {
        let invalid = [
            RKF45Params::builder().tolerance(0.0),
            RKF45Params::builder().tolerance(-1e-8),
            RKF45Params::builder().relative_tolerance(f64::NAN),
            RKF45Params::builder().min_step(2.0).max_step(1.0),
            RKF45Params::builder().min_step(0.0),
            RKF45Params::builder().initial_step(-1.0),
            RKF45Params::builder().max_steps(0),
            RKF45Params::builder().output_step(0.0),
        ];
        for builder in invalid {
            assert!(matches!(
                builder.build(),
                Err(DuoSatError::InvalidConfiguration(_))
            ));
        }

        // A pure absolute tolerance is allowed
        assert!(RKF45Params::builder()
            .relative_tolerance(0.0)
            .absolute_tolerance(1e-6)
            .build()
            .is_ok());
    }

    #[test]
    fn test_compact_display() {
        let p = RKF45Params::builder().output_step(100.0).build().unwrap();
        assert_eq!(
            p.to_string(),
            "rtol=1e-8, atol=1e-8, h0=None, min_step=1e-9, max_step=inf, \
             max_steps=1000000, output_step=Some(100.0)"
        );
    }
}

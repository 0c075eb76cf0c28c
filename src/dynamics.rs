//! # Restricted three-body dynamics
//!
//! This module defines the **right-hand side** of the two-satellite problem: two small bodies
//! orbiting a dominant central mass fixed at the origin, each attracting the other.
//!
//! ## Equations of motion
//!
//! With `μ₁ = G(M + m₁)`, `μ₂ = G(M + m₂)`, `r₁ = |p₁|`, `r₂ = |p₂|`, `d = p₂ − p₁`, `s = |d|`:
//!
//! ```text
//! a₁ = −μ₁ p₁ / r₁³ + G m₂ d / s³
//! a₂ = −μ₂ p₂ / r₂³ − G m₁ d / s³
//! ```
//!
//! and the derivative vector is `[v₁, v₂, a₁, a₂]` (see [`crate::state`]).
//!
//! ## Singularities
//!
//! The model is undefined when any of `r₁`, `r₂`, `s` is zero. [`ThreeBodyDynamics::rates`]
//! reports this as [`DuoSatError::SingularConfiguration`] carrying the offending time and
//! state, and the stepper aborts the integration.
//!
//! ## Configuration
//!
//! Masses and the gravitational constant live in [`PhysicalParams`], built and validated
//! through [`PhysicalParams::builder`]. The parameters are immutable once built and are passed
//! explicitly, so several simulations can share or vary them freely.
use log::debug;
use nalgebra::{DVector, Vector3};
use std::fmt;

use crate::{
    constants::{Kilogram, GRAVITATIONAL_CONSTANT},
    duosat_errors::DuoSatError,
    state::{SatelliteState, StateVector},
};

/// Physical constants of one run: gravitational constant and the three masses.
///
/// Units
/// -----
/// * `gravitational_constant`: km³/(kg·s²)
/// * masses: kg
///
/// A body mass of zero is allowed and turns that body into a test particle: it feels the
/// other masses but exerts no force itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicalParams {
    pub gravitational_constant: f64,
    pub central_mass: Kilogram,
    pub body1_mass: Kilogram,
    pub body2_mass: Kilogram,
}

impl PhysicalParams {
    /// Create a new [`PhysicalParamsBuilder`] starting from the default `G` and zero masses.
    pub fn builder() -> PhysicalParamsBuilder {
        PhysicalParamsBuilder::new()
    }

    /// Check the invariants enforced by [`PhysicalParamsBuilder::build`].
    ///
    /// Return
    /// ----------
    /// * `Ok(())` when `G > 0`, `M > 0`, `m₁ ≥ 0`, `m₂ ≥ 0`, all finite.
    /// * `Err(DuoSatError::InvalidConfiguration)` otherwise.
    pub fn validate(&self) -> Result<(), DuoSatError> {
        let positive = |x: f64| x.is_finite() && x > 0.0;
        let non_negative = |x: f64| x.is_finite() && x >= 0.0;

        if !positive(self.gravitational_constant) {
            return Err(DuoSatError::InvalidConfiguration(format!(
                "gravitational_constant must be positive and finite, got {}",
                self.gravitational_constant
            )));
        }
        if !positive(self.central_mass) {
            return Err(DuoSatError::InvalidConfiguration(format!(
                "central_mass must be positive and finite, got {}",
                self.central_mass
            )));
        }
        if !non_negative(self.body1_mass) || !non_negative(self.body2_mass) {
            return Err(DuoSatError::InvalidConfiguration(format!(
                "body masses must be non-negative and finite, got {} and {}",
                self.body1_mass, self.body2_mass
            )));
        }
        Ok(())
    }

    /// Gravitational parameter `G(M + m₁)` of body 1 about the central mass (km³/s²).
    pub fn body1_mu(&self) -> f64 {
        self.gravitational_constant * (self.central_mass + self.body1_mass)
    }

    /// Gravitational parameter `G(M + m₂)` of body 2 about the central mass (km³/s²).
    pub fn body2_mu(&self) -> f64 {
        self.gravitational_constant * (self.central_mass + self.body2_mass)
    }
}

impl fmt::Display for PhysicalParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "G = {:e} km³/(kg·s²), M = {:e} kg, m1 = {:e} kg, m2 = {:e} kg",
            self.gravitational_constant, self.central_mass, self.body1_mass, self.body2_mass
        )
    }
}

/// Builder for [`PhysicalParams`], with validation.
#[derive(Debug, Clone)]
pub struct PhysicalParamsBuilder {
    params: PhysicalParams,
}

impl Default for PhysicalParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicalParamsBuilder {
    pub fn new() -> Self {
        Self {
            params: PhysicalParams {
                gravitational_constant: GRAVITATIONAL_CONSTANT,
                central_mass: 0.0,
                body1_mass: 0.0,
                body2_mass: 0.0,
            },
        }
    }

    pub fn gravitational_constant(mut self, v: f64) -> Self {
        self.params.gravitational_constant = v;
        self
    }
    pub fn central_mass(mut self, v: Kilogram) -> Self {
        self.params.central_mass = v;
        self
    }
    pub fn body1_mass(mut self, v: Kilogram) -> Self {
        self.params.body1_mass = v;
        self
    }
    pub fn body2_mass(mut self, v: Kilogram) -> Self {
        self.params.body2_mass = v;
        self
    }

    /// Finalize the builder.
    ///
    /// Return
    /// ----------
    /// * `Ok(PhysicalParams)` if [`PhysicalParams::validate`] passes.
    /// * `Err(DuoSatError::InvalidConfiguration)` describing the first violated rule.
    pub fn build(self) -> Result<PhysicalParams, DuoSatError> {
        self.params.validate()?;
        debug!("physical parameters: {}", self.params);
        Ok(self.params)
    }
}

/// The 12-dimensional right-hand side of the two-satellite problem.
///
/// This is a pure function object: evaluating [`ThreeBodyDynamics::rates`] has no side
/// effects and depends only on the time, the state, and the immutable [`PhysicalParams`].
/// It is `Copy` and safe to share across threads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThreeBodyDynamics {
    params: PhysicalParams,
}

impl ThreeBodyDynamics {
    pub fn new(params: PhysicalParams) -> Self {
        ThreeBodyDynamics { params }
    }

    pub fn params(&self) -> &PhysicalParams {
        &self.params
    }

    /// Evaluate `dy/dt = f(t, y)`.
    ///
    /// Arguments
    /// -----------------
    /// * `t`: Time (s). The system is autonomous; `t` is only reported in errors.
    /// * `y`: State vector `[pos1, pos2, vel1, vel2]`.
    ///
    /// Return
    /// ----------
    /// * `Ok([vel1, vel2, accel1, accel2])`.
    /// * `Err(DuoSatError::SingularConfiguration)` if a body sits on the central mass or the
    ///   two bodies coincide.
    ///
    /// See also
    /// ------------
    /// * [`crate::integrator::rkf45::integrate`] – Consumer of this right-hand side.
    pub fn rates(&self, t: f64, y: &StateVector) -> Result<StateVector, DuoSatError> {
        let state = SatelliteState::from_vector(y);
        let g = self.params.gravitational_constant;

        let r1 = state.body1_position.norm();
        let r2 = state.body2_position.norm();
        let sep = state.separation();
        let s = sep.norm();

        if r1 == 0.0 || r2 == 0.0 || s == 0.0 {
            return Err(DuoSatError::SingularConfiguration {
                t,
                state: DVector::from_column_slice(y.as_slice()),
            });
        }

        let mutual = sep / s.powi(3);
        let accel1 = -self.params.body1_mu() * state.body1_position / r1.powi(3)
            + g * self.params.body2_mass * mutual;
        let accel2 = -self.params.body2_mu() * state.body2_position / r2.powi(3)
            - g * self.params.body1_mass * mutual;

        Ok(SatelliteState::derivative(
            &state.body1_velocity,
            &state.body2_velocity,
            &accel1,
            &accel2,
        ))
    }

    /// Specific two-body orbital energy `v²/2 − μ₁/r` of body 1 about the central mass.
    ///
    /// Conserved exactly when `m₂ = 0`.
    pub fn body1_energy(&self, state: &SatelliteState) -> f64 {
        specific_energy(
            &state.body1_position,
            &state.body1_velocity,
            self.params.body1_mu(),
        )
    }

    /// Specific two-body orbital energy `v²/2 − μ₂/r` of body 2 about the central mass.
    pub fn body2_energy(&self, state: &SatelliteState) -> f64 {
        specific_energy(
            &state.body2_position,
            &state.body2_velocity,
            self.params.body2_mu(),
        )
    }

    /// Total mechanical energy of the two orbiting bodies (kg·km²/s²), including their
    /// mutual potential, with the central mass held fixed at the origin.
    ///
    /// Conserved when the central body is much heavier than both satellites, up to the
    /// `m·M/(M+m)` reduced-mass corrections of the heliocentric frame.
    pub fn total_energy(&self, state: &SatelliteState) -> f64 {
        let g = self.params.gravitational_constant;
        let m1 = self.params.body1_mass;
        let m2 = self.params.body2_mass;
        let m = self.params.central_mass;

        let kinetic = 0.5 * m1 * state.body1_velocity.norm_squared()
            + 0.5 * m2 * state.body2_velocity.norm_squared();
        let potential = -g * m * m1 / state.body1_position.norm()
            - g * m * m2 / state.body2_position.norm()
            - g * m1 * m2 / state.separation().norm();
        kinetic + potential
    }
}

/// Specific angular momentum `r × v` (km²/s).
pub fn angular_momentum(position: &Vector3<f64>, velocity: &Vector3<f64>) -> Vector3<f64> {
    position.cross(velocity)
}

/// Specific orbital energy `v²/2 − μ/|r|` (km²/s²).
pub fn specific_energy(position: &Vector3<f64>, velocity: &Vector3<f64>, mu: f64) -> f64 {
    0.5 * velocity.norm_squared() - mu / position.norm()
}

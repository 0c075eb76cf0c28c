//! # Simulation: dynamics, initial conditions, and integrator settings
//!
//! [`Simulation`] is the driver-level façade that ties together:
//!
//! 1. **Physical model** ([`ThreeBodyDynamics`]) built from validated [`PhysicalParams`].
//! 2. **Initial conditions**: a [`SatelliteState`] at `t0`.
//! 3. **Time span** `[t0, tf]`.
//! 4. **Integrator settings** ([`RKF45Params`]).
//!
//! Every part is checked once, in [`Simulation::new`], so [`Simulation::run`] only fails for
//! reasons that appear during the integration itself.
//!
//! ## Typical usage
//!
//! ```rust,no_run
//! use duosat::dynamics::PhysicalParams;
//! use duosat::integrator::RKF45Params;
//! use duosat::simulation::Simulation;
//! use duosat::state::SatelliteState;
//! use nalgebra::Vector3;
//!
//! let physical = PhysicalParams::builder()
//!     .central_mass(1e29)
//!     .body1_mass(2e27)
//!     .body2_mass(1e26)
//!     .build()
//!     .unwrap();
//! let initial = SatelliteState::new(
//!     Vector3::new(500_000.0, 0.0, 0.0),
//!     Vector3::new(0.0, 45.0, 5.0),
//!     Vector3::new(600_000.0, 0.0, 0.0),
//!     Vector3::new(0.0, 72.0, 10.0),
//! );
//! let sim = Simulation::new(physical, initial, 0.0, 100_000.0, RKF45Params::default()).unwrap();
//! let result = sim.run().unwrap();
//! println!("{}", result.stats);
//! ```
//!
//! ## See also
//! ------------
//! * [`crate::config::SimulationConfig`] – YAML description of a simulation.
//! * [`crate::sweep`] – Running many simulations in one batch.
use log::debug;
use std::fmt;

use crate::{
    constants::{Second, STATE_DIM},
    duosat_errors::DuoSatError,
    dynamics::{PhysicalParams, ThreeBodyDynamics},
    integrator::{
        rkf45::{integrate_with_monitor, Integration, StepReport},
        RKF45Params,
    },
    keplerian_element::KeplerianElements,
    state::SatelliteState,
};

/// A fully specified two-satellite integration problem.
#[derive(Debug, Clone, PartialEq)]
pub struct Simulation {
    dynamics: ThreeBodyDynamics,
    initial_state: SatelliteState,
    t0: Second,
    tf: Second,
    params: RKF45Params,
}

impl Simulation {
    /// Validate and assemble a simulation.
    ///
    /// Arguments
    /// -----------------
    /// * `physical`: Masses and gravitational constant.
    /// * `initial_state`: Positions (km) and velocities (km/s) of both bodies at `t0`.
    /// * `t0`, `tf`: Integration span in seconds, `tf ≥ t0`.
    /// * `params`: Integrator settings.
    ///
    /// Return
    /// ----------
    /// * `Err(DuoSatError::InvalidConfiguration)` if any part is invalid. Coincident bodies
    ///   are not rejected here; they surface as `SingularConfiguration` when the simulation runs.
    pub fn new(
        physical: PhysicalParams,
        initial_state: SatelliteState,
        t0: Second,
        tf: Second,
        params: RKF45Params,
    ) -> Result<Self, DuoSatError> {
        physical.validate()?;
        params.validate()?;
        if !initial_state.is_finite() {
            return Err(DuoSatError::InvalidConfiguration(
                "initial positions and velocities must be finite".into(),
            ));
        }
        if !t0.is_finite() || !tf.is_finite() || tf < t0 {
            return Err(DuoSatError::InvalidConfiguration(format!(
                "invalid time span [{t0}, {tf}]"
            )));
        }

        Ok(Simulation {
            dynamics: ThreeBodyDynamics::new(physical),
            initial_state,
            t0,
            tf,
            params,
        })
    }

    pub fn dynamics(&self) -> &ThreeBodyDynamics {
        &self.dynamics
    }

    pub fn initial_state(&self) -> &SatelliteState {
        &self.initial_state
    }

    pub fn span(&self) -> (Second, Second) {
        (self.t0, self.tf)
    }

    pub fn params(&self) -> &RKF45Params {
        &self.params
    }

    /// Copy of this simulation with different integrator settings.
    pub fn with_params(&self, params: RKF45Params) -> Result<Self, DuoSatError> {
        params.validate()?;
        Ok(Simulation {
            params,
            ..self.clone()
        })
    }

    /// Integrate from `t0` to `tf`.
    ///
    /// See also
    /// ------------
    /// * [`crate::integrator::rkf45::integrate`] – Contract and failure modes.
    pub fn run(&self) -> Result<Integration<STATE_DIM>, DuoSatError> {
        self.run_with_monitor(|_| {})
    }

    /// Integrate from `t0` to `tf`, reporting every attempted step to `monitor`.
    pub fn run_with_monitor<M>(&self, monitor: M) -> Result<Integration<STATE_DIM>, DuoSatError>
    where
        M: FnMut(&StepReport),
    {
        debug!(
            "Running simulation over [{}, {}] with {}",
            self.t0, self.tf, self.params
        );
        let dynamics = self.dynamics;
        integrate_with_monitor(
            move |t, y| dynamics.rates(t, y),
            self.t0,
            self.tf,
            &self.initial_state.to_vector(),
            &self.params,
            monitor,
        )
    }

    /// Osculating elements of both bodies about the central mass at epoch `t`.
    ///
    /// Each body uses its own two-body parameter `G(M + m_i)`; the perturbation by the other
    /// body is ignored.
    pub fn osculating_elements(
        &self,
        t: Second,
        state: &SatelliteState,
    ) -> Result<(KeplerianElements, KeplerianElements), DuoSatError> {
        let params = self.dynamics.params();
        let body1 = KeplerianElements::from_state(
            &state.body1_position,
            &state.body1_velocity,
            params.body1_mu(),
            t,
        )?;
        let body2 = KeplerianElements::from_state(
            &state.body2_position,
            &state.body2_velocity,
            params.body2_mu(),
            t,
        )?;
        Ok((body1, body2))
    }
}

impl fmt::Display for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Simulation over [{} s, {} s]", self.t0, self.tf)?;
        writeln!(f, "{}", self.dynamics.params())?;
        writeln!(f, "{}", self.initial_state)?;
        write!(f, "{}", self.params)
    }
}

#[cfg(test)]
mod simulation_test {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn physical() -> PhysicalParams {
        PhysicalParams::builder()
            .central_mass(1e29)
            .body1_mass(2e27)
            .body2_mass(1e26)
            .build()
            .unwrap()
    }

    fn initial() -> SatelliteState {
        SatelliteState::new(
            Vector3::new(500_000.0, 0.0, 0.0),
            Vector3::new(0.0, 45.0, 5.0),
            Vector3::new(600_000.0, 0.0, 0.0),
            Vector3::new(0.0, 72.0, 10.0),
        )
    }

    #[test]
    fn test_new_rejects_invalid_span() {
        let res = Simulation::new(physical(), initial(), 10.0, 0.0, RKF45Params::default());
        assert!(matches!(res, Err(DuoSatError::InvalidConfiguration(_))));

        let mut state = initial();
        state.body2_velocity.x = f64::NAN;
        let res = Simulation::new(physical(), state, 0.0, 1.0, RKF45Params::default());
        assert!(matches!(res, Err(DuoSatError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_short_run_lands_on_tf() {
        let sim =
            Simulation::new(physical(), initial(), 0.0, 100.0, RKF45Params::default()).unwrap();
        let res = sim.run().unwrap();

        assert_eq!(res.trajectory.start_time(), 0.0);
        assert_eq!(res.trajectory.end_time(), 100.0);
        assert_eq!(res.trajectory.first().state, initial().to_vector());
    }

    #[test]
    fn test_singular_initial_state() {
        let mut state = initial();
        state.body1_position = Vector3::zeros();
        let sim = Simulation::new(physical(), state, 0.0, 100.0, RKF45Params::default()).unwrap();
        assert!(matches!(
            sim.run(),
            Err(DuoSatError::SingularConfiguration { t, .. }) if t == 0.0
        ));
    }

    #[test]
    fn test_osculating_elements_of_initial_state() {
        let sim = Simulation::new(physical(), initial(), 0.0, 1.0, RKF45Params::default()).unwrap();
        let (el1, el2) = sim.osculating_elements(0.0, sim.initial_state()).unwrap();

        // Both bodies start below circular speed, at apoapsis on the x axis
        assert_relative_eq!(el1.apoapsis_distance(), 500_000.0, max_relative = 1e-9);
        assert_relative_eq!(el2.apoapsis_distance(), 600_000.0, max_relative = 1e-9);
        assert!(el1.eccentricity < 1.0);
        assert!(el2.eccentricity < 1.0);
    }

    #[test]
    fn test_with_params() {
        let sim = Simulation::new(physical(), initial(), 0.0, 1.0, RKF45Params::default()).unwrap();
        let tight = RKF45Params::builder().tolerance(1e-11).build().unwrap();
        let other = sim.with_params(tight).unwrap();
        assert_eq!(other.params().relative_tolerance, 1e-11);
        assert_eq!(other.span(), sim.span());
    }
}

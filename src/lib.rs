//! # duosat
//!
//! Two satellites of non-negligible mass orbiting a central body, integrated with an adaptive
//! Runge–Kutta–Fehlberg 4(5) scheme.
//!
//! ## Overview
//!
//! * [`dynamics`] – equations of motion of both bodies relative to the central mass,
//!   including their mutual attraction, and energy diagnostics.
//! * [`integrator`] – the RKF45 stepper, generic over the state dimension, with its
//!   configuration ([`integrator::RKF45Params`]).
//! * [`trajectory`] – accepted samples with Hermite dense output, resampling and a
//!   13-column CSV table.
//! * [`simulation`] / [`config`] – a complete problem, built in code or read from YAML.
//! * [`sweep`] – batches of independent simulations.
//!
//! Units are km, km/s, kg and s throughout.
//!
//! ## Example
//!
//! ```rust,no_run
//! use duosat::config::SimulationConfig;
//! use camino::Utf8Path;
//!
//! let sim = SimulationConfig::from_path(Utf8Path::new("demos/two_satellites.yaml"))
//!     .and_then(|c| c.build())
//!     .unwrap();
//! let result = sim.run().unwrap();
//! println!("{:#}", result.stats);
//! ```
pub mod config;
pub mod constants;
pub mod duosat_errors;
pub mod dynamics;
pub mod integrator;
pub mod keplerian_element;
#[cfg(feature = "progress")]
pub mod progress_bar;
pub mod simulation;
pub mod state;
pub mod sweep;
pub mod trajectory;

pub use duosat_errors::DuoSatError;
pub use dynamics::{PhysicalParams, ThreeBodyDynamics};
pub use integrator::{
    rkf45::{integrate, Integration, IntegrationStats},
    RKF45Params,
};
pub use simulation::Simulation;
pub use state::{SatelliteState, StateVector};
pub use trajectory::Trajectory;

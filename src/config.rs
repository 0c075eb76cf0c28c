//! # YAML simulation configuration
//!
//! A [`SimulationConfig`] carries every driver input (masses, gravitational constant, initial
//! position and velocity of both bodies, time span, integrator settings) in a form that can be
//! stored next to its results. Integrator fields are optional; missing ones take the defaults
//! of [`RKF45Params`].
//!
//! ```yaml
//! central_mass: 1.0e+29
//! gravitational_constant: 6.67259e-20   # optional
//! body1:
//!   mass: 2.0e+27
//!   position: [500000.0, 0.0, 0.0]
//!   velocity: [0.0, 45.0, 5.0]
//! body2:
//!   mass: 1.0e+26
//!   position: [600000.0, 0.0, 0.0]
//!   velocity: [0.0, 72.0, 10.0]
//! t0: 0.0
//! tf: 100000.0
//! integrator:                           # optional
//!   tolerance: 1.0e-8
//!   output_step: 100.0
//! ```
use camino::Utf8Path;
use log::info;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fs;

use crate::{
    constants::{Kilogram, Kilometer, KmPerSecond, Second, GRAVITATIONAL_CONSTANT},
    duosat_errors::DuoSatError,
    dynamics::PhysicalParams,
    integrator::RKF45Params,
    simulation::Simulation,
    state::SatelliteState,
};

fn default_gravitational_constant() -> f64 {
    GRAVITATIONAL_CONSTANT
}

/// Mass and initial conditions of one orbiting body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BodyConfig {
    pub mass: Kilogram,
    pub position: [Kilometer; 3],
    pub velocity: [KmPerSecond; 3],
}

/// Optional integrator settings. `tolerance` sets both tolerances and is overridden by the
/// specific ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IntegratorConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_tolerance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub absolute_tolerance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_step: Option<Second>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_step: Option<Second>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_step: Option<Second>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_steps: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_step: Option<Second>,
}

impl IntegratorConfig {
    /// Validated [`RKF45Params`], defaults filled in.
    pub fn to_params(&self) -> Result<RKF45Params, DuoSatError> {
        let mut builder = RKF45Params::builder();
        if let Some(v) = self.tolerance {
            builder = builder.tolerance(v);
        }
        if let Some(v) = self.relative_tolerance {
            builder = builder.relative_tolerance(v);
        }
        if let Some(v) = self.absolute_tolerance {
            builder = builder.absolute_tolerance(v);
        }
        if let Some(v) = self.initial_step {
            builder = builder.initial_step(v);
        }
        if let Some(v) = self.min_step {
            builder = builder.min_step(v);
        }
        if let Some(v) = self.max_step {
            builder = builder.max_step(v);
        }
        if let Some(v) = self.max_steps {
            builder = builder.max_steps(v);
        }
        if let Some(v) = self.output_step {
            builder = builder.output_step(v);
        }
        builder.build()
    }
}

/// Complete description of a two-satellite simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationConfig {
    pub central_mass: Kilogram,
    #[serde(default = "default_gravitational_constant")]
    pub gravitational_constant: f64,
    pub body1: BodyConfig,
    pub body2: BodyConfig,
    pub t0: Second,
    pub tf: Second,
    #[serde(default)]
    pub integrator: IntegratorConfig,
}

impl SimulationConfig {
    /// Parse a configuration from a YAML document.
    pub fn from_yaml_str(contents: &str) -> Result<Self, DuoSatError> {
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Read and parse a YAML configuration file.
    pub fn from_path(path: &Utf8Path) -> Result<Self, DuoSatError> {
        let contents = fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&contents)?;
        info!("Loaded simulation configuration from {path}");
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> Result<String, DuoSatError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Physical parameters described by this configuration, validated.
    pub fn physical_params(&self) -> Result<PhysicalParams, DuoSatError> {
        PhysicalParams::builder()
            .gravitational_constant(self.gravitational_constant)
            .central_mass(self.central_mass)
            .body1_mass(self.body1.mass)
            .body2_mass(self.body2.mass)
            .build()
    }

    pub fn initial_state(&self) -> SatelliteState {
        SatelliteState::new(
            Vector3::from(self.body1.position),
            Vector3::from(self.body1.velocity),
            Vector3::from(self.body2.position),
            Vector3::from(self.body2.velocity),
        )
    }

    /// Validate every field and assemble the [`Simulation`].
    pub fn build(&self) -> Result<Simulation, DuoSatError> {
        Simulation::new(
            self.physical_params()?,
            self.initial_state(),
            self.t0,
            self.tf,
            self.integrator.to_params()?,
        )
    }
}

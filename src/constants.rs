//! # Constants and type definitions for duosat
//!
//! This module centralizes the **physical constants**, **integrator defaults**, and **unit
//! aliases** used throughout the `duosat` library.
//!
//! ## Overview
//!
//! - Gravitational constant in the crate's unit system (km, kg, s)
//! - Default tolerances and step bounds of the RKF45 stepper
//! - Unit type aliases used in signatures to make the unit system explicit
//!
//! ## Units
//!
//! Lengths are expressed in **kilometers**, masses in **kilograms**, and times in
//! **seconds**. Velocities are therefore in km/s and the gravitational constant in
//! km³·kg⁻¹·s⁻².

// -------------------------------------------------------------------------------------------------
// Physical constants
// -------------------------------------------------------------------------------------------------

/// 2π, useful for angle normalization
pub const DPI: f64 = 2. * std::f64::consts::PI;

/// Newtonian gravitational constant in km³/(kg·s²)
pub const GRAVITATIONAL_CONSTANT: f64 = 6.67259e-20;

/// Number of components of the two-satellite state vector
pub const STATE_DIM: usize = 12;

// -------------------------------------------------------------------------------------------------
// RKF45 defaults
// -------------------------------------------------------------------------------------------------

/// Default relative tolerance of the mixed error norm
pub const DEFAULT_RELATIVE_TOLERANCE: f64 = 1e-8;

/// Default absolute tolerance of the mixed error norm
pub const DEFAULT_ABSOLUTE_TOLERANCE: f64 = 1e-8;

/// Initial step as a fraction of the integration span, when no guess is given
pub const DEFAULT_INITIAL_STEP_FRACTION: f64 = 1e-3;

/// Smallest step size (seconds) the controller may use before giving up
pub const DEFAULT_MIN_STEP: f64 = 1e-9;

/// Largest step size (seconds); unbounded apart from the remaining span
pub const DEFAULT_MAX_STEP: f64 = f64::INFINITY;

/// Ceiling on attempted (accepted + rejected) steps
pub const DEFAULT_MAX_STEPS: usize = 1_000_000;

/// Safety factor of the step-size controller
pub const STEP_SAFETY: f64 = 0.84;

/// Step-size control exponent
pub const STEP_EXPONENT: f64 = 1.0 / 5.0;

/// Smallest factor applied to the step size after one attempt
pub const MIN_STEP_SCALE: f64 = 0.1;

/// Largest factor applied to the step size after one attempt
pub const MAX_STEP_SCALE: f64 = 4.0;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Distance in kilometers
pub type Kilometer = f64;
/// Velocity in kilometers per second
pub type KmPerSecond = f64;
/// Mass in kilograms
pub type Kilogram = f64;
/// Time in seconds
pub type Second = f64;
/// Angle in radians
pub type Radian = f64;

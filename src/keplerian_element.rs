//! # Osculating Keplerian elements
//!
//! This module defines [`KeplerianElements`] and the conversion from a Cartesian position and
//! velocity about the central mass to the classical element set `(a, e, i, Ω, ω, M)`.
//!
//! In the two-satellite problem each body follows a perturbed Kepler orbit: the elements
//! computed here are **osculating**, i.e. those of the conic the body would follow if the other
//! satellite vanished at that instant. When the perturbing mass is zero they are constants of
//! motion, which makes them a convenient accuracy check for the integrator.
//!
//! ## Units
//!
//! - Lengths: **km**
//! - Angles: **radians**
//! - Time: **seconds** (epoch is the integration time of the sample)
//!
//! ## Degeneracies
//!
//! - **Equatorial orbits (`i → 0`)**: the ascending node Ω is undefined and set to `0.0`.
//! - **Circular orbits (`e → 0`)**: the periapsis direction is numerically ill-defined; the
//!   returned ω and M still sum to the correct argument of latitude.
//! - **Unbound states** (`1/a ≤ 0`) are rejected with [`DuoSatError::NonEllipticOrbit`].
use nalgebra::{Rotation3, Vector3};
use std::fmt;

use crate::{
    constants::{Kilometer, Radian, Second, DPI},
    duosat_errors::DuoSatError,
};

/// Return the principal value of an angle in `[0, 2π)`.
pub fn principal_angle(a: Radian) -> Radian {
    a.rem_euclid(DPI)
}

/// Keplerian orbital elements (osculating, two-body).
///
/// Units
/// -----
/// * `reference_epoch`: seconds.
/// * `semi_major_axis`: km.
/// * `eccentricity`: unitless.
/// * `inclination`: radians.
/// * `ascending_node_longitude`: radians (Ω).
/// * `periapsis_argument`: radians (ω).
/// * `mean_anomaly`: radians (M).
#[derive(Debug, PartialEq, Clone)]
pub struct KeplerianElements {
    pub reference_epoch: Second,
    pub semi_major_axis: Kilometer,
    pub eccentricity: f64,
    pub inclination: Radian,
    pub ascending_node_longitude: Radian,
    pub periapsis_argument: Radian,
    pub mean_anomaly: Radian,
}

impl KeplerianElements {
    /// Build the osculating elements of a body from its state relative to the central mass.
    ///
    /// The state is first rotated into the orbital frame (X axis along the line of nodes,
    /// Z axis along the angular momentum), then the reciprocal semi-major axis selects the
    /// conic. Only elliptic orbits are representable by this element set.
    ///
    /// Arguments
    /// -----------------
    /// * `position`: Position relative to the central mass (km).
    /// * `velocity`: Velocity relative to the central mass (km/s).
    /// * `mu`: Gravitational parameter `G(M + m)` (km³/s²).
    /// * `reference_epoch`: Time of the state (s).
    ///
    /// Return
    /// ----------
    /// * `Ok(KeplerianElements)` for a bound orbit.
    /// * `Err(DuoSatError::NonEllipticOrbit)` when `1/a ≤ 0`.
    ///
    /// See also
    /// ------------
    /// * [`crate::dynamics::ThreeBodyDynamics::body1_energy`] – Energy form of the same invariant.
    pub fn from_state(
        position: &Vector3<f64>,
        velocity: &Vector3<f64>,
        mu: f64,
        reference_epoch: Second,
    ) -> Result<Self, DuoSatError> {
        // Angular momentum unit vector
        let elle = position.cross(velocity);
        let elmod = elle.norm();
        let elv = elle / elmod;

        // Orbital inclination and longitude of the node
        let sini = (elv.x * elv.x + elv.y * elv.y).sqrt();
        let inclination = sini.atan2(elv.z);
        let node = if sini == 0.0 {
            0.0
        } else {
            principal_angle(elv.x.atan2(-elv.y))
        };

        // Coordinates in the orbital frame
        let rot = Rotation3::from_axis_angle(&Vector3::x_axis(), -inclination)
            * Rotation3::from_axis_angle(&Vector3::z_axis(), -node);
        let xorb = rot * position;
        let vorb = rot * velocity;

        let rv = xorb.x * vorb.x + xorb.y * vorb.y;
        let rs = (xorb.x * xorb.x + xorb.y * xorb.y).sqrt();
        let v2 = vorb.x * vorb.x + vorb.y * vorb.y;

        // Reciprocal semi-major axis
        let reca = 2.0 / rs - v2 / mu;
        if reca <= 0.0 {
            let p = elmod * elmod / mu;
            return Err(DuoSatError::NonEllipticOrbit {
                eccentricity: (1.0 - p * reca).sqrt(),
            });
        }

        let sma = 1.0 / reca;
        let enne = (mu / sma.powi(3)).sqrt();

        let esine = rv / (enne * sma * sma);
        let ecose = v2 * rs / mu - 1.0;
        let ecc = (esine * esine + ecose * ecose).sqrt();

        let anec = esine.atan2(ecose);
        let mean_anomaly = principal_angle(anec - ecc * anec.sin());

        // Argument of pericenter
        let x1 = anec.cos() - ecc;
        let x2 = (1.0 - ecc * ecc).sqrt() * anec.sin();
        let xm = (x1 * x1 + x2 * x2).sqrt();
        let (x1, x2) = (x1 / xm, x2 / xm);
        let sinper = x1 * xorb.y - x2 * xorb.x;
        let cosper = x1 * xorb.x + x2 * xorb.y;

        Ok(KeplerianElements {
            reference_epoch,
            semi_major_axis: sma,
            eccentricity: ecc,
            inclination,
            ascending_node_longitude: node,
            periapsis_argument: principal_angle(sinper.atan2(cosper)),
            mean_anomaly,
        })
    }

    /// Mean motion `n = sqrt(μ / a³)` (rad/s).
    pub fn mean_motion(&self, mu: f64) -> f64 {
        (mu / self.semi_major_axis.powi(3)).sqrt()
    }

    /// Orbital period `2π / n` (s).
    pub fn orbital_period(&self, mu: f64) -> Second {
        DPI / self.mean_motion(mu)
    }

    /// Periapsis distance `a(1 − e)` (km).
    pub fn periapsis_distance(&self) -> Kilometer {
        self.semi_major_axis * (1.0 - self.eccentricity)
    }

    /// Apoapsis distance `a(1 + e)` (km).
    pub fn apoapsis_distance(&self) -> Kilometer {
        self.semi_major_axis * (1.0 + self.eccentricity)
    }
}

impl fmt::Display for KeplerianElements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rad_to_deg = 180.0 / std::f64::consts::PI;
        writeln!(f, "Keplerian Elements @ t = {:.3} s", self.reference_epoch)?;
        writeln!(f, "-------------------------------------------")?;
        writeln!(
            f,
            "  a   (semi-major axis)       = {:.3} km",
            self.semi_major_axis
        )?;
        writeln!(
            f,
            "  e   (eccentricity)          = {:.6}",
            self.eccentricity
        )?;
        writeln!(
            f,
            "  i   (inclination)           = {:.6} rad ({:.6}°)",
            self.inclination,
            self.inclination * rad_to_deg
        )?;
        writeln!(
            f,
            "  Ω   (longitude of node)     = {:.6} rad ({:.6}°)",
            self.ascending_node_longitude,
            self.ascending_node_longitude * rad_to_deg
        )?;
        writeln!(
            f,
            "  ω   (argument of periapsis) = {:.6} rad ({:.6}°)",
            self.periapsis_argument,
            self.periapsis_argument * rad_to_deg
        )?;
        writeln!(
            f,
            "  M   (mean anomaly)          = {:.6} rad ({:.6}°)",
            self.mean_anomaly,
            self.mean_anomaly * rad_to_deg
        )
    }
}

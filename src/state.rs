//! # Two-satellite state vector
//!
//! The integrator works on a flat 12-component vector whose ordering is the contract between
//! the dynamics model and the stepper:
//!
//! ```text
//! index   0..3        3..6        6..9        9..12
//!         pos1(x,y,z) pos2(x,y,z) vel1(x,y,z) vel2(x,y,z)
//! ```
//!
//! The derivative vector shares the same shape, with velocities in the first half and
//! accelerations in the second half.
//!
//! [`SatelliteState`] is the typed view over this layout: named 3-vectors for the position
//! and velocity of each body, with lossless conversions to and from [`StateVector`].
use nalgebra::{SVector, Vector3};
use std::fmt;

use crate::constants::STATE_DIM;

/// Flat state (or derivative) vector of the two-satellite problem.
pub type StateVector = SVector<f64, STATE_DIM>;

const POS1: usize = 0;
const POS2: usize = 3;
const VEL1: usize = 6;
const VEL2: usize = 9;

/// Positions and velocities of both orbiting bodies, relative to the central mass.
///
/// Units
/// -----
/// * positions: km
/// * velocities: km/s
///
/// See also
/// --------
/// * [`StateVector`] – Flat layout consumed by the integrator.
/// * [`SatelliteState::to_vector`] / [`SatelliteState::from_vector`] – Conversions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SatelliteState {
    pub body1_position: Vector3<f64>,
    pub body2_position: Vector3<f64>,
    pub body1_velocity: Vector3<f64>,
    pub body2_velocity: Vector3<f64>,
}

impl SatelliteState {
    pub fn new(
        body1_position: Vector3<f64>,
        body1_velocity: Vector3<f64>,
        body2_position: Vector3<f64>,
        body2_velocity: Vector3<f64>,
    ) -> Self {
        SatelliteState {
            body1_position,
            body2_position,
            body1_velocity,
            body2_velocity,
        }
    }

    /// Split a flat vector into its four named 3-vectors.
    pub fn from_vector(y: &StateVector) -> Self {
        SatelliteState {
            body1_position: y.fixed_rows::<3>(POS1).into_owned(),
            body2_position: y.fixed_rows::<3>(POS2).into_owned(),
            body1_velocity: y.fixed_rows::<3>(VEL1).into_owned(),
            body2_velocity: y.fixed_rows::<3>(VEL2).into_owned(),
        }
    }

    /// Pack the four named 3-vectors as `[pos1, pos2, vel1, vel2]`.
    pub fn to_vector(&self) -> StateVector {
        let mut y = StateVector::zeros();
        y.fixed_rows_mut::<3>(POS1).copy_from(&self.body1_position);
        y.fixed_rows_mut::<3>(POS2).copy_from(&self.body2_position);
        y.fixed_rows_mut::<3>(VEL1).copy_from(&self.body1_velocity);
        y.fixed_rows_mut::<3>(VEL2).copy_from(&self.body2_velocity);
        y
    }

    /// Time derivative of a state: the velocities take the position slots and the
    /// accelerations take the velocity slots, `[vel1, vel2, accel1, accel2]`.
    pub fn derivative(
        body1_velocity: &Vector3<f64>,
        body2_velocity: &Vector3<f64>,
        body1_acceleration: &Vector3<f64>,
        body2_acceleration: &Vector3<f64>,
    ) -> StateVector {
        let mut dydt = StateVector::zeros();
        dydt.fixed_rows_mut::<3>(POS1).copy_from(body1_velocity);
        dydt.fixed_rows_mut::<3>(POS2).copy_from(body2_velocity);
        dydt.fixed_rows_mut::<3>(VEL1).copy_from(body1_acceleration);
        dydt.fixed_rows_mut::<3>(VEL2).copy_from(body2_acceleration);
        dydt
    }

    /// Relative separation `pos2 - pos1` between the two orbiting bodies.
    pub fn separation(&self) -> Vector3<f64> {
        self.body2_position - self.body1_position
    }

    pub fn is_finite(&self) -> bool {
        self.to_vector().iter().all(|v| v.is_finite())
    }
}

impl From<&StateVector> for SatelliteState {
    fn from(y: &StateVector) -> Self {
        SatelliteState::from_vector(y)
    }
}

impl From<StateVector> for SatelliteState {
    fn from(y: StateVector) -> Self {
        SatelliteState::from_vector(&y)
    }
}

impl From<SatelliteState> for StateVector {
    fn from(s: SatelliteState) -> Self {
        s.to_vector()
    }
}

impl fmt::Display for SatelliteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p1 = &self.body1_position;
        let p2 = &self.body2_position;
        let v1 = &self.body1_velocity;
        let v2 = &self.body2_velocity;
        writeln!(
            f,
            "body 1: r = ({:.3}, {:.3}, {:.3}) km, v = ({:.6}, {:.6}, {:.6}) km/s",
            p1.x, p1.y, p1.z, v1.x, v1.y, v1.z
        )?;
        write!(
            f,
            "body 2: r = ({:.3}, {:.3}, {:.3}) km, v = ({:.6}, {:.6}, {:.6}) km/s",
            p2.x, p2.y, p2.z, v2.x, v2.y, v2.z
        )
    }
}

//! # Integration results
//!
//! A [`Trajectory`] is the ordered sequence of `(t, y)` samples produced by the RKF45 stepper:
//!
//! * it starts at `t0` with the initial state and ends at `tf` exactly,
//! * sample times are **strictly increasing** and irregularly spaced (one sample per accepted
//!   step),
//! * it is sealed once returned: there is no public way to append or mutate samples.
//!
//! Each [`Sample`] also stores the derivative `f(t, y)` evaluated by the stepper. This gives
//! dense output for free: [`Trajectory::interpolate`] uses cubic Hermite interpolation between
//! neighbouring samples, and [`Trajectory::resample`] builds the optional uniform output grid.
//!
//! ## Trajectory table
//!
//! For the two-satellite problem ([`STATE_DIM`] = 12) the trajectory can be written to and
//! read from a CSV table with 13 columns, in time order:
//!
//! ```text
//! t,x1,y1,z1,x2,y2,z2,vx1,vy1,vz1,vx2,vy2,vz2
//! ```
//!
//! Reading a table back needs the dynamics model, since derivatives are not stored.
use camino::Utf8Path;
use itertools::Itertools;
use nalgebra::{DVector, SVector};
use serde::{Deserialize, Serialize};
use std::{fs::File, io};

use crate::{
    constants::STATE_DIM,
    duosat_errors::{DuoSatError, PartialSamples},
    dynamics::ThreeBodyDynamics,
    state::{SatelliteState, StateVector},
};

/// One accepted point of an integration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample<const N: usize> {
    pub t: f64,
    pub state: SVector<f64, N>,
    pub derivative: SVector<f64, N>,
}

impl<const N: usize> Sample<N> {
    pub fn new(t: f64, state: SVector<f64, N>, derivative: SVector<f64, N>) -> Self {
        Sample {
            t,
            state,
            derivative,
        }
    }
}

/// Time-ordered samples of an integration, from `t0` to `tf` inclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory<const N: usize> {
    samples: Vec<Sample<N>>,
}

impl<const N: usize> Trajectory<N> {
    pub(crate) fn new(first: Sample<N>) -> Self {
        Trajectory {
            samples: vec![first],
        }
    }

    pub(crate) fn push(&mut self, sample: Sample<N>) {
        debug_assert!(sample.t > self.end_time(), "sample times must increase");
        self.samples.push(sample);
    }

    /// Number of samples (always at least one).
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always `false`: a trajectory holds at least its initial sample.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Sample<N>] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<Sample<N>> {
        self.samples
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample<N>> {
        self.samples.iter()
    }

    pub fn first(&self) -> &Sample<N> {
        &self.samples[0]
    }

    pub fn last(&self) -> &Sample<N> {
        &self.samples[self.samples.len() - 1]
    }

    pub fn start_time(&self) -> f64 {
        self.first().t
    }

    pub fn end_time(&self) -> f64 {
        self.last().t
    }

    /// Sample times in order.
    pub fn times(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.t)
    }

    /// `true` when consecutive sample times are strictly increasing.
    pub fn is_strictly_increasing(&self) -> bool {
        self.samples.iter().tuple_windows().all(|(a, b)| a.t < b.t)
    }

    /// Copy the samples into dynamically sized `(t, y)` pairs.
    ///
    /// This is the form carried by [`DuoSatError::StepBudgetExceeded`].
    pub fn to_partial_samples(&self) -> PartialSamples {
        self.samples
            .iter()
            .map(|s| (s.t, DVector::from_column_slice(s.state.as_slice())))
            .collect()
    }

    /// Evaluate the dense output at time `t`.
    ///
    /// Between two samples `(t_a, y_a, f_a)` and `(t_b, y_b, f_b)` the state is the cubic
    /// Hermite polynomial matching values and derivatives at both ends. Sample times return
    /// the stored sample exactly.
    ///
    /// Return
    /// ----------
    /// * `Some(Sample)` for `t` inside `[start_time, end_time]`.
    /// * `None` outside that range.
    pub fn sample_at(&self, t: f64) -> Option<Sample<N>> {
        if !(self.start_time()..=self.end_time()).contains(&t) {
            return None;
        }

        let i = self.samples.partition_point(|s| s.t <= t);
        let a = &self.samples[i - 1];
        if a.t == t || i == self.samples.len() {
            return Some(*a);
        }
        let b = &self.samples[i];

        let h = b.t - a.t;
        let s = (t - a.t) / h;
        let s2 = s * s;
        let s3 = s2 * s;

        let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
        let h10 = s3 - 2.0 * s2 + s;
        let h01 = -2.0 * s3 + 3.0 * s2;
        let h11 = s3 - s2;
        let state =
            a.state * h00 + a.derivative * (h * h10) + b.state * h01 + b.derivative * (h * h11);

        let d00 = 6.0 * s2 - 6.0 * s;
        let d10 = 3.0 * s2 - 4.0 * s + 1.0;
        let d01 = -6.0 * s2 + 6.0 * s;
        let d11 = 3.0 * s2 - 2.0 * s;
        let derivative =
            (a.state * d00 + b.state * d01) / h + a.derivative * d10 + b.derivative * d11;

        Some(Sample::new(t, state, derivative))
    }

    /// State at time `t` from the dense output, `None` outside the integrated span.
    pub fn interpolate(&self, t: f64) -> Option<SVector<f64, N>> {
        self.sample_at(t).map(|s| s.state)
    }

    /// Resample on the uniform grid `t0, t0 + step, t0 + 2·step, …, tf`.
    ///
    /// The last grid point is always `tf`, even when the span is not a multiple of `step`;
    /// a grid point falling within `1e-9·step` of `tf` is merged into it.
    ///
    /// Return
    /// ----------
    /// * The resampled [`Trajectory`].
    /// * `Err(DuoSatError::InvalidConfiguration)` if `step` is not positive and finite.
    pub fn resample(&self, step: f64) -> Result<Trajectory<N>, DuoSatError> {
        if !(step.is_finite() && step > 0.0) {
            return Err(DuoSatError::InvalidConfiguration(format!(
                "output step must be positive and finite, got {step}"
            )));
        }

        let t0 = self.start_time();
        let tf = self.end_time();
        let mut out = Trajectory::new(*self.first());

        let mut k: u64 = 1;
        loop {
            let t = t0 + k as f64 * step;
            if t >= tf - 1e-9 * step {
                break;
            }
            // Inside the span by construction
            if let Some(sample) = self.sample_at(t) {
                out.push(sample);
            }
            k += 1;
        }
        if tf > t0 {
            out.push(*self.last());
        }
        Ok(out)
    }
}

impl<'a, const N: usize> IntoIterator for &'a Trajectory<N> {
    type Item = &'a Sample<N>;
    type IntoIter = std::slice::Iter<'a, Sample<N>>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

/// One row of the 13-column trajectory table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryRow {
    pub t: f64,
    pub x1: f64,
    pub y1: f64,
    pub z1: f64,
    pub x2: f64,
    pub y2: f64,
    pub z2: f64,
    pub vx1: f64,
    pub vy1: f64,
    pub vz1: f64,
    pub vx2: f64,
    pub vy2: f64,
    pub vz2: f64,
}

impl TrajectoryRow {
    pub fn new(t: f64, y: &StateVector) -> Self {
        TrajectoryRow {
            t,
            x1: y[0],
            y1: y[1],
            z1: y[2],
            x2: y[3],
            y2: y[4],
            z2: y[5],
            vx1: y[6],
            vy1: y[7],
            vz1: y[8],
            vx2: y[9],
            vy2: y[10],
            vz2: y[11],
        }
    }

    pub fn state(&self) -> StateVector {
        StateVector::from_column_slice(&[
            self.x1, self.y1, self.z1, self.x2, self.y2, self.z2, self.vx1, self.vy1, self.vz1,
            self.vx2, self.vy2, self.vz2,
        ])
    }
}

impl Trajectory<STATE_DIM> {
    /// Samples as `(t, SatelliteState)` pairs.
    pub fn satellite_states(&self) -> impl Iterator<Item = (f64, SatelliteState)> + '_ {
        self.samples
            .iter()
            .map(|s| (s.t, SatelliteState::from_vector(&s.state)))
    }

    /// Largest distance of each body from the central mass over the samples (km).
    pub fn max_radii(&self) -> (f64, f64) {
        self.satellite_states()
            .fold((0.0_f64, 0.0_f64), |(r1, r2), (_, s)| {
                (
                    r1.max(s.body1_position.norm()),
                    r2.max(s.body2_position.norm()),
                )
            })
    }

    /// Smallest separation between the two bodies over the samples (km).
    pub fn min_separation(&self) -> f64 {
        self.satellite_states()
            .map(|(_, s)| s.separation().norm())
            .fold(f64::INFINITY, f64::min)
    }

    /// Write the 13-column table (with header) to `writer`.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<(), DuoSatError> {
        let mut wtr = csv::Writer::from_writer(writer);
        for s in &self.samples {
            wtr.serialize(TrajectoryRow::new(s.t, &s.state))?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Write the 13-column table to a file, replacing it if it exists.
    pub fn write_csv_file(&self, path: &Utf8Path) -> Result<(), DuoSatError> {
        let file = File::create(path)?;
        self.write_csv(file)
    }

    /// Read a 13-column table back into a trajectory.
    ///
    /// Derivatives are recomputed with `dynamics`, so the dense output of the loaded
    /// trajectory matches the one of the run that produced it.
    ///
    /// Return
    /// ----------
    /// * The loaded [`Trajectory`].
    /// * `Err(DuoSatError::InvalidConfiguration)` for an empty table or non-increasing times.
    /// * `Err(DuoSatError::CsvError)` for malformed rows.
    /// * `Err(DuoSatError::SingularConfiguration)` if a stored state is singular.
    pub fn read_csv<R: io::Read>(
        reader: R,
        dynamics: &ThreeBodyDynamics,
    ) -> Result<Self, DuoSatError> {
        let mut rdr = csv::Reader::from_reader(reader);
        let mut samples = Vec::new();
        for row in rdr.deserialize() {
            let row: TrajectoryRow = row?;
            let y = row.state();
            let dydt = dynamics.rates(row.t, &y)?;
            samples.push(Sample::new(row.t, y, dydt));
        }

        if samples.is_empty() {
            return Err(DuoSatError::InvalidConfiguration(
                "trajectory table has no rows".into(),
            ));
        }
        let trajectory = Trajectory { samples };
        if !trajectory.is_strictly_increasing() {
            return Err(DuoSatError::InvalidConfiguration(
                "trajectory table times are not strictly increasing".into(),
            ));
        }
        Ok(trajectory)
    }

    /// Read a 13-column table from a file.
    pub fn read_csv_file(
        path: &Utf8Path,
        dynamics: &ThreeBodyDynamics,
    ) -> Result<Self, DuoSatError> {
        let file = File::open(path)?;
        Self::read_csv(file, dynamics)
    }
}

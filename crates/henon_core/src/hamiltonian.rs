//! Energy diagnostics.
//!
//! The exact flow conserves `H`, so the series produced here measures how far
//! each integrator wanders off the energy surface.

use crate::error::{HenonError, Result};
use crate::system::HenonHeiles;
use crate::traits::{HamiltonianSystem, State};
use crate::trajectory::{Method, Trajectory};
use serde::Serialize;

/// `H` at every stored sample of one trajectory, index-aligned with it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HamiltonianSeries {
    method: Method,
    values: Vec<f64>,
}

impl HamiltonianSeries {
    pub fn method(&self) -> Method {
        self.method
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn stats(&self) -> Option<EnergyStats> {
        EnergyStats::from_values(&self.values)
    }
}

/// Evaluates `H` at each state.
pub fn evaluate(states: &[State]) -> Vec<f64> {
    let system = HenonHeiles;
    states.iter().map(|y| system.hamiltonian(y)).collect()
}

pub fn hamiltonian_series(trajectory: &Trajectory) -> HamiltonianSeries {
    HamiltonianSeries {
        method: trajectory.method(),
        values: evaluate(trajectory.states()),
    }
}

/// Summary of an energy series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnergyStats {
    /// Energy of the first sample.
    pub initial: f64,
    pub mean: f64,
    /// `max |H_i - mean|`: bounded for symplectic schemes.
    pub max_deviation: f64,
    /// `max |H_i - H_0|`.
    pub max_drift: f64,
    /// Least-squares slope of `H` against sample index.
    pub drift_rate: f64,
}

impl EnergyStats {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let initial = *values.first()?;
        let count = values.len() as f64;
        let mean = values.iter().sum::<f64>() / count;

        let mut max_deviation = 0.0_f64;
        let mut max_drift = 0.0_f64;
        for &value in values {
            max_deviation = max_deviation.max((value - mean).abs());
            max_drift = max_drift.max((value - initial).abs());
        }

        let index_mean = (count - 1.0) / 2.0;
        let mut covariance = 0.0;
        let mut variance = 0.0;
        for (i, &value) in values.iter().enumerate() {
            let dx = i as f64 - index_mean;
            covariance += dx * (value - mean);
            variance += dx * dx;
        }
        let drift_rate = if variance > 0.0 { covariance / variance } else { 0.0 };

        Some(Self {
            initial,
            mean,
            max_deviation,
            max_drift,
            drift_rate,
        })
    }
}

/// The `[time, H_rk4, H_rk3, H_implicit2, H_leapfrog]` table handed to the sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HamiltonianTable {
    times: Vec<f64>,
    columns: [HamiltonianSeries; 4],
}

impl HamiltonianTable {
    /// `columns` must be in [`Method::ALL`] order and as long as `times`.
    pub fn new(times: Vec<f64>, columns: [HamiltonianSeries; 4]) -> Result<Self> {
        for (series, expected) in columns.iter().zip(Method::ALL) {
            if series.method != expected {
                return Err(HenonError::InconsistentTable(format!(
                    "Hamiltonian column for {} found where {} was expected.",
                    series.method, expected
                )));
            }
            if series.len() != times.len() {
                return Err(HenonError::InconsistentTable(format!(
                    "Hamiltonian column for {} has {} rows, time column has {}.",
                    series.method,
                    series.len(),
                    times.len()
                )));
            }
        }
        Ok(Self { times, columns })
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn column(&self, method: Method) -> &HamiltonianSeries {
        &self.columns[method.index()]
    }

    pub fn columns(&self) -> &[HamiltonianSeries; 4] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Rows as `[time, H_rk4, H_rk3, H_implicit2, H_leapfrog]`.
    pub fn rows(&self) -> impl Iterator<Item = [f64; 5]> + '_ {
        self.times.iter().enumerate().map(move |(i, &t)| {
            [
                t,
                self.columns[0].values[i],
                self.columns[1].values[i],
                self.columns[2].values[i],
                self.columns[3].values[i],
            ]
        })
    }
}

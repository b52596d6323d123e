//! The Hénon-Heiles system.
//!
//! `H = (p1^2 + p2^2)/2 + (q1^2 + q2^2)/2 + q1^2 q2 - q2^3/3`

use crate::error::{HenonError, Result};
use crate::traits::{DynamicalSystem, HamiltonianSystem, State};
use nalgebra::Vector2;

/// Component indices into a [`State`].
pub const P1: usize = 0;
pub const P2: usize = 1;
pub const Q1: usize = 2;
pub const Q2: usize = 3;

/// Starting `q2` used by [`initial_condition`].
pub const DEFAULT_START_Q2: f64 = 0.45;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HenonHeiles;

impl DynamicalSystem for HenonHeiles {
    fn apply(&self, y: &State) -> State {
        let force = self.force(y[Q1], y[Q2]);
        State::new(force.x, force.y, y[P1], y[P2])
    }
}

impl HamiltonianSystem for HenonHeiles {
    fn hamiltonian(&self, y: &State) -> f64 {
        let (p1, p2, q1, q2) = (y[P1], y[P2], y[Q1], y[Q2]);
        0.5 * (p1 * p1 + p2 * p2) + 0.5 * (q1 * q1 + q2 * q2) + q2 * q1 * q1
            - q2 * q2 * q2 / 3.0
    }

    fn force(&self, q1: f64, q2: f64) -> Vector2<f64> {
        Vector2::new(-q1 * (1.0 + 2.0 * q2), -(q2 + q1 * q1 - q2 * q2))
    }
}

/// Initial state with energy `energy` at `p2 = 0, q1 = 0, q2 = 0.45`.
pub fn initial_condition(energy: f64) -> Result<State> {
    initial_condition_at(energy, DEFAULT_START_Q2)
}

/// Initial state with energy `energy` at `p2 = 0, q1 = 0` and the given `q2`,
/// solving `H = energy` for a non-negative `p1`.
pub fn initial_condition_at(energy: f64, q2: f64) -> Result<State> {
    let p2 = 0.0;
    let q1 = 0.0;
    let radicand = 2.0 / 3.0 * q2.powi(3) + 2.0 * energy
        - p2 * p2
        - q1 * q1
        - q2 * q2
        - 2.0 * q1 * q1 * q2;
    if !energy.is_finite() || !q2.is_finite() || !(radicand >= 0.0) {
        return Err(HenonError::InvalidInitialCondition { energy, radicand });
    }
    Ok(State::new(radicand.sqrt(), p2, q1, q2))
}

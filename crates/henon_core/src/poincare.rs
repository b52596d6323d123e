//! Poincaré section on the surface `q1 = 0`, crossed with `p1 > 0`.
//!
//! Each crossing between two stored samples is located by linear
//! interpolation in `q1` and recorded as a `(q2, p2)` point.

use crate::system::{P1, P2, Q1, Q2};
use crate::traits::State;
use crate::trajectory::{Method, Trajectory};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PoincarePoint {
    pub q2: f64,
    pub p2: f64,
}

/// Chronologically ordered section points of one trajectory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoincareSection {
    method: Method,
    points: Vec<PoincarePoint>,
}

impl PoincareSection {
    pub fn method(&self) -> Method {
        self.method
    }

    pub fn points(&self) -> &[PoincarePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PoincarePoint> {
        self.points.iter()
    }
}

/// Whether the step from `prev` to `curr` crosses the section.
///
/// Both inequalities are strict, so a pair with `q1 == 0` on either side is
/// never a crossing and the interpolation below never divides by zero.
fn crosses(prev: &State, curr: &State) -> bool {
    curr[P1] > 0.0 && curr[Q1] * prev[Q1] < 0.0
}

fn interpolate(prev: &State, curr: &State) -> PoincarePoint {
    let lam = prev[Q1] / (prev[Q1] - curr[Q1]);
    PoincarePoint {
        q2: lam * curr[Q2] + (1.0 - lam) * prev[Q2],
        p2: lam * curr[P2] + (1.0 - lam) * prev[P2],
    }
}

/// Section points of consecutive `states`.
pub fn section_points(states: &[State]) -> Vec<PoincarePoint> {
    states
        .windows(2)
        .filter(|pair| crosses(&pair[0], &pair[1]))
        .map(|pair| interpolate(&pair[0], &pair[1]))
        .collect()
}

pub fn poincare_section(trajectory: &Trajectory) -> PoincareSection {
    PoincareSection {
        method: trajectory.method(),
        points: section_points(trajectory.states()),
    }
}

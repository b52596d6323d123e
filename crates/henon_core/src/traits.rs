use crate::error::Result;
use nalgebra::{Vector2, Vector4};

/// Phase-space point `(p1, p2, q1, q2)`: two momenta followed by two positions.
pub type State = Vector4<f64>;

/// A first-order autonomous flow on the 4-dimensional phase space.
pub trait DynamicalSystem {
    /// Evaluates the vector field dy/dt at `y`.
    fn apply(&self, y: &State) -> State;
}

/// A two-degree-of-freedom Hamiltonian with unit masses,
/// `H(p, q) = |p|^2 / 2 + V(q)`.
pub trait HamiltonianSystem: DynamicalSystem {
    /// Total energy at `y`.
    fn hamiltonian(&self, y: &State) -> f64;

    /// Generalised force `-∂V/∂q` at positions `(q1, q2)`.
    fn force(&self, q1: f64, q2: f64) -> Vector2<f64>;
}

/// A solver that can advance a state by one step of a system `S`.
pub trait Steppable<S> {
    /// Performs one step of size dt, overwriting `state`.
    fn step(&mut self, system: &S, state: &mut State, dt: f64) -> Result<()>;

    /// Resets any state carried between steps so that the next step starts
    /// cleanly from `state` with step size `dt`. Stateless solvers ignore it.
    fn reseed(&mut self, _system: &S, _state: &State, _dt: f64) {}
}

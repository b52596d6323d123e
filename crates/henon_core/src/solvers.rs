use crate::error::{HenonError, Result};
use crate::system::{HenonHeiles, P1, P2, Q1, Q2};
use crate::traits::{DynamicalSystem, HamiltonianSystem, State, Steppable};
use nalgebra::{Matrix4, Vector2};

/// Classic Runge-Kutta 4th Order Solver
#[derive(Debug, Clone, Copy, Default)]
pub struct Rk4;

impl Rk4 {
    pub fn new() -> Self {
        Self
    }
}

impl<S: DynamicalSystem> Steppable<S> for Rk4 {
    fn step(&mut self, system: &S, state: &mut State, dt: f64) -> Result<()> {
        let y = *state;

        // k1 = f(y)
        let k1 = system.apply(&y);
        // k2 = f(y + dt*k1/2)
        let k2 = system.apply(&(y + k1 * (0.5 * dt)));
        // k3 = f(y + dt*k2/2)
        let k3 = system.apply(&(y + k2 * (0.5 * dt)));
        // k4 = f(y + dt*k3)
        let k4 = system.apply(&(y + k3 * dt));

        // y_next = y + dt/6 * (k1 + 2k2 + 2k3 + k4)
        *state = y + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (dt / 6.0);
        Ok(())
    }
}

/// Third order, three stage Runge-Kutta solver with the Bogacki-Shampine
/// weights. Used with a fixed step; the embedded second-order pair is unused.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rk3;

impl Rk3 {
    pub fn new() -> Self {
        Self
    }
}

impl<S: DynamicalSystem> Steppable<S> for Rk3 {
    fn step(&mut self, system: &S, state: &mut State, dt: f64) -> Result<()> {
        let y = *state;

        let k1 = system.apply(&y);
        let k2 = system.apply(&(y + k1 * (0.5 * dt)));
        let k3 = system.apply(&(y + k2 * (0.75 * dt)));

        // y_next = y + dt/9 * (2k1 + 3k2 + 4k3)
        *state = y + (k1 * 2.0 + k2 * 3.0 + k3 * 4.0) * (dt / 9.0);
        Ok(())
    }
}

/// Kahan's linearly implicit method (order 2).
///
/// The quadratic terms of the vector field are replaced by their symmetric
/// polarisation between the current and the next state, so every step is a
/// single 4x4 linear solve instead of a Newton iteration.
#[derive(Debug, Clone, Copy, Default)]
pub struct Kahan {
    steps: usize,
}

impl Kahan {
    pub fn new() -> Self {
        Self { steps: 0 }
    }
}

/// Builds `A` and `b` of the linear system `A * y_next = b` for one Kahan step
/// of size `h` from `y`.
pub fn kahan_system(y: &State, h: f64) -> (Matrix4<f64>, State) {
    let (p1, p2, q1, q2) = (y[P1], y[P2], y[Q1], y[Q2]);

    let mut a = Matrix4::identity();
    a[(P1, Q1)] = h * (q2 + 0.5);
    a[(P1, Q2)] = h * q1;
    a[(P2, Q1)] = h * q1;
    a[(P2, Q2)] = h * (0.5 - q2);
    a[(Q1, P1)] = -0.5 * h;
    a[(Q2, P2)] = -0.5 * h;

    let b = State::new(
        p1 - 0.5 * h * q1,
        p2 - 0.5 * h * q2,
        q1 + 0.5 * h * p1,
        q2 + 0.5 * h * p2,
    );
    (a, b)
}

impl Steppable<HenonHeiles> for Kahan {
    fn step(&mut self, _system: &HenonHeiles, state: &mut State, dt: f64) -> Result<()> {
        let (a, b) = kahan_system(state, dt);
        let next = a.lu().solve(&b).ok_or(HenonError::SingularSystem {
            step: self.steps + 1,
        })?;
        *state = next;
        self.steps += 1;
        Ok(())
    }
}

/// Störmer-Verlet (leapfrog) solver for separable Hamiltonians.
///
/// `correction` holds the half kick `dt/2 * F(q)` at the current position.
/// It is produced at the end of one step and consumed at the start of the
/// next, so the force is evaluated once per step.
#[derive(Debug, Clone, Copy, Default)]
pub struct StormerVerlet {
    correction: Vector2<f64>,
}

impl StormerVerlet {
    pub fn new() -> Self {
        Self {
            correction: Vector2::zeros(),
        }
    }

    pub fn correction(&self) -> Vector2<f64> {
        self.correction
    }
}

impl<S: HamiltonianSystem> Steppable<S> for StormerVerlet {
    fn step(&mut self, system: &S, state: &mut State, dt: f64) -> Result<()> {
        let p1_half = state[P1] + self.correction.x;
        let q1_next = state[Q1] + dt * p1_half;
        let p2_half = state[P2] + self.correction.y;
        let q2_next = state[Q2] + dt * p2_half;

        self.correction = system.force(q1_next, q2_next) * (0.5 * dt);

        *state = State::new(
            p1_half + self.correction.x,
            p2_half + self.correction.y,
            q1_next,
            q2_next,
        );
        Ok(())
    }

    fn reseed(&mut self, system: &S, state: &State, dt: f64) {
        self.correction = system.force(state[Q1], state[Q2]) * (0.5 * dt);
    }
}

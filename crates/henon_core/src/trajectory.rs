use crate::error::{HenonError, Result};
use crate::plan::StepPlan;
use crate::solvers::{Kahan, Rk3, Rk4, StormerVerlet};
use crate::system::HenonHeiles;
use crate::traits::{State, Steppable};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four integration schemes, in output-table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    /// Classical explicit Runge-Kutta, order 4.
    Rk4,
    /// Explicit three-stage Runge-Kutta, order 3.
    Rk3,
    /// Kahan's linearly implicit method, order 2.
    Implicit2,
    /// Störmer-Verlet, order 2, symplectic.
    Leapfrog,
}

impl Method {
    pub const ALL: [Method; 4] = [Method::Rk4, Method::Rk3, Method::Implicit2, Method::Leapfrog];

    /// Short tag used in output identifiers and logs.
    pub fn name(self) -> &'static str {
        match self {
            Method::Rk4 => "rk4",
            Method::Rk3 => "rk3",
            Method::Implicit2 => "implicit2",
            Method::Leapfrog => "leapfrog",
        }
    }

    pub fn order(self) -> u32 {
        match self {
            Method::Rk4 => 4,
            Method::Rk3 => 3,
            Method::Implicit2 | Method::Leapfrog => 2,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Method::Rk4 => 0,
            Method::Rk3 => 1,
            Method::Implicit2 => 2,
            Method::Leapfrog => 3,
        }
    }

    /// Integrates the Hénon-Heiles system from `y0` over `[t0, t_end]`.
    pub fn integrate(
        self,
        t0: f64,
        t_end: f64,
        y0: &State,
        h: f64,
        stride: usize,
    ) -> Result<Trajectory> {
        let plan = StepPlan::new(t0, t_end, h, stride)?;
        self.integrate_plan(&plan, y0)
    }

    /// Integrates along an already computed plan.
    pub fn integrate_plan(self, plan: &StepPlan, y0: &State) -> Result<Trajectory> {
        let system = HenonHeiles;
        match self {
            Method::Rk4 => drive(self, &system, &mut Rk4::new(), plan, y0),
            Method::Rk3 => drive(self, &system, &mut Rk3::new(), plan, y0),
            Method::Implicit2 => drive(self, &system, &mut Kahan::new(), plan, y0),
            Method::Leapfrog => drive(self, &system, &mut StormerVerlet::new(), plan, y0),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub fn rk4(t0: f64, t_end: f64, y0: &State, h: f64, stride: usize) -> Result<Trajectory> {
    Method::Rk4.integrate(t0, t_end, y0, h, stride)
}

pub fn rk3(t0: f64, t_end: f64, y0: &State, h: f64, stride: usize) -> Result<Trajectory> {
    Method::Rk3.integrate(t0, t_end, y0, h, stride)
}

pub fn implicit2(t0: f64, t_end: f64, y0: &State, h: f64, stride: usize) -> Result<Trajectory> {
    Method::Implicit2.integrate(t0, t_end, y0, h, stride)
}

pub fn leapfrog(t0: f64, t_end: f64, y0: &State, h: f64, stride: usize) -> Result<Trajectory> {
    Method::Leapfrog.integrate(t0, t_end, y0, h, stride)
}

/// Stored samples of one integration run. Sample 0 is the initial condition
/// and the last sample lies exactly at `t_end`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory {
    method: Method,
    plan: StepPlan,
    states: Vec<State>,
}

impl Trajectory {
    pub fn method(&self) -> Method {
        self.method
    }

    pub fn plan(&self) -> &StepPlan {
        &self.plan
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn first(&self) -> Option<&State> {
        self.states.first()
    }

    pub fn last(&self) -> Option<&State> {
        self.states.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, State> {
        self.states.iter()
    }

    /// One phase-space component across all samples (see [`crate::system::P1`] etc.).
    pub fn column(&self, component: usize) -> impl Iterator<Item = f64> + '_ {
        self.states.iter().map(move |y| y[component])
    }

    /// Physical time of every stored sample.
    pub fn times(&self) -> Vec<f64> {
        self.plan.sample_times()
    }

    pub fn into_states(self) -> Vec<State> {
        self.states
    }
}

/// Runs `stepper` along `plan`: `n - 2` steps of size `h`, then one of size
/// `last_step`, keeping the samples the plan marks as stored.
fn drive<S, T: Steppable<S>>(
    method: Method,
    system: &S,
    stepper: &mut T,
    plan: &StepPlan,
    y0: &State,
) -> Result<Trajectory> {
    ensure_finite(method, y0, 0)?;

    let mut states = Vec::with_capacity(plan.m);
    states.push(*y0);

    let last = plan.last_index();
    if last > 0 {
        let mut current = *y0;
        stepper.reseed(system, &current, plan.h);
        for i in 1..last {
            stepper.step(system, &mut current, plan.h)?;
            ensure_finite(method, &current, i)?;
            if i % plan.stride == 0 {
                states.push(current);
            }
        }

        stepper.reseed(system, &current, plan.last_step);
        stepper.step(system, &mut current, plan.last_step)?;
        ensure_finite(method, &current, last)?;
        states.push(current);
    }

    debug_assert_eq!(states.len(), plan.m);
    Ok(Trajectory {
        method,
        plan: *plan,
        states,
    })
}

fn ensure_finite(method: Method, state: &State, step: usize) -> Result<()> {
    if state.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(HenonError::NonFiniteState {
            method: method.name(),
            step,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::{initial_condition, Q1};

    fn y0() -> State {
        initial_condition(1.0 / 12.0).expect("valid energy")
    }

    #[test]
    fn trajectory_length_matches_plan() {
        for method in Method::ALL {
            for (t_end, h, stride) in [(0.9, 0.3, 1), (1.0, 0.3, 1), (1.0, 0.1, 3), (2.0, 0.1, 7)] {
                let traj = method
                    .integrate(0.0, t_end, &y0(), h, stride)
                    .expect("integration should succeed");
                let plan = StepPlan::new(0.0, t_end, h, stride).expect("plan");
                assert_eq!(traj.len(), plan.m, "{method} t_end={t_end} h={h}");
                assert_eq!(traj.first(), Some(&y0()));
                assert_eq!(traj.times().len(), traj.len());
                assert_eq!(traj.method(), method);
            }
        }
    }

    #[test]
    fn stride_subsamples_full_run() {
        for method in Method::ALL {
            let full = method.integrate(0.0, 3.05, &y0(), 0.1, 1).expect("full run");
            let strided = method.integrate(0.0, 3.05, &y0(), 0.1, 4).expect("strided run");
            let plan = strided.plan();
            let kept: Vec<State> = plan
                .stored_indices()
                .map(|i| full.states()[i])
                .collect();
            assert_eq!(strided.states(), kept.as_slice(), "{method}");
            assert_eq!(strided.last(), full.last());
        }
    }

    #[test]
    fn degenerate_interval_returns_initial_state_only() {
        for method in Method::ALL {
            let traj = method.integrate(0.5, 0.5, &y0(), 0.1, 1).expect("trivial run");
            assert_eq!(traj.states(), &[y0()]);
        }
    }

    #[test]
    fn single_partial_step() {
        let traj = rk4(0.0, 0.05, &y0(), 0.1, 1).expect("run");
        assert_eq!(traj.len(), 2);
        let mut expected = y0();
        Rk4::new()
            .step(&HenonHeiles, &mut expected, 0.05)
            .expect("step");
        assert_eq!(traj.states()[1], expected);
    }

    #[test]
    fn last_step_uses_remainder() {
        // 1.0 = 3 * 0.3 + 0.1: the final sample must equal three full steps and one 0.1 step.
        let traj = rk3(0.0, 1.0, &y0(), 0.3, 1).expect("run");
        let mut expected = y0();
        let mut stepper = Rk3::new();
        for _ in 0..3 {
            stepper.step(&HenonHeiles, &mut expected, 0.3).expect("step");
        }
        let plan = traj.plan();
        stepper
            .step(&HenonHeiles, &mut expected, plan.last_step)
            .expect("step");
        assert_eq!(traj.last(), Some(&expected));
    }

    #[test]
    fn leapfrog_reseeds_before_final_partial_step() {
        let traj = leapfrog(0.0, 1.0, &y0(), 0.3, 1).expect("run");
        let plan = *traj.plan();
        let mut stepper = StormerVerlet::new();
        let mut expected = y0();
        stepper.reseed(&HenonHeiles, &expected, plan.h);
        for _ in 0..3 {
            stepper.step(&HenonHeiles, &mut expected, plan.h).expect("step");
        }
        stepper.reseed(&HenonHeiles, &expected, plan.last_step);
        stepper
            .step(&HenonHeiles, &mut expected, plan.last_step)
            .expect("step");
        assert_eq!(traj.last(), Some(&expected));
    }

    #[test]
    fn free_functions_match_method_dispatch() {
        let y = y0();
        assert_eq!(rk4(0.0, 1.0, &y, 0.1, 1), Method::Rk4.integrate(0.0, 1.0, &y, 0.1, 1));
        assert_eq!(implicit2(0.0, 1.0, &y, 0.1, 1), Method::Implicit2.integrate(0.0, 1.0, &y, 0.1, 1));
        let traj = implicit2(0.0, 1.0, &y, 0.1, 1).expect("run");
        assert_eq!(traj.column(Q1).count(), traj.len());
    }

    #[test]
    fn rejects_invalid_plan_and_state() {
        assert!(matches!(
            rk4(0.0, 1.0, &y0(), 0.0, 1),
            Err(HenonError::InvalidStepPlan(_))
        ));
        let bad = State::new(f64::NAN, 0.0, 0.0, 0.0);
        assert_eq!(
            leapfrog(0.0, 1.0, &bad, 0.1, 1),
            Err(HenonError::NonFiniteState {
                method: "leapfrog",
                step: 0
            })
        );
    }

    #[test]
    fn blow_up_is_reported_as_non_finite_state() {
        // Far outside the bounded region the cubic potential sends the orbit to infinity.
        let escaping = State::new(0.0, 5.0, 0.0, 5.0);
        let err = rk4(0.0, 1e4, &escaping, 0.1, 1).expect_err("orbit escapes");
        assert!(matches!(err, HenonError::NonFiniteState { method: "rk4", .. }));
    }

    #[test]
    fn method_tags_are_stable() {
        let names: Vec<&str> = Method::ALL.iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["rk4", "rk3", "implicit2", "leapfrog"]);
        for (i, method) in Method::ALL.iter().enumerate() {
            assert_eq!(method.index(), i);
        }
        assert_eq!(Method::Implicit2.to_string(), "implicit2");
    }
}

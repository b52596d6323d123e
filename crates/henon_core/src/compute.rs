//! Parallel fan-out of the four integrators and their diagnostics.
//!
//! [`compute_both`] runs a two-phase fork-join graph on a dedicated rayon
//! pool: the four integrations first, then the eight diagnostics (one
//! Hamiltonian series and one Poincaré section per trajectory). Every task
//! returns its result by value, so no task writes to memory another task can
//! see and the output does not depend on the pool size or scheduling order.

use crate::error::{HenonError, Result};
use crate::hamiltonian::{hamiltonian_series, HamiltonianSeries, HamiltonianTable};
use crate::plan::{StepPlan, DEFAULT_REMAINDER_TOLERANCE};
use crate::poincare::{poincare_section, PoincareSection};
use crate::system::initial_condition;
use crate::traits::State;
use crate::trajectory::{Method, Trajectory};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Instant;

/// Inputs of one run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComputeSettings {
    pub t0: f64,
    pub t_end: f64,
    pub h: f64,
    /// Initial energy `H0`; the initial state is derived from it.
    pub energy: f64,
    pub stride: usize,
    /// Worker threads; 0 lets rayon pick.
    pub threads: usize,
    pub remainder_tolerance: f64,
}

impl Default for ComputeSettings {
    fn default() -> Self {
        Self {
            t0: 0.0,
            t_end: 3e6,
            h: 0.1,
            energy: 1.0 / 12.0,
            stride: 1,
            threads: 0,
            remainder_tolerance: DEFAULT_REMAINDER_TOLERANCE,
        }
    }
}

impl ComputeSettings {
    pub fn plan(&self) -> Result<StepPlan> {
        StepPlan::with_tolerance(
            self.t0,
            self.t_end,
            self.h,
            self.stride,
            self.remainder_tolerance,
        )
    }

    pub fn initial_state(&self) -> Result<State> {
        initial_condition(self.energy)
    }

    /// Checks everything that can be checked before any task is scheduled and
    /// returns the resulting plan and initial state.
    pub fn validate(&self) -> Result<(StepPlan, State)> {
        Ok((self.plan()?, self.initial_state()?))
    }
}

/// Which diagnostics to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Integrate once, then derive both diagnostics from the shared trajectories.
    #[default]
    Both,
    Hamiltonians,
    Poincare,
}

impl FromStr for Mode {
    type Err = HenonError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "both" => Ok(Mode::Both),
            "hamiltonians" => Ok(Mode::Hamiltonians),
            "poincare" => Ok(Mode::Poincare),
            other => Err(HenonError::InvalidSettings(format!(
                "Unknown mode \"{other}\" (expected both, hamiltonians or poincare)."
            ))),
        }
    }
}

/// Finished results, ready for the persistence sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Output {
    pub plan: StepPlan,
    pub initial_state: State,
    pub hamiltonians: Option<HamiltonianTable>,
    pub sections: Option<[PoincareSection; 4]>,
}

pub fn compute(settings: &ComputeSettings, mode: Mode) -> Result<Output> {
    match mode {
        Mode::Both => compute_both(settings),
        Mode::Hamiltonians => compute_hamiltonians(settings),
        Mode::Poincare => compute_poincare_maps(settings),
    }
}

/// Integrates with all four methods, then computes the Hamiltonian table and
/// the four Poincaré sections.
pub fn compute_both(settings: &ComputeSettings) -> Result<Output> {
    let (plan, y0) = prepare(settings)?;
    let pool = build_pool(settings.threads)?;

    let (series, sections) = pool.install(|| -> Result<_> {
        let started = Instant::now();
        let trajectories = integrate_all(&plan, &y0)?;
        info!("Integration phase finished in {:.3?}.", started.elapsed());

        let started = Instant::now();
        let diagnostics = diagnose_all(&trajectories);
        info!("Diagnostics phase finished in {:.3?}.", started.elapsed());
        Ok(diagnostics)
    })?;

    Ok(Output {
        plan,
        initial_state: y0,
        hamiltonians: Some(HamiltonianTable::new(plan.sample_times(), series)?),
        sections: Some(sections),
    })
}

/// Hamiltonian table only; each task integrates and evaluates in one go.
pub fn compute_hamiltonians(settings: &ComputeSettings) -> Result<Output> {
    let (plan, y0) = prepare(settings)?;
    let pool = build_pool(settings.threads)?;

    let started = Instant::now();
    let results = pool.install(|| {
        fan_out(&Method::ALL, |&method| {
            integrate_one(method, &plan, &y0).map(|traj| hamiltonian_series(&traj))
        })
    });
    let series = collect_results(results)?;
    info!("Hamiltonians finished in {:.3?}.", started.elapsed());

    Ok(Output {
        plan,
        initial_state: y0,
        hamiltonians: Some(HamiltonianTable::new(plan.sample_times(), series)?),
        sections: None,
    })
}

/// Poincaré sections only; each task integrates and extracts in one go.
pub fn compute_poincare_maps(settings: &ComputeSettings) -> Result<Output> {
    let (plan, y0) = prepare(settings)?;
    let pool = build_pool(settings.threads)?;

    let started = Instant::now();
    let results = pool.install(|| {
        fan_out(&Method::ALL, |&method| {
            integrate_one(method, &plan, &y0).map(|traj| poincare_section(&traj))
        })
    });
    let sections = collect_results(results)?;
    info!("Poincaré sections finished in {:.3?}.", started.elapsed());

    Ok(Output {
        plan,
        initial_state: y0,
        hamiltonians: None,
        sections: Some(sections),
    })
}

/// Phase one: the four integrations, concurrently on the current rayon pool.
/// Returns the first error in [`Method::ALL`] order if any task fails.
pub fn integrate_all(plan: &StepPlan, y0: &State) -> Result<[Trajectory; 4]> {
    collect_results(fan_out(&Method::ALL, |&method| {
        integrate_one(method, plan, y0)
    }))
}

/// Phase two: eight read-only diagnostic tasks over the phase-one output.
pub fn diagnose_all(
    trajectories: &[Trajectory; 4],
) -> ([HamiltonianSeries; 4], [PoincareSection; 4]) {
    rayon::join(
        || fan_out(trajectories, hamiltonian_series),
        || fan_out(trajectories, poincare_section),
    )
}

fn prepare(settings: &ComputeSettings) -> Result<(StepPlan, State)> {
    let (plan, y0) = settings.validate()?;
    info!(
        "Planned {} micro-steps ({} stored, stride {}, last step {}) from t = {} to {}.",
        plan.n, plan.m, plan.stride, plan.last_step, plan.t0, plan.t_end
    );
    Ok((plan, y0))
}

fn build_pool(threads: usize) -> Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("henon-worker-{i}"))
        .build()
        .map_err(|e| HenonError::ThreadPool(e.to_string()))
}

fn integrate_one(method: Method, plan: &StepPlan, y0: &State) -> Result<Trajectory> {
    let started = Instant::now();
    let traj = method.integrate_plan(plan, y0)?;
    debug!(
        "{method}: {} samples in {:.3?}.",
        traj.len(),
        started.elapsed()
    );
    Ok(traj)
}

/// Applies `f` to each of four items as four rayon tasks and waits for all.
fn fan_out<T, R, F>(items: &[T; 4], f: F) -> [R; 4]
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync,
{
    let ((a, b), (c, d)) = rayon::join(
        || rayon::join(|| f(&items[0]), || f(&items[1])),
        || rayon::join(|| f(&items[2]), || f(&items[3])),
    );
    [a, b, c, d]
}

fn collect_results<R>(results: [Result<R>; 4]) -> Result<[R; 4]> {
    let [a, b, c, d] = results;
    Ok([a?, b?, c?, d?])
}

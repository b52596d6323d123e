use henon_core::compute::{compute, compute_both, integrate_all, ComputeSettings, Mode};
use henon_core::hamiltonian::hamiltonian_series;
use henon_core::poincare::poincare_section;
use henon_core::trajectory::Method;
use henon_core::HenonError;

fn settings(threads: usize) -> ComputeSettings {
    ComputeSettings {
        t0: 0.0,
        t_end: 150.0,
        h: 0.05,
        threads,
        ..ComputeSettings::default()
    }
}

#[test]
fn results_are_bit_identical_across_pool_sizes() {
    let baseline = compute_both(&settings(1)).expect("single worker run");
    for threads in [1, 2, 3, 8] {
        let again = compute_both(&settings(threads)).expect("parallel run");
        assert_eq!(again, baseline, "threads = {threads}");
    }
}

#[test]
fn orchestrated_results_match_sequential_evaluation() {
    let settings = settings(4);
    let output = compute(&settings, Mode::Both).expect("run should succeed");
    let plan = settings.plan().expect("valid plan");
    let y0 = settings.initial_state().expect("valid energy");

    let table = output.hamiltonians.expect("table present");
    let sections = output.sections.expect("sections present");
    assert_eq!(table.times(), plan.sample_times().as_slice());
    assert_eq!(output.initial_state, y0);

    for method in Method::ALL {
        let traj = method.integrate_plan(&plan, &y0).expect("sequential run");
        assert_eq!(table.column(method), &hamiltonian_series(&traj));
        assert_eq!(&sections[method.index()], &poincare_section(&traj));
    }
}

#[test]
fn table_rows_start_at_initial_energy_and_end_at_t_end() {
    let output = compute_both(&settings(2)).expect("run should succeed");
    let table = output.hamiltonians.expect("table present");
    let rows: Vec<[f64; 5]> = table.rows().collect();
    assert_eq!(rows.len(), output.plan.m);
    let first = rows[0];
    assert_eq!(first[0], 0.0);
    for value in &first[1..] {
        assert!((value - 1.0 / 12.0).abs() < 1e-15);
    }
    assert_eq!(rows[rows.len() - 1][0], 150.0);
}

#[test]
fn stride_reduces_table_but_keeps_endpoints() {
    let strided = ComputeSettings {
        stride: 10,
        ..settings(2)
    };
    let full = compute_both(&settings(2)).expect("full run");
    let thinned = compute_both(&strided).expect("strided run");
    let full_table = full.hamiltonians.expect("table present");
    let thin_table = thinned.hamiltonians.expect("table present");

    assert_eq!(thin_table.len(), thinned.plan.m);
    assert!(thin_table.len() < full_table.len() / 5);
    assert_eq!(thin_table.times().first(), full_table.times().first());
    assert_eq!(thin_table.times().last(), full_table.times().last());
    for method in Method::ALL {
        assert_eq!(
            thin_table.column(method).values().last(),
            full_table.column(method).values().last()
        );
    }
}

#[test]
fn integrate_all_runs_outside_a_dedicated_pool() {
    let settings = settings(0);
    let plan = settings.plan().expect("valid plan");
    let y0 = settings.initial_state().expect("valid energy");
    let trajectories = integrate_all(&plan, &y0).expect("integration should succeed");
    for (traj, method) in trajectories.iter().zip(Method::ALL) {
        assert_eq!(traj.method(), method);
        assert_eq!(traj.len(), plan.m);
    }
}

#[test]
fn failures_abort_the_whole_run() {
    let too_low = ComputeSettings {
        energy: -1.0,
        ..settings(2)
    };
    for mode in [Mode::Both, Mode::Hamiltonians, Mode::Poincare] {
        assert!(matches!(
            compute(&too_low, mode),
            Err(HenonError::InvalidInitialCondition { .. })
        ));
    }

    let backwards = ComputeSettings {
        t0: 10.0,
        t_end: 5.0,
        ..settings(2)
    };
    assert!(matches!(
        compute(&backwards, Mode::Both),
        Err(HenonError::InvalidStepPlan(_))
    ));
}

#[test]
fn errors_raised_inside_integration_tasks_are_returned() {
    // Far above the escape energy the orbit leaves the bounded region and the
    // explicit schemes overflow within a few time units.
    let escaping = ComputeSettings {
        t_end: 20.0,
        energy: 10.0,
        ..settings(4)
    };
    assert!(escaping.validate().is_ok());
    for mode in [Mode::Both, Mode::Hamiltonians, Mode::Poincare] {
        let result = compute(&escaping, mode);
        assert!(
            matches!(result, Err(HenonError::NonFiniteState { method: "rk4", .. })),
            "{mode:?}: {result:?}"
        );
    }
}

#[test]
fn tolerance_that_breaks_the_endpoint_is_rejected_before_integration() {
    for remainder_tolerance in [0.0, 0.2] {
        let bad = ComputeSettings {
            remainder_tolerance,
            ..settings(2)
        };
        assert!(matches!(
            compute(&bad, Mode::Both),
            Err(HenonError::InvalidStepPlan(_))
        ));
    }
}

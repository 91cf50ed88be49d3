//! End-to-end runs through the facade.

use tempora::feasibility::{Request, RequestSet};
use tempora::{AcceptorKind, CriterionConfig, FeasibilityChecker, SolverConfig};
use tempora_test::enrollment::{sections, Enrollment};
use tempora_test::timetable::TimetableBuilder;

#[test]
fn test_solve_from_toml() {
    let config = SolverConfig::from_toml_str(
        r#"
        random_seed = 17

        [resolver]
        max_attempts = 4
        time_limit_ms = 500

        [search]
        max_iterations = 800
        acceptor = "late_acceptance"
        late_acceptance_size = 20
        threads = 3
        "#,
    )
    .unwrap();
    assert_eq!(config.search.acceptor, AcceptorKind::LateAcceptance);

    let model = TimetableBuilder::new(6, 3, 2).same_time_penalty(0.25).build();
    let outcome = tempora::solve(&model, &config).unwrap();

    assert_eq!(outcome.results.len(), 3);
    assert_eq!(outcome.result().unassigned, 0);
    for value in outcome.best.assigned_values() {
        assert!(!model.in_conflict(&outcome.best, value));
    }
    // six lectures fill the grid: costs 0+0+1+1+2+2, one same-time pair per time
    assert!((outcome.result().best_value - 6.75).abs() < 1e-9);
}

#[test]
fn test_invalid_config_is_reported() {
    let config = SolverConfig::new().with_criterion(CriterionConfig::new(""));
    let model = TimetableBuilder::new(1, 1, 1).build();
    assert!(tempora::solve(&model, &config).is_err());
}

#[test]
fn test_feasibility_through_facade() {
    let mut enrollment = Enrollment::new();
    let math = enrollment.course("Math", &[1]);
    let physics = enrollment.course("Physics", &[1]);
    let model = enrollment.build();
    let requests = RequestSet::new()
        .with(Request::course(1, "Math", sections(&model, math)))
        .with(Request::course(2, "Physics", sections(&model, physics)));

    let checker = FeasibilityChecker::new(&model);
    assert!(!checker.check(&requests).complete);
    assert_eq!(checker.no_good(&requests), vec![1, 2]);
}

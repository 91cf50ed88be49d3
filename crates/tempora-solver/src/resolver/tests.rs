//! Tests for the swap resolver.

use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tempora_core::VariableId;
use tempora_test::timetable::{place, slot, Slot, TimetableBuilder};

use super::*;
use crate::neighbour::Neighbour;

fn resolver(configure: impl FnOnce(&mut ResolverConfig)) -> SwapResolver {
    let mut config = ResolverConfig {
        time_limit_ms: 1_000,
        ..ResolverConfig::default()
    };
    configure(&mut config);
    SwapResolver::new(config)
}

fn rng() -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(7)
}

#[test]
fn test_move_without_conflicts_is_accepted_immediately() {
    let model = TimetableBuilder::new(2, 2, 1).build();
    let mut assignment = Assignment::new(&model);
    place(&model, &mut assignment, &[(0, 0, 0)]);
    let before = assignment.snapshot();

    let target = slot(&model, 0, 1, 0);
    let resolution = resolver(|_| {}).resolve(&model, &mut assignment, &target, 1, &mut rng());

    let neighbour = resolution.neighbour.unwrap();
    // cost(B) - cost(A), accepted although it worsens
    assert_eq!(neighbour.delta(), 1.0);
    assert_eq!(neighbour.values(), &[target]);
    assert_eq!(resolution.stats.attempts, 0);
    assert_eq!(assignment.snapshot(), before);
}

#[test]
fn test_prohibited_target_is_rejected_untouched() {
    let model = TimetableBuilder::new(2, 2, 1).close(0, 0).build();
    let mut assignment = Assignment::new(&model);
    place(&model, &mut assignment, &[(0, 1, 0)]);
    let before = assignment.snapshot();
    let iteration = assignment.iteration(VariableId::new(0));

    let resolution =
        resolver(|_| {}).resolve(&model, &mut assignment, &slot(&model, 0, 0, 0), 5, &mut rng());
    assert!(resolution.neighbour.is_none());
    assert_eq!(resolution.stats.attempts, 0);
    assert_eq!(resolution.stats.displaced, 0);
    assert_eq!(assignment.snapshot(), before);
    assert_eq!(assignment.iteration(VariableId::new(0)), iteration);
}

#[test]
fn test_cascade_skips_prohibited_alternatives() {
    // L1 can only leave (0, 0) for (1, 0), which is closed
    let model = TimetableBuilder::new(2, 2, 1).close(1, 0).build();
    let mut assignment = Assignment::new(&model);
    place(&model, &mut assignment, &[(1, 0, 0)]);

    let resolution =
        resolver(|_| {}).resolve(&model, &mut assignment, &slot(&model, 0, 0, 0), 1, &mut rng());
    assert!(resolution.neighbour.is_none());
    assert_eq!(resolution.stats.attempts, 1);
}

#[test]
fn test_one_level_cascade() {
    let model = TimetableBuilder::new(2, 2, 1).cost(1, 1, 0, 0.5).build();
    let mut assignment = Assignment::new(&model);
    place(&model, &mut assignment, &[(0, 1, 0), (1, 0, 0)]);
    let before = assignment.snapshot();
    let total = model.total_value(&assignment);

    let target = slot(&model, 0, 0, 0);
    let resolution = resolver(|_| {}).resolve(&model, &mut assignment, &target, 1, &mut rng());
    assert_eq!(assignment.snapshot(), before);

    let neighbour = resolution.neighbour.unwrap();
    // (0 - 1) for L0 plus (0.5 - 0) for L1
    assert_eq!(neighbour.delta(), -0.5);
    assert_eq!(neighbour.values(), &[target.clone(), slot(&model, 1, 1, 0)]);
    assert_eq!(neighbour.cascade_len(), 1);
    assert_eq!(resolution.stats.attempts, 1);
    assert_eq!(resolution.stats.displaced, 1);

    neighbour.commit(&model, &mut assignment, 2);
    assert_eq!(assignment.value(VariableId::new(0)), Some(&target));
    assert_eq!(assignment.value(VariableId::new(1)), Some(&slot(&model, 1, 1, 0)));
    assert_eq!(model.total_value(&assignment), total - 0.5);
}

#[test]
fn test_zero_attempts_forbid_any_cascade() {
    let model = TimetableBuilder::new(2, 2, 1).cost(1, 1, 0, 0.5).build();
    let mut assignment = Assignment::new(&model);
    place(&model, &mut assignment, &[(0, 1, 0), (1, 0, 0)]);
    let before = assignment.snapshot();

    let resolution = resolver(|c| c.max_attempts = 0).resolve(
        &model,
        &mut assignment,
        &slot(&model, 0, 0, 0),
        1,
        &mut rng(),
    );

    assert!(resolution.neighbour.is_none());
    assert!(resolution.stats.exhausted);
    assert_eq!(assignment.snapshot(), before);
}

#[test]
fn test_hill_climbing_rejects_worsening_cascade() {
    let model = TimetableBuilder::new(2, 2, 1).cost(1, 1, 0, 3.0).build();
    let mut assignment = Assignment::new(&model);
    place(&model, &mut assignment, &[(0, 1, 0), (1, 0, 0)]);
    let target = slot(&model, 0, 0, 0);

    let climbing = resolver(|_| {}).resolve(&model, &mut assignment, &target, 1, &mut rng());
    assert!(climbing.neighbour.is_none());
    assert!(!climbing.stats.exhausted);

    let open = resolver(|c| c.hill_climbing = false).resolve(
        &model,
        &mut assignment,
        &target,
        1,
        &mut rng(),
    );
    assert_eq!(open.neighbour.unwrap().delta(), 2.0);
}

#[test]
fn test_max_preference_prunes_alternatives() {
    let model = TimetableBuilder::new(2, 1, 2).build();
    let mut assignment = Assignment::new(&model);
    place(&model, &mut assignment, &[(0, 0, 1), (1, 0, 0)]);
    let target = slot(&model, 0, 0, 0);

    // the only alternative for L1 is room 1, preference 1
    let strict = resolver(|c| c.max_preference = Some(0.5));
    assert!(strict
        .resolve(&model, &mut assignment, &target, 1, &mut rng())
        .neighbour
        .is_none());

    let relaxed = resolver(|_| {}).resolve(&model, &mut assignment, &target, 1, &mut rng());
    assert_eq!(relaxed.neighbour.unwrap().delta(), 0.0);
}

#[test]
fn test_multi_resource_values_are_not_displaced() {
    let model = TimetableBuilder::new(2, 2, 1).wide(1).build();
    let mut assignment = Assignment::new(&model);
    place(&model, &mut assignment, &[(0, 1, 0), (1, 0, 0)]);
    let before = assignment.snapshot();

    let resolution = resolver(|_| {}).resolve(
        &model,
        &mut assignment,
        &slot(&model, 0, 0, 0),
        1,
        &mut rng(),
    );
    assert!(resolution.neighbour.is_none());
    assert_eq!(assignment.snapshot(), before);
}

#[test]
fn test_moved_variable_may_be_multi_resource() {
    let model = TimetableBuilder::new(2, 2, 1).wide(0).build();
    let mut assignment = Assignment::new(&model);
    place(&model, &mut assignment, &[(0, 1, 0), (1, 0, 0)]);

    let resolution = resolver(|_| {}).resolve(
        &model,
        &mut assignment,
        &slot(&model, 0, 0, 0),
        1,
        &mut rng(),
    );
    assert!(resolution.neighbour.is_some());
}

#[test]
fn test_displaced_variable_without_free_alternative_fails() {
    let model = TimetableBuilder::new(3, 2, 1).build();
    let mut assignment = Assignment::new(&model);
    place(&model, &mut assignment, &[(0, 1, 0), (1, 0, 0)]);
    let before = assignment.snapshot();

    // L1 could only move to time 1, which L0 holds
    let resolution = resolver(|_| {}).resolve(
        &model,
        &mut assignment,
        &slot(&model, 2, 0, 0),
        1,
        &mut rng(),
    );
    assert!(resolution.neighbour.is_none());
    assert!(!resolution.stats.exhausted);
    assert!(!assignment.is_assigned(VariableId::new(2)));
    assert_eq!(assignment.snapshot(), before);
}

#[test]
fn test_expired_time_limit_aborts() {
    let model = TimetableBuilder::new(2, 2, 1).build();
    let mut assignment = Assignment::new(&model);
    place(&model, &mut assignment, &[(0, 1, 0), (1, 0, 0)]);

    let resolution = resolver(|c| c.time_limit_ms = 0).resolve(
        &model,
        &mut assignment,
        &slot(&model, 0, 0, 0),
        1,
        &mut rng(),
    );
    assert!(resolution.neighbour.is_none());
    assert!(resolution.stats.exhausted);
}

#[test]
fn test_complete_cascade_counts_at_the_deadline() {
    let model = TimetableBuilder::new(1, 1, 1).build();
    let mut assignment = Assignment::new(&model);
    let mut search = Search {
        attempts: 0,
        deadline: Instant::now(),
        exhausted: false,
    };
    let mut chosen = Vec::new();

    let found = resolver(|_| {}).resolve_from(
        &model,
        &mut assignment,
        &[],
        0,
        0.0,
        1,
        &mut search,
        &mut chosen,
        &mut rng(),
    );
    assert_eq!(found, Some(0.0));
    assert!(!search.exhausted);
    assert!(chosen.is_empty());
}

#[test]
fn test_context_state_survives_failed_resolution() {
    let model = TimetableBuilder::new(3, 2, 1).same_time_penalty(1.0).build();
    let mut assignment = Assignment::new(&model);
    place(&model, &mut assignment, &[(0, 1, 0), (1, 0, 0)]);
    let total = model.total_value(&assignment);

    let _ = resolver(|_| {}).resolve(
        &model,
        &mut assignment,
        &slot(&model, 2, 0, 0),
        1,
        &mut rng(),
    );

    assert_eq!(model.total_value(&assignment), total);
    assert!(model.in_conflict(&assignment, &slot(&model, 2, 1, 0)));
    for (handle, criterion) in model.criteria_with_handles() {
        let running = model.criterion_summary(&assignment, handle).unwrap().value;
        assert_eq!(running, criterion.compute_total(&assignment));
    }
}

const LECTURES: usize = 5;
const TIMES: u32 = 3;
const ROOMS: u32 = 2;

fn pick(model: &Model<Slot>, lecture: usize, index: usize) -> ValueRef<Slot> {
    let domain = model.values_of(VariableId::new(lecture));
    domain[index % domain.len()].clone()
}

proptest! {
    #[test]
    fn resolution_leaves_assignment_untouched(
        setup in prop::collection::vec((0..LECTURES, 0..6usize), 0..12),
        lecture in 0..LECTURES,
        index in 0..6usize,
        max_attempts in 0..4usize,
        hill_climbing in any::<bool>(),
        seed in any::<u64>(),
    ) {
        let model = TimetableBuilder::new(LECTURES, TIMES, ROOMS)
            .cost(2, 0, 1, 4.0)
            .same_time_penalty(0.5)
            .build();
        let mut assignment = Assignment::new(&model);
        for (i, &(l, v)) in setup.iter().enumerate() {
            model.commit(&mut assignment, i as u64, pick(&model, l, v));
        }
        let before = assignment.snapshot();
        let total = model.total_value(&assignment);

        let resolver = SwapResolver::new(ResolverConfig {
            max_attempts,
            hill_climbing,
            time_limit_ms: 1_000,
            ..ResolverConfig::default()
        });
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let resolution = resolver.resolve(&model, &mut assignment, &pick(&model, lecture, index), 50, &mut rng);

        prop_assert_eq!(assignment.snapshot(), before);
        prop_assert!((model.total_value(&assignment) - total).abs() < 1e-9);

        if let Some(neighbour) = resolution.neighbour {
            if hill_climbing && neighbour.cascade_len() > 0 {
                prop_assert!(neighbour.delta() <= 0.0);
            }
            neighbour.commit(&model, &mut assignment, 51);
            let after = model.total_value(&assignment);
            prop_assert!((after - total - neighbour.delta()).abs() < 1e-9);
            for value in neighbour.values() {
                prop_assert_eq!(assignment.value(value.variable()), Some(value));
            }
            for value in assignment.assigned_values() {
                prop_assert!(!model.in_conflict(&assignment, value));
            }
        }
    }
}

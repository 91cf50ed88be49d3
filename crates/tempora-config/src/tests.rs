//! Tests for solver configuration.

use super::*;

#[test]
fn test_toml_parsing() {
    let toml = r#"
        random_seed = 42

        [resolver]
        max_attempts = 8
        time_limit_ms = 40
        hill_climbing = false
        max_preference = 2.0

        [search]
        max_iterations = 1000
        time_limit_ms = 5000
        acceptor = "late_acceptance"
        late_acceptance_size = 50
        threads = 4

        [feasibility]
        node_limit = 100000

        [[criteria]]
        name = "TimePreferences"
        weight = 3.0
        update = "after_unassigned_after_assigned"

        [[criteria]]
        name = "StudentConflicts"
    "#;

    let config = SolverConfig::from_toml_str(toml).unwrap();
    assert_eq!(config.random_seed, Some(42));
    assert_eq!(config.resolver.max_attempts, 8);
    assert_eq!(config.resolver.time_limit(), Duration::from_millis(40));
    assert!(!config.resolver.hill_climbing);
    assert_eq!(config.resolver.max_preference, Some(2.0));
    assert_eq!(config.search.max_iterations, Some(1000));
    assert_eq!(config.search.time_limit(), Some(Duration::from_secs(5)));
    assert_eq!(config.search.acceptor, AcceptorKind::LateAcceptance);
    assert_eq!(config.search.late_acceptance_size, 50);
    assert_eq!(config.search.threads, 4);
    assert_eq!(config.feasibility.node_limit, Some(100000));
    assert_eq!(config.feasibility.time_limit(), None);
    assert_eq!(config.criteria.len(), 2);
    assert_eq!(
        config.criterion("TimePreferences").unwrap().update,
        Some(ValueUpdate::AfterUnassignedAfterAssigned)
    );
    assert_eq!(config.criterion("StudentConflicts").unwrap().weight, None);
}

#[test]
fn test_yaml_parsing() {
    let yaml = r#"
        random_seed: 42
        resolver:
          max_attempts: 2
        search:
          acceptor: hill_climbing
        criteria:
          - name: RoomPreferences
            weight: 0.5
    "#;

    let config = SolverConfig::from_yaml_str(yaml).unwrap();
    assert_eq!(config.random_seed, Some(42));
    assert_eq!(config.resolver.max_attempts, 2);
    assert_eq!(config.resolver.time_limit_ms, ResolverConfig::DEFAULT_TIME_LIMIT_MS);
    assert_eq!(config.search.acceptor, AcceptorKind::HillClimbing);
    assert_eq!(config.criteria[0].weight, Some(0.5));
}

#[test]
fn test_defaults() {
    let config = SolverConfig::from_toml_str("").unwrap();
    assert_eq!(config.random_seed, None);
    assert_eq!(config.resolver, ResolverConfig::default());
    assert_eq!(config.search, SearchConfig::default());
    assert_eq!(config.search.threads, 1);
    assert!(config.criteria.is_empty());
}

#[test]
fn test_builder() {
    let config = SolverConfig::new()
        .with_random_seed(123)
        .with_resolver(ResolverConfig {
            max_attempts: 0,
            ..ResolverConfig::default()
        })
        .with_criterion(CriterionConfig::new("TimePreferences").with_weight(2.0));

    assert_eq!(config.random_seed, Some(123));
    assert_eq!(config.resolver.max_attempts, 0);
    assert_eq!(config.criterion("TimePreferences").unwrap().weight, Some(2.0));
}

#[test]
fn test_zero_sizes_fall_back_to_defaults() {
    let config = SolverConfig::from_toml_str(
        "[search]\nthreads = 0\nacceptor = \"late_acceptance\"\nlate_acceptance_size = 0",
    )
    .unwrap();
    assert_eq!(config.search.threads, SearchConfig::DEFAULT_THREADS);
    assert_eq!(config.search.late_acceptance_size, 400);

    let config = SolverConfig::from_yaml_str("search:\n  threads: 0\n").unwrap();
    assert_eq!(config.search.threads, 1);
}

#[test]
fn test_invalid_values_are_rejected() {
    let err = SolverConfig::from_toml_str("[[criteria]]\nname = \"\"").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn test_parse_errors_are_typed() {
    let err = SolverConfig::from_toml_str("random_seed = \"many\"").unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)));

    let err = SolverConfig::from_yaml_str("resolver: [1, 2").unwrap_err();
    assert!(matches!(err, ConfigError::Yaml(_)));

    let err = SolverConfig::load("/nonexistent/tempora.toml").unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn test_properties_fall_back_on_bad_input() {
    let properties: Properties = [
        ("Swap.MaxAttempts", "lots"),
        ("Swap.TimeLimit", " 25 "),
        ("Swap.HillClimbing", "maybe"),
        ("Swap.MaxPreference", "1.5"),
    ]
    .into_iter()
    .collect();

    let resolver = ResolverConfig::from_properties(&properties);
    assert_eq!(resolver.max_attempts, ResolverConfig::DEFAULT_MAX_ATTEMPTS);
    assert_eq!(resolver.time_limit_ms, 25);
    assert!(resolver.hill_climbing);
    assert_eq!(resolver.max_preference, Some(1.5));
}

#[test]
fn test_properties_typed_getters() {
    let mut properties = Properties::new();
    properties.set("A.Weight", "0.25");
    properties.set("Flag", "Off");
    properties.set("Count", "-3");

    assert_eq!(properties.get_f64("A.Weight", 1.0), 0.25);
    assert!(!properties.get_bool("Flag", true));
    assert_eq!(properties.get_u64("Count", 9), 9);
    assert_eq!(properties.get_opt_f64("Missing"), None);
    assert_eq!(properties.get_str("Flag"), Some("Off"));
    assert_eq!(properties.len(), 3);

    assert_eq!(properties.remove("Flag").as_deref(), Some("Off"));
    assert!(!properties.contains("Flag"));
}

#[test]
fn test_properties_deserialize_as_map() {
    let properties: Properties = toml::from_str("\"Swap.MaxAttempts\" = \"4\"").unwrap();
    assert_eq!(ResolverConfig::from_properties(&properties).max_attempts, 4);
}

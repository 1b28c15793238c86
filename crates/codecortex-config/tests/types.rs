use codecortex_common::Validatable;
use codecortex_config::*;

#[test]
fn test_app_config_default() {
    let config = AppConfig::default();
    assert_eq!(config.orchestrator.max_concurrent_requests, 10);
    assert_eq!(config.orchestrator.request_timeout_ms, 30_000);
    assert_eq!(config.orchestrator.retry_attempts, 3);
    assert_eq!(config.orchestrator.quality_threshold, 0.7);
    assert_eq!(config.orchestrator.max_response_time_ms, 200);
    assert_eq!(config.ranking.max_suggestions, 20);
    assert_eq!(config.gateway.backoff.base_delay_ms, 1000);
    assert_eq!(config.gateway.backoff.max_delay_ms, 30_000);
}

#[test]
fn test_default_weights_sum_to_one() {
    let weights = RankingWeights::default();
    assert!((weights.total() - 1.0).abs() < 1e-9);
}

#[test]
fn test_config_validation() {
    let manager = ConfigManager::new();
    let mut config = AppConfig::default();
    assert!(manager.validate_config(&config).is_ok());

    config.orchestrator.quality_threshold = 1.5;
    assert!(manager.validate_config(&config).is_err());

    let mut config = AppConfig::default();
    config.ranking.weights = RankingWeights {
        context_match: 0.0,
        usage_frequency: 0.0,
        recency: 0.0,
        type_compatibility: 0.0,
        scope_proximity: 0.0,
        pattern_match: 0.0,
        user_preference: 0.0,
        semantic: 0.0,
    };
    assert!(!config.is_valid());

    let mut config = AppConfig::default();
    config.orchestrator.tuner.max_concurrency = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_save_and_load_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = AppConfig::default();
    config.orchestrator.max_concurrent_requests = 4;
    config.orchestrator.fallback_strategy = FallbackStrategy::BestEffort;
    config.ranking.max_suggestions = 5;

    let mut manager = ConfigManager::with_path(path.clone())
        .with_env_prefix("CODECORTEX_TEST_ROUNDTRIP");
    manager.save_config(&config).unwrap();
    assert!(path.exists());

    let loaded = manager.load_config().unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_partial_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "[orchestrator]\nquality_threshold = 0.5\nfallback_strategy = \"fail-fast\"\n",
    )
    .unwrap();

    let mut manager = ConfigManager::with_path(path).with_env_prefix("CODECORTEX_TEST_PARTIAL");
    let loaded = manager.load_config().unwrap();

    assert_eq!(loaded.orchestrator.quality_threshold, 0.5);
    assert_eq!(loaded.orchestrator.fallback_strategy, FallbackStrategy::FailFast);
    assert_eq!(loaded.orchestrator.max_concurrent_requests, 10);
    assert_eq!(loaded.ranking, RankingConfig::default());
}

#[test]
fn test_environment_overrides_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "[orchestrator]\nmax_concurrent_requests = 8\nfallback_strategy = \"fail-fast\"\nretry_attempts = 2\n",
    )
    .unwrap();

    let concurrency = "CODECORTEX_TEST_ENV__ORCHESTRATOR__MAX_CONCURRENT_REQUESTS";
    let strategy = "CODECORTEX_TEST_ENV__ORCHESTRATOR__FALLBACK_STRATEGY";
    std::env::set_var(concurrency, "4");
    std::env::set_var(strategy, "best-effort");

    let mut manager = ConfigManager::with_path(path).with_env_prefix("CODECORTEX_TEST_ENV");
    let loaded = manager.load_config();

    std::env::remove_var(concurrency);
    std::env::remove_var(strategy);

    let loaded = loaded.unwrap();
    assert_eq!(loaded.orchestrator.max_concurrent_requests, 4);
    assert_eq!(loaded.orchestrator.fallback_strategy, FallbackStrategy::BestEffort);
    assert_eq!(loaded.orchestrator.retry_attempts, 2);
}

#[test]
fn test_missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = ConfigManager::with_path(dir.path().join("absent.toml"))
        .with_env_prefix("CODECORTEX_TEST_MISSING");
    assert_eq!(manager.load_config().unwrap(), AppConfig::default());
}

#[test]
fn test_invalid_file_is_rejected_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[ranking]\nmax_suggestions = 0\n").unwrap();

    let mut manager = ConfigManager::with_path(path).with_env_prefix("CODECORTEX_TEST_INVALID");
    assert!(matches!(
        manager.load_config(),
        Err(ConfigError::Validation(_))
    ));
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    fn weights(values: [f64; 8]) -> RankingWeights {
        RankingWeights {
            context_match: values[0],
            usage_frequency: values[1],
            recency: values[2],
            type_compatibility: values[3],
            scope_proximity: values[4],
            pattern_match: values[5],
            user_preference: values[6],
            semantic: values[7],
        }
    }

    proptest! {
        /// Any non-negative weight vector with a positive sum is accepted
        #[test]
        fn prop_non_negative_weights_validate(
            values in prop::array::uniform8(0.0f64..1.0),
            boost in 0.01f64..1.0,
        ) {
            let mut values = values;
            values[0] += boost;
            let mut config = AppConfig::default();
            config.ranking.weights = weights(values);
            prop_assert!(config.validate().is_ok());
        }

        /// A single negative weight always fails validation
        #[test]
        fn prop_negative_weight_rejected(
            index in 0usize..8,
            negative in -10.0f64..-0.001,
        ) {
            let mut values = [0.125; 8];
            values[index] = negative;
            let mut config = AppConfig::default();
            config.ranking.weights = weights(values);
            prop_assert!(config.validate().is_err());
        }

        /// Quality threshold must stay within the unit interval
        #[test]
        fn prop_quality_threshold_range(threshold in -2.0f64..3.0) {
            let mut config = AppConfig::default();
            config.orchestrator.quality_threshold = threshold;
            prop_assert_eq!(
                config.validate().is_ok(),
                (0.0..=1.0).contains(&threshold)
            );
        }
    }
}

#[test]
fn test_logging_level_is_validated() {
    let mut config = AppConfig::default();
    assert_eq!(
        config.logging.log_options().level,
        Some(codecortex_common::LogLevel::Info)
    );

    config.logging.level = "verbose".to_string();
    assert!(config.validate().is_err());

    config.logging.level = "  ".to_string();
    assert!(config.validate().is_err());

    config.logging.level = "WARN".to_string();
    assert!(config.validate().is_ok());
}

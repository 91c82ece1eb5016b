//! Configuration loading from disk
//!
//! Covers the three loading phases (read, parse, validate), the error
//! context each phase preserves, and the template written by `pentamind config`.

use pentamind::cli::generate_config_template;
use pentamind::config::Config;
use pentamind::error::AppError;
use pentamind::providers::ProviderRegistry;
use pentamind::router::{BackendId, Task};
use std::error::Error;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

const MINIMAL_CONFIG: &str = r#"
[server]
host = "127.0.0.1"
port = 8000

[providers.local]
kind = "openai_compatible"
base_url = "http://localhost:1234/v1"
api_key_env = "PENTAMIND_TEST_UNSET_LOCAL_KEY"

[[backends]]
id = "small"
provider = "local"
model = "small-model"
cost_tier = "low"

[[backends]]
id = "large"
provider = "local"
model = "large-model"
cost_tier = "high"

[routing]
classifier = "small"
fallback = "large"
synthesis = "large"

[routing.tasks]
solve = "large"
code = "large"
"#;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("should create temp file");
    file.write_all(content.as_bytes())
        .expect("should write temp config");
    file
}

#[test]
fn test_from_file_loads_minimal_config_with_defaults() {
    let file = write_config(MINIMAL_CONFIG);
    let config = Config::from_file(file.path()).expect("minimal config should load");

    assert_eq!(config.backends.len(), 2);
    assert_eq!(config.routing.long_context_threshold_chars, 10_000);
    assert!(config.routing.long_context_tiers.is_empty());
    assert!(config.search.is_none());
    assert_eq!(config.timeouts.standard(), Duration::from_secs(60));
    assert_eq!(config.observability.log_level, "info");
    assert_eq!(
        config.routing.tasks.get(&Task::Solve),
        Some(&BackendId::from("large"))
    );
    assert!(config.routing.tasks.get(&Task::Research).is_none());
}

#[test]
fn test_from_file_loads_generated_template() {
    let file = write_config(generate_config_template());
    let config = Config::from_file(file.path()).expect("template should load");

    assert_eq!(config.backends.len(), 5);
    assert_eq!(config.routing.tasks.len(), Task::ALL.len());
    assert_eq!(config.routing.long_context_tiers.len(), 2);
    assert_eq!(config.search.as_ref().map(|s| s.max_results()), Some(5));
}

#[test]
fn test_missing_file_preserves_io_error_and_path() {
    let err = Config::from_file("/nonexistent/path/to/pentamind.toml").unwrap_err();

    assert!(matches!(err, AppError::ConfigFileRead { .. }));
    assert!(err.to_string().contains("/nonexistent/path/to/pentamind.toml"));
    let source = err.source().expect("should carry the io error");
    assert!(source.is::<std::io::Error>());
}

#[test]
fn test_invalid_toml_preserves_parse_error_and_path() {
    let file = write_config("this is [[[[ not valid toml");
    let err = Config::from_file(file.path()).unwrap_err();

    assert!(matches!(err, AppError::ConfigParseFailed { .. }));
    assert!(err.to_string().contains(&file.path().display().to_string()));
    let source = err.source().expect("should carry the toml error");
    assert!(source.is::<toml::de::Error>());
}

#[test]
fn test_unknown_backend_reference_fails_validation_with_path() {
    let content = MINIMAL_CONFIG.replace("fallback = \"large\"", "fallback = \"missing\"");
    let file = write_config(&content);
    let err = Config::from_file(file.path()).unwrap_err();

    match &err {
        AppError::ConfigValidationFailed { path, reason } => {
            assert_eq!(path, &file.path().display().to_string());
            assert!(reason.contains("routing.fallback"), "got: {}", reason);
            assert!(reason.contains("missing"), "got: {}", reason);
        }
        other => panic!("expected ConfigValidationFailed, got {:?}", other),
    }
}

#[test]
fn test_unknown_task_name_is_a_parse_error() {
    let content = MINIMAL_CONFIG.replace("code = \"large\"", "translate = \"large\"");
    let file = write_config(&content);
    let err = Config::from_file(file.path()).unwrap_err();
    assert!(matches!(err, AppError::ConfigParseFailed { .. }), "got {:?}", err);
}

#[test]
fn test_out_of_range_timeout_is_rejected_while_parsing() {
    let content = format!("{}\n[timeouts]\nstandard = 301\n", MINIMAL_CONFIG);
    let file = write_config(&content);
    let err = Config::from_file(file.path()).unwrap_err();

    assert!(matches!(err, AppError::ConfigParseFailed { .. }), "got {:?}", err);
    assert!(err.source().is_some_and(|s| s.to_string().contains("300")));
}

#[test]
fn test_search_max_results_range_is_validated() {
    let content = format!("{}\n[search]\nmax_results = 0\n", MINIMAL_CONFIG);
    let file = write_config(&content);
    let err = Config::from_file(file.path()).unwrap_err();
    assert!(matches!(err, AppError::ConfigValidationFailed { .. }), "got {:?}", err);
}

#[test]
fn test_duplicate_backend_ids_are_rejected() {
    let content = MINIMAL_CONFIG.replace("id = \"large\"", "id = \"small\"");
    let file = write_config(&content);
    assert!(Config::from_file(file.path()).is_err());
}

#[test]
fn test_unset_credentials_are_recorded_not_fatal() {
    let file = write_config(MINIMAL_CONFIG);
    let config = Config::from_file(file.path()).unwrap();
    let registry = ProviderRegistry::from_config(&config);

    assert!(!registry.has_provider("local"));
    assert_eq!(
        registry.missing_env_var("local"),
        Some("PENTAMIND_TEST_UNSET_LOCAL_KEY")
    );
    assert!(registry.search().is_err());
}

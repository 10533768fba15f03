use codejudge::{Config, LanguageRegistry};

use super::{fixture_path, shell_config};

#[test]
fn test_load_shell_fixture() {
    let config = shell_config();

    assert_eq!(config.default_limits.wall_time_limit, Some(2.0));
    assert_eq!(config.default_limits.max_output, Some(64));
    assert!(config.languages["shc"].is_compiled());
    assert!(!config.languages["sh"].is_compiled());
    assert_eq!(config.languages["shc"].artifact_name(), Some("script"));
}

#[test]
fn test_registry_from_fixture() {
    let registry = LanguageRegistry::from_config(&shell_config());

    assert_eq!(registry.ids(), ["hollow", "missing", "sh", "shc"]);
    assert!(registry.resolve("sh").is_ok());
    assert!(registry.resolve("python").is_err());
}

#[test]
fn test_load_with_explicit_path() {
    let config = Config::load(Some(fixture_path("shell.toml").as_path())).unwrap();
    assert!(config.languages.contains_key("sh"));
}

#[test]
fn test_load_missing_file_fails() {
    assert!(Config::from_file(fixture_path("does-not-exist.toml")).is_err());
}

#[test]
fn test_embedded_config_round_trips_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("codejudge.toml");
    std::fs::write(&path, codejudge::EXAMPLE_CONFIG).unwrap();

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.languages.len(), Config::default().languages.len());
}

//! Tests for service wiring and logging configuration.

use reelsmith::observability::ObservabilityConfig;
use reelsmith::{ProviderProfile, ReelsmithConfig, local_services};

#[test]
fn test_local_services_need_a_base_url() {
    let dir = tempfile::tempdir().unwrap();
    let config = ReelsmithConfig {
        storage_dir: dir.path().join("clips"),
        runs_dir: dir.path().join("runs"),
        ..ReelsmithConfig::default()
    };

    let err = local_services(&config, &ProviderProfile::new("veo")).unwrap_err();
    assert_eq!(err.reason_code(), "config");
}

#[test]
fn test_local_services_create_storage_directories() {
    let dir = tempfile::tempdir().unwrap();
    let config = ReelsmithConfig {
        storage_dir: dir.path().join("clips"),
        runs_dir: dir.path().join("runs"),
        ..ReelsmithConfig::default()
    };
    let profile = ProviderProfile {
        base_url: Some("http://localhost:9000/v1".to_string()),
        ..ProviderProfile::new("local")
    };

    let services = local_services(&config, &profile).unwrap();

    assert_eq!(services.provider.name(), "local");
    assert!(dir.path().join("clips").is_dir());
    assert!(dir.path().join("runs").is_dir());
}

#[test]
fn test_verbosity_selects_default_level() {
    assert_eq!(ObservabilityConfig::for_verbosity(false).log_level, "info");
    assert_eq!(ObservabilityConfig::for_verbosity(true).log_level, "debug");

    let config = ObservabilityConfig::default().with_json_logs(true);
    assert!(config.json_logs);
    assert_eq!(config.log_level, "info");
}

//! Tests for provider profiles and layered configuration.

use reelsmith_throttle::{Capability, ProviderProfile, ReelsmithConfig};
use std::collections::BTreeMap;
use std::io::Write;
use std::time::Duration;

#[test]
fn test_load_bundled_defaults() {
    let config = ReelsmithConfig::load().unwrap();

    assert!(config.providers.contains_key("veo"));
    assert!(config.providers.contains_key("sora"));
    assert_eq!(*config.planning.max_clip_seconds(), 8.0);
    assert_eq!(*config.assembly.music_level(), 0.12);

    let veo = config.provider(None).unwrap();
    assert_eq!(veo.name, config.default_provider);
    assert!(veo.supports(Capability::Video));
    assert!(!veo.supports(Capability::Music));
}

#[test]
fn test_from_file_overrides_defaults() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        r#"
default_provider = "local"
runs_dir = "/tmp/reelsmith-runs"

[planning]
max_clip_seconds = 12.0

[providers.local]
capabilities = ["video"]
max_concurrent = 3
submit_cooldown_secs = 1.5
max_clip_seconds = 10.0
allowed_durations = [5, 10]
"#
    )
    .unwrap();

    let config = ReelsmithConfig::from_file(file.path()).unwrap();
    assert_eq!(config.default_provider, "local");
    assert_eq!(config.runs_dir.to_str(), Some("/tmp/reelsmith-runs"));
    assert_eq!(*config.planning.max_clip_seconds(), 12.0);
    assert_eq!(*config.planning.reading_rate_wps(), 2.5);

    let local = config.provider(Some("local")).unwrap();
    assert_eq!(local.name, "local");
    assert_eq!(local.max_concurrent, 3);
    assert_eq!(local.submit_cooldown(), Duration::from_millis(1500));
    // Unset fields keep their defaults.
    assert_eq!(local.poll_interval(), Duration::from_secs(10));

    let planning = config.planning_for(&local);
    assert_eq!(*planning.max_clip_seconds(), 10.0);
}

#[test]
fn test_invalid_profile_is_rejected() {
    let cases = [
        ("max_concurrent = 0", "max_concurrent"),
        ("poll_interval_secs = 0.0", "poll_interval_secs"),
        (
            "max_clip_seconds = 8.0\nallowed_durations = [4, 6]",
            "max_clip_seconds",
        ),
    ];

    for (body, field) in cases {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[providers.broken]\n{}", body).unwrap();

        let err = ReelsmithConfig::from_file(file.path()).unwrap_err();
        assert_eq!(err.reason_code(), "config", "{}", body);
        assert!(err.to_string().contains(field), "{}: {}", body, err);
    }
}

#[test]
fn test_zero_poll_interval_override_is_rejected() {
    let profile = ProviderProfile::new("busy");
    let overrides: BTreeMap<String, String> =
        [("poll_interval_secs".to_string(), "0".to_string())].into();

    let err = profile.with_overrides(&overrides).unwrap_err();
    assert!(err.to_string().contains("poll_interval_secs"));
}

#[test]
fn test_unknown_provider_is_error() {
    let config = ReelsmithConfig::default();
    let err = config.provider(Some("nonexistent")).unwrap_err();
    assert_eq!(err.reason_code(), "config");
}

#[test]
fn test_request_duration_snaps_to_allowed() {
    let mut profile = ProviderProfile::new("snap");
    profile.allowed_durations = vec![8, 4, 6];

    assert_eq!(profile.request_duration(0.5), 4);
    assert_eq!(profile.request_duration(4.0), 4);
    assert_eq!(profile.request_duration(4.1), 6);
    assert_eq!(profile.request_duration(7.9), 8);
    assert_eq!(profile.request_duration(20.0), 8);

    profile.allowed_durations.clear();
    assert_eq!(profile.request_duration(5.2), 6);
    assert_eq!(profile.request_duration(30.0), 8);
}

#[test]
fn test_dispatch_overrides_patch_profile() {
    let profile = ProviderProfile::new("veo");
    let overrides: BTreeMap<String, String> = [
        ("max_concurrent", "5"),
        ("submit_cooldown_secs", "2.5"),
        ("max_retries", "1"),
        ("unknown_knob", "ignored"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    let patched = profile.with_overrides(&overrides).unwrap();
    assert_eq!(patched.max_concurrent, 5);
    assert_eq!(patched.submit_cooldown_secs, 2.5);
    assert_eq!(patched.max_retries, 1);
    assert_eq!(patched.poll_interval_secs, profile.poll_interval_secs);
}

#[test]
fn test_bad_override_value_is_error() {
    let profile = ProviderProfile::new("veo");
    let mut overrides = BTreeMap::new();
    overrides.insert("max_wait_secs".to_string(), "soon".to_string());
    assert!(profile.with_overrides(&overrides).is_err());

    overrides.insert("max_wait_secs".to_string(), "-4".to_string());
    assert!(profile.with_overrides(&overrides).is_err());
}

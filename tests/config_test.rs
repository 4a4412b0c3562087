//! Layered configuration: TOML file plus STORYGATE_ environment overrides

use serial_test::serial;
use std::io::Write;
use std::time::Duration;
use storygate_core::GateConfig;

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("Failed to create temp config");
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
#[serial]
fn test_file_then_env_layering() {
    let file = write_config(
        r#"
[event]
name = "Rust Meetup"
event_id = "RUST25"
code_prefix = "SLICE"

[limits]
max_requests_per_user = 5
window = 3600

[[tiers]]
name = "GOLD"
min_score = 7

[[tiers]]
name = "SILVER"
min_score = 0
"#,
    );

    std::env::set_var("STORYGATE_LIMITS__MIN_TEXT_LENGTH", "30");
    let config = GateConfig::load(Some(file.path()));
    std::env::remove_var("STORYGATE_LIMITS__MIN_TEXT_LENGTH");
    let config = config.unwrap();

    assert_eq!(config.event.event_id, "RUST25");
    assert_eq!(config.limits.max_requests_per_user, 5);
    assert_eq!(config.limits.window, Duration::from_secs(3600));
    assert_eq!(config.limits.min_text_length, 30);
    // Untouched values keep their defaults
    assert_eq!(config.limits.max_text_length, 1000);

    let thresholds = config.tier_thresholds().unwrap();
    assert_eq!(thresholds.tier_for(9).tier_name, "GOLD");
    assert_eq!(thresholds.tier_for(2).tier_name, "SILVER");
}

#[test]
#[serial]
fn test_invalid_file_is_rejected() {
    let file = write_config(
        r#"
[limits]
min_text_length = 500
max_text_length = 100
"#,
    );
    assert!(GateConfig::load(Some(file.path())).is_err());
}

#[test]
#[serial]
fn test_default_config_round_trips_through_toml() {
    let rendered = GateConfig::default().to_toml().unwrap();
    let parsed = GateConfig::from_toml(&rendered).unwrap();
    assert_eq!(parsed.tiers.len(), 3);
    assert_eq!(parsed.limits.max_requests_per_user, 3);
    assert!(!rendered.contains("api_key"));
}

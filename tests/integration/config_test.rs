use hostpulse::core::config::Config;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_config_default() {
    let config = Config::default();
    assert_eq!(config.bind, "127.0.0.1:3000");
    assert_eq!(config.interval(), Duration::from_secs(1));
    assert_eq!(config.cpu_freshness(), Duration::from_secs(2));
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_load_missing_file_returns_default() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::load_from(&temp_dir.path().join("config.json")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_config_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("config.json");

    let config = Config {
        bind: "0.0.0.0:9100".to_string(),
        interval_ms: 500,
        ..Default::default()
    };
    config.save_to(&path).unwrap();

    assert_eq!(Config::load_from(&path).unwrap(), config);
}

#[test]
fn test_config_partial_file_fills_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    std::fs::write(&path, r#"{ "interval_ms": 250, "probes": { "public_ip_ms": 60000 } }"#).unwrap();

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.interval_ms, 250);
    assert_eq!(config.probes.public_ip_ms, 60_000);
    assert_eq!(config.probes.connectivity_ms, 30_000);
    assert_eq!(config.stream_buffer, 8);
}

#[test]
fn test_config_corrupt_file_falls_back() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert_eq!(Config::load_from(&path).unwrap(), Config::default());
}

#[test]
fn test_config_validate_rejects_zero_values() {
    let zero_interval = Config {
        interval_ms: 0,
        ..Default::default()
    };
    assert!(zero_interval.validate().is_err());

    let zero_buffer = Config {
        stream_buffer: 0,
        ..Default::default()
    };
    assert!(zero_buffer.validate().is_err());
}

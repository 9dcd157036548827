//! Tests for sink configuration

use logtable::prelude::*;
use std::time::Duration;

#[test]
fn test_required_options_reported_individually() {
    let err = SinkConfig::default().validate().unwrap_err();
    assert!(err.to_string().contains("host"));

    let err = SinkConfig::new("localhost", "", "p", "db", "logs")
        .validate()
        .unwrap_err();
    assert!(err.to_string().contains("username"));

    let err = SinkConfig::new("localhost", "u", "", "db", "logs")
        .validate()
        .unwrap_err();
    assert!(err.to_string().contains("password"));

    let err = SinkConfig::new("localhost", "u", "p", "", "logs")
        .validate()
        .unwrap_err();
    assert!(err.to_string().contains("database name"));

    let err = SinkConfig::new("localhost", "u", "p", "db", "")
        .validate()
        .unwrap_err();
    assert!(err.to_string().contains("table"));
}

#[test]
fn test_validation_errors_are_configuration_category() {
    let err = SinkConfig::default().validate().unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Configuration);
    assert!(!err.is_retriable());
}

#[test]
fn test_builder_chain() {
    let config = SinkConfig::new("db.internal", "logger", "secret", "app", "sys_logs")
        .with_port(3307)
        .with_field(LogField::Timestamp, "addDate")
        .with_pool(PoolConfig::default().with_max_size(4))
        .with_connect_timeout(Duration::from_secs(3));

    assert!(config.validate().is_ok());
    assert_eq!(config.port, 3307);
    assert_eq!(config.fields[&LogField::Timestamp], "addDate");
    assert_eq!(config.pool.max_size, 4);
    assert_eq!(config.connect_timeout, Duration::from_secs(3));
}

#[test]
fn test_config_from_json() {
    let config: SinkConfig = serde_json::from_str(
        r#"{
            "host": "localhost",
            "user": "logger",
            "password": "secret",
            "database": "app",
            "table": "sys_logs",
            "fields": { "level": "mylevel", "responseTime": "elapsed" }
        }"#,
    )
    .unwrap();

    assert!(config.validate().is_ok());
    assert_eq!(config.port, 3306);
    assert_eq!(config.fields[&LogField::Level], "mylevel");
    assert_eq!(config.fields[&LogField::ResponseTime], "elapsed");
}

#[test]
fn test_debug_never_prints_password() {
    let config = SinkConfig::new("localhost", "logger", "hunter2", "app", "sys_logs");
    let rendered = format!("{config:?}");
    assert!(!rendered.contains("hunter2"));
}

//! Tests for logtable error classification

use logtable::prelude::*;

#[test]
fn test_categories() {
    assert_eq!(
        Error::config("missing table").category(),
        ErrorCategory::Configuration
    );
    assert_eq!(
        Error::acquire("pool exhausted").category(),
        ErrorCategory::Acquire
    );
    assert_eq!(
        Error::insert("duplicate key").category(),
        ErrorCategory::Insert
    );
    assert_eq!(
        Error::translation("unserializable meta").category(),
        ErrorCategory::Translation
    );
}

#[test]
fn test_only_acquire_is_retriable() {
    assert!(Error::acquire("x").is_retriable());
    assert!(!Error::config("x").is_retriable());
    assert!(!Error::insert("x").is_retriable());
    assert!(!Error::translation("x").is_retriable());
}

#[test]
fn test_insert_error_carries_sql() {
    let err = Error::insert_with_sql("syntax error", "INSERT INTO logs SET level = ?");
    match err {
        Error::Insert { sql, .. } => {
            assert_eq!(sql.as_deref(), Some("INSERT INTO logs SET level = ?"));
        }
        other => panic!("expected Insert, got {other:?}"),
    }
}

#[test]
fn test_source_chain_preserved() {
    let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
    let err = Error::acquire_with_source("failed to connect", io);

    let source = std::error::Error::source(&err).expect("source should be preserved");
    assert!(source.to_string().contains("refused"));
}

#[test]
fn test_display_formats() {
    assert_eq!(
        Error::config("the database table is required").to_string(),
        "configuration error: the database table is required"
    );
    assert!(Error::acquire("timed out").to_string().starts_with("acquire error:"));
}

//! Field scheme: logical log attributes mapped to physical column names
//!
//! The scheme is resolved once at sink construction and never changes
//! afterward, so concurrent `log` calls read it without synchronization.
//! User overrides merge over the built-in defaults field-by-field: a partial
//! custom scheme degrades to defaults rather than producing unset columns.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The logical fields a log row carries, in canonical column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LogField {
    /// Severity level of the record
    Level,
    /// JSON blob of everything besides level and message
    Meta,
    /// HTTP method parsed from the message
    Method,
    /// Endpoint path parsed from the message
    Endpoint,
    /// JSON blob of the request object
    Req,
    /// HTTP response status parsed from the message
    ResponseCode,
    /// JSON blob of the response object
    Res,
    /// When the record was emitted
    Timestamp,
    /// Request duration in milliseconds
    ResponseTime,
}

impl LogField {
    /// All logical fields in canonical column order
    pub const ALL: [LogField; 9] = [
        Self::Level,
        Self::Meta,
        Self::Method,
        Self::Endpoint,
        Self::Req,
        Self::ResponseCode,
        Self::Res,
        Self::Timestamp,
        Self::ResponseTime,
    ];

    /// The built-in physical column name for this field
    pub const fn default_column(self) -> &'static str {
        match self {
            Self::Level => "level",
            Self::Meta => "metadata",
            Self::Method => "method",
            Self::Endpoint => "endpoint",
            Self::Req => "req",
            Self::ResponseCode => "responsecode",
            Self::Res => "res",
            Self::Timestamp => "timestamp",
            Self::ResponseTime => "responsetime",
        }
    }

    /// Logical field name as it appears in configuration
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Level => "level",
            Self::Meta => "meta",
            Self::Method => "method",
            Self::Endpoint => "endpoint",
            Self::Req => "req",
            Self::ResponseCode => "responseCode",
            Self::Res => "res",
            Self::Timestamp => "timestamp",
            Self::ResponseTime => "responseTime",
        }
    }
}

impl std::fmt::Display for LogField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resolved mapping from logical field to physical column name.
///
/// Built once at construction; immutable afterward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldScheme {
    columns: [String; 9],
}

impl Default for FieldScheme {
    fn default() -> Self {
        Self {
            columns: LogField::ALL.map(|f| f.default_column().to_string()),
        }
    }
}

impl FieldScheme {
    /// Resolve a scheme by merging `overrides` over the built-in defaults.
    ///
    /// Every logical field always resolves to a usable column name: fields
    /// absent from `overrides` keep their defaults.
    pub fn resolve(overrides: &BTreeMap<LogField, String>) -> Self {
        Self {
            columns: LogField::ALL.map(|f| {
                overrides
                    .get(&f)
                    .cloned()
                    .unwrap_or_else(|| f.default_column().to_string())
            }),
        }
    }

    /// The physical column name for a logical field
    pub fn column(&self, field: LogField) -> &str {
        let idx = LogField::ALL
            .iter()
            .position(|f| *f == field)
            .unwrap_or_default();
        &self.columns[idx]
    }

    /// Iterate (logical field, physical column name) in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (LogField, &str)> {
        LogField::ALL
            .iter()
            .zip(self.columns.iter())
            .map(|(f, c)| (*f, c.as_str()))
    }

    /// Physical column names in canonical order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }
}

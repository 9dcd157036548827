//! Log records and record-to-row translation
//!
//! [`LogRecord`] is the normalized input: a level, a message, a timestamp,
//! optional request metadata, and arbitrary extra fields. Translation into a
//! [`ColumnRow`] is a pure function of the record and the (immutable)
//! [`FieldScheme`] — no I/O, no shared state.
//!
//! By convention the message is `"<method> <endpoint> <status>"` for HTTP
//! access logs. The translator splits on single spaces and takes the first
//! three tokens; it does not validate the shape, and missing tokens become
//! SQL NULL. Absent request metadata likewise becomes NULL rather than
//! failing the call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::fields::{FieldScheme, LogField};
use crate::types::{ColumnRow, Value};

/// Request/response metadata attached to an access-log record.
///
/// All fields are explicitly optional: absence translates to SQL NULL in the
/// corresponding columns.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RequestMeta {
    /// The request object, serialized to the `req` column
    #[serde(skip_serializing_if = "Option::is_none")]
    pub req: Option<serde_json::Value>,
    /// The response object, serialized to the `res` column
    #[serde(skip_serializing_if = "Option::is_none")]
    pub res: Option<serde_json::Value>,
    /// Request duration in milliseconds
    #[serde(rename = "responseTime", skip_serializing_if = "Option::is_none")]
    pub response_time: Option<i64>,
}

impl RequestMeta {
    /// Create metadata with request, response, and duration
    pub fn new(
        req: impl Into<serde_json::Value>,
        res: impl Into<serde_json::Value>,
        response_time: i64,
    ) -> Self {
        Self {
            req: Some(req.into()),
            res: Some(res.into()),
            response_time: Some(response_time),
        }
    }

    /// Set the request object
    pub fn with_req(mut self, req: impl Into<serde_json::Value>) -> Self {
        self.req = Some(req.into());
        self
    }

    /// Set the response object
    pub fn with_res(mut self, res: impl Into<serde_json::Value>) -> Self {
        self.res = Some(res.into());
        self
    }

    /// Set the request duration in milliseconds
    pub fn with_response_time(mut self, millis: i64) -> Self {
        self.response_time = Some(millis);
        self
    }
}

/// One structured log event to be persisted as a table row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Severity level (e.g. "info", "error")
    pub level: String,
    /// Log message; access logs use `"<method> <endpoint> <status>"`
    pub message: String,
    /// When the record was emitted
    pub timestamp: DateTime<Utc>,
    /// Optional request/response metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<RequestMeta>,
    /// Any additional structured fields carried by the record
    #[serde(default, flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl LogRecord {
    /// Create a record with the given level and message, timestamped now
    pub fn new(level: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            message: message.into(),
            timestamp: Utc::now(),
            meta: None,
            extra: BTreeMap::new(),
        }
    }

    /// Set an explicit timestamp
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Attach request/response metadata
    pub fn with_meta(mut self, meta: RequestMeta) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Attach an additional structured field
    pub fn with_extra(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Translate this record into a column row under the given scheme.
    ///
    /// Columns appear in the scheme's canonical order. The `meta` column
    /// holds a JSON blob of everything besides `level` and `message` (the
    /// request metadata, the timestamp, and any extra fields); `req` and
    /// `res` get their own JSON columns.
    pub fn to_row(&self, scheme: &FieldScheme) -> Result<ColumnRow> {
        let mut tokens = self.message.split(' ');
        let method = tokens.next().map(Value::from).unwrap_or(Value::Null);
        let endpoint = tokens.next().map(Value::from).unwrap_or(Value::Null);
        let response_code = tokens.next().map(Value::from).unwrap_or(Value::Null);

        let mut row = ColumnRow::with_capacity(LogField::ALL.len());
        for (field, column) in scheme.iter() {
            let value = match field {
                LogField::Level => Value::from(self.level.as_str()),
                LogField::Meta => Value::Json(self.meta_blob()?),
                LogField::Method => method.clone(),
                LogField::Endpoint => endpoint.clone(),
                LogField::Req => json_column(self.meta.as_ref().and_then(|m| m.req.as_ref())),
                LogField::ResponseCode => response_code.clone(),
                LogField::Res => json_column(self.meta.as_ref().and_then(|m| m.res.as_ref())),
                LogField::Timestamp => Value::from(self.timestamp),
                LogField::ResponseTime => {
                    Value::from(self.meta.as_ref().and_then(|m| m.response_time))
                }
            };
            row.push(column, value);
        }
        Ok(row)
    }

    /// Everything besides `level` and `message`, as one JSON object.
    fn meta_blob(&self) -> Result<serde_json::Value> {
        let mut blob = serde_json::Map::new();
        for (key, value) in &self.extra {
            blob.insert(key.clone(), value.clone());
        }
        if let Some(meta) = &self.meta {
            let meta = serde_json::to_value(meta)
                .map_err(|e| Error::translation(format!("unserializable meta: {e}")))?;
            blob.insert("meta".to_string(), meta);
        }
        blob.insert(
            "timestamp".to_string(),
            serde_json::Value::String(self.timestamp.to_rfc3339()),
        );
        Ok(serde_json::Value::Object(blob))
    }
}

/// An optional nested object becomes its own JSON column, NULL when absent.
fn json_column(value: Option<&serde_json::Value>) -> Value {
    match value {
        Some(v) => Value::Json(v.clone()),
        None => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn access_record() -> LogRecord {
        LogRecord::new("info", "GET /users 200")
            .with_meta(RequestMeta::new(json!({}), json!({}), 12))
    }

    #[test]
    fn test_message_tokens_map_to_columns() {
        let row = access_record().to_row(&FieldScheme::default()).unwrap();

        assert_eq!(row.get("method"), Some(&Value::from("GET")));
        assert_eq!(row.get("endpoint"), Some(&Value::from("/users")));
        assert_eq!(row.get("responsecode"), Some(&Value::from("200")));
        assert_eq!(row.get("responsetime"), Some(&Value::Int64(12)));
    }

    #[test]
    fn test_short_message_yields_null_columns() {
        let record = LogRecord::new("info", "startup");
        let row = record.to_row(&FieldScheme::default()).unwrap();

        assert_eq!(row.get("method"), Some(&Value::from("startup")));
        assert_eq!(row.get("endpoint"), Some(&Value::Null));
        assert_eq!(row.get("responsecode"), Some(&Value::Null));
    }

    #[test]
    fn test_absent_meta_yields_null_not_panic() {
        let record = LogRecord::new("warn", "GET /health 503");
        let row = record.to_row(&FieldScheme::default()).unwrap();

        assert_eq!(row.get("req"), Some(&Value::Null));
        assert_eq!(row.get("res"), Some(&Value::Null));
        assert_eq!(row.get("responsetime"), Some(&Value::Null));
    }

    #[test]
    fn test_row_has_all_nine_default_columns_in_order() {
        let row = access_record().to_row(&FieldScheme::default()).unwrap();
        let names: Vec<_> = row.names().collect();
        assert_eq!(
            names,
            vec![
                "level",
                "metadata",
                "method",
                "endpoint",
                "req",
                "responsecode",
                "res",
                "timestamp",
                "responsetime",
            ]
        );
    }

    #[test]
    fn test_meta_blob_contains_extras_meta_and_timestamp() {
        let record = access_record().with_extra("request_id", json!("abc-123"));
        let row = record.to_row(&FieldScheme::default()).unwrap();

        let Some(Value::Json(blob)) = row.get("metadata") else {
            panic!("metadata column should be JSON");
        };
        assert_eq!(blob["request_id"], json!("abc-123"));
        assert_eq!(blob["meta"]["responseTime"], json!(12));
        assert!(blob["timestamp"].is_string());
        // level and message stay out of the blob
        assert!(blob.get("level").is_none());
        assert!(blob.get("message").is_none());
    }

    #[test]
    fn test_timestamp_copied_through_unchanged() {
        let ts = Utc::now();
        let record = access_record().with_timestamp(ts);
        let row = record.to_row(&FieldScheme::default()).unwrap();
        assert_eq!(row.get("timestamp"), Some(&Value::DateTimeTz(ts)));
    }

    #[test]
    fn test_translation_is_pure() {
        let record = access_record();
        let scheme = FieldScheme::default();
        assert_eq!(
            record.to_row(&scheme).unwrap(),
            record.to_row(&scheme).unwrap()
        );
    }
}

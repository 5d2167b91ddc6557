//! Client-facing result types and error definitions.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::driver::DriverError;
use crate::normalize::{decode_many, NormalizeError, Target};
use crate::resilience::Interrupt;

/// Errors surfaced by [`SurrealClient`](super::SurrealClient).
///
/// Callers can tell apart "the wait was cut short" ([`is_cancellation`]),
/// "the database refused or failed" ([`is_driver_error`]) and "the answer did
/// not fit the requested type" ([`is_decode_error`]).
///
/// [`is_cancellation`]: ClientError::is_cancellation
/// [`is_driver_error`]: ClientError::is_driver_error
/// [`is_decode_error`]: ClientError::is_decode_error
#[derive(Debug, Error)]
pub enum ClientError {
    /// The endpoint could not be reached during construction.
    #[error("connection error: {0}")]
    Connection(String),

    /// Sign-in was refused.
    #[error("authentication error: {0}")]
    Authentication(String),

    /// Namespace/database selection failed.
    #[error("selection error: {0}")]
    Selection(String),

    /// The caller's context was cancelled before the operation finished.
    #[error("{operation}: context cancelled")]
    Cancelled { operation: &'static str },

    /// The caller's deadline passed before the operation finished.
    #[error("{operation}: timeout hit after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// The driver call itself failed.
    #[error("driver error: {0}")]
    Driver(DriverError),

    /// The response did not fit the requested shape.
    #[error("decode error: {0}")]
    Decode(serde_json::Error),

    /// The driver answered with something other than a sequence.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// An argument was rejected before reaching the driver.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The configuration is unusable.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ClientError {
    pub(crate) fn interrupted(operation: &'static str, interrupt: Interrupt, after: Duration) -> Self {
        match interrupt {
            Interrupt::Cancelled => ClientError::Cancelled { operation },
            Interrupt::DeadlineExceeded => ClientError::Timeout { operation, after },
        }
    }

    /// Cancelled or timed out.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, ClientError::Cancelled { .. } | ClientError::Timeout { .. })
    }

    pub fn is_driver_error(&self) -> bool {
        matches!(self, ClientError::Driver(_))
    }

    pub fn is_decode_error(&self) -> bool {
        matches!(self, ClientError::Decode(_))
    }

    /// Label used for metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            ClientError::Connection(_) => "connection_error",
            ClientError::Authentication(_) => "authentication_error",
            ClientError::Selection(_) => "selection_error",
            ClientError::Cancelled { .. } => "cancelled",
            ClientError::Timeout { .. } => "timeout",
            ClientError::Driver(_) => "driver_error",
            ClientError::Decode(_) => "decode_error",
            ClientError::InvalidResponse(_) => "invalid_response",
            ClientError::InvalidArgument(_) => "invalid_argument",
            ClientError::Config(_) => "config_error",
        }
    }
}

impl From<DriverError> for ClientError {
    fn from(err: DriverError) -> Self {
        ClientError::Driver(err)
    }
}

impl From<NormalizeError> for ClientError {
    fn from(err: NormalizeError) -> Self {
        match err {
            NormalizeError::InvalidResponse { .. } => ClientError::InvalidResponse(err.to_string()),
            NormalizeError::Decode(e) => ClientError::Decode(e),
            NormalizeError::NotAnObject { .. } => ClientError::InvalidArgument(err.to_string()),
        }
    }
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// An undecoded driver answer.
///
/// Returned by operations whose answer most callers ignore (create, update,
/// relate); call [`RawResponse::decode`] to normalize it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse(Value);

impl RawResponse {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Normalize into `Option<T>` or `Vec<T>`.
    pub fn decode<R: Target>(self) -> ClientResult<R> {
        Ok(R::from_raw(self.0)?)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

/// One statement's answer to a free-form query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Execution time as reported by the database.
    #[serde(default)]
    pub time: String,

    /// `OK` or `ERR`.
    #[serde(default)]
    pub status: String,

    /// Result rows, undecoded. For `ERR` statements the database usually
    /// sends a message string instead of rows; it is kept as one item.
    #[serde(default, rename = "result", deserialize_with = "rows")]
    pub results: Vec<Value>,
}

impl QueryResult {
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("OK")
    }

    /// Decode every row into `T`.
    pub fn take<T: DeserializeOwned>(&self) -> ClientResult<Vec<T>> {
        Ok(decode_many(Value::Array(self.results.clone()))?)
    }
}

fn rows<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_classes() {
        let cancelled = ClientError::Cancelled { operation: "read" };
        let timeout = ClientError::Timeout {
            operation: "read",
            after: Duration::from_millis(5),
        };
        let driver = ClientError::from(DriverError::Rejected("nope".into()));

        assert!(cancelled.is_cancellation());
        assert!(timeout.is_cancellation());
        assert!(!driver.is_cancellation());
        assert!(driver.is_driver_error());
        assert_eq!(cancelled.to_string(), "read: context cancelled");
        assert_eq!(timeout.outcome(), "timeout");
    }

    #[test]
    fn test_normalize_error_mapping() {
        let err: ClientError = NormalizeError::InvalidResponse { found: "null" }.into();
        assert!(matches!(err, ClientError::InvalidResponse(_)));

        let serde_err = serde_json::from_value::<u32>(json!("x")).unwrap_err();
        let err: ClientError = NormalizeError::Decode(serde_err).into();
        assert!(err.is_decode_error());
    }

    #[test]
    fn test_query_result_from_envelope() {
        let qr: QueryResult = serde_json::from_value(json!({
            "time": "10µs",
            "status": "OK",
            "result": [{"id": "item:1"}]
        }))
        .unwrap();
        assert!(qr.is_ok());
        assert_eq!(qr.results, vec![json!({"id": "item:1"})]);
    }

    #[test]
    fn test_query_result_error_message_kept() {
        let qr: QueryResult = serde_json::from_value(json!({
            "time": "1µs",
            "status": "ERR",
            "result": "table does not exist"
        }))
        .unwrap();
        assert!(!qr.is_ok());
        assert_eq!(qr.results, vec![json!("table does not exist")]);
    }

    #[test]
    fn test_take_rows() {
        #[derive(Deserialize)]
        struct Row {
            id: String,
        }
        let qr = QueryResult {
            time: String::new(),
            status: "OK".into(),
            results: vec![json!({"id": "a:1"}), json!({"id": "a:2"})],
        };
        let rows: Vec<Row> = qr.take().unwrap();
        assert_eq!(rows[1].id, "a:2");
    }

    #[test]
    fn test_raw_response_decode() {
        let raw = RawResponse::new(json!([{"id": "a:1"}]));
        let one: Option<Value> = raw.clone().decode().unwrap();
        assert_eq!(one, Some(json!({"id": "a:1"})));
        let many: Vec<Value> = raw.decode().unwrap();
        assert_eq!(many.len(), 1);
    }
}

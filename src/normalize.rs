//! Response normalization.
//!
//! # Data Flow
//! ```text
//! raw serde_json::Value from a driver
//!     → must be a JSON array           (else InvalidResponse)
//!     → Shape::One  → first element or nothing
//!       Shape::Many → the whole array
//!     → serde_json::from_value into the caller's type (else Decode)
//! ```
//!
//! # Design Decisions
//! - The target's shape comes from its type (`Option<T>` or `Vec<T>`),
//!   never from the reference or query that produced the data
//! - An empty answer decoded as a single record is `None`, not an error
//! - With several elements, a single-record target takes the first one in
//!   the order the driver returned them
//! - Decoding either fully succeeds or yields no value at all

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors produced while normalizing a raw response.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// The driver broke its contract and did not answer with a sequence.
    #[error("invalid response: expected a JSON array, got {found}")]
    InvalidResponse { found: &'static str },

    /// The selected value did not fit the target type.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// A payload serialized to something other than a JSON object.
    #[error("payload must serialize to a JSON object, got {found}")]
    NotAnObject { found: &'static str },
}

/// Result type for normalization.
pub type NormalizeResult<T> = Result<T, NormalizeError>;

/// What the caller wants out of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// At most one record.
    One,
    /// Every record, in driver order.
    Many,
}

/// A type a raw response can be normalized into.
///
/// Implemented for `Option<T>` (single record) and `Vec<T>` (collection).
pub trait Target: Sized {
    const SHAPE: Shape;

    fn from_raw(raw: Value) -> NormalizeResult<Self>;
}

impl<T: DeserializeOwned> Target for Option<T> {
    const SHAPE: Shape = Shape::One;

    fn from_raw(raw: Value) -> NormalizeResult<Self> {
        decode_one(raw)
    }
}

impl<T: DeserializeOwned> Target for Vec<T> {
    const SHAPE: Shape = Shape::Many;

    fn from_raw(raw: Value) -> NormalizeResult<Self> {
        decode_many(raw)
    }
}

/// Pick the part of `raw` that matches `shape`.
///
/// Returns `None` only for `Shape::One` over an empty sequence.
pub fn select(raw: Value, shape: Shape) -> NormalizeResult<Option<Value>> {
    let items = match raw {
        Value::Array(items) => items,
        other => {
            return Err(NormalizeError::InvalidResponse {
                found: kind_of(&other),
            })
        }
    };

    Ok(match shape {
        Shape::One => items.into_iter().next(),
        Shape::Many => Some(Value::Array(items)),
    })
}

/// Decode a single record, taking the first element of the sequence.
pub fn decode_one<T: DeserializeOwned>(raw: Value) -> NormalizeResult<Option<T>> {
    match select(raw, Shape::One)? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

/// Decode every element of the sequence.
pub fn decode_many<T: DeserializeOwned>(raw: Value) -> NormalizeResult<Vec<T>> {
    match select(raw, Shape::Many)? {
        Some(value) => Ok(serde_json::from_value(value)?),
        None => Ok(Vec::new()),
    }
}

/// Convert a caller record into the object map drivers accept as content.
pub fn to_entry<T: Serialize + ?Sized>(record: &T) -> NormalizeResult<Map<String, Value>> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        other => Err(NormalizeError::NotAnObject {
            found: kind_of(&other),
        }),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

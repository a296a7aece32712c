//! Serialization boundary
//!
//! Values cross into the store wrapped in a tagged envelope: primitive
//! scalars take a fast lossless path, everything else the generic
//! structured encoding. Decoding tries the fast path first, then the
//! generic decoder, then falls back to interpreting the stored value
//! directly (counter keys written by `increment` are plain integers with
//! no envelope).

use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Envelope written by `set` around every cached value
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub(crate) enum Payload {
    /// Fast path for strings, numbers, booleans and null
    Scalar(Value),
    /// Generic encoding for arrays, maps and structs
    Structured(Value),
}

/// Encode a value for storage
pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Payload> {
    let raw = serde_json::to_value(value)?;
    Ok(match raw {
        v @ (Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_)) => {
            Payload::Scalar(v)
        }
        v => Payload::Structured(v),
    })
}

/// Decode a stored value back into the caller's type
pub(crate) fn decode<T: DeserializeOwned>(raw: Value) -> Result<T> {
    if let Ok(payload) = serde_json::from_value::<Payload>(raw.clone()) {
        let inner = match payload {
            Payload::Scalar(v) | Payload::Structured(v) => v,
        };
        return Ok(serde_json::from_value(inner)?);
    }

    // Values written outside the envelope, e.g. raw counters
    Ok(serde_json::from_value(raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_scalars_take_fast_path() {
        assert!(matches!(encode(&42).unwrap(), Payload::Scalar(_)));
        assert!(matches!(encode(&"text").unwrap(), Payload::Scalar(_)));
        assert!(matches!(encode(&true).unwrap(), Payload::Scalar(_)));
        assert!(matches!(encode(&1.5).unwrap(), Payload::Scalar(_)));
    }

    #[test]
    fn test_compound_values_take_structured_path() {
        assert!(matches!(
            encode(&vec![1, 2, 3]).unwrap(),
            Payload::Structured(_)
        ));

        let mut map = HashMap::new();
        map.insert("a", 1);
        assert!(matches!(encode(&map).unwrap(), Payload::Structured(_)));
    }

    #[test]
    fn test_round_trip() {
        let payload = encode(&"hello").unwrap();
        let raw = serde_json::to_value(&payload).unwrap();
        let back: String = decode(raw).unwrap();
        assert_eq!(back, "hello");

        let payload = encode(&vec![1u32, 2, 3]).unwrap();
        let raw = serde_json::to_value(&payload).unwrap();
        let back: Vec<u32> = decode(raw).unwrap();
        assert_eq!(back, vec![1, 2, 3]);
    }

    #[test]
    fn test_raw_value_fallback() {
        // Counter keys are stored as bare integers, not envelopes
        let back: i64 = decode(serde_json::json!(7)).unwrap();
        assert_eq!(back, 7);
    }

    #[test]
    fn test_type_mismatch_is_an_error() {
        let payload = encode(&"not a number").unwrap();
        let raw = serde_json::to_value(&payload).unwrap();
        assert!(decode::<i64>(raw).is_err());
    }
}

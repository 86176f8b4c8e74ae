//! Opaque blob encoding for values that have no usable literal form.
//!
//! Blobs are the `serde_json` rendering of [`Value`]'s serde derive. Host
//! objects are not encodable, and cyclic containers are refused up front
//! because serialization would not terminate.

use crate::{CodecError, Value};

pub fn encode(value: &Value) -> Result<Vec<u8>, CodecError> {
    if !value.is_acyclic() {
        return Err(CodecError::Cyclic);
    }
    serde_json::to_vec(value).map_err(CodecError::Encode)
}

pub fn decode(blob: &[u8]) -> Result<Value, CodecError> {
    serde_json::from_slice(blob).map_err(CodecError::Decode)
}

/// Encode and immediately decode, returning the blob only if both succeed.
pub fn round_trip(value: &Value) -> Result<Vec<u8>, CodecError> {
    let blob = encode(value)?;
    decode(&blob)?;
    Ok(blob)
}

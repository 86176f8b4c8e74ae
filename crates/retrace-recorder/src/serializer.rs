//! Serializer: literal text where it is faithful, embedded data otherwise.

use std::collections::HashMap;

use retrace_eval::eval_literal;
use retrace_types::{codec, ObjectRef, Value};
use sha2::{Digest, Sha256};

use crate::error::{RecordError, RecordResult};
use crate::session::Session;
use crate::unwrap::{is_proxy, unwrap};

/// Prefix of the names that refer to embedded data.
pub const DATA_PREFIX: &str = "__data";

/// Ordered, deduplicated store of embedded blobs.
///
/// Blobs are indexed by SHA-256 digest; a digest hit is confirmed by byte
/// comparison before an index is reused.
#[derive(Debug, Default)]
pub struct DataPool {
    blobs: Vec<Vec<u8>>,
    by_digest: HashMap<String, Vec<usize>>,
}

impl DataPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `blob`, appending it if no equal blob is stored yet.
    pub fn intern(&mut self, blob: Vec<u8>) -> usize {
        let mut hasher = Sha256::new();
        hasher.update(&blob);
        let digest = format!("{:x}", hasher.finalize());
        let slots = self.by_digest.entry(digest).or_default();
        if let Some(&index) = slots.iter().find(|&&i| self.blobs[i] == blob) {
            return index;
        }
        let index = self.blobs.len();
        self.blobs.push(blob);
        slots.push(index);
        index
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    pub fn blobs(&self) -> &[Vec<u8>] {
        &self.blobs
    }
}

pub fn placeholder(index: usize) -> String {
    format!("{DATA_PREFIX}{index}")
}

impl Session {
    /// Render `value` for a generated statement.
    ///
    /// A short literal that evaluates back to an equal value is used as is.
    /// A value that survives the blob codec is embedded when its literal is
    /// long or not evaluable. A value that is neither fails with
    /// [`RecordError::Unrecordable`] when `strict`, and otherwise falls back
    /// to its literal text.
    pub fn serialize(&self, value: &Value, strict: bool) -> RecordResult<String> {
        let literal = value.write_literal(&mut |obj: &ObjectRef| self.object_text(obj));
        let plain = unwrap(value);

        let known = self.known_objects();
        let evaluable = eval_literal(&literal, &known).is_ok_and(|back| back == plain);
        let large = literal.chars().count() >= self.config().literal_limit;
        let blob = codec::round_trip(&plain).ok();

        match blob {
            Some(blob) if large || !evaluable => {
                let index = self.intern_blob(blob);
                Ok(placeholder(index))
            }
            Some(_) => Ok(literal),
            None if evaluable => Ok(literal),
            None if strict => Err(RecordError::Unrecordable(literal)),
            None => Ok(literal),
        }
    }

    /// Text for a host object inside a literal: a wrapper's name (which
    /// registers it), the name of a known object, or the object's repr.
    fn object_text(&self, obj: &ObjectRef) -> String {
        if is_proxy(obj) {
            return obj.repr();
        }
        self.known_name_of(obj).unwrap_or_else(|| obj.repr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_blobs_share_an_index() {
        let mut pool = DataPool::new();
        assert_eq!(pool.intern(b"[1]".to_vec()), 0);
        assert_eq!(pool.intern(b"[2]".to_vec()), 1);
        assert_eq!(pool.intern(b"[1]".to_vec()), 0);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn placeholders_are_numbered() {
        assert_eq!(placeholder(3), "__data3");
    }
}

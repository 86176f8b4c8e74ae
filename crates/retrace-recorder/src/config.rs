//! Recorder configuration.

use serde::{Deserialize, Serialize};

use crate::error::RecordResult;

/// Tunables for serialization and program emission.
///
/// Every field has a default, so a partial JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Literals at least this long are embedded as data when they can be.
    pub literal_limit: usize,
    /// Name of the generated function holding the recorded statements.
    pub entry_point: String,
    /// Function the data section calls to rebuild embedded blobs.
    pub deserializer: String,
    /// Indentation of the entry point body.
    pub indent: String,
    /// Extension appended to the target path when saving a script.
    pub script_extension: String,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            literal_limit: 100,
            entry_point: "recorded_code".to_string(),
            deserializer: "loads".to_string(),
            indent: "  ".to_string(),
            script_extension: "rt".to_string(),
        }
    }
}

impl RecorderConfig {
    pub fn from_json(text: &str) -> RecordResult<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = RecorderConfig::from_json(r#"{"literal_limit": 8}"#).unwrap();
        assert_eq!(config.literal_limit, 8);
        assert_eq!(config.entry_point, "recorded_code");
        assert_eq!(config.indent, "  ");
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        assert!(matches!(
            RecorderConfig::from_json("{"),
            Err(crate::RecordError::Config(_))
        ));
    }
}

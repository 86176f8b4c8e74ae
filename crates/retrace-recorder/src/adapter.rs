//! Domain adapters: the customisation points around the recording engine.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use retrace_eval::CODEC_MODULE;
use retrace_types::Value;

use crate::config::RecorderConfig;
use crate::error::RecordResult;
use crate::proxy::ProxyRef;

/// Supplies everything domain specific: boilerplate around the generated
/// program, short names for categories, which results stay recorded, and
/// how a recording is persisted.
pub trait Adapter {
    /// Lines before the entry point.
    fn header(&self, config: &RecorderConfig) -> Vec<String> {
        vec![
            "#!/usr/bin/env retrace".to_string(),
            format!("from {CODEC_MODULE} import {}", config.deserializer),
        ]
    }

    /// Lines after the data section. Must call the entry point.
    fn footer(&self, config: &RecorderConfig, _target: Option<&Path>) -> Vec<String> {
        vec![format!("{}()", config.entry_point)]
    }

    /// Short name base for a runtime category, e.g. `AxesSubplot` → `ax`.
    fn mnemonic(&self, _category: &str) -> Option<&str> {
        None
    }

    /// Whether a call result stays wrapped. A result for which this returns
    /// `false` is still recorded, but the caller receives the bare value.
    fn keeps_recording(&self, _result: &Value) -> bool {
        true
    }

    /// Persist the recording for `target`; by default only the script.
    fn save(&self, proxy: &ProxyRef, target: &Path) -> RecordResult<PathBuf> {
        write_script(proxy, target)
    }
}

/// Write the generated program next to `target` as
/// `<target>.<script_extension>` and mark it executable.
pub fn write_script(proxy: &ProxyRef, target: &Path) -> RecordResult<PathBuf> {
    let program = proxy.program(Some(target))?;
    let mut file_name = target.as_os_str().to_owned();
    file_name.push(".");
    file_name.push(&proxy.session().config().script_extension);
    let path = PathBuf::from(file_name);
    fs::write(&path, program.to_source())?;
    make_executable(&path)?;
    tracing::debug!(path = %path.display(), "saved recorded script");
    Ok(path)
}

#[cfg(unix)]
fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

/// The generic adapter: codec import header, entry point call footer, and
/// an optional mnemonic table.
#[derive(Debug, Clone, Default)]
pub struct DefaultAdapter {
    mnemonics: BTreeMap<String, String>,
}

impl DefaultAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mnemonic(mut self, category: impl Into<String>, short: impl Into<String>) -> Self {
        self.mnemonics.insert(category.into(), short.into());
        self
    }
}

impl Adapter for DefaultAdapter {
    fn mnemonic(&self, category: &str) -> Option<&str> {
        self.mnemonics.get(category).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_boilerplate() {
        let adapter = DefaultAdapter::new();
        let config = RecorderConfig::default();
        assert_eq!(
            adapter.header(&config),
            vec!["#!/usr/bin/env retrace", "from codec import loads"]
        );
        assert_eq!(adapter.footer(&config, None), vec!["recorded_code()"]);
    }

    #[test]
    fn mnemonic_table() {
        let adapter = DefaultAdapter::new().with_mnemonic("Accumulator", "acc");
        assert_eq!(adapter.mnemonic("Accumulator"), Some("acc"));
        assert_eq!(adapter.mnemonic("int"), None);
    }
}

//! Adapter for plotting figures.
//!
//! Records what is done to a figure created by a `plot` domain, saves the
//! recording as a script next to the figure's own output, and stops
//! recording values that leave the domain (plain numbers, tuples of
//! limits, ...).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use retrace_types::{quote_str, ObjectRef, Value};

use crate::adapter::{write_script, Adapter, DefaultAdapter};
use crate::config::RecorderConfig;
use crate::error::{RecordError, RecordResult};
use crate::proxy::ProxyRef;
use crate::session::Session;

/// Module prefix of the plotting domain.
pub const PLOT_MODULE: &str = "plot";

/// Known-object name of the figure constructor.
pub const FIGURE_NAME: &str = "figure";

#[derive(Debug, Clone)]
pub struct FigureAdapter {
    mnemonics: BTreeMap<String, String>,
    domain: String,
}

impl FigureAdapter {
    pub fn new() -> Self {
        let mnemonics = [("Figure", "f"), ("AxesSubplot", "ax"), ("list", "l")]
            .into_iter()
            .map(|(category, short)| (category.to_string(), short.to_string()))
            .collect();
        Self {
            mnemonics,
            domain: PLOT_MODULE.to_string(),
        }
    }

    /// Treat objects from modules starting with `domain` as recordable.
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    fn in_domain(&self, module: Option<&str>) -> bool {
        module.is_some_and(|m| m.starts_with(self.domain.as_str()))
    }
}

impl Default for FigureAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Adapter for FigureAdapter {
    fn header(&self, config: &RecorderConfig) -> Vec<String> {
        let mut lines = DefaultAdapter::new().header(config);
        lines.push(format!("from {} import *", self.domain));
        lines
    }

    fn footer(&self, config: &RecorderConfig, target: Option<&Path>) -> Vec<String> {
        let mut lines = vec![format!("{}()", config.entry_point)];
        if let Some(target) = target {
            lines.push(format!(
                "savefig({})",
                quote_str(&target.to_string_lossy())
            ));
        }
        lines
    }

    fn mnemonic(&self, category: &str) -> Option<&str> {
        self.mnemonics.get(category).map(String::as_str)
    }

    /// Keep results that are, or contain, an object of the plotting domain.
    fn keeps_recording(&self, result: &Value) -> bool {
        result.any_object(&mut |obj: &ObjectRef| self.in_domain(obj.module()))
    }

    /// Write the script, then have the figure save itself to `target`.
    fn save(&self, proxy: &ProxyRef, target: &Path) -> RecordResult<PathBuf> {
        let path = write_script(proxy, target)?;
        let savefig = proxy.target().get_attr("savefig")?;
        savefig.call(&[Value::str(target.to_string_lossy())], &[])?;
        Ok(path)
    }
}

/// Create a recorded figure.
///
/// `figure_fn` is the domain's figure constructor. It is wrapped under the
/// known name `figure`, so the constructor call itself is the first
/// recorded statement (`f1 = figure(...)`).
pub fn recorded_figure(
    figure_fn: Value,
    args: &[Value],
    kwargs: &[(String, Value)],
) -> RecordResult<ProxyRef> {
    recorded_figure_with(FigureAdapter::new(), RecorderConfig::default(), figure_fn, args, kwargs)
}

pub fn recorded_figure_with(
    adapter: FigureAdapter,
    config: RecorderConfig,
    figure_fn: Value,
    args: &[Value],
    kwargs: &[(String, Value)],
) -> RecordResult<ProxyRef> {
    let session = Session::new(adapter, config);
    session.register_known(FIGURE_NAME, figure_fn.clone());
    let root = session.wrap(figure_fn);
    let figure = root.call(args, kwargs)?;
    ProxyRef::from_value(&figure).ok_or_else(|| {
        RecordError::Escaped(format!("{FIGURE_NAME}() returned {}", figure.type_name()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use retrace_types::NativeFn;

    fn plot_object() -> Value {
        NativeFn::function("line", |_, _| Ok(Value::None))
            .in_module("plot.lines")
            .into_value()
    }

    #[test]
    fn boilerplate_imports_the_domain_and_saves() {
        let adapter = FigureAdapter::new();
        let config = RecorderConfig::default();
        assert_eq!(adapter.header(&config).last().unwrap(), "from plot import *");
        assert_eq!(
            adapter.footer(&config, Some(Path::new("out.png"))),
            vec!["recorded_code()", "savefig('out.png')"]
        );
        assert_eq!(adapter.footer(&config, None), vec!["recorded_code()"]);
    }

    #[test]
    fn short_names_for_plot_categories() {
        let adapter = FigureAdapter::new();
        assert_eq!(adapter.mnemonic("AxesSubplot"), Some("ax"));
        assert_eq!(adapter.mnemonic("Figure"), Some("f"));
        assert_eq!(adapter.mnemonic("Line2D"), None);
    }

    #[test]
    fn only_domain_results_keep_recording() {
        let adapter = FigureAdapter::new();
        assert!(adapter.keeps_recording(&plot_object()));
        assert!(adapter.keeps_recording(&Value::list(vec![plot_object()])));
        assert!(!adapter.keeps_recording(&Value::tuple(vec![Value::Float(0.0)])));
        let elsewhere = NativeFn::function("f", |_, _| Ok(Value::None))
            .in_module("plotting")
            .into_value();
        assert!(!FigureAdapter::new()
            .with_domain("plot.")
            .keeps_recording(&elsewhere));
    }
}

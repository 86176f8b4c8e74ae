//! Identity Namer: readable, unique names for recorded values.

use std::collections::{BTreeMap, HashSet};

use retrace_lexer::KEYWORDS;
use retrace_types::Value;

/// Per-base counters used to mint names such as `ax1`, `ax2`.
#[derive(Debug, Default)]
pub struct NameRegistry {
    counters: BTreeMap<String, usize>,
    minted: HashSet<String>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint the next free name for `base`.
    ///
    /// Candidates already minted, or rejected by `taken`, are skipped; the
    /// counter still advances past them.
    pub fn mint(&mut self, base: &str, taken: impl Fn(&str) -> bool) -> String {
        let counter = self.counters.entry(base.to_string()).or_insert(0);
        loop {
            *counter += 1;
            let candidate = format!("{base}{counter}");
            if !self.minted.contains(&candidate) && !taken(&candidate) {
                self.minted.insert(candidate.clone());
                return candidate;
            }
        }
    }

    /// Whether `name` came from [`NameRegistry::mint`].
    pub fn is_minted(&self, name: &str) -> bool {
        self.minted.contains(name)
    }

    /// Last counter value handed out for `base`.
    pub fn counter(&self, base: &str) -> usize {
        self.counters.get(base).copied().unwrap_or(0)
    }
}

/// The name `value` is already known by: its identity name, when that name
/// is bound to an equal value in `known`.
pub fn known_identity(value: &Value, known: &BTreeMap<String, Value>) -> Option<String> {
    let name = value.identity_name()?;
    (known.get(name) == Some(value)).then(|| name.to_string())
}

/// Turn a runtime category (or its mnemonic) into a name base.
///
/// The result is an identifier that is not a keyword, does not start with
/// an underscore (so it can never look like a `__data` placeholder), and
/// does not end in a digit (so `base + counter` cannot collide across bases).
pub fn base_name(category: &str) -> String {
    let mut base: String = category
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    base = base.trim_start_matches('_').to_string();
    if base.is_empty() {
        base.push_str("obj");
    }
    if base.starts_with(|c: char| c.is_ascii_digit()) {
        base.insert_str(0, "v");
    }
    if base.ends_with(|c: char| c.is_ascii_digit()) || KEYWORDS.contains(&base.as_str()) {
        base.push('_');
    }
    base
}

/// Whether `name` can be written as an attribute or keyword-argument name:
/// an ASCII identifier that is not a keyword.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let head_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    head_ok
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !KEYWORDS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use retrace_types::NativeFn;

    #[test]
    fn counters_are_per_base() {
        let mut names = NameRegistry::new();
        assert_eq!(names.mint("ax", |_| false), "ax1");
        assert_eq!(names.mint("ax", |_| false), "ax2");
        assert_eq!(names.mint("f", |_| false), "f1");
        assert_eq!(names.counter("ax"), 2);
        assert!(names.is_minted("f1"));
    }

    #[test]
    fn taken_names_are_skipped() {
        let mut names = NameRegistry::new();
        assert_eq!(names.mint("l", |n| n == "l1"), "l2");
    }

    #[test]
    fn base_names_are_identifiers() {
        assert_eq!(base_name("Figure"), "Figure");
        assert_eq!(base_name("NoneType"), "NoneType");
        assert_eq!(base_name("my-type"), "my_type");
        assert_eq!(base_name("__data"), "data");
        assert_eq!(base_name("Vec3"), "Vec3_");
        assert_eq!(base_name("2d"), "v2d");
        assert_eq!(base_name("None"), "None_");
        assert_eq!(base_name(""), "obj");
    }

    #[test]
    fn member_names_must_be_plain_identifiers() {
        assert!(is_identifier("add_subplot"));
        assert!(is_identifier("_private2"));
        assert!(!is_identifier("from"));
        assert!(!is_identifier("True"));
        assert!(!is_identifier("my-kw"));
        assert!(!is_identifier("a b"));
        assert!(!is_identifier("2d"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn identity_name_needs_equal_binding() {
        let figure = NativeFn::function("figure", |_, _| Ok(Value::None)).into_value();
        let other = NativeFn::function("figure", |_, _| Ok(Value::None)).into_value();
        let known = BTreeMap::from([("figure".to_string(), figure.clone())]);
        assert_eq!(known_identity(&figure, &known).as_deref(), Some("figure"));
        assert_eq!(known_identity(&other, &known), None);
        assert_eq!(known_identity(&figure, &BTreeMap::new()), None);
    }
}

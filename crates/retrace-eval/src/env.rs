//! Scoped variable environment.

use retrace_types::Value;
use std::collections::BTreeMap;

/// Scoped bindings with push/pop semantics.
///
/// Lookups search from the innermost scope outward. `define` always binds
/// in the innermost scope, so assignments inside a function body are local.
#[derive(Debug, Clone)]
pub struct Environment {
    scopes: Vec<BTreeMap<String, Value>>,
}

impl Environment {
    /// An environment with one (global) scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![BTreeMap::new()],
        }
    }

    /// An environment whose global scope starts with `bindings`.
    pub fn with_globals(bindings: BTreeMap<String, Value>) -> Self {
        Self {
            scopes: vec![bindings],
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(BTreeMap::new());
    }

    /// Pop the innermost scope. The global scope is never popped.
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn define(&mut self, name: &str, value: Value) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), value);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    pub fn global_bindings(&self) -> &BTreeMap<String, Value> {
        &self.scopes[0]
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_scope_shadows_and_pops() {
        let mut env = Environment::new();
        env.define("x", Value::Int(1));
        env.push_scope();
        env.define("x", Value::Int(2));
        assert_eq!(env.get("x"), Some(&Value::Int(2)));
        env.pop_scope();
        assert_eq!(env.get("x"), Some(&Value::Int(1)));
    }

    #[test]
    fn global_scope_survives_extra_pops() {
        let mut env = Environment::new();
        env.define("g", Value::Bool(true));
        env.pop_scope();
        env.pop_scope();
        assert_eq!(env.depth(), 1);
        assert!(env.global_bindings().contains_key("g"));
    }
}

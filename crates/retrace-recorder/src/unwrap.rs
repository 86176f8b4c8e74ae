//! The "clean" step: strip wrappers out of values before they reach the
//! underlying object.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use retrace_types::{ObjectRef, Value};

use crate::proxy::ProxyInner;

/// Replace every wrapper reachable from `value` with its underlying value.
///
/// Containers that hold no wrapper are returned as-is, so identity is kept
/// for plain data. Containers that do are copied; a container reached again
/// while being copied maps to the same copy, so cycles are reproduced
/// instead of followed forever.
pub fn unwrap(value: &Value) -> Value {
    Unwrapper::default().clean(value)
}

/// Unwrap a call's operands with one shared visited map, so aliasing
/// between arguments survives.
pub(crate) fn unwrap_call(
    args: &[Value],
    kwargs: &[(String, Value)],
) -> (Vec<Value>, Vec<(String, Value)>) {
    let mut unwrapper = Unwrapper::default();
    let args = args.iter().map(|arg| unwrapper.clean(arg)).collect();
    let kwargs = kwargs
        .iter()
        .map(|(name, value)| (name.clone(), unwrapper.clean(value)))
        .collect();
    (args, kwargs)
}

pub(crate) fn is_proxy(obj: &ObjectRef) -> bool {
    obj.downcast_ref::<ProxyInner>().is_some()
}

fn contains_proxy(value: &Value) -> bool {
    value.any_object(&mut |obj: &ObjectRef| is_proxy(obj))
}

#[derive(Default)]
struct Unwrapper {
    /// Copies made so far, by identity of the original container.
    copies: HashMap<usize, Value>,
    /// Tuples being rebuilt; they cannot be pre-registered because they are
    /// immutable once built.
    open_tuples: HashSet<usize>,
}

impl Unwrapper {
    fn clean(&mut self, value: &Value) -> Value {
        if let Value::Object(obj) = value {
            return match obj.downcast_ref::<ProxyInner>() {
                Some(proxy) => proxy.target().clone(),
                None => value.clone(),
            };
        }
        let Some(id) = value.identity() else {
            return value.clone();
        };
        if let Some(copy) = self.copies.get(&id) {
            return copy.clone();
        }
        if !contains_proxy(value) {
            return value.clone();
        }

        match value {
            Value::List(items) | Value::Set(items) => {
                let copy = Rc::new(RefCell::new(Vec::new()));
                let wrapped = match value {
                    Value::Set(_) => Value::Set(Rc::clone(&copy)),
                    _ => Value::List(Rc::clone(&copy)),
                };
                self.copies.insert(id, wrapped.clone());
                let snapshot = items.borrow().clone();
                let cleaned: Vec<Value> = snapshot.iter().map(|item| self.clean(item)).collect();
                *copy.borrow_mut() = cleaned;
                wrapped
            }
            Value::Dict(entries) => {
                let copy = Rc::new(RefCell::new(Vec::new()));
                let wrapped = Value::Dict(Rc::clone(&copy));
                self.copies.insert(id, wrapped.clone());
                let snapshot = entries.borrow().clone();
                let cleaned: Vec<(Value, Value)> = snapshot
                    .iter()
                    .map(|(k, v)| (self.clean(k), self.clean(v)))
                    .collect();
                *copy.borrow_mut() = cleaned;
                wrapped
            }
            Value::Tuple(items) => {
                if !self.open_tuples.insert(id) {
                    // Reached through its own contents: leave this reference alone.
                    return value.clone();
                }
                let cleaned: Vec<Value> = items.iter().map(|item| self.clean(item)).collect();
                self.open_tuples.remove(&id);
                let copy = Value::tuple(cleaned);
                self.copies.insert(id, copy.clone());
                copy
            }
            _ => value.clone(),
        }
    }
}

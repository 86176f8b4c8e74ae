//! The dynamic value model.
//!
//! `List`, `Dict` and `Set` are shared and mutable, so two values may alias
//! the same container and a container may contain itself. Code that walks
//! values must be cycle aware; [`Value::identity`] provides the key.

use crate::object::ObjectRef;
use crate::{OpError, OpResult};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

pub type ListRef = Rc<RefCell<Vec<Value>>>;
pub type DictRef = Rc<RefCell<Vec<(Value, Value)>>>;
pub type TupleRef = Rc<Vec<Value>>;

/// A runtime value.
#[derive(Clone, Default, Serialize, Deserialize)]
pub enum Value {
    #[default]
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(ListRef),
    Tuple(TupleRef),
    /// Insertion ordered; keys are unique by equality.
    Dict(DictRef),
    /// Insertion ordered; members are unique by equality.
    Set(ListRef),
    /// Host objects never cross the blob codec.
    #[serde(skip)]
    Object(ObjectRef),
}

impl Value {
    // ── Constructors ──────────────────────────────────────────────────────

    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn tuple(items: Vec<Value>) -> Self {
        Value::Tuple(Rc::new(items))
    }

    /// Build a dict; a later duplicate key overwrites the earlier value in place.
    pub fn dict(entries: Vec<(Value, Value)>) -> Self {
        let mut unique: Vec<(Value, Value)> = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            match unique.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = value,
                None => unique.push((key, value)),
            }
        }
        Value::Dict(Rc::new(RefCell::new(unique)))
    }

    pub fn set(items: Vec<Value>) -> Self {
        let mut unique: Vec<Value> = Vec::with_capacity(items.len());
        for item in items {
            if !unique.contains(&item) {
                unique.push(item);
            }
        }
        Value::Set(Rc::new(RefCell::new(unique)))
    }

    pub fn object(object: impl crate::HostObject + 'static) -> Self {
        Value::Object(ObjectRef::new(object))
    }

    // ── Inspection ────────────────────────────────────────────────────────

    /// Runtime category name.
    pub fn type_name(&self) -> &str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Dict(_) => "dict",
            Value::Set(_) => "set",
            Value::Object(obj) => obj.type_name(),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Identity key for shared values (containers and objects).
    pub fn identity(&self) -> Option<usize> {
        match self {
            Value::List(l) | Value::Set(l) => Some(Rc::as_ptr(l) as usize),
            Value::Dict(d) => Some(Rc::as_ptr(d) as usize),
            Value::Tuple(t) => Some(Rc::as_ptr(t) as usize),
            Value::Object(obj) => Some(obj.id()),
            _ => None,
        }
    }

    /// The fixed name a host object is known by, if any.
    pub fn identity_name(&self) -> Option<&str> {
        self.as_object().and_then(|obj| obj.identity_name())
    }

    /// Snapshot of a container's direct children, in order.
    pub fn children(&self) -> Vec<Value> {
        match self {
            Value::List(l) | Value::Set(l) => l.borrow().clone(),
            Value::Tuple(t) => t.to_vec(),
            Value::Dict(d) => d
                .borrow()
                .iter()
                .flat_map(|(k, v)| [k.clone(), v.clone()])
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Returns `true` if any object reachable from this value satisfies `pred`.
    /// Shared containers are visited once.
    pub fn any_object(&self, pred: &mut dyn FnMut(&ObjectRef) -> bool) -> bool {
        fn walk(
            value: &Value,
            seen: &mut HashSet<usize>,
            pred: &mut dyn FnMut(&ObjectRef) -> bool,
        ) -> bool {
            if let Value::Object(obj) = value {
                return pred(obj);
            }
            if let Some(id) = value.identity() {
                if !seen.insert(id) {
                    return false;
                }
            }
            value.children().iter().any(|child| walk(child, seen, pred))
        }
        walk(self, &mut HashSet::new(), pred)
    }

    /// Returns `true` if no container reaches itself.
    pub fn is_acyclic(&self) -> bool {
        fn walk(value: &Value, path: &mut Vec<usize>) -> bool {
            let Some(id) = value.identity() else {
                return true;
            };
            if path.contains(&id) {
                return false;
            }
            path.push(id);
            let ok = value.children().iter().all(|child| walk(child, path));
            path.pop();
            ok
        }
        walk(self, &mut Vec::new())
    }

    // ── Operations ────────────────────────────────────────────────────────

    pub fn get_attr(&self, name: &str) -> OpResult<Value> {
        match self {
            Value::Object(obj) => obj.get_attr(name),
            _ => Err(OpError::no_attribute(self.type_name(), name)),
        }
    }

    pub fn set_attr(&self, name: &str, value: Value) -> OpResult<()> {
        match self {
            Value::Object(obj) => obj.set_attr(name, value),
            _ => Err(OpError::ReadOnly {
                type_name: self.type_name().to_string(),
                attr: name.to_string(),
            }),
        }
    }

    pub fn call(&self, args: &[Value], kwargs: &[(String, Value)]) -> OpResult<Value> {
        match self {
            Value::Object(obj) => obj.call(args, kwargs),
            _ => Err(OpError::NotCallable(self.type_name().to_string())),
        }
    }

    pub fn get_item(&self, key: &Value) -> OpResult<Value> {
        match self {
            Value::List(items) => sequence_item(&items.borrow(), key, "list"),
            Value::Tuple(items) => sequence_item(items, key, "tuple"),
            Value::Str(s) => {
                let chars: Vec<Value> = s.chars().map(|c| Value::Str(c.to_string())).collect();
                sequence_item(&chars, key, "string")
            }
            Value::Bytes(b) => {
                let bytes: Vec<Value> = b.iter().map(|&x| Value::Int(i64::from(x))).collect();
                sequence_item(&bytes, key, "bytes")
            }
            Value::Dict(entries) => entries
                .borrow()
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
                .ok_or_else(|| OpError::KeyNotFound(key.to_string())),
            Value::Object(obj) => obj.get_item(key),
            _ => Err(OpError::NotSubscriptable(self.type_name().to_string())),
        }
    }

    // ── Literal form ──────────────────────────────────────────────────────

    /// Render the literal form, asking `objects` for the text of every host
    /// object encountered.
    pub fn write_literal(&self, objects: &mut dyn FnMut(&ObjectRef) -> String) -> String {
        let mut writer = LiteralWriter {
            out: String::new(),
            active: Vec::new(),
            objects,
        };
        writer.write(self);
        writer.out
    }
}

fn sequence_item(items: &[Value], key: &Value, what: &str) -> OpResult<Value> {
    let Value::Int(index) = key else {
        return Err(OpError::bad_argument(format!(
            "{what} indices must be integers, not {}",
            key.type_name()
        )));
    };
    let len = items.len();
    let resolved = if *index < 0 {
        index.checked_add(len as i64)
    } else {
        Some(*index)
    };
    resolved
        .and_then(|i| usize::try_from(i).ok())
        .and_then(|i| items.get(i))
        .cloned()
        .ok_or(OpError::IndexOutOfRange { index: *index, len })
}

struct LiteralWriter<'a> {
    out: String,
    /// Containers currently being written, for cycle detection.
    active: Vec<usize>,
    objects: &'a mut dyn FnMut(&ObjectRef) -> String,
}

impl LiteralWriter<'_> {
    fn write(&mut self, value: &Value) {
        match value {
            Value::None => self.out.push_str("None"),
            Value::Bool(true) => self.out.push_str("True"),
            Value::Bool(false) => self.out.push_str("False"),
            Value::Int(i) => self.out.push_str(&i.to_string()),
            Value::Float(f) => self.out.push_str(&format_float(*f)),
            Value::Str(s) => self.out.push_str(&quote_str(s)),
            Value::Bytes(b) => self.out.push_str(&quote_bytes(b)),
            Value::Object(obj) => {
                let text = (self.objects)(obj);
                self.out.push_str(&text);
            }
            Value::List(_) | Value::Tuple(_) | Value::Dict(_) | Value::Set(_) => {
                self.write_container(value)
            }
        }
    }

    fn write_container(&mut self, value: &Value) {
        let id = value.identity().unwrap_or_default();
        if self.active.contains(&id) {
            self.out.push_str(match value {
                Value::List(_) => "[...]",
                Value::Tuple(_) => "(...)",
                _ => "{...}",
            });
            return;
        }
        self.active.push(id);
        match value {
            Value::List(items) => {
                let items = items.borrow().clone();
                self.write_seq("[", &items, "]");
            }
            Value::Tuple(items) => {
                if items.len() == 1 {
                    self.out.push('(');
                    self.write(&items[0]);
                    self.out.push_str(",)");
                } else {
                    self.write_seq("(", items, ")");
                }
            }
            Value::Set(items) => {
                let items = items.borrow().clone();
                if items.is_empty() {
                    self.out.push_str("set()");
                } else {
                    self.write_seq("{", &items, "}");
                }
            }
            Value::Dict(entries) => {
                let entries = entries.borrow().clone();
                self.out.push('{');
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    self.write(k);
                    self.out.push_str(": ");
                    self.write(v);
                }
                self.out.push('}');
            }
            _ => {}
        }
        self.active.pop();
    }

    fn write_seq(&mut self, open: &str, items: &[Value], close: &str) {
        self.out.push_str(open);
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.write(item);
        }
        self.out.push_str(close);
    }
}

/// Shortest text that reads back as the same float.
pub fn format_float(f: f64) -> String {
    if f.is_nan() {
        "nan".to_string()
    } else if f.is_infinite() {
        (if f > 0.0 { "inf" } else { "-inf" }).to_string()
    } else {
        format!("{f:?}")
    }
}

/// Quote a string as a script literal.
///
/// Single quotes are preferred; double quotes are used when the text holds
/// a single quote and no double quote.
pub fn quote_str(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

pub fn quote_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() + 3);
    out.push_str("b'");
    for &b in bytes {
        match b {
            b'\\' => out.push_str("\\\\"),
            b'\'' => out.push_str("\\'"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            0x20..=0x7e => out.push(b as char),
            _ => out.push_str(&format!("\\x{b:02x}")),
        }
    }
    out.push('\'');
    out
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                *a as f64 == *b
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Value::Tuple(a), Value::Tuple(b)) => Rc::ptr_eq(a, b) || a == b,
            (Value::Set(a), Value::Set(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len() && a.iter().all(|x| b.contains(x))
            }
            (Value::Dict(a), Value::Dict(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.iter().any(|(bk, bv)| bk == k && bv == v))
            }
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.write_literal(&mut |obj: &ObjectRef| obj.repr()))
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::list(items)
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }
}

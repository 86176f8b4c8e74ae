//! Trace Recorder: the transparent wrapper.
//!
//! Every operation is forwarded to the wrapped value with unwrapped
//! operands, its non-null result is wrapped in a new proxy of the same
//! session, and only then is the opcode appended. A failed operation is
//! never recorded.

use std::any::Any;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

use retrace_types::{HostObject, ObjectRef, OpResult, Value};

use crate::emit::GeneratedProgram;
use crate::error::{RecordError, RecordResult};
use crate::session::Session;
use crate::trace::{Opcode, Operand};
use crate::unwrap::{unwrap, unwrap_call};

/// The host object behind a wrapped value.
///
/// It holds the session weakly: wrappers end up inside the trace (as call
/// operands), and a strong reference there would keep the session alive
/// forever.
pub(crate) struct ProxyInner {
    name: Rc<str>,
    target: Value,
    session: Weak<Session>,
}

impl ProxyInner {
    pub(crate) fn target(&self) -> &Value {
        &self.target
    }

    fn session(&self) -> RecordResult<Rc<Session>> {
        self.session.upgrade().ok_or(RecordError::SessionClosed)
    }
}

/// Handle to a wrapped value.
///
/// Cloning is cheap. A `ProxyRef` keeps its session alive; the values its
/// operations return only refer to the session weakly, so keep the root
/// handle (or any `ProxyRef`) for as long as recording goes on.
#[derive(Clone)]
pub struct ProxyRef {
    object: ObjectRef,
    name: Rc<str>,
    target: Value,
    session: Rc<Session>,
}

impl ProxyRef {
    pub(crate) fn new(session: Rc<Session>, target: Value) -> Self {
        let name: Rc<str> = session.name_for(&target).into();
        let inner = ProxyInner {
            name: Rc::clone(&name),
            target: target.clone(),
            session: Rc::downgrade(&session),
        };
        Self {
            object: ObjectRef::new(inner),
            name,
            target,
            session,
        }
    }

    /// Recover a handle from a value returned by a recorded operation.
    ///
    /// `None` if the value is not a wrapper or its session is gone.
    pub fn from_value(value: &Value) -> Option<ProxyRef> {
        let object = value.as_object()?;
        let inner = object.downcast_ref::<ProxyInner>()?;
        Some(Self {
            object: object.clone(),
            name: Rc::clone(&inner.name),
            target: inner.target.clone(),
            session: inner.session.upgrade()?,
        })
    }

    /// The stable name this wrapper is recorded under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The wrapped value.
    pub fn target(&self) -> &Value {
        &self.target
    }

    /// This wrapper as a value, e.g. to pass it as an argument.
    pub fn value(&self) -> Value {
        Value::Object(self.object.clone())
    }

    pub fn session(&self) -> &Rc<Session> {
        &self.session
    }

    // ── Intercepted operations ────────────────────────────────────────────

    pub fn get_attr(&self, attr: &str) -> RecordResult<Value> {
        self.session.forward_get_attr(&self.name, &self.target, attr)
    }

    pub fn get_item(&self, key: Value) -> RecordResult<Value> {
        self.session.forward_get_item(&self.name, &self.target, key)
    }

    pub fn call(&self, args: &[Value], kwargs: &[(String, Value)]) -> RecordResult<Value> {
        self.session
            .forward_call(&self.name, &self.target, args, kwargs)
    }

    pub fn set_attr(&self, attr: &str, value: Value) -> RecordResult<()> {
        self.session
            .forward_set_attr(&self.name, &self.target, attr, value)
    }

    /// Attribute lookup followed by a call of the result; records both.
    pub fn call_method(
        &self,
        method: &str,
        args: &[Value],
        kwargs: &[(String, Value)],
    ) -> RecordResult<Value> {
        let bound = self.get_attr(method)?;
        match ProxyRef::from_value(&bound) {
            Some(proxy) => proxy.call(args, kwargs),
            None => Ok(bound.call(args, kwargs)?),
        }
    }

    // ── Code generation ───────────────────────────────────────────────────

    /// Compile the session's trace. `target` is handed to the adapter's
    /// footer.
    pub fn program(&self, target: Option<&Path>) -> RecordResult<GeneratedProgram> {
        self.session.generate(target)
    }

    /// The generated program as lines.
    pub fn get_code(&self) -> RecordResult<Vec<String>> {
        Ok(self.program(None)?.lines())
    }

    /// Let the adapter persist the program (and whatever else it persists)
    /// for `target`. Returns the path of the written script.
    pub fn save(&self, target: &Path) -> RecordResult<PathBuf> {
        self.session.adapter().save(self, target)
    }
}

/// Printing a wrapper registers its name as a known object.
impl fmt::Display for ProxyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.object.repr())
    }
}

impl fmt::Debug for ProxyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyRef")
            .field("name", &self.name)
            .field("target", &self.target)
            .finish()
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Forwarding
// ══════════════════════════════════════════════════════════════════════════

impl Session {
    fn forward_get_attr(
        self: &Rc<Self>,
        receiver: &str,
        target: &Value,
        attr: &str,
    ) -> RecordResult<Value> {
        let raw = target.get_attr(attr)?;
        let (result, value) = self.adopt(raw);
        self.push(Opcode::new(receiver, Operand::Attr(attr.to_string()), result));
        Ok(value)
    }

    fn forward_get_item(
        self: &Rc<Self>,
        receiver: &str,
        target: &Value,
        key: Value,
    ) -> RecordResult<Value> {
        let raw = target.get_item(&unwrap(&key))?;
        let (result, value) = self.adopt(raw);
        self.push(Opcode::new(receiver, Operand::Item(key), result));
        Ok(value)
    }

    fn forward_call(
        self: &Rc<Self>,
        receiver: &str,
        target: &Value,
        args: &[Value],
        kwargs: &[(String, Value)],
    ) -> RecordResult<Value> {
        let (plain_args, plain_kwargs) = unwrap_call(args, kwargs);
        let raw = target.call(&plain_args, &plain_kwargs)?;
        // A result outside the adapter's domain is still recorded, but the
        // caller gets the bare value and recording stops there.
        let escaped = (!raw.is_none() && !self.adapter().keeps_recording(&raw)).then(|| raw.clone());
        let (result, value) = self.adopt(raw);
        let operand = Operand::Call {
            args: args.to_vec(),
            kwargs: kwargs.to_vec(),
        };
        self.push(Opcode::new(receiver, operand, result));
        Ok(escaped.unwrap_or(value))
    }

    fn forward_set_attr(
        self: &Rc<Self>,
        receiver: &str,
        target: &Value,
        attr: &str,
        value: Value,
    ) -> RecordResult<()> {
        target.set_attr(attr, unwrap(&value))?;
        let operand = Operand::SetAttr {
            name: attr.to_string(),
            value,
        };
        self.push(Opcode::new(receiver, operand, None));
        Ok(())
    }

    /// Wrap a non-null result; `None` stays `None` and gets no name.
    fn adopt(self: &Rc<Self>, raw: Value) -> (Option<String>, Value) {
        if raw.is_none() {
            return (None, Value::None);
        }
        let proxy = self.wrap(raw);
        (Some(proxy.name().to_string()), proxy.value())
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Wrappers inside plain values
// ══════════════════════════════════════════════════════════════════════════

/// A wrapper reached through a plain value (say, an element of a list
/// argument) still records what is done to it.
impl HostObject for ProxyInner {
    fn type_name(&self) -> &str {
        self.target.type_name()
    }

    fn module(&self) -> Option<&str> {
        self.target.as_object().and_then(|obj| obj.module())
    }

    fn get_attr(&self, name: &str) -> OpResult<Value> {
        let session = self.session()?;
        Ok(session.forward_get_attr(&self.name, &self.target, name)?)
    }

    fn set_attr(&self, name: &str, value: Value) -> OpResult<()> {
        let session = self.session()?;
        Ok(session.forward_set_attr(&self.name, &self.target, name, value)?)
    }

    fn get_item(&self, key: &Value) -> OpResult<Value> {
        let session = self.session()?;
        Ok(session.forward_get_item(&self.name, &self.target, key.clone())?)
    }

    fn call(&self, args: &[Value], kwargs: &[(String, Value)]) -> OpResult<Value> {
        let session = self.session()?;
        Ok(session.forward_call(&self.name, &self.target, args, kwargs)?)
    }

    /// The recorded name. Registers the name as a known object so later
    /// literals can refer to it.
    fn repr(&self) -> String {
        if let Ok(session) = self.session() {
            session.register_known(self.name.as_ref(), self.target.clone());
        }
        self.name.to_string()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl From<&ProxyRef> for Value {
    fn from(proxy: &ProxyRef) -> Self {
        proxy.value()
    }
}

//! Host objects: the open-ended part of the value model.
//!
//! A domain exposes its objects by implementing [`HostObject`]. The four
//! operations a recorder can intercept (attribute read, item read, call,
//! attribute write) are the only behaviour the rest of the system relies on.

use crate::{OpError, OpResult, Value};
use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// A live object owned by the host domain.
///
/// Every operation defaults to the failure a dynamic runtime would report,
/// so implementors only override what their type supports. Mutation goes
/// through `&self`; implementors use interior mutability.
pub trait HostObject {
    /// Runtime category, e.g. `Figure`. Used to derive recorded names.
    fn type_name(&self) -> &str;

    /// A fixed name the object is known by, if any (a function's name).
    fn identity_name(&self) -> Option<&str> {
        None
    }

    /// The module the object's type belongs to.
    fn module(&self) -> Option<&str> {
        None
    }

    fn get_attr(&self, name: &str) -> OpResult<Value> {
        Err(OpError::no_attribute(self.type_name(), name))
    }

    fn set_attr(&self, name: &str, _value: Value) -> OpResult<()> {
        Err(OpError::ReadOnly {
            type_name: self.type_name().to_string(),
            attr: name.to_string(),
        })
    }

    fn get_item(&self, _key: &Value) -> OpResult<Value> {
        Err(OpError::NotSubscriptable(self.type_name().to_string()))
    }

    fn call(&self, _args: &[Value], _kwargs: &[(String, Value)]) -> OpResult<Value> {
        Err(OpError::NotCallable(self.type_name().to_string()))
    }

    /// Display form. Not expected to evaluate back to the object.
    fn repr(&self) -> String {
        match self.module() {
            Some(module) => format!("<{module}.{} object>", self.type_name()),
            None => format!("<{} object>", self.type_name()),
        }
    }

    fn as_any(&self) -> &dyn Any;
}

/// Shared handle to a host object. Equality is identity.
#[derive(Clone)]
pub struct ObjectRef(Rc<dyn HostObject>);

impl ObjectRef {
    pub fn new(object: impl HostObject + 'static) -> Self {
        Self(Rc::new(object))
    }

    pub fn from_rc(object: Rc<dyn HostObject>) -> Self {
        Self(object)
    }

    /// Address of the shared allocation; stable while any handle is alive.
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        self.id() == other.id()
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }
}

impl std::ops::Deref for ObjectRef {
    type Target = dyn HostObject;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.repr())
    }
}

type NativeBody = dyn Fn(&[Value], &[(String, Value)]) -> OpResult<Value>;

/// A callable host object backed by a Rust closure.
///
/// Hosts use it for module-level functions and for bound methods returned
/// from `get_attr`.
pub struct NativeFn {
    name: String,
    type_name: String,
    module: Option<String>,
    body: Rc<NativeBody>,
}

impl NativeFn {
    /// A free function. Its name doubles as its identity name.
    pub fn function(
        name: impl Into<String>,
        body: impl Fn(&[Value], &[(String, Value)]) -> OpResult<Value> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            type_name: "function".to_string(),
            module: None,
            body: Rc::new(body),
        }
    }

    /// A bound method; carries no identity name.
    pub fn method(
        name: impl Into<String>,
        body: impl Fn(&[Value], &[(String, Value)]) -> OpResult<Value> + 'static,
    ) -> Self {
        Self {
            type_name: "method".to_string(),
            ..Self::function(name, body)
        }
    }

    pub fn in_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn into_value(self) -> Value {
        Value::Object(ObjectRef::new(self))
    }
}

impl HostObject for NativeFn {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn identity_name(&self) -> Option<&str> {
        (self.type_name == "function").then_some(self.name.as_str())
    }

    fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    fn call(&self, args: &[Value], kwargs: &[(String, Value)]) -> OpResult<Value> {
        (self.body)(args, kwargs)
    }

    fn repr(&self) -> String {
        match self.module.as_deref() {
            Some(module) => format!("<{} {module}.{}>", self.type_name, self.name),
            None => format!("<{} {}>", self.type_name, self.name),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Look up a keyword argument by name.
pub fn kwarg<'a>(kwargs: &'a [(String, Value)], name: &str) -> Option<&'a Value> {
    kwargs.iter().find(|(k, _)| k == name).map(|(_, v)| v)
}

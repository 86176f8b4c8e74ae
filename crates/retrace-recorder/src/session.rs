//! The recording session shared by every wrapper descending from one root.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;

use retrace_types::{ObjectRef, Value};

use crate::adapter::{Adapter, DefaultAdapter};
use crate::config::RecorderConfig;
use crate::naming::{base_name, known_identity, NameRegistry};
use crate::proxy::ProxyRef;
use crate::serializer::DataPool;
use crate::trace::Opcode;

/// One recording: trace, name registry, data pool and known objects.
///
/// Sessions are shared through `Rc` and mutated through `RefCell`, so they
/// are neither `Send` nor `Sync`; all recording happens on one thread.
pub struct Session {
    trace: RefCell<Vec<Opcode>>,
    names: RefCell<NameRegistry>,
    pool: RefCell<DataPool>,
    known: RefCell<BTreeMap<String, Value>>,
    /// Unrecordable operands already logged, by opcode position and text.
    warned: RefCell<HashSet<(usize, String)>>,
    adapter: Box<dyn Adapter>,
    config: RecorderConfig,
}

impl Session {
    pub fn new(adapter: impl Adapter + 'static, config: RecorderConfig) -> Rc<Self> {
        Rc::new(Self {
            trace: RefCell::new(Vec::new()),
            names: RefCell::new(NameRegistry::new()),
            pool: RefCell::new(DataPool::new()),
            known: RefCell::new(BTreeMap::new()),
            warned: RefCell::new(HashSet::new()),
            adapter: Box::new(adapter),
            config,
        })
    }

    /// A session with [`DefaultAdapter`] and the default configuration.
    pub fn with_defaults() -> Rc<Self> {
        Self::new(DefaultAdapter::new(), RecorderConfig::default())
    }

    /// Bind `name` to `value` in the known-objects map.
    pub fn register_known(&self, name: impl Into<String>, value: Value) {
        self.known.borrow_mut().insert(name.into(), value);
    }

    /// Wrap a root value. Register known objects first so that a root with
    /// a matching identity name keeps it.
    pub fn wrap(self: &Rc<Self>, root: Value) -> ProxyRef {
        ProxyRef::new(Rc::clone(self), root)
    }

    // ── Inspection ────────────────────────────────────────────────────────

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    pub fn adapter(&self) -> &dyn Adapter {
        self.adapter.as_ref()
    }

    pub fn trace_len(&self) -> usize {
        self.trace.borrow().len()
    }

    /// Snapshot of the trace.
    pub fn opcodes(&self) -> Vec<Opcode> {
        self.trace.borrow().clone()
    }

    /// Snapshot of the known-objects map.
    pub fn known_objects(&self) -> BTreeMap<String, Value> {
        self.known.borrow().clone()
    }

    pub fn is_known(&self, name: &str) -> bool {
        self.known.borrow().contains_key(name)
    }

    pub fn data_blobs(&self) -> Vec<Vec<u8>> {
        self.pool.borrow().blobs().to_vec()
    }

    // ── Crate internals ───────────────────────────────────────────────────

    pub(crate) fn push(&self, opcode: Opcode) {
        tracing::debug!(
            kind = %opcode.kind(),
            receiver = %opcode.receiver,
            result = ?opcode.result,
            "recorded"
        );
        self.trace.borrow_mut().push(opcode);
    }

    /// Name for a freshly wrapped value: its known identity name, or a
    /// minted one derived from its category.
    pub(crate) fn name_for(&self, value: &Value) -> String {
        let known = self.known.borrow();
        if let Some(name) = known_identity(value, &known) {
            return name;
        }
        let category = value.type_name();
        let base = base_name(self.adapter.mnemonic(category).unwrap_or(category));
        self.names
            .borrow_mut()
            .mint(&base, |candidate| known.contains_key(candidate))
    }

    pub(crate) fn is_minted(&self, name: &str) -> bool {
        self.names.borrow().is_minted(name)
    }

    /// The known name bound to this very object, if any.
    pub(crate) fn known_name_of(&self, obj: &ObjectRef) -> Option<String> {
        self.known
            .borrow()
            .iter()
            .find(|(_, value)| value.as_object().is_some_and(|o| o.ptr_eq(obj)))
            .map(|(name, _)| name.clone())
    }

    /// `true` the first time an unrecordable operand of `opcode` is seen.
    /// Every generated program still reports its warnings; only logging
    /// happens once.
    pub(crate) fn first_warning(&self, opcode: usize, argument: &str) -> bool {
        self.warned
            .borrow_mut()
            .insert((opcode, argument.to_string()))
    }

    pub(crate) fn intern_blob(&self, blob: Vec<u8>) -> usize {
        self.pool.borrow_mut().intern(blob)
    }
}

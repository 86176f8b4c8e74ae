//! Recorded operations.

use retrace_types::Value;
use std::fmt;

/// Which of the four intercepted operations an [`Opcode`] records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    GetAttr,
    GetItem,
    Call,
    SetAttr,
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OpKind::GetAttr => "get-attribute",
            OpKind::GetItem => "get-item",
            OpKind::Call => "call",
            OpKind::SetAttr => "set-attribute",
        })
    }
}

/// Operands exactly as the caller supplied them, wrappers included.
#[derive(Debug, Clone)]
pub enum Operand {
    Attr(String),
    Item(Value),
    Call {
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
    },
    SetAttr {
        name: String,
        value: Value,
    },
}

/// One recorded event. Never changed once appended to the trace.
#[derive(Debug, Clone)]
pub struct Opcode {
    /// Name of the wrapper the operation was performed on.
    pub receiver: String,
    pub operand: Operand,
    /// Name of the wrapper holding the result; `None` for a null result or
    /// an attribute assignment.
    pub result: Option<String>,
}

impl Opcode {
    pub fn new(receiver: impl Into<String>, operand: Operand, result: Option<String>) -> Self {
        Self {
            receiver: receiver.into(),
            operand,
            result,
        }
    }

    pub fn kind(&self) -> OpKind {
        match self.operand {
            Operand::Attr(_) => OpKind::GetAttr,
            Operand::Item(_) => OpKind::GetItem,
            Operand::Call { .. } => OpKind::Call,
            Operand::SetAttr { .. } => OpKind::SetAttr,
        }
    }
}

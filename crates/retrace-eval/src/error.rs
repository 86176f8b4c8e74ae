//! Runtime error types for the evaluator.

use retrace_types::{CodecError, OpError, ScriptErrors};
use thiserror::Error;

/// Evaluation error: a script that failed to parse, or a runtime failure.
#[derive(Debug, Error)]
pub enum EvalError {
    /// The script or expression did not parse.
    #[error("syntax error: {0}")]
    Syntax(ScriptErrors),
    /// A failure raised by a value or host object.
    #[error(transparent)]
    Op(#[from] OpError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("name '{0}' is not defined")]
    UndefinedName(String),
    #[error("no module named '{0}'")]
    UnknownModule(String),
    #[error("cannot import name '{name}' from '{module}'")]
    UnknownImport { module: String, name: String },
    /// Literal evaluation only permits the `set()` builtin.
    #[error("calls are not allowed here: {0}")]
    CallsDisabled(String),
    #[error("bad operand type for unary -: '{0}'")]
    BadOperand(String),
    #[error("maximum call depth of {0} exceeded")]
    CallDepth(usize),
}

/// Result alias for evaluator operations.
pub type EvalResult<T> = Result<T, EvalError>;

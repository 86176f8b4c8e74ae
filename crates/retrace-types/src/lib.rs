//! Shared types for retrace.
//!
//! Defines the dynamic [`Value`] model and the [`HostObject`] seam through
//! which domains expose live objects, plus the script AST, source spans,
//! structured script errors and the opaque blob codec used by the other
//! crates.

pub mod ast;
pub mod codec;
mod error;
mod object;
mod span;
mod value;

pub use error::{
    CodecError, ErrorCategory, ErrorCode, OpError, OpResult, ScriptError, ScriptErrors,
    MAX_ERRORS,
};
pub use object::{kwarg, HostObject, NativeFn, ObjectRef};
pub use span::{SourceFile, Span};
pub use value::{format_float, quote_bytes, quote_str, DictRef, ListRef, TupleRef, Value};

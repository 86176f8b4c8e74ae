//! retrace evaluator.
//!
//! Two entry points:
//! - [`eval_literal`] turns literal text back into a value with host calls
//!   disabled; the recorder uses it to decide whether a literal is faithful.
//! - [`Interpreter`] runs whole scripts, such as generated programs, against
//!   registered host modules.

pub mod env;
pub mod error;
pub mod evaluator;
pub mod interpreter;

pub use error::{EvalError, EvalResult};
pub use evaluator::Evaluator;
pub use interpreter::{Interpreter, CODEC_MODULE};

use retrace_parser::parse_expression_source;
use retrace_types::{SourceFile, Value};
use std::collections::BTreeMap;

/// Evaluate literal text. Names resolve through `known`; calls other than
/// `set()` are rejected.
pub fn eval_literal(text: &str, known: &BTreeMap<String, Value>) -> EvalResult<Value> {
    let sf = SourceFile::new("<literal>", text);
    let parsed = parse_expression_source(&sf);
    match parsed.expr {
        Some(expr) if !parsed.errors.has_errors() => Evaluator::literal(known).eval_expr(&expr),
        _ => Err(EvalError::Syntax(parsed.errors)),
    }
}

use crate::Span;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Maximum number of errors kept before the lexer or parser gives up.
pub const MAX_ERRORS: usize = 20;

/// Numeric error code for script diagnostics.
///
/// E100–E199 are lexical, E200–E299 are syntactic, E300–E399 are layout
/// (indentation and block structure).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    // ── Lexical (E100–E199) ──
    pub const UNEXPECTED_CHARACTER: Self = Self(100);
    pub const UNTERMINATED_STRING: Self = Self(101);
    pub const INVALID_ESCAPE: Self = Self(102);
    pub const INVALID_NUMBER: Self = Self(103);

    // ── Syntax (E200–E299) ──
    pub const UNEXPECTED_TOKEN: Self = Self(200);
    pub const INVALID_ASSIGNMENT_TARGET: Self = Self(201);
    pub const DUPLICATE_KEYWORD_ARGUMENT: Self = Self(202);
    pub const POSITIONAL_AFTER_KEYWORD: Self = Self(203);
    pub const NESTING_TOO_DEEP: Self = Self(204);

    // ── Layout (E300–E399) ──
    pub const UNEXPECTED_INDENT: Self = Self(300);
    pub const EXPECTED_BLOCK: Self = Self(301);

    pub fn category(self) -> ErrorCategory {
        match self.0 {
            100..=199 => ErrorCategory::Lexical,
            300..=399 => ErrorCategory::Layout,
            _ => ErrorCategory::Syntax,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Lexical,
    Syntax,
    Layout,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lexical => write!(f, "lexical"),
            Self::Syntax => write!(f, "syntax"),
            Self::Layout => write!(f, "layout"),
        }
    }
}

/// A structured diagnostic produced while reading script text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptError {
    pub file: String,
    pub code: ErrorCode,
    pub category: ErrorCategory,
    pub message: String,
    #[serde(flatten)]
    pub span: Span,
    pub source_line: String,
}

impl ScriptError {
    pub fn new(
        file: impl Into<String>,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
        source_line: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            code,
            category: code.category(),
            message: message.into(),
            span,
            source_line: source_line.into(),
        }
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {} [{}] {}",
            self.file, self.span, self.code, self.category, self.message
        )
    }
}

impl std::error::Error for ScriptError {}

/// Errors collected over one lexing or parsing pass.
///
/// At most [`MAX_ERRORS`] are stored; `total` keeps counting past the cap.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScriptErrors {
    pub errors: Vec<ScriptError>,
    pub total: usize,
}

impl ScriptErrors {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        self.total > 0
    }

    /// `true` once the cap is reached and further scanning is pointless.
    pub fn is_full(&self) -> bool {
        self.total >= MAX_ERRORS
    }

    pub fn push(&mut self, error: ScriptError) {
        if self.errors.len() < MAX_ERRORS {
            self.errors.push(error);
        }
        self.total += 1;
    }

    /// Append another pass's errors, respecting the cap.
    pub fn extend(&mut self, other: ScriptErrors) {
        let extra = other.total.saturating_sub(other.errors.len());
        for error in other.errors {
            self.push(error);
        }
        self.total += extra;
    }

    pub fn first(&self) -> Option<&ScriptError> {
        self.errors.first()
    }
}

impl fmt::Display for ScriptErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{error}")?;
        }
        if self.total > self.errors.len() {
            write!(f, "\n... and {} more", self.total - self.errors.len())?;
        }
        Ok(())
    }
}

/// Failure of an operation performed directly on a value or host object.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OpError {
    #[error("'{type_name}' object has no attribute '{attr}'")]
    NoAttribute { type_name: String, attr: String },

    #[error("cannot set attribute '{attr}' on '{type_name}' object")]
    ReadOnly { type_name: String, attr: String },

    #[error("'{0}' object is not callable")]
    NotCallable(String),

    #[error("'{0}' object is not subscriptable")]
    NotSubscriptable(String),

    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("key not found: {0}")]
    KeyNotFound(String),

    #[error("bad argument: {0}")]
    BadArgument(String),

    #[error("{0}")]
    Host(String),
}

impl OpError {
    pub fn no_attribute(type_name: impl Into<String>, attr: impl Into<String>) -> Self {
        Self::NoAttribute {
            type_name: type_name.into(),
            attr: attr.into(),
        }
    }

    pub fn bad_argument(message: impl Into<String>) -> Self {
        Self::BadArgument(message.into())
    }
}

/// Result of an operation on a value.
pub type OpResult<T> = Result<T, OpError>;

/// Failure of the opaque blob codec.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("value cannot be encoded: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("blob cannot be decoded: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("value contains a reference cycle")]
    Cyclic,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error(i: u32) -> ScriptError {
        ScriptError::new(
            "t.rt",
            ErrorCode::UNEXPECTED_TOKEN,
            format!("error {i}"),
            Span::point(i + 1, 1),
            "",
        )
    }

    #[test]
    fn code_categories() {
        assert_eq!(
            ErrorCode::UNTERMINATED_STRING.category(),
            ErrorCategory::Lexical
        );
        assert_eq!(
            ErrorCode::INVALID_ASSIGNMENT_TARGET.category(),
            ErrorCategory::Syntax
        );
        assert_eq!(
            ErrorCode::UNEXPECTED_INDENT.category(),
            ErrorCategory::Layout
        );
    }

    #[test]
    fn code_display() {
        assert_eq!(ErrorCode::INVALID_NUMBER.to_string(), "E103");
    }

    #[test]
    fn errors_are_capped_but_counted() {
        let mut errors = ScriptErrors::empty();
        for i in 0..25 {
            errors.push(error(i));
        }
        assert_eq!(errors.errors.len(), MAX_ERRORS);
        assert_eq!(errors.total, 25);
        assert!(errors.is_full());
    }

    #[test]
    fn extend_keeps_overflow_count() {
        let mut a = ScriptErrors::empty();
        a.push(error(0));
        let mut b = ScriptErrors::empty();
        for i in 0..22 {
            b.push(error(i));
        }
        a.extend(b);
        assert_eq!(a.total, 23);
        assert_eq!(a.errors.len(), MAX_ERRORS);
    }

    #[test]
    fn script_error_json_uses_flat_span() {
        let json = serde_json::to_string(&error(4)).unwrap();
        assert!(json.contains("\"line\":5"));
        assert!(json.contains("\"column\":1"));
        assert!(json.contains("\"category\":\"syntax\""));
    }

    #[test]
    fn op_error_messages() {
        assert_eq!(
            OpError::no_attribute("Figure", "plot").to_string(),
            "'Figure' object has no attribute 'plot'"
        );
        assert_eq!(
            OpError::NotCallable("int".into()).to_string(),
            "'int' object is not callable"
        );
    }
}

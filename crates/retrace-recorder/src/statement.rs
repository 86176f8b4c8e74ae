//! Statement Builder: one structured statement per opcode.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use retrace_types::Value;

use crate::error::{RecordError, RecordResult};
use crate::naming::is_identifier;
use crate::session::Session;
use crate::trace::{Opcode, Operand};

/// `lvalue = rvalue + suffix`, or `rvalue + suffix` when there is no lvalue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub lvalue: Option<String>,
    pub rvalue: String,
    pub suffix: String,
    /// `false` when an operand could not be rendered faithfully; such a
    /// statement is emitted as a comment.
    pub recordable: bool,
}

impl Statement {
    pub fn new(
        lvalue: Option<&str>,
        rvalue: &str,
        suffix: impl Into<String>,
        recordable: bool,
    ) -> Self {
        Self {
            lvalue: lvalue.map(str::to_string),
            rvalue: rvalue.to_string(),
            suffix: suffix.into(),
            recordable,
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(lvalue) = &self.lvalue {
            write!(f, "{lvalue} = ")?;
        }
        write!(f, "{}{}", self.rvalue, self.suffix)
    }
}

/// An operand that could only be rendered as non-executable text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordWarning {
    /// Position of the opcode in the trace.
    pub opcode: usize,
    pub receiver: String,
    /// Best-effort rendering of the offending operand.
    pub argument: String,
}

impl fmt::Display for RecordWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "one of the arguments to {} can't be recorded: {}",
            self.receiver, self.argument
        )
    }
}

/// Renders operands for one opcode, degrading to non-strict mode per
/// operand and remembering whether it had to.
struct OperandWriter<'a> {
    session: &'a Session,
    opcode: usize,
    receiver: &'a str,
    recordable: bool,
    warnings: &'a mut Vec<RecordWarning>,
}

impl OperandWriter<'_> {
    fn render(&mut self, value: &Value) -> RecordResult<String> {
        match self.session.serialize(value, true) {
            Err(RecordError::Unrecordable(text)) => {
                self.degrade(text);
                self.session.serialize(value, false)
            }
            other => other,
        }
    }

    /// An attribute or keyword-argument name. One that the script dialect
    /// cannot spell (a keyword, `my-kw`) makes the statement a comment.
    fn member<'n>(&mut self, name: &'n str) -> &'n str {
        if !is_identifier(name) {
            self.degrade(name.to_string());
        }
        name
    }

    fn degrade(&mut self, text: String) {
        if self.session.first_warning(self.opcode, &text) {
            tracing::warn!(
                receiver = self.receiver,
                argument = %text,
                "one of the arguments can't be recorded"
            );
        }
        self.warnings.push(RecordWarning {
            opcode: self.opcode,
            receiver: self.receiver.to_string(),
            argument: text,
        });
        self.recordable = false;
    }
}

impl Session {
    /// Build one statement per opcode, in trace order.
    pub fn build_statements(
        &self,
        trace: &[Opcode],
    ) -> RecordResult<(Vec<Statement>, Vec<RecordWarning>)> {
        let mut statements = Vec::with_capacity(trace.len());
        let mut warnings = Vec::new();
        for (index, opcode) in trace.iter().enumerate() {
            let mut writer = OperandWriter {
                session: self,
                opcode: index,
                receiver: &opcode.receiver,
                recordable: true,
                warnings: &mut warnings,
            };
            let suffix = match &opcode.operand {
                Operand::Attr(name) => format!(".{}", writer.member(name)),
                Operand::Item(key) => format!("[{}]", writer.render(key)?),
                Operand::Call { args, kwargs } => {
                    let mut parts = Vec::with_capacity(args.len() + kwargs.len());
                    for arg in args {
                        parts.push(writer.render(arg)?);
                    }
                    for (name, value) in kwargs {
                        let name = writer.member(name);
                        parts.push(format!("{name}={}", writer.render(value)?));
                    }
                    format!("({})", parts.join(", "))
                }
                Operand::SetAttr { name, value } => {
                    let name = writer.member(name);
                    format!(".{name} = {}", writer.render(value)?)
                }
            };
            let recordable = writer.recordable;
            statements.push(Statement {
                lvalue: opcode.result.clone(),
                rvalue: opcode.receiver.clone(),
                suffix,
                recordable,
            });
        }
        Ok((statements, warnings))
    }

    /// Fail if a minted name is assigned by more than one statement.
    ///
    /// Names bound in the known-objects map are exempt: a known root can be
    /// reached, and so assigned, more than once.
    pub fn check_unique_names(&self, statements: &[Statement]) -> RecordResult<()> {
        check_unique_names(statements, &self.known_objects(), |name| {
            self.is_minted(name)
        })
    }
}

pub(crate) fn check_unique_names(
    statements: &[Statement],
    known: &BTreeMap<String, Value>,
    minted: impl Fn(&str) -> bool,
) -> RecordResult<()> {
    let mut seen = HashSet::new();
    for lvalue in statements.iter().filter_map(|s| s.lvalue.as_deref()) {
        if known.contains_key(lvalue) || !minted(lvalue) {
            continue;
        }
        if !seen.insert(lvalue) {
            tracing::warn!(name = lvalue, "recorded name assigned twice");
            return Err(RecordError::NameCollision(lvalue.to_string()));
        }
    }
    Ok(())
}

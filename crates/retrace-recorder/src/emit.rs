//! Code Emitter: header, entry point, data section, footer.

use std::path::Path;

use retrace_types::quote_str;

use crate::compress::compress;
use crate::error::RecordResult;
use crate::serializer::placeholder;
use crate::session::Session;
use crate::statement::RecordWarning;

/// A generated program, by section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedProgram {
    pub header: Vec<String>,
    /// The entry point definition, including its comment and `def` line.
    pub body: Vec<String>,
    /// Embedded data declarations; empty when nothing was embedded.
    pub data: Vec<String>,
    pub footer: Vec<String>,
    /// One per operand that could not be recorded faithfully.
    pub warnings: Vec<RecordWarning>,
}

impl GeneratedProgram {
    /// Header, blank, body, blank, data, blank, footer.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = self.header.clone();
        lines.push(String::new());
        lines.extend(self.body.iter().cloned());
        lines.push(String::new());
        lines.extend(self.data.iter().cloned());
        lines.push(String::new());
        lines.extend(self.footer.iter().cloned());
        lines
    }

    /// The program as one newline-terminated text.
    pub fn to_source(&self) -> String {
        let mut source = self.lines().join("\n");
        source.push('\n');
        source
    }
}

impl Session {
    /// Compile the current trace into a program. `target` is passed on to
    /// the adapter's footer.
    pub fn generate(&self, target: Option<&Path>) -> RecordResult<GeneratedProgram> {
        let trace = self.opcodes();
        let (statements, warnings) = self.build_statements(&trace)?;
        self.check_unique_names(&statements)?;
        let statements = compress(statements, |name| self.is_known(name));

        let config = self.config();
        let mut body = vec![
            "# this function is called at the end of the script".to_string(),
            format!("def {}():", config.entry_point),
        ];
        for statement in &statements {
            let line = format!("{}{statement}", config.indent);
            body.push(if statement.recordable {
                line
            } else {
                format!("#{line}")
            });
        }
        // A body of comments alone is not a block.
        if !statements.iter().any(|statement| statement.recordable) {
            body.push(format!("{}pass", config.indent));
        }

        let program = GeneratedProgram {
            header: self.adapter().header(config),
            body,
            data: self.data_section(),
            footer: self.adapter().footer(config, target),
            warnings,
        };
        tracing::debug!(
            opcodes = trace.len(),
            statements = statements.len(),
            warnings = program.warnings.len(),
            "generated program"
        );
        Ok(program)
    }

    fn data_section(&self) -> Vec<String> {
        let blobs = self.data_blobs();
        if blobs.is_empty() {
            return Vec::new();
        }
        let mut lines = vec![if blobs.len() == 1 {
            "# The next line holds data too large or not readable as a literal".to_string()
        } else {
            "# The next lines hold data too large or not readable as a literal".to_string()
        }];
        for (index, blob) in blobs.iter().enumerate() {
            let text = String::from_utf8_lossy(blob);
            lines.push(format!(
                "{} = {}({})",
                placeholder(index),
                self.config().deserializer,
                quote_str(&text)
            ));
        }
        lines
    }
}

//! Core parser infrastructure: token cursor, error reporting, helpers.

use retrace_lexer::{Lexer, Token, TokenKind};
use retrace_types::ast::{Expr, Ident, Program};
use retrace_types::{ErrorCode, ScriptError, ScriptErrors, SourceFile, Span};

/// Maximum nesting of brackets and postfix chains in one expression.
pub(crate) const MAX_EXPR_DEPTH: u32 = 100;

/// The retrace parser.
///
/// Consumes a token stream produced by the lexer and builds an AST.
/// Collects errors and resynchronizes at the next line where possible.
pub struct Parser<'src> {
    tokens: Vec<Token>,
    pos: usize,
    source_file: &'src SourceFile,
    errors: ScriptErrors,
    /// Current expression nesting depth.
    pub(crate) expr_depth: u32,
}

/// Result of parsing a whole script.
pub struct ParseResult {
    /// `None` only when the input could not be parsed at all.
    pub program: Option<Program>,
    pub errors: ScriptErrors,
}

/// Result of parsing a single expression.
pub struct ExprResult {
    pub expr: Option<Expr>,
    pub errors: ScriptErrors,
}

impl ParseResult {
    pub fn is_ok(&self) -> bool {
        self.program.is_some() && !self.errors.has_errors()
    }
}

impl ExprResult {
    pub fn is_ok(&self) -> bool {
        self.expr.is_some() && !self.errors.has_errors()
    }
}

/// Lex and parse a script, merging errors from both passes.
pub fn parse_source(source_file: &SourceFile) -> ParseResult {
    let lexed = Lexer::new(source_file).lex();
    let mut result = Parser::new(lexed.tokens, source_file).parse();
    let mut errors = lexed.errors;
    errors.extend(result.errors);
    result.errors = errors;
    result
}

/// Lex and parse text that must consist of exactly one expression.
pub fn parse_expression_source(source_file: &SourceFile) -> ExprResult {
    let lexed = Lexer::new(source_file).lex();
    let mut result = Parser::new(lexed.tokens, source_file).parse_expression_only();
    let mut errors = lexed.errors;
    errors.extend(result.errors);
    result.errors = errors;
    result
}

impl<'src> Parser<'src> {
    pub fn new(tokens: Vec<Token>, source_file: &'src SourceFile) -> Self {
        Self {
            tokens,
            pos: 0,
            source_file,
            errors: ScriptErrors::empty(),
            expr_depth: 0,
        }
    }

    // ── Token Cursor ──────────────────────────────────────────────────────────

    /// Returns the current token without advancing.
    pub(crate) fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).or_else(|| self.tokens.last())
    }

    pub(crate) fn peek_kind(&self) -> &TokenKind {
        self.peek().map(|t| &t.kind).unwrap_or(&TokenKind::Eof)
    }

    /// Advance the cursor by one and return the consumed token's span.
    pub(crate) fn advance(&mut self) -> Span {
        let span = self.current_span();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        span
    }

    pub(crate) fn previous_span(&self) -> Span {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|t| t.span)
            .unwrap_or_else(|| Span::point(1, 1))
    }

    pub(crate) fn current_span(&self) -> Span {
        self.peek().map(|t| t.span).unwrap_or_else(|| Span::point(1, 1))
    }

    /// Column of the current token, used for block membership.
    pub(crate) fn current_col(&self) -> u32 {
        self.current_span().start_col
    }

    pub(crate) fn at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    /// If the current token matches, advance and return `true`.
    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn look_ahead(&self, n: usize) -> &TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    // ── Newline Handling ──────────────────────────────────────────────────────

    pub(crate) fn skip_newlines(&mut self) {
        while self.check(&TokenKind::Newline) {
            self.advance();
        }
    }

    /// Expect the end of a logical line. Reports an error otherwise.
    pub(crate) fn expect_newline_or_eof(&mut self) {
        if self.at_end() {
            return;
        }
        if self.check(&TokenKind::Newline) {
            self.advance();
            self.skip_newlines();
        } else {
            self.error_at_current(
                ErrorCode::UNEXPECTED_TOKEN,
                format!("expected end of line, got '{}'", self.peek_kind()),
            );
        }
    }

    // ── Expect Helpers ────────────────────────────────────────────────────────

    pub(crate) fn expect(&mut self, expected: &TokenKind) -> Option<Span> {
        if self.check(expected) {
            Some(self.advance())
        } else {
            self.error_at_current(
                ErrorCode::UNEXPECTED_TOKEN,
                format!("expected '{}', got '{}'", expected, self.peek_kind()),
            );
            None
        }
    }

    pub(crate) fn expect_identifier(&mut self) -> Option<Ident> {
        match self.peek_kind().clone() {
            TokenKind::Identifier(name) => {
                let span = self.advance();
                Some(Ident::new(name, span))
            }
            _ => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected identifier, got '{}'", self.peek_kind()),
                );
                None
            }
        }
    }

    // ── Error Reporting ───────────────────────────────────────────────────────

    pub(crate) fn error_at_current(&mut self, code: ErrorCode, message: impl Into<String>) {
        let span = self.current_span();
        self.error_at(code, message, span);
    }

    pub(crate) fn error_at(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        let source_line = self.source_file.line(span.start_line).unwrap_or("");
        let error = ScriptError::new(&self.source_file.name, code, message, span, source_line);
        self.errors.push(error);
    }

    pub(crate) fn too_many_errors(&self) -> bool {
        self.errors.is_full()
    }

    // ── Synchronization ───────────────────────────────────────────────────────

    /// Skip to the start of the next logical line.
    pub(crate) fn synchronize(&mut self) {
        while !self.at_end() {
            if self.check(&TokenKind::Newline) {
                self.skip_newlines();
                return;
            }
            self.advance();
        }
    }

    // ── Public API ────────────────────────────────────────────────────────────

    /// Parse the token stream into a [`Program`].
    pub fn parse(mut self) -> ParseResult {
        self.skip_newlines();
        let program = self.parse_program();
        ParseResult {
            program,
            errors: self.errors,
        }
    }

    /// Parse the token stream as one expression followed by end of input.
    ///
    /// Trailing newlines are allowed; anything else after the expression is
    /// an error.
    pub fn parse_expression_only(mut self) -> ExprResult {
        self.skip_newlines();
        let expr = self.parse_expression();
        if expr.is_some() {
            self.skip_newlines();
            if !self.at_end() {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("unexpected '{}' after expression", self.peek_kind()),
                );
            }
        }
        ExprResult {
            expr,
            errors: self.errors,
        }
    }
}

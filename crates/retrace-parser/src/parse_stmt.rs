//! Statement parsing and indentation-based blocks.
//!
//! A block is the run of statements whose first token starts in the same
//! column. A block ends at the first statement that starts further left.

use retrace_lexer::TokenKind;
use retrace_types::ast::*;
use retrace_types::ErrorCode;

use crate::parser::Parser;

impl<'src> Parser<'src> {
    pub(crate) fn parse_program(&mut self) -> Option<Program> {
        let start = self.current_span();
        let mut statements = Vec::new();
        while !self.at_end() && !self.too_many_errors() {
            if self.current_col() > 1 {
                self.error_at_current(ErrorCode::UNEXPECTED_INDENT, "unexpected indent");
            }
            self.parse_statement_into(&mut statements);
        }
        let span = start.merge(self.previous_span());
        Some(Program { statements, span })
    }

    /// Parse one statement, resynchronizing at the next line on failure.
    fn parse_statement_into(&mut self, out: &mut Vec<Stmt>) {
        match self.parse_statement() {
            Some(stmt) => out.push(stmt),
            None => self.synchronize(),
        }
        self.skip_newlines();
    }

    /// Parse the indented body of a compound statement opened at `parent_col`.
    fn parse_block(&mut self, parent_col: u32) -> Vec<Stmt> {
        let mut body = Vec::new();
        if !self.eat(&TokenKind::Newline) {
            // `def f(): stmt` on a single line
            self.parse_statement_into(&mut body);
            return body;
        }
        self.skip_newlines();
        let block_col = self.current_col();
        if self.at_end() || block_col <= parent_col {
            self.error_at_current(ErrorCode::EXPECTED_BLOCK, "expected an indented block");
            return body;
        }
        while !self.at_end() && !self.too_many_errors() {
            let col = self.current_col();
            if col < block_col {
                break;
            }
            if col > block_col {
                self.error_at_current(ErrorCode::UNEXPECTED_INDENT, "unexpected indent");
            }
            self.parse_statement_into(&mut body);
        }
        body
    }

    pub(crate) fn parse_statement(&mut self) -> Option<Stmt> {
        match self.peek_kind() {
            TokenKind::Def => self.parse_def(),
            TokenKind::From => self.parse_import(),
            TokenKind::Pass => {
                let span = self.advance();
                self.expect_newline_or_eof();
                Some(Stmt::new(StmtKind::Pass, span))
            }
            _ => self.parse_simple_statement(),
        }
    }

    /// `def name():` followed by a block.
    fn parse_def(&mut self) -> Option<Stmt> {
        let start = self.current_span();
        let parent_col = start.start_col;
        self.advance(); // eat `def`
        let name = self.expect_identifier()?;
        self.expect(&TokenKind::LParen)?;
        self.expect(&TokenKind::RParen)?;
        self.expect(&TokenKind::Colon)?;
        let body = self.parse_block(parent_col);
        let span = start.merge(self.previous_span());
        Some(Stmt::new(StmtKind::Def { name, body }, span))
    }

    /// `from a.b import x, y` or `from a.b import *`
    fn parse_import(&mut self) -> Option<Stmt> {
        let start = self.current_span();
        self.advance(); // eat `from`
        let mut module = self.expect_identifier()?.name;
        while self.eat(&TokenKind::Dot) {
            module.push('.');
            module.push_str(&self.expect_identifier()?.name);
        }
        self.expect(&TokenKind::Import)?;
        let names = if self.eat(&TokenKind::Star) {
            ImportNames::All
        } else {
            let mut names = vec![self.expect_identifier()?];
            while self.eat(&TokenKind::Comma) {
                names.push(self.expect_identifier()?);
            }
            ImportNames::Names(names)
        };
        let span = start.merge(self.previous_span());
        self.expect_newline_or_eof();
        Some(Stmt::new(StmtKind::Import { module, names }, span))
    }

    /// Assignment, attribute assignment, or a bare expression.
    fn parse_simple_statement(&mut self) -> Option<Stmt> {
        let target = self.parse_expression()?;
        if !self.eat(&TokenKind::Eq) {
            let span = target.span;
            self.expect_newline_or_eof();
            return Some(Stmt::new(StmtKind::Expr(target), span));
        }

        let value = self.parse_expression()?;
        let span = target.span.merge(value.span);
        let kind = match target.kind {
            ExprKind::Identifier(name) => StmtKind::Assign {
                target: Ident::new(name, target.span),
                value,
            },
            ExprKind::Attr { object, name } => StmtKind::SetAttr {
                object: *object,
                attr: name,
                value,
            },
            _ => {
                self.error_at(
                    ErrorCode::INVALID_ASSIGNMENT_TARGET,
                    "can only assign to a name or an attribute",
                    target.span,
                );
                return None;
            }
        };
        self.expect_newline_or_eof();
        Some(Stmt::new(kind, span))
    }
}

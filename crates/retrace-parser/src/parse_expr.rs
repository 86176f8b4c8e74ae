//! Expression parsing.
//!
//! Precedence (lowest → highest):
//! 2. unary `-`
//! 1. `.name` (attribute), `[index]` (item), `(args)` (call)

use retrace_lexer::TokenKind;
use retrace_types::ast::*;
use retrace_types::{ErrorCode, Span};

use crate::parser::{Parser, MAX_EXPR_DEPTH};

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════════
    // Entry Point
    // ══════════════════════════════════════════════════════════════════════════

    pub(crate) fn parse_expression(&mut self) -> Option<Expr> {
        self.expr_depth += 1;
        if self.expr_depth > MAX_EXPR_DEPTH {
            self.error_at_current(
                ErrorCode::NESTING_TOO_DEEP,
                format!("maximum expression nesting depth is {MAX_EXPR_DEPTH}"),
            );
            self.expr_depth -= 1;
            return None;
        }
        let result = self.parse_unary();
        self.expr_depth -= 1;
        result
    }

    /// `UnaryExpr = [ "-" ] UnaryExpr | PostfixExpr`
    fn parse_unary(&mut self) -> Option<Expr> {
        if !self.check(&TokenKind::Minus) {
            return self.parse_postfix();
        }
        let start = self.advance();
        let operand = self.parse_expression()?;
        let span = start.merge(operand.span);
        Some(Expr::new(ExprKind::Neg(Box::new(operand)), span))
    }

    /// `PostfixExpr = PrimaryExpr { "." Identifier | "[" Index "]" | "(" Args ")" }`
    fn parse_postfix(&mut self) -> Option<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek_kind() {
                TokenKind::Dot => {
                    self.advance(); // eat `.`
                    let name = self.expect_identifier()?;
                    let span = expr.span.merge(name.span);
                    expr = Expr::new(
                        ExprKind::Attr {
                            object: Box::new(expr),
                            name,
                        },
                        span,
                    );
                }
                TokenKind::LBracket => {
                    let open = self.advance();
                    let index = self.parse_index(open)?;
                    let span = expr.span.merge(self.previous_span());
                    expr = Expr::new(
                        ExprKind::Index {
                            object: Box::new(expr),
                            index: Box::new(index),
                        },
                        span,
                    );
                }
                TokenKind::LParen => {
                    self.advance(); // eat `(`
                    let (args, kwargs) = self.parse_call_args()?;
                    let span = expr.span.merge(self.previous_span());
                    expr = Expr::new(
                        ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                            kwargs,
                        },
                        span,
                    );
                }
                _ => break,
            }
        }
        Some(expr)
    }

    /// The inside of `[...]`. A comma makes the key a tuple: `m[1, 2]`.
    fn parse_index(&mut self, open: Span) -> Option<Expr> {
        let first = self.parse_expression()?;
        if !self.check(&TokenKind::Comma) {
            self.expect(&TokenKind::RBracket)?;
            return Some(first);
        }
        let mut items = vec![first];
        while self.eat(&TokenKind::Comma) {
            if self.check(&TokenKind::RBracket) {
                break;
            }
            items.push(self.parse_expression()?);
        }
        self.expect(&TokenKind::RBracket)?;
        let span = open.merge(self.previous_span());
        Some(Expr::new(ExprKind::TupleLit(items), span))
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Call Arguments
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse `a, b, name=value` up to and including the closing `)`.
    ///
    /// Keyword arguments must follow all positional ones and may not repeat.
    fn parse_call_args(&mut self) -> Option<(Vec<Expr>, Vec<Keyword>)> {
        let mut args = Vec::new();
        let mut kwargs: Vec<Keyword> = Vec::new();
        while !self.check(&TokenKind::RParen) {
            let is_keyword = matches!(self.peek_kind(), TokenKind::Identifier(_))
                && *self.look_ahead(1) == TokenKind::Eq;
            if is_keyword {
                let name = self.expect_identifier()?;
                self.advance(); // eat `=`
                let value = self.parse_expression()?;
                if kwargs.iter().any(|k| k.name.name == name.name) {
                    self.error_at(
                        ErrorCode::DUPLICATE_KEYWORD_ARGUMENT,
                        format!("keyword argument '{}' repeated", name.name),
                        name.span,
                    );
                }
                kwargs.push(Keyword { name, value });
            } else {
                let value = self.parse_expression()?;
                if !kwargs.is_empty() {
                    self.error_at(
                        ErrorCode::POSITIONAL_AFTER_KEYWORD,
                        "positional argument follows keyword argument",
                        value.span,
                    );
                }
                args.push(value);
            }
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen)?;
        Some((args, kwargs))
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Primary Expressions
    // ══════════════════════════════════════════════════════════════════════════

    fn parse_primary(&mut self) -> Option<Expr> {
        let start = self.current_span();
        let kind = match self.peek_kind().clone() {
            // ── Literals ────────────────────────────────────────────────
            TokenKind::IntLit(n) => ExprKind::IntLit(n),
            TokenKind::FloatLit(n) => ExprKind::FloatLit(n),
            TokenKind::StrLit(s) => ExprKind::StrLit(s),
            TokenKind::BytesLit(b) => ExprKind::BytesLit(b),
            TokenKind::True => ExprKind::BoolLit(true),
            TokenKind::False => ExprKind::BoolLit(false),
            TokenKind::NoneKw => ExprKind::NoneLit,
            TokenKind::Identifier(name) => ExprKind::Identifier(name),

            // ── Collections ─────────────────────────────────────────────
            TokenKind::LParen => return self.parse_paren(),
            TokenKind::LBracket => return self.parse_list_literal(),
            TokenKind::LBrace => return self.parse_brace_literal(),

            _ => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected expression, got '{}'", self.peek_kind()),
                );
                return None;
            }
        };
        self.advance();
        Some(Expr::new(kind, start))
    }

    /// `()`, `(expr)`, `(expr,)` or `(a, b, ...)`
    fn parse_paren(&mut self) -> Option<Expr> {
        let start = self.advance(); // eat `(`
        if self.eat(&TokenKind::RParen) {
            let span = start.merge(self.previous_span());
            return Some(Expr::new(ExprKind::TupleLit(Vec::new()), span));
        }
        let first = self.parse_expression()?;
        if self.eat(&TokenKind::RParen) {
            // Grouping only; keep the inner node but widen its span.
            let span = start.merge(self.previous_span());
            return Some(Expr::new(first.kind, span));
        }
        let mut items = vec![first];
        while self.eat(&TokenKind::Comma) {
            if self.check(&TokenKind::RParen) {
                break;
            }
            items.push(self.parse_expression()?);
        }
        self.expect(&TokenKind::RParen)?;
        let span = start.merge(self.previous_span());
        Some(Expr::new(ExprKind::TupleLit(items), span))
    }

    /// `[expr, ...]`
    fn parse_list_literal(&mut self) -> Option<Expr> {
        let start = self.advance(); // eat `[`
        let items = self.parse_sequence(&TokenKind::RBracket)?;
        let span = start.merge(self.previous_span());
        Some(Expr::new(ExprKind::ListLit(items), span))
    }

    /// `{}` (empty dict), `{k: v, ...}` (dict) or `{a, b, ...}` (set).
    fn parse_brace_literal(&mut self) -> Option<Expr> {
        let start = self.advance(); // eat `{`
        if self.eat(&TokenKind::RBrace) {
            let span = start.merge(self.previous_span());
            return Some(Expr::new(ExprKind::DictLit(Vec::new()), span));
        }
        let first = self.parse_expression()?;
        if !self.eat(&TokenKind::Colon) {
            let mut items = vec![first];
            if self.eat(&TokenKind::Comma) {
                items.extend(self.parse_sequence(&TokenKind::RBrace)?);
            } else {
                self.expect(&TokenKind::RBrace)?;
            }
            let span = start.merge(self.previous_span());
            return Some(Expr::new(ExprKind::SetLit(items), span));
        }

        let mut entries = vec![(first, self.parse_expression()?)];
        while self.eat(&TokenKind::Comma) {
            if self.check(&TokenKind::RBrace) {
                break;
            }
            let key = self.parse_expression()?;
            self.expect(&TokenKind::Colon)?;
            let value = self.parse_expression()?;
            entries.push((key, value));
        }
        self.expect(&TokenKind::RBrace)?;
        let span = start.merge(self.previous_span());
        Some(Expr::new(ExprKind::DictLit(entries), span))
    }

    /// Comma-separated expressions up to and including `close`.
    /// A trailing comma is allowed.
    fn parse_sequence(&mut self, close: &TokenKind) -> Option<Vec<Expr>> {
        let mut items = Vec::new();
        while !self.check(close) {
            items.push(self.parse_expression()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(close)?;
        Some(items)
    }
}

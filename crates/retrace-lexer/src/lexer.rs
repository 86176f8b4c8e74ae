//! Core retrace lexer.
//!
//! - `#` comments run to end of line
//! - newlines are tokens, except inside `()`, `[]` and `{}`
//! - strings may use either quote and do not span lines
//! - collects up to [`MAX_ERRORS`] errors instead of stopping at the first

use retrace_types::{ErrorCode, ScriptError, ScriptErrors, SourceFile, Span};

use crate::token::{Token, TokenKind};

pub struct Lexer<'src> {
    source: &'src [u8],
    source_file: &'src SourceFile,
    pos: usize,
    line: u32,
    col: u32,
    /// Open bracket count; newlines inside brackets are insignificant.
    depth: u32,
    errors: ScriptErrors,
}

/// Tokens plus any errors collected along the way.
pub struct LexResult {
    /// Always ends with [`TokenKind::Eof`].
    pub tokens: Vec<Token>,
    pub errors: ScriptErrors,
}

impl<'src> Lexer<'src> {
    pub fn new(source_file: &'src SourceFile) -> Self {
        Self {
            source: source_file.source.as_bytes(),
            source_file,
            pos: 0,
            line: 1,
            col: 1,
            depth: 0,
            errors: ScriptErrors::empty(),
        }
    }

    pub fn lex(mut self) -> LexResult {
        let mut tokens = Vec::new();
        loop {
            if self.errors.is_full() {
                tokens.push(Token::new(TokenKind::Eof, self.current_span()));
                break;
            }
            let Some(token) = self.scan() else {
                continue;
            };
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        LexResult {
            tokens,
            errors: self.errors,
        }
    }

    // ── Cursor ────────────────────────────────────────────────────────────

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.source.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let ch = self.peek()?;
        self.pos += 1;
        if ch == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn current_span(&self) -> Span {
        Span::point(self.line, self.col)
    }

    fn span_from(&self, start_line: u32, start_col: u32) -> Span {
        Span::new(start_line, start_col, self.line, self.col.saturating_sub(1).max(1))
    }

    fn emit_error(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        let source_line = self.source_file.line(span.start_line).unwrap_or("");
        let error = ScriptError::new(&self.source_file.name, code, message, span, source_line);
        self.errors.push(error);
    }

    // ── Scanning ──────────────────────────────────────────────────────────

    fn skip_trivia(&mut self) {
        while let Some(ch) = self.peek() {
            match ch {
                b' ' | b'\t' | b'\r' => {
                    self.advance();
                }
                b'\n' if self.depth > 0 => {
                    self.advance();
                }
                b'#' => {
                    while self.peek().is_some_and(|c| c != b'\n') {
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    /// Next token, or `None` when the input at the cursor was rejected.
    fn scan(&mut self) -> Option<Token> {
        self.skip_trivia();
        let (start_line, start_col) = (self.line, self.col);
        let start = self.pos;
        let Some(ch) = self.advance() else {
            return Some(Token::new(TokenKind::Eof, self.current_span()));
        };

        let kind = match ch {
            b'\n' => {
                return Some(Token::new(
                    TokenKind::Newline,
                    Span::point(start_line, start_col),
                ))
            }
            b'\'' | b'"' => self.scan_string(ch, false, start_line, start_col),
            b'b' | b'B' if matches!(self.peek(), Some(b'\'' | b'"')) => {
                let quote = self.advance().unwrap_or(b'\'');
                self.scan_string(quote, true, start_line, start_col)
            }
            b'0'..=b'9' => self.scan_number(start, start_line, start_col),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.scan_identifier(start),
            b'(' => self.open(TokenKind::LParen),
            b'[' => self.open(TokenKind::LBracket),
            b'{' => self.open(TokenKind::LBrace),
            b')' => self.close(TokenKind::RParen),
            b']' => self.close(TokenKind::RBracket),
            b'}' => self.close(TokenKind::RBrace),
            b',' => TokenKind::Comma,
            b':' => TokenKind::Colon,
            b'.' => TokenKind::Dot,
            b'=' => TokenKind::Eq,
            b'*' => TokenKind::Star,
            b'-' => TokenKind::Minus,
            _ => {
                // Re-decode so multi-byte characters are reported whole.
                let source_file = self.source_file;
                let rest = &source_file.source[start..];
                let shown = rest.chars().next().unwrap_or('?');
                while self.pos < start + shown.len_utf8() {
                    self.advance();
                }
                let span = self.span_from(start_line, start_col);
                self.emit_error(
                    ErrorCode::UNEXPECTED_CHARACTER,
                    format!("unexpected character '{shown}'"),
                    span,
                );
                return None;
            }
        };
        Some(Token::new(kind, self.span_from(start_line, start_col)))
    }

    fn open(&mut self, kind: TokenKind) -> TokenKind {
        self.depth += 1;
        kind
    }

    fn close(&mut self, kind: TokenKind) -> TokenKind {
        self.depth = self.depth.saturating_sub(1);
        kind
    }

    fn scan_identifier(&mut self, start: usize) -> TokenKind {
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == b'_')
        {
            self.advance();
        }
        let source_file = self.source_file;
        let text = &source_file.source[start..self.pos];
        TokenKind::from_keyword(text).unwrap_or_else(|| TokenKind::Identifier(text.to_string()))
    }

    /// Integers, decimals and exponent forms such as `1e-07`.
    fn scan_number(&mut self, start: usize, start_line: u32, start_col: u32) -> TokenKind {
        let mut is_float = false;
        self.eat_digits();
        if self.peek() == Some(b'.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            self.advance();
            self.eat_digits();
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            let sign = usize::from(matches!(self.peek_at(1), Some(b'+' | b'-')));
            if self.peek_at(1 + sign).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                for _ in 0..=sign {
                    self.advance();
                }
                self.eat_digits();
            }
        }

        let source_file = self.source_file;
        let text = &source_file.source[start..self.pos];
        let parsed = if is_float {
            text.parse::<f64>().ok().map(TokenKind::FloatLit)
        } else {
            text.parse::<i64>().ok().map(TokenKind::IntLit)
        };
        parsed.unwrap_or_else(|| {
            let span = self.span_from(start_line, start_col);
            self.emit_error(
                ErrorCode::INVALID_NUMBER,
                format!("number literal '{text}' is out of range"),
                span,
            );
            TokenKind::IntLit(0)
        })
    }

    fn eat_digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    /// Scan the body of a string or bytes literal; the opening quote is consumed.
    fn scan_string(&mut self, quote: u8, bytes: bool, start_line: u32, start_col: u32) -> TokenKind {
        let mut buf: Vec<u8> = Vec::new();
        loop {
            match self.peek() {
                None | Some(b'\n') => {
                    let span = self.span_from(start_line, start_col);
                    self.emit_error(
                        ErrorCode::UNTERMINATED_STRING,
                        "unterminated string literal",
                        span,
                    );
                    break;
                }
                Some(c) if c == quote => {
                    self.advance();
                    break;
                }
                Some(b'\\') => self.scan_escape(&mut buf, bytes),
                Some(c) => {
                    self.advance();
                    buf.push(c);
                }
            }
        }
        if bytes {
            TokenKind::BytesLit(buf)
        } else {
            TokenKind::StrLit(String::from_utf8_lossy(&buf).into_owned())
        }
    }

    fn scan_escape(&mut self, buf: &mut Vec<u8>, bytes: bool) {
        let (start_line, start_col) = (self.line, self.col);
        self.advance(); // `\`
        let simple = match self.advance() {
            Some(b'\\') => b'\\',
            Some(b'\'') => b'\'',
            Some(b'"') => b'"',
            Some(b'n') => b'\n',
            Some(b't') => b'\t',
            Some(b'r') => b'\r',
            Some(b'0') => 0,
            Some(b'x') => {
                match self.scan_hex(2) {
                    Some(code) if bytes => buf.push(code as u8),
                    Some(code) => push_char(buf, code),
                    None => self.bad_escape(start_line, start_col),
                }
                return;
            }
            Some(b'u') if !bytes => {
                match self.scan_hex(4) {
                    Some(code) => push_char(buf, code),
                    None => self.bad_escape(start_line, start_col),
                }
                return;
            }
            None => {
                let span = self.span_from(start_line, start_col);
                self.emit_error(
                    ErrorCode::UNTERMINATED_STRING,
                    "unexpected end of input in escape sequence",
                    span,
                );
                return;
            }
            Some(other) => {
                self.bad_escape(start_line, start_col);
                other
            }
        };
        buf.push(simple);
    }

    fn scan_hex(&mut self, digits: usize) -> Option<u32> {
        let mut code = 0u32;
        for _ in 0..digits {
            let digit = char::from(self.peek()?).to_digit(16)?;
            self.advance();
            code = code * 16 + digit;
        }
        Some(code)
    }

    fn bad_escape(&mut self, start_line: u32, start_col: u32) {
        let span = self.span_from(start_line, start_col);
        self.emit_error(ErrorCode::INVALID_ESCAPE, "invalid escape sequence", span);
    }
}

fn push_char(buf: &mut Vec<u8>, code: u32) {
    let c = char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER);
    let mut tmp = [0u8; 4];
    buf.extend_from_slice(c.encode_utf8(&mut tmp).as_bytes());
}

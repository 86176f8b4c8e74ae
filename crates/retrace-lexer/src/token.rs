//! Token types for the retrace script dialect.

use retrace_types::Span;
use std::fmt;

/// Reserved words. None of them can name a binding.
pub const KEYWORDS: &[&str] = &["True", "False", "None", "def", "from", "import", "pass"];

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ── Literals ──────────────────────────────────────────────
    IntLit(i64),
    FloatLit(f64),
    StrLit(String),
    BytesLit(Vec<u8>),
    True,
    False,
    NoneKw,

    Identifier(String),

    // ── Keywords ──────────────────────────────────────────────
    Def,
    From,
    Import,
    Pass,

    // ── Punctuation ───────────────────────────────────────────
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Dot,
    Eq,
    Star,
    Minus,

    /// End of a logical line. Not produced inside brackets.
    Newline,
    Eof,
}

impl TokenKind {
    pub fn from_keyword(word: &str) -> Option<TokenKind> {
        Some(match word {
            "True" => TokenKind::True,
            "False" => TokenKind::False,
            "None" => TokenKind::NoneKw,
            "def" => TokenKind::Def,
            "from" => TokenKind::From,
            "import" => TokenKind::Import,
            "pass" => TokenKind::Pass,
            _ => return None,
        })
    }

    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::True
                | TokenKind::False
                | TokenKind::NoneKw
                | TokenKind::Def
                | TokenKind::From
                | TokenKind::Import
                | TokenKind::Pass
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::IntLit(i) => write!(f, "{i}"),
            TokenKind::FloatLit(x) => write!(f, "{}", retrace_types::format_float(*x)),
            TokenKind::StrLit(s) => write!(f, "{}", retrace_types::quote_str(s)),
            TokenKind::BytesLit(b) => write!(f, "{}", retrace_types::quote_bytes(b)),
            TokenKind::True => write!(f, "True"),
            TokenKind::False => write!(f, "False"),
            TokenKind::NoneKw => write!(f, "None"),
            TokenKind::Identifier(name) => write!(f, "{name}"),
            TokenKind::Def => write!(f, "def"),
            TokenKind::From => write!(f, "from"),
            TokenKind::Import => write!(f, "import"),
            TokenKind::Pass => write!(f, "pass"),
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::LBracket => write!(f, "["),
            TokenKind::RBracket => write!(f, "]"),
            TokenKind::LBrace => write!(f, "{{"),
            TokenKind::RBrace => write!(f, "}}"),
            TokenKind::Comma => write!(f, ","),
            TokenKind::Colon => write!(f, ":"),
            TokenKind::Dot => write!(f, "."),
            TokenKind::Eq => write!(f, "="),
            TokenKind::Star => write!(f, "*"),
            TokenKind::Minus => write!(f, "-"),
            TokenKind::Newline => write!(f, "newline"),
            TokenKind::Eof => write!(f, "end of file"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_keyword_maps_to_a_keyword_token() {
        for word in KEYWORDS {
            let kind = TokenKind::from_keyword(word).unwrap();
            assert!(kind.is_keyword(), "{word}");
            assert_eq!(kind.to_string(), *word);
        }
    }

    #[test]
    fn identifiers_are_not_keywords() {
        assert_eq!(TokenKind::from_keyword("none"), None);
        assert!(!TokenKind::Identifier("x".into()).is_keyword());
    }
}

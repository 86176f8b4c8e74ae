//! retrace parser: converts a token stream into an AST.

mod parse_expr;
mod parse_stmt;
mod parser;

pub use parser::{parse_expression_source, parse_source, ExprResult, ParseResult, Parser};

//! Parser tests: statements, blocks, postfix chains, collection literals,
//! call arguments and error recovery.

use pretty_assertions::assert_eq;
use retrace_parser::{parse_expression_source, parse_source, ParseResult};
use retrace_types::ast::*;
use retrace_types::{ErrorCode, SourceFile};

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

fn parse(source: &str) -> ParseResult {
    let sf = SourceFile::new("test.rt", source);
    parse_source(&sf)
}

/// Parse source and return the program, panicking if there are errors.
fn parse_ok(source: &str) -> Program {
    let result = parse(source);
    if result.errors.has_errors() {
        panic!("unexpected parse errors:\n{}", result.errors);
    }
    result.program.expect("no program returned")
}

fn error_codes(source: &str) -> Vec<ErrorCode> {
    parse(source).errors.errors.iter().map(|e| e.code).collect()
}

/// Render an expression as a compact S-expression, ignoring spans.
fn shape(expr: &Expr) -> String {
    fn list(items: &[Expr]) -> String {
        items.iter().map(shape).collect::<Vec<_>>().join(" ")
    }
    match &expr.kind {
        ExprKind::NoneLit => "None".into(),
        ExprKind::BoolLit(b) => b.to_string(),
        ExprKind::IntLit(n) => n.to_string(),
        ExprKind::FloatLit(x) => format!("{x:?}"),
        ExprKind::StrLit(s) => format!("{s:?}"),
        ExprKind::BytesLit(b) => format!("b{b:?}"),
        ExprKind::Identifier(name) => name.clone(),
        ExprKind::ListLit(items) => format!("(list {})", list(items)),
        ExprKind::TupleLit(items) => format!("(tuple {})", list(items)),
        ExprKind::SetLit(items) => format!("(set {})", list(items)),
        ExprKind::DictLit(entries) => {
            let body: Vec<String> = entries
                .iter()
                .map(|(k, v)| format!("{}:{}", shape(k), shape(v)))
                .collect();
            format!("(dict {})", body.join(" "))
        }
        ExprKind::Neg(inner) => format!("(neg {})", shape(inner)),
        ExprKind::Attr { object, name } => format!("(. {} {})", shape(object), name.name),
        ExprKind::Index { object, index } => format!("([] {} {})", shape(object), shape(index)),
        ExprKind::Call {
            callee,
            args,
            kwargs,
        } => {
            let mut parts = vec![shape(callee)];
            parts.extend(args.iter().map(shape));
            parts.extend(
                kwargs
                    .iter()
                    .map(|k| format!("{}={}", k.name.name, shape(&k.value))),
            );
            format!("(call {})", parts.join(" "))
        }
    }
}

fn expr_shape(source: &str) -> String {
    let sf = SourceFile::new("expr.rt", source);
    let result = parse_expression_source(&sf);
    assert!(result.is_ok(), "errors: {}", result.errors);
    shape(&result.expr.expect("expression"))
}

// ─────────────────────────────────────────────────────────────────────
// Expressions
// ─────────────────────────────────────────────────────────────────────

#[test]
fn literals() {
    assert_eq!(expr_shape("None"), "None");
    assert_eq!(expr_shape("True"), "true");
    assert_eq!(expr_shape("1.5"), "1.5");
    assert_eq!(expr_shape("'x'"), "\"x\"");
    assert_eq!(expr_shape("b'\\x01'"), "b[1]");
}

#[test]
fn negative_numbers() {
    assert_eq!(expr_shape("-3"), "(neg 3)");
    assert_eq!(expr_shape("--3"), "(neg (neg 3))");
}

#[test]
fn postfix_chain() {
    assert_eq!(
        expr_shape("R.add(1).total()"),
        "(call (. (call (. R add) 1) total))"
    );
}

#[test]
fn unary_binds_looser_than_postfix() {
    assert_eq!(expr_shape("-x.y"), "(neg (. x y))");
}

#[test]
fn index_with_tuple_key() {
    assert_eq!(expr_shape("m[1, 2]"), "([] m (tuple 1 2))");
    assert_eq!(expr_shape("m['k']"), "([] m \"k\")");
}

#[test]
fn call_with_keywords() {
    assert_eq!(
        expr_shape("f(1, 2, color='red', lw=2)"),
        "(call f 1 2 color=\"red\" lw=2)"
    );
}

#[test]
fn call_trailing_comma_and_newlines() {
    assert_eq!(expr_shape("f(\n  1,\n  2,\n)"), "(call f 1 2)");
}

#[test]
fn tuples_and_grouping() {
    assert_eq!(expr_shape("()"), "(tuple )");
    assert_eq!(expr_shape("(1)"), "1");
    assert_eq!(expr_shape("(1,)"), "(tuple 1)");
    assert_eq!(expr_shape("(1, 'a')"), "(tuple 1 \"a\")");
}

#[test]
fn braces_make_dicts_and_sets() {
    assert_eq!(expr_shape("{}"), "(dict )");
    assert_eq!(expr_shape("{'a': 1, 'b': [2]}"), "(dict \"a\":1 \"b\":(list 2))");
    assert_eq!(expr_shape("{1, 2}"), "(set 1 2)");
    assert_eq!(expr_shape("{1}"), "(set 1)");
}

#[test]
fn nested_lists() {
    assert_eq!(expr_shape("[[1], []]"), "(list (list 1) (list ))");
}

#[test]
fn expression_only_rejects_trailing_tokens() {
    let sf = SourceFile::new("expr.rt", "1 2");
    let result = parse_expression_source(&sf);
    assert!(!result.is_ok());
}

#[test]
fn deep_nesting_is_reported() {
    let source = format!("{}1{}", "[".repeat(200), "]".repeat(200));
    let sf = SourceFile::new("expr.rt", source);
    let result = parse_expression_source(&sf);
    assert_eq!(
        result.errors.first().map(|e| e.code),
        Some(ErrorCode::NESTING_TOO_DEEP)
    );
}

// ─────────────────────────────────────────────────────────────────────
// Statements
// ─────────────────────────────────────────────────────────────────────

#[test]
fn assignment_and_set_attribute() {
    let prog = parse_ok("x = 1\nax.title = 'hi'\n");
    assert_eq!(prog.statements.len(), 2);
    match &prog.statements[0].kind {
        StmtKind::Assign { target, value } => {
            assert_eq!(target.name, "x");
            assert_eq!(shape(value), "1");
        }
        other => panic!("expected assignment, got {other:?}"),
    }
    match &prog.statements[1].kind {
        StmtKind::SetAttr {
            object,
            attr,
            value,
        } => {
            assert_eq!(shape(object), "ax");
            assert_eq!(attr.name, "title");
            assert_eq!(shape(value), "\"hi\"");
        }
        other => panic!("expected attribute assignment, got {other:?}"),
    }
}

#[test]
fn expression_statement() {
    let prog = parse_ok("ax.plot([1, 2])");
    assert!(matches!(prog.statements[0].kind, StmtKind::Expr(_)));
}

#[test]
fn imports() {
    let prog = parse_ok("from codec import loads\nfrom plot.core import *\nfrom m import a, b\n");
    let imports: Vec<(String, Vec<String>)> = prog
        .statements
        .iter()
        .map(|s| match &s.kind {
            StmtKind::Import { module, names } => {
                let names = match names {
                    ImportNames::All => vec!["*".to_string()],
                    ImportNames::Names(ns) => ns.iter().map(|n| n.name.clone()).collect(),
                };
                (module.clone(), names)
            }
            other => panic!("expected import, got {other:?}"),
        })
        .collect();
    assert_eq!(
        imports,
        vec![
            ("codec".to_string(), vec!["loads".to_string()]),
            ("plot.core".to_string(), vec!["*".to_string()]),
            ("m".to_string(), vec!["a".to_string(), "b".to_string()]),
        ]
    );
}

#[test]
fn def_with_indented_body() {
    let prog = parse_ok("def recorded_code():\n  a = f()\n  a.g()\n\nrecorded_code()\n");
    assert_eq!(prog.statements.len(), 2);
    match &prog.statements[0].kind {
        StmtKind::Def { name, body } => {
            assert_eq!(name.name, "recorded_code");
            assert_eq!(body.len(), 2);
        }
        other => panic!("expected def, got {other:?}"),
    }
    assert!(matches!(prog.statements[1].kind, StmtKind::Expr(_)));
}

#[test]
fn comments_inside_body_are_ignored() {
    let prog = parse_ok("def f():\n  # a.skip()\n  pass\n");
    match &prog.statements[0].kind {
        StmtKind::Def { body, .. } => {
            assert_eq!(body.len(), 1);
            assert!(matches!(body[0].kind, StmtKind::Pass));
        }
        other => panic!("expected def, got {other:?}"),
    }
}

#[test]
fn single_line_def() {
    let prog = parse_ok("def f(): pass\n");
    assert!(matches!(
        &prog.statements[0].kind,
        StmtKind::Def { body, .. } if body.len() == 1
    ));
}

#[test]
fn nested_def_blocks() {
    let prog = parse_ok("def f():\n    def g():\n        pass\n    g()\nf()\n");
    assert_eq!(prog.statements.len(), 2);
    match &prog.statements[0].kind {
        StmtKind::Def { body, .. } => assert_eq!(body.len(), 2),
        other => panic!("expected def, got {other:?}"),
    }
}

#[test]
fn multiline_call_inside_body() {
    let prog = parse_ok("def f():\n  g(1,\n2)\n  h()\n");
    match &prog.statements[0].kind {
        StmtKind::Def { body, .. } => assert_eq!(body.len(), 2),
        other => panic!("expected def, got {other:?}"),
    }
}

// ─────────────────────────────────────────────────────────────────────
// Errors and recovery
// ─────────────────────────────────────────────────────────────────────

#[test]
fn missing_block() {
    assert_eq!(error_codes("def f():\nx = 1\n"), vec![ErrorCode::EXPECTED_BLOCK]);
}

#[test]
fn unexpected_indent_at_top_level() {
    assert_eq!(error_codes("  x = 1\n"), vec![ErrorCode::UNEXPECTED_INDENT]);
}

#[test]
fn invalid_assignment_target() {
    assert_eq!(
        error_codes("f() = 1\n"),
        vec![ErrorCode::INVALID_ASSIGNMENT_TARGET]
    );
}

#[test]
fn keyword_argument_errors() {
    assert_eq!(
        error_codes("f(a=1, a=2)"),
        vec![ErrorCode::DUPLICATE_KEYWORD_ARGUMENT]
    );
    assert_eq!(
        error_codes("f(a=1, 2)"),
        vec![ErrorCode::POSITIONAL_AFTER_KEYWORD]
    );
}

#[test]
fn recovers_at_next_line() {
    let result = parse("x = )\ny = 2\n");
    assert_eq!(result.errors.total, 1);
    let prog = result.program.expect("program");
    assert_eq!(prog.statements.len(), 1);
    assert!(matches!(
        &prog.statements[0].kind,
        StmtKind::Assign { target, .. } if target.name == "y"
    ));
}

#[test]
fn lexer_errors_are_merged() {
    let result = parse("x = 'open\n");
    assert_eq!(
        result.errors.first().map(|e| e.code),
        Some(ErrorCode::UNTERMINATED_STRING)
    );
}

//! Statement Compressor: a peephole pass over built statements.
//!
//! Two rules, repeated until neither applies:
//! - chaining: `v = a.b` followed by `w = v(1)` becomes `w = a.b(1)` when `v`
//!   is used nowhere later, is not a known object, and the second statement
//!   is recordable;
//! - elision: an lvalue never used as a later receiver, and not a known
//!   object, is dropped.
//!
//! Statements are never reordered.

use crate::statement::Statement;

/// Compress `statements`. `is_known` reports names bound in the
/// known-objects map, which are never fused away or elided.
pub fn compress(mut statements: Vec<Statement>, is_known: impl Fn(&str) -> bool) -> Vec<Statement> {
    loop {
        let chained = chain(&mut statements, &is_known);
        let elided = elide(&mut statements, &is_known);
        if !chained && !elided {
            return statements;
        }
    }
}

fn used_later(statements: &[Statement], from: usize, name: &str) -> bool {
    statements[from..].iter().any(|s| s.rvalue == name)
}

fn chain(statements: &mut Vec<Statement>, is_known: &impl Fn(&str) -> bool) -> bool {
    let mut changed = false;
    let mut i = 0;
    while i + 1 < statements.len() {
        let next = &statements[i + 1];
        let fuse = statements[i].lvalue.as_deref() == Some(next.rvalue.as_str())
            && !used_later(statements, i + 2, &next.rvalue)
            && !is_known(&next.rvalue)
            && next.recordable;
        if fuse {
            let next = statements.remove(i + 1);
            let current = &mut statements[i];
            current.lvalue = next.lvalue;
            current.suffix.push_str(&next.suffix);
            changed = true;
        } else {
            i += 1;
        }
    }
    changed
}

fn elide(statements: &mut [Statement], is_known: &impl Fn(&str) -> bool) -> bool {
    let mut changed = false;
    for i in 0..statements.len() {
        let dead = match statements[i].lvalue.as_deref() {
            Some(name) => !used_later(statements, i + 1, name) && !is_known(name),
            None => false,
        };
        if dead {
            statements[i].lvalue = None;
            changed = true;
        }
    }
    changed
}

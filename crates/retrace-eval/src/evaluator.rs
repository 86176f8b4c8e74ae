//! Core expression and statement evaluator.

use crate::env::Environment;
use crate::error::{EvalError, EvalResult};
use retrace_types::ast::*;
use retrace_types::Value;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Maximum nesting of user function calls.
pub const MAX_CALL_DEPTH: usize = 64;

/// Members exported by an importable module.
pub type Module = BTreeMap<String, Value>;

/// Walks AST nodes and produces values.
pub struct Evaluator {
    pub env: Environment,
    /// When `false`, only the `set()` builtin may be called.
    pub calls_allowed: bool,
    pub modules: BTreeMap<String, Module>,
    functions: BTreeMap<String, Rc<Vec<Stmt>>>,
    call_depth: usize,
}

impl Evaluator {
    /// An evaluator for full scripts.
    pub fn new() -> Self {
        Self {
            env: Environment::new(),
            calls_allowed: true,
            modules: BTreeMap::new(),
            functions: BTreeMap::new(),
            call_depth: 0,
        }
    }

    /// An evaluator for literal text: names resolve through `known` and
    /// nothing may be called.
    pub fn literal(known: &BTreeMap<String, Value>) -> Self {
        Self {
            env: Environment::with_globals(known.clone()),
            calls_allowed: false,
            ..Self::new()
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Expression evaluation
    // ══════════════════════════════════════════════════════════════════════

    pub fn eval_expr(&mut self, expr: &Expr) -> EvalResult<Value> {
        match &expr.kind {
            ExprKind::NoneLit => Ok(Value::None),
            ExprKind::BoolLit(b) => Ok(Value::Bool(*b)),
            ExprKind::IntLit(n) => Ok(Value::Int(*n)),
            ExprKind::FloatLit(x) => Ok(Value::Float(*x)),
            ExprKind::StrLit(s) => Ok(Value::Str(s.clone())),
            ExprKind::BytesLit(b) => Ok(Value::Bytes(b.clone())),
            ExprKind::Identifier(name) => self.eval_identifier(name),

            ExprKind::ListLit(items) => Ok(Value::list(self.eval_all(items)?)),
            ExprKind::TupleLit(items) => Ok(Value::tuple(self.eval_all(items)?)),
            ExprKind::SetLit(items) => Ok(Value::set(self.eval_all(items)?)),
            ExprKind::DictLit(entries) => {
                let mut pairs = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    pairs.push((self.eval_expr(key)?, self.eval_expr(value)?));
                }
                Ok(Value::dict(pairs))
            }

            ExprKind::Neg(inner) => self.eval_neg(inner),
            ExprKind::Attr { object, name } => {
                let object = self.eval_expr(object)?;
                Ok(object.get_attr(&name.name)?)
            }
            ExprKind::Index { object, index } => {
                let object = self.eval_expr(object)?;
                let key = self.eval_expr(index)?;
                Ok(object.get_item(&key)?)
            }
            ExprKind::Call {
                callee,
                args,
                kwargs,
            } => self.eval_call(callee, args, kwargs),
        }
    }

    fn eval_all(&mut self, items: &[Expr]) -> EvalResult<Vec<Value>> {
        items.iter().map(|item| self.eval_expr(item)).collect()
    }

    fn eval_identifier(&self, name: &str) -> EvalResult<Value> {
        self.env
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::UndefinedName(name.to_string()))
    }

    fn eval_neg(&mut self, inner: &Expr) -> EvalResult<Value> {
        match self.eval_expr(inner)? {
            Value::Int(n) => n
                .checked_neg()
                .map(Value::Int)
                .ok_or_else(|| EvalError::BadOperand("int".to_string())),
            Value::Float(x) => Ok(Value::Float(-x)),
            other => Err(EvalError::BadOperand(other.type_name().to_string())),
        }
    }

    // ── Calls ─────────────────────────────────────────────────────────────

    fn eval_call(&mut self, callee: &Expr, args: &[Expr], kwargs: &[Keyword]) -> EvalResult<Value> {
        if !self.calls_allowed {
            return self.eval_literal_call(callee, args, kwargs);
        }

        if let ExprKind::Identifier(name) = &callee.kind {
            if self.env.get(name).is_none() {
                if let Some(body) = self.functions.get(name).cloned() {
                    if !args.is_empty() || !kwargs.is_empty() {
                        return Err(EvalError::Op(retrace_types::OpError::bad_argument(
                            format!("{name}() takes no arguments"),
                        )));
                    }
                    return self.call_function(name, &body);
                }
            }
        }

        let function = self.eval_expr(callee)?;
        let args = self.eval_all(args)?;
        let mut kw = Vec::with_capacity(kwargs.len());
        for keyword in kwargs {
            kw.push((keyword.name.name.clone(), self.eval_expr(&keyword.value)?));
        }
        Ok(function.call(&args, &kw)?)
    }

    /// The one call literal text may contain: `set()` for the empty set.
    fn eval_literal_call(
        &mut self,
        callee: &Expr,
        args: &[Expr],
        kwargs: &[Keyword],
    ) -> EvalResult<Value> {
        match &callee.kind {
            ExprKind::Identifier(name)
                if name == "set"
                    && args.is_empty()
                    && kwargs.is_empty()
                    && self.env.get(name).is_none() =>
            {
                Ok(Value::set(Vec::new()))
            }
            ExprKind::Identifier(name) => Err(EvalError::CallsDisabled(format!("{name}()"))),
            _ => Err(EvalError::CallsDisabled("call expression".to_string())),
        }
    }

    fn call_function(&mut self, name: &str, body: &[Stmt]) -> EvalResult<Value> {
        if self.call_depth >= MAX_CALL_DEPTH {
            return Err(EvalError::CallDepth(MAX_CALL_DEPTH));
        }
        tracing::debug!(function = name, "calling script function");
        self.call_depth += 1;
        self.env.push_scope();
        let result = self.exec_block(body);
        self.env.pop_scope();
        self.call_depth -= 1;
        result.map(|()| Value::None)
    }

    // ══════════════════════════════════════════════════════════════════════
    // Statement execution
    // ══════════════════════════════════════════════════════════════════════

    pub fn exec_block(&mut self, stmts: &[Stmt]) -> EvalResult<()> {
        stmts.iter().try_for_each(|stmt| self.exec_stmt(stmt))
    }

    pub fn exec_stmt(&mut self, stmt: &Stmt) -> EvalResult<()> {
        match &stmt.kind {
            StmtKind::Assign { target, value } => {
                let value = self.eval_expr(value)?;
                self.env.define(&target.name, value);
            }
            StmtKind::SetAttr {
                object,
                attr,
                value,
            } => {
                let object = self.eval_expr(object)?;
                let value = self.eval_expr(value)?;
                object.set_attr(&attr.name, value)?;
            }
            StmtKind::Expr(expr) => {
                self.eval_expr(expr)?;
            }
            StmtKind::Def { name, body } => {
                self.functions
                    .insert(name.name.clone(), Rc::new(body.clone()));
            }
            StmtKind::Import { module, names } => self.exec_import(module, names)?,
            StmtKind::Pass => {}
        }
        Ok(())
    }

    fn exec_import(&mut self, module: &str, names: &ImportNames) -> EvalResult<()> {
        let members = self
            .modules
            .get(module)
            .ok_or_else(|| EvalError::UnknownModule(module.to_string()))?;
        let bindings: Vec<(String, Value)> = match names {
            ImportNames::All => members
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
            ImportNames::Names(names) => names
                .iter()
                .map(|ident| {
                    members
                        .get(&ident.name)
                        .map(|value| (ident.name.clone(), value.clone()))
                        .ok_or_else(|| EvalError::UnknownImport {
                            module: module.to_string(),
                            name: ident.name.clone(),
                        })
                })
                .collect::<EvalResult<_>>()?,
        };
        tracing::debug!(module, count = bindings.len(), "import");
        for (name, value) in bindings {
            self.env.define(&name, value);
        }
        Ok(())
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

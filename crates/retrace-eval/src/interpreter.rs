//! Script runner used to replay generated programs.

use std::collections::BTreeMap;

use retrace_parser::{parse_expression_source, parse_source};
use retrace_types::{codec, NativeFn, OpError, SourceFile, Value};

use crate::error::{EvalError, EvalResult};
use crate::evaluator::{Evaluator, Module};

/// Name of the built-in module that holds the blob deserializer.
pub const CODEC_MODULE: &str = "codec";

/// Runs retrace scripts against registered host modules.
///
/// Every interpreter starts with the `codec` module (`loads`, `dumps`) and
/// the `set`, `list` and `tuple` builtins.
pub struct Interpreter {
    evaluator: Evaluator,
}

impl Interpreter {
    pub fn new() -> Self {
        let mut evaluator = Evaluator::new();
        evaluator
            .modules
            .insert(CODEC_MODULE.to_string(), codec_module());
        for (name, value) in builtins() {
            evaluator.env.define(&name, value);
        }
        Self { evaluator }
    }

    /// Make `members` importable as `from <name> import ...`.
    pub fn register_module<I, S>(&mut self, name: &str, members: I)
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        let module: Module = members
            .into_iter()
            .map(|(member, value)| (member.into(), value))
            .collect();
        self.evaluator.modules.insert(name.to_string(), module);
    }

    /// Bind a global name.
    pub fn define(&mut self, name: &str, value: Value) {
        self.evaluator.env.define(name, value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.evaluator.env.get(name)
    }

    pub fn globals(&self) -> &BTreeMap<String, Value> {
        self.evaluator.env.global_bindings()
    }

    /// Parse and execute a whole script.
    pub fn run(&mut self, source_file: &SourceFile) -> EvalResult<()> {
        let parsed = parse_source(source_file);
        let program = match parsed.program {
            Some(program) if !parsed.errors.has_errors() => program,
            _ => return Err(EvalError::Syntax(parsed.errors)),
        };
        tracing::debug!(
            file = %source_file.name,
            statements = program.statements.len(),
            "running script"
        );
        self.evaluator.exec_block(&program.statements)
    }

    pub fn run_source(&mut self, name: &str, source: &str) -> EvalResult<()> {
        self.run(&SourceFile::new(name, source))
    }

    /// Evaluate a single expression in the global scope.
    pub fn eval(&mut self, source: &str) -> EvalResult<Value> {
        let sf = SourceFile::new("<expr>", source);
        let parsed = parse_expression_source(&sf);
        match parsed.expr {
            Some(expr) if !parsed.errors.has_errors() => self.evaluator.eval_expr(&expr),
            _ => Err(EvalError::Syntax(parsed.errors)),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn codec_module() -> Module {
    let loads = NativeFn::function("loads", |args, _| {
        let text = single_arg(args, "loads")?
            .as_str()
            .ok_or_else(|| OpError::bad_argument("loads() expects a str"))?;
        codec::decode(text.as_bytes()).map_err(|e| OpError::bad_argument(e.to_string()))
    })
    .in_module(CODEC_MODULE);

    let dumps = NativeFn::function("dumps", |args, _| {
        let blob = codec::encode(single_arg(args, "dumps")?)
            .map_err(|e| OpError::bad_argument(e.to_string()))?;
        Ok(Value::Str(String::from_utf8_lossy(&blob).into_owned()))
    })
    .in_module(CODEC_MODULE);

    Module::from([
        ("loads".to_string(), loads.into_value()),
        ("dumps".to_string(), dumps.into_value()),
    ])
}

fn builtins() -> Vec<(String, Value)> {
    let set = NativeFn::function("set", |args, _| Ok(Value::set(iterable_arg(args, "set")?)));
    let list = NativeFn::function("list", |args, _| Ok(Value::list(iterable_arg(args, "list")?)));
    let tuple = NativeFn::function("tuple", |args, _| {
        Ok(Value::tuple(iterable_arg(args, "tuple")?))
    });
    vec![
        ("set".to_string(), set.into_value()),
        ("list".to_string(), list.into_value()),
        ("tuple".to_string(), tuple.into_value()),
    ]
}

fn single_arg<'a>(args: &'a [Value], function: &str) -> Result<&'a Value, OpError> {
    match args {
        [arg] => Ok(arg),
        _ => Err(OpError::bad_argument(format!(
            "{function}() takes exactly one argument ({} given)",
            args.len()
        ))),
    }
}

/// Items of the optional sequence argument of `set`, `list` and `tuple`.
fn iterable_arg(args: &[Value], function: &str) -> Result<Vec<Value>, OpError> {
    match args {
        [] => Ok(Vec::new()),
        [Value::List(items) | Value::Set(items)] => Ok(items.borrow().clone()),
        [Value::Tuple(items)] => Ok(items.to_vec()),
        [Value::Dict(entries)] => Ok(entries.borrow().iter().map(|(k, _)| k.clone()).collect()),
        [other] => Err(OpError::bad_argument(format!(
            "{function}() argument must be a sequence, not {}",
            other.type_name()
        ))),
        _ => Err(OpError::bad_argument(format!(
            "{function}() takes at most one argument"
        ))),
    }
}

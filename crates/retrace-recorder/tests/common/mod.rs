//! Toy host domains shared by the recorder tests.
//!
//! - `plot`: a figure with subplots, lines and a `savefig` that logs paths.
//! - a register/accumulator pair for small chained-call recordings.

#![allow(dead_code)]

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use retrace_types::{kwarg, HostObject, NativeFn, OpError, OpResult, Value};

pub const PLOT: &str = "plot";

// ══════════════════════════════════════════════════════════════════════
// plot
// ══════════════════════════════════════════════════════════════════════

/// Everything a plotting session did, shared by all of its objects.
#[derive(Default)]
pub struct PlotLog {
    pub figures: RefCell<Vec<Value>>,
    pub saved: RefCell<Vec<String>>,
}

impl PlotLog {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// The `figure` constructor, in module `plot`.
    pub fn figure_fn(self: &Rc<Self>) -> Value {
        let log = Rc::clone(self);
        NativeFn::function("figure", move |_, kwargs| {
            let dpi = kwarg(kwargs, "dpi").and_then(Value::as_int).unwrap_or(100);
            let figure = Value::object(Figure {
                state: Rc::new(FigureState {
                    dpi,
                    axes: RefCell::new(Vec::new()),
                    log: Rc::clone(&log),
                }),
            });
            log.figures.borrow_mut().push(figure.clone());
            Ok(figure)
        })
        .in_module(PLOT)
        .into_value()
    }

    /// Members of the `plot` module for replay: `figure`, plus a `savefig`
    /// that saves the most recent figure.
    pub fn module(self: &Rc<Self>) -> Vec<(&'static str, Value)> {
        let log = Rc::clone(self);
        let savefig = NativeFn::function("savefig", move |args, _| {
            let path = path_arg(args)?;
            if log.figures.borrow().is_empty() {
                return Err(OpError::Host("no figure to save".to_string()));
            }
            log.saved.borrow_mut().push(path);
            Ok(Value::None)
        })
        .in_module(PLOT);
        vec![("figure", self.figure_fn()), ("savefig", savefig.into_value())]
    }

    pub fn latest_figure(&self) -> Option<Rc<FigureState>> {
        let figures = self.figures.borrow();
        let figure = figures.last()?.as_object()?.downcast_ref::<Figure>()?;
        Some(Rc::clone(&figure.state))
    }
}

fn path_arg(args: &[Value]) -> OpResult<String> {
    match args {
        [Value::Str(path)] => Ok(path.clone()),
        _ => Err(OpError::bad_argument("savefig() expects a path")),
    }
}

pub struct FigureState {
    pub dpi: i64,
    pub axes: RefCell<Vec<Value>>,
    log: Rc<PlotLog>,
}

impl FigureState {
    pub fn axes_state(&self, index: usize) -> Option<Rc<AxesState>> {
        let axes = self.axes.borrow();
        let ax = axes.get(index)?.as_object()?.downcast_ref::<Axes>()?;
        Some(Rc::clone(&ax.state))
    }
}

pub struct Figure {
    pub state: Rc<FigureState>,
}

impl HostObject for Figure {
    fn type_name(&self) -> &str {
        "Figure"
    }

    fn module(&self) -> Option<&str> {
        Some(PLOT)
    }

    fn get_attr(&self, name: &str) -> OpResult<Value> {
        let state = Rc::clone(&self.state);
        match name {
            "dpi" => Ok(Value::Int(self.state.dpi)),
            "add_subplot" => Ok(method(name, move |args, _| {
                let position = args.first().and_then(Value::as_int).unwrap_or(111);
                let ax = Value::object(Axes {
                    state: Rc::new(AxesState {
                        position,
                        title: RefCell::new(String::new()),
                        lines: RefCell::new(Vec::new()),
                    }),
                });
                state.axes.borrow_mut().push(ax.clone());
                Ok(ax)
            })),
            "savefig" => Ok(method(name, move |args, _| {
                state.log.saved.borrow_mut().push(path_arg(args)?);
                Ok(Value::None)
            })),
            _ => Err(OpError::no_attribute("Figure", name)),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct AxesState {
    pub position: i64,
    pub title: RefCell<String>,
    /// The data of every plotted line.
    pub lines: RefCell<Vec<Value>>,
}

pub struct Axes {
    pub state: Rc<AxesState>,
}

impl HostObject for Axes {
    fn type_name(&self) -> &str {
        "AxesSubplot"
    }

    fn module(&self) -> Option<&str> {
        Some(PLOT)
    }

    fn get_attr(&self, name: &str) -> OpResult<Value> {
        let state = Rc::clone(&self.state);
        match name {
            "title" => Ok(Value::str(self.state.title.borrow().clone())),
            "plot" => Ok(method(name, move |args, _| {
                let data = args
                    .first()
                    .cloned()
                    .ok_or_else(|| OpError::bad_argument("plot() needs data"))?;
                state.lines.borrow_mut().push(data.clone());
                Ok(Value::list(vec![Value::object(Line2D { data })]))
            })),
            "set_title" => Ok(method(name, move |args, _| {
                let title = args
                    .first()
                    .and_then(Value::as_str)
                    .ok_or_else(|| OpError::bad_argument("set_title() expects a str"))?;
                *state.title.borrow_mut() = title.to_string();
                Ok(Value::None)
            })),
            "get_xlim" => Ok(method(name, move |_, _| {
                let points = state.lines.borrow().len() as f64;
                Ok(Value::tuple(vec![Value::Float(0.0), Value::Float(points)]))
            })),
            _ => Err(OpError::no_attribute("AxesSubplot", name)),
        }
    }

    fn set_attr(&self, name: &str, value: Value) -> OpResult<()> {
        match (name, value) {
            ("title", Value::Str(title)) => {
                *self.state.title.borrow_mut() = title;
                Ok(())
            }
            ("title", _) => Err(OpError::bad_argument("title must be a str")),
            _ => Err(OpError::ReadOnly {
                type_name: "AxesSubplot".to_string(),
                attr: name.to_string(),
            }),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct Line2D {
    pub data: Value,
}

impl HostObject for Line2D {
    fn type_name(&self) -> &str {
        "Line2D"
    }

    fn module(&self) -> Option<&str> {
        Some(PLOT)
    }

    fn get_attr(&self, name: &str) -> OpResult<Value> {
        match name {
            "data" => Ok(self.data.clone()),
            _ => Err(OpError::no_attribute("Line2D", name)),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// An object with no literal form and no blob encoding.
pub struct Opaque;

impl HostObject for Opaque {
    fn type_name(&self) -> &str {
        "Opaque"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn method(
    name: &str,
    body: impl Fn(&[Value], &[(String, Value)]) -> OpResult<Value> + 'static,
) -> Value {
    NativeFn::method(name, body).into_value()
}

// ══════════════════════════════════════════════════════════════════════
// register / accumulator
// ══════════════════════════════════════════════════════════════════════

/// A root object known by a fixed name. Records the calls made on it.
pub struct Register {
    name: String,
    pub calls: Rc<RefCell<Vec<String>>>,
    pub label: RefCell<Value>,
}

impl Register {
    pub fn value(name: &str) -> Value {
        Value::object(Self {
            name: name.to_string(),
            calls: Rc::new(RefCell::new(Vec::new())),
            label: RefCell::new(Value::None),
        })
    }
}

impl HostObject for Register {
    fn type_name(&self) -> &str {
        "Register"
    }

    fn identity_name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn get_attr(&self, name: &str) -> OpResult<Value> {
        let calls = Rc::clone(&self.calls);
        match name {
            "label" => Ok(self.label.borrow().clone()),
            "add" => Ok(method(name, move |args, _| {
                let amount = args.first().and_then(Value::as_int).unwrap_or(0);
                calls.borrow_mut().push(format!("add({amount})"));
                Ok(Accumulator::value(amount))
            })),
            "make" => Ok(method(name, move |_, kwargs| {
                let width = kwarg(kwargs, "width").and_then(Value::as_int).unwrap_or(1);
                calls.borrow_mut().push(format!("make(width={width})"));
                Ok(Accumulator::value(width))
            })),
            "echo" => Ok(method(name, move |args, _| {
                calls.borrow_mut().push(format!("echo({})", args.len()));
                Ok(args.first().cloned().unwrap_or_default())
            })),
            "fail" => Ok(method(name, |_, _| {
                Err(OpError::Host("fail() always fails".to_string()))
            })),
            _ => Err(OpError::no_attribute("Register", name)),
        }
    }

    fn set_attr(&self, name: &str, value: Value) -> OpResult<()> {
        match name {
            "label" => {
                *self.label.borrow_mut() = value;
                Ok(())
            }
            _ => Err(OpError::ReadOnly {
                type_name: "Register".to_string(),
                attr: name.to_string(),
            }),
        }
    }

    fn get_item(&self, key: &Value) -> OpResult<Value> {
        match key.as_int() {
            Some(index) => Ok(Value::Int(index * 10)),
            None => Err(OpError::bad_argument("Register indices are ints")),
        }
    }

    fn repr(&self) -> String {
        format!("<Register {}>", self.name)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub fn register_calls(value: &Value) -> Vec<String> {
    value
        .as_object()
        .and_then(|obj| obj.downcast_ref::<Register>())
        .map(|register| register.calls.borrow().clone())
        .unwrap_or_default()
}

pub struct Accumulator {
    total: Rc<RefCell<i64>>,
}

impl Accumulator {
    pub fn value(start: i64) -> Value {
        Value::object(Self {
            total: Rc::new(RefCell::new(start)),
        })
    }
}

impl HostObject for Accumulator {
    fn type_name(&self) -> &str {
        "Accumulator"
    }

    fn get_attr(&self, name: &str) -> OpResult<Value> {
        let total = Rc::clone(&self.total);
        match name {
            "total" => Ok(method(name, move |_, _| Ok(Value::Int(*total.borrow())))),
            "add" => Ok(method(name, move |args, _| {
                let amount = args.first().and_then(Value::as_int).unwrap_or(0);
                *total.borrow_mut() += amount;
                Ok(Value::None)
            })),
            _ => Err(OpError::no_attribute("Accumulator", name)),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

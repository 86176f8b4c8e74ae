//! retrace recorder: record operations on live objects, replay them as code.
//!
//! ```text
//! wrap(root) → operations on proxies → trace → statements → compress → program
//! ```
//!
//! A [`ProxyRef`] behaves like the value it wraps: attribute reads, item
//! reads, calls and attribute writes are forwarded to the real value, and
//! each successful one is appended to the session trace. [`ProxyRef::program`]
//! turns the trace into a script that reproduces the same operations, with
//! values that have no faithful literal embedded as serialized data.

pub mod adapter;
pub mod compress;
pub mod config;
pub mod emit;
pub mod error;
pub mod figure;
pub mod naming;
pub mod proxy;
pub mod serializer;
pub mod session;
pub mod statement;
pub mod trace;
pub mod unwrap;

pub use adapter::{write_script, Adapter, DefaultAdapter};
pub use compress::compress;
pub use config::RecorderConfig;
pub use emit::GeneratedProgram;
pub use error::{RecordError, RecordResult};
pub use figure::{recorded_figure, recorded_figure_with, FigureAdapter, FIGURE_NAME, PLOT_MODULE};
pub use proxy::ProxyRef;
pub use serializer::DATA_PREFIX;
pub use session::Session;
pub use statement::{RecordWarning, Statement};
pub use trace::{OpKind, Opcode, Operand};
pub use unwrap::unwrap;

use retrace_types::Value;

/// Wrap `root` in a fresh session with the default adapter and
/// configuration. `known` objects are registered before wrapping.
pub fn wrap<S: Into<String>>(root: Value, known: impl IntoIterator<Item = (S, Value)>) -> ProxyRef {
    let session = Session::with_defaults();
    for (name, value) in known {
        session.register_known(name, value);
    }
    session.wrap(root)
}

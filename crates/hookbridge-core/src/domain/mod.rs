//! Interpreter domain types.

mod interpreter;
mod managed;

pub use interpreter::{DiscoveryStrategy, InterpreterInfo, PythonVersion, VersionParseError};
pub use managed::{InterpreterState, InterpreterStatus, InterpreterSummary, ManagedInterpreter};

//! Script host: runs emitted JavaScript against a named scope.
//!
//! The program is parsed with tree-sitter, lowered into an owned tree and
//! evaluated by a small strict-mode interpreter. Nothing is evaluated
//! through a host engine.

mod ast;
mod builder;
mod error;
mod host;
mod interp;
mod lower;
mod value;

pub use builder::{ExecutableCallable, ExecutionBuilder, Scope};
pub use error::{ErrorKind, ScriptError};
pub use host::HostGlobals;
pub use interp::{MAX_CALL_DEPTH, MAX_STACK_BYTES};
pub use value::Value;

//! Language service adapter: syntax markers + TypeScript emit.

mod analysis;
mod emit;
mod service;
mod worker;

pub use analysis::{syntax_markers, SYNTAX_OWNER};
pub use emit::emit_javascript;
pub use service::TreeSitterLanguageService;
pub use worker::WorkerClient;

pub(crate) use analysis::parse;

//! Headless editor core: buffer ownership, autosave, diagnostics and the
//! compile pipeline.

pub mod autosave;
pub mod editor;
pub mod language;
pub mod problems;
pub mod services;

pub use autosave::{AutosaveDebouncer, PendingWrite};
pub use editor::{Editor, EditorHost, TranspileError};
pub use language::LanguageId;
pub use problems::{DiagnosticRecord, MarkerTable};

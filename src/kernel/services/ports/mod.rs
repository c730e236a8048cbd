//! Service ports: traits + data contracts.

pub mod clock;
pub mod config;
pub mod language;
pub mod runtime;
pub mod settings;
pub mod storage;
pub mod transfer;

pub use clock::{Clock, SystemClock};
pub use config::{EditorConfig, DEFAULT_QUIET_INTERVAL_MS};
pub use language::{
    CompileWorker, EmitOutput, LanguageError, LanguageService, Marker, MarkerSeverity,
    OutputFile, ResourceUri,
};
pub use runtime::BoxFuture;
pub use settings::Settings;
pub use storage::KeyValueStore;
pub use transfer::{FilePicker, TextArtifact, TransferHandle, TransferHost};

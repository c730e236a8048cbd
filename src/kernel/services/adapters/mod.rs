//! Service adapters: OS/runtime specific implementations (IO/async).

pub mod clock;
pub mod language;
pub mod paths;
pub mod settings;
pub mod storage;
pub mod transfer;

pub use clock::ManualClock;
pub use language::{emit_javascript, syntax_markers, TreeSitterLanguageService, WorkerClient};
pub use paths::{
    ensure_downloads_dir, ensure_log_dir, ensure_storage_dir, get_downloads_dir, get_log_dir,
    get_storage_dir,
};
pub use settings::{ensure_settings_file, get_settings_path, load_settings, load_settings_from};
pub use storage::{FileStore, MemoryStore};
pub use transfer::{LocalTransferHost, PresetPicker};

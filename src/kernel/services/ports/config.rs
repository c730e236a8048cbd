use crate::kernel::language::LanguageId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_QUIET_INTERVAL_MS: u64 = 5000;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// 最后一次修改后等待多久才落盘
    pub quiet_interval_ms: u64,
    pub language: LanguageId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downloads_dir: Option<PathBuf>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            quiet_interval_ms: DEFAULT_QUIET_INTERVAL_MS,
            language: LanguageId::default(),
            storage_dir: None,
            downloads_dir: None,
        }
    }
}

impl EditorConfig {
    pub fn quiet_interval(&self) -> Duration {
        Duration::from_millis(self.quiet_interval_ms)
    }
}

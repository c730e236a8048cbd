use super::runtime::BoxFuture;
use std::io;
use std::path::PathBuf;

/// 已发布产物的句柄；同一编辑器同一时刻最多只有一个存活
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransferHandle {
    id: u64,
    location: String,
}

impl TransferHandle {
    pub fn new(id: u64, location: impl Into<String>) -> Self {
        Self {
            id,
            location: location.into(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn location(&self) -> &str {
        &self.location
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextArtifact {
    pub content: String,
    pub mime: &'static str,
}

impl TextArtifact {
    pub fn plain(content: String) -> Self {
        Self {
            content,
            mime: "text/plain",
        }
    }
}

/// Platform side of export: publish a blob, release it, trigger save-as.
pub trait TransferHost: Send {
    fn publish(&mut self, artifact: TextArtifact) -> io::Result<TransferHandle>;

    fn revoke(&mut self, handle: &TransferHandle) -> io::Result<()>;

    fn save_as(&mut self, handle: &TransferHandle, file_name: &str) -> io::Result<()>;
}

/// File-open interaction. `None` means the user dismissed the dialog.
pub trait FilePicker: Send {
    fn pick(&mut self) -> BoxFuture<'_, Option<Vec<PathBuf>>>;
}

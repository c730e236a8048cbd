//! 本地文件传输宿主
//!
//! 发布的产物先写入暂存目录（相当于 blob URL），另存为时复制到下载目录；
//! 撤销句柄即删除暂存文件。

use super::paths::ensure_downloads_dir;
use crate::kernel::services::ports::{
    BoxFuture, FilePicker, TextArtifact, TransferHandle, TransferHost,
};
use rustc_hash::FxHashMap;
use std::io;
use std::path::{Path, PathBuf};

const STAGING_DIR: &str = ".staging";

pub struct LocalTransferHost {
    staging_dir: PathBuf,
    downloads_dir: PathBuf,
    next_id: u64,
    live: FxHashMap<u64, PathBuf>,
}

impl LocalTransferHost {
    pub fn new(downloads_dir: PathBuf) -> Self {
        Self {
            staging_dir: downloads_dir.join(STAGING_DIR),
            downloads_dir,
            next_id: 1,
            live: FxHashMap::default(),
        }
    }

    pub fn open_default() -> io::Result<Self> {
        ensure_downloads_dir().map(Self::new)
    }

    pub fn downloads_dir(&self) -> &Path {
        &self.downloads_dir
    }

    pub fn live_handles(&self) -> usize {
        self.live.len()
    }
}

impl TransferHost for LocalTransferHost {
    fn publish(&mut self, artifact: TextArtifact) -> io::Result<TransferHandle> {
        if !self.staging_dir.exists() {
            std::fs::create_dir_all(&self.staging_dir)?;
        }
        let id = self.next_id;
        self.next_id += 1;

        let path = self.staging_dir.join(format!("blob-{}.txt", id));
        std::fs::write(&path, artifact.content.as_bytes())?;
        let handle = TransferHandle::new(id, path.to_string_lossy());
        self.live.insert(id, path);
        Ok(handle)
    }

    fn revoke(&mut self, handle: &TransferHandle) -> io::Result<()> {
        let Some(path) = self.live.remove(&handle.id()) else {
            return Ok(());
        };
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn save_as(&mut self, handle: &TransferHandle, file_name: &str) -> io::Result<()> {
        let staged = self.live.get(&handle.id()).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "transfer handle is not live")
        })?;
        // 只取文件名部分，避免写出下载目录
        let name = Path::new(file_name).file_name().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid file name: {:?}", file_name),
            )
        })?;

        if !self.downloads_dir.exists() {
            std::fs::create_dir_all(&self.downloads_dir)?;
        }
        std::fs::copy(staged, self.downloads_dir.join(name))?;
        Ok(())
    }
}

impl Drop for LocalTransferHost {
    fn drop(&mut self) {
        for (_, path) in self.live.drain() {
            let _ = std::fs::remove_file(path);
        }
    }
}

/// Picker with a selection fixed up front, for headless hosts.
#[derive(Debug, Clone, Default)]
pub struct PresetPicker {
    selection: Option<Vec<PathBuf>>,
}

impl PresetPicker {
    pub fn new(selection: Vec<PathBuf>) -> Self {
        Self {
            selection: Some(selection),
        }
    }

    pub fn single(path: impl Into<PathBuf>) -> Self {
        Self::new(vec![path.into()])
    }

    pub fn cancelled() -> Self {
        Self { selection: None }
    }
}

impl FilePicker for PresetPicker {
    fn pick(&mut self) -> BoxFuture<'_, Option<Vec<PathBuf>>> {
        let selection = self.selection.clone();
        Box::pin(async move { selection })
    }
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/adapters/transfer.rs"]
mod tests;

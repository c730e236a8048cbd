//! 键值存储适配器
//!
//! - `MemoryStore`：进程内存储，可克隆共享（测试/嵌入宿主）
//! - `FileStore`：每个 key 一个文件，内容原样写入

use super::paths::{ensure_storage_dir, hash_key};
use crate::kernel::services::ports::KeyValueStore;
use rustc_hash::FxHashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

const MAX_STEM_CHARS: usize = 48;

#[derive(Debug, Default)]
struct MemoryInner {
    values: FxHashMap<String, String>,
    writes: usize,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `set` calls so far.
    pub fn write_count(&self) -> usize {
        self.inner.lock().map(|inner| inner.writes).unwrap_or(0)
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.inner
            .lock()
            .ok()
            .and_then(|inner| inner.values.get(key).cloned())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        let inner = self
            .inner
            .lock()
            .map_err(|_| io::Error::other("memory store poisoned"))?;
        Ok(inner.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> io::Result<()> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| io::Error::other("memory store poisoned"))?;
        inner.values.insert(key.to_string(), value.to_string());
        inner.writes += 1;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Store rooted at the per-user data directory.
    pub fn open_default() -> io::Result<Self> {
        ensure_storage_dir().map(Self::new)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// 文件名 = 可读前缀 + key 哈希，保证不同 key 不会撞名
    pub fn path_for(&self, key: &str) -> PathBuf {
        let stem: String = key
            .chars()
            .take(MAX_STEM_CHARS)
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.base_dir
            .join(format!("{}-{}.txt", stem, hash_key(key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> io::Result<()> {
        if !self.base_dir.exists() {
            std::fs::create_dir_all(&self.base_dir)?;
        }
        std::fs::write(self.path_for(key), value)
    }
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/adapters/storage.rs"]
mod tests;

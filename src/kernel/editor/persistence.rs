use super::{Editor, EditorHost};
use crate::kernel::services::ports::{EditorConfig, KeyValueStore};
use std::io;
use std::time::Instant;

impl Editor {
    /// Like [`Editor::with_config`], but starts from the stored content
    /// under `storage_key` when there is any.
    pub fn restore(
        host: EditorHost,
        storage_key: impl Into<String>,
        fallback: &str,
        config: &EditorConfig,
    ) -> io::Result<Self> {
        let storage_key = storage_key.into();
        let stored = host.store.get(&storage_key)?;
        if stored.is_some() {
            tracing::debug!(key = %storage_key, "restored stored content");
        }
        let content = stored.as_deref().unwrap_or(fallback);
        Ok(Self::with_config(host, content, storage_key, config))
    }

    pub fn autosave_deadline(&self) -> Option<Instant> {
        self.autosave.deadline()
    }

    pub fn has_pending_autosave(&self) -> bool {
        self.autosave.is_pending()
    }

    /// Fires the pending write once its deadline has passed. The buffer is
    /// read now, not when the write was scheduled.
    pub fn poll_autosave(&mut self) -> io::Result<bool> {
        if !self.autosave.poll(self.clock.now()) {
            return Ok(false);
        }
        write_snapshot(self.store.as_mut(), &self.storage_key, &self.buffer.text())?;
        Ok(true)
    }

    /// Writes immediately and drops any pending write.
    pub fn flush(&mut self) -> io::Result<()> {
        self.autosave.cancel();
        write_snapshot(self.store.as_mut(), &self.storage_key, &self.buffer.text())
    }
}

fn write_snapshot(store: &mut dyn KeyValueStore, key: &str, text: &str) -> io::Result<()> {
    store.set(key, text)?;
    tracing::debug!(key = %key, bytes = text.len(), "autosave written");
    Ok(())
}

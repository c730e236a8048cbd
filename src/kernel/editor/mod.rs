//! Editor domain: one buffer bound to persistence, transfer and the
//! compile/execute pipeline.

mod persistence;
mod transfer;
mod transpile;

pub use transpile::TranspileError;

use crate::kernel::autosave::AutosaveDebouncer;
use crate::kernel::language::LanguageId;
use crate::kernel::services::ports::{
    Clock, EditorConfig, KeyValueStore, LanguageService, ResourceUri, SystemClock,
    TransferHandle, TransferHost,
};
use crate::models::TextBuffer;
use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

/// Platform services an editor is wired to.
pub struct EditorHost {
    pub store: Box<dyn KeyValueStore>,
    pub transfer: Box<dyn TransferHost>,
    pub language: Arc<dyn LanguageService>,
    pub clock: Arc<dyn Clock>,
}

impl EditorHost {
    pub fn new(
        store: impl KeyValueStore + 'static,
        transfer: impl TransferHost + 'static,
        language: Arc<dyn LanguageService>,
    ) -> Self {
        Self {
            store: Box::new(store),
            transfer: Box::new(transfer),
            language,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

pub struct Editor {
    buffer: TextBuffer,
    storage_key: String,
    uri: ResourceUri,
    language_id: LanguageId,
    autosave: AutosaveDebouncer,
    store: Box<dyn KeyValueStore>,
    transfer: Box<dyn TransferHost>,
    live_handle: Option<TransferHandle>,
    language: Arc<dyn LanguageService>,
    clock: Arc<dyn Clock>,
}

impl Editor {
    pub fn new(
        host: EditorHost,
        initial_content: &str,
        storage_key: impl Into<String>,
        quiet_interval: Duration,
    ) -> Self {
        Self::open(
            host,
            initial_content,
            storage_key.into(),
            quiet_interval,
            LanguageId::default(),
        )
    }

    pub fn with_config(
        host: EditorHost,
        initial_content: &str,
        storage_key: impl Into<String>,
        config: &EditorConfig,
    ) -> Self {
        Self::open(
            host,
            initial_content,
            storage_key.into(),
            config.quiet_interval(),
            config.language,
        )
    }

    fn open(
        host: EditorHost,
        content: &str,
        storage_key: String,
        quiet_interval: Duration,
        language_id: LanguageId,
    ) -> Self {
        let uri = ResourceUri::for_model(&storage_key, language_id);
        host.language
            .open(uri.clone(), language_id, content.to_string());
        tracing::debug!(uri = %uri, key = %storage_key, "editor opened");

        Self {
            buffer: TextBuffer::from_text(content),
            storage_key,
            uri,
            language_id,
            autosave: AutosaveDebouncer::new(quiet_interval),
            store: host.store,
            transfer: host.transfer,
            live_handle: None,
            language: host.language,
            clock: host.clock,
        }
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub fn uri(&self) -> &ResourceUri {
        &self.uri
    }

    pub fn language_id(&self) -> LanguageId {
        self.language_id
    }

    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    pub fn text(&self) -> String {
        self.buffer.text()
    }

    pub fn version(&self) -> u64 {
        self.buffer.version()
    }

    /// Replaces the whole buffer. Always counts as a change.
    pub fn set_text(&mut self, text: &str) {
        self.buffer.set_text(text);
        self.content_changed();
    }

    pub fn insert(&mut self, char_offset: usize, text: &str) -> bool {
        let changed = self.buffer.insert(char_offset, text);
        if changed {
            self.content_changed();
        }
        changed
    }

    pub fn delete(&mut self, range: Range<usize>) -> bool {
        let changed = self.buffer.delete(range);
        if changed {
            self.content_changed();
        }
        changed
    }

    fn content_changed(&mut self) {
        self.language
            .did_change(&self.uri, self.buffer.version(), self.buffer.text());
        if self.autosave.schedule(self.clock.now()).is_some() {
            tracing::trace!(version = self.buffer.version(), "pending autosave replaced");
        }
    }
}

impl Drop for Editor {
    fn drop(&mut self) {
        if self.autosave.cancel() {
            tracing::debug!(key = %self.storage_key, "pending autosave abandoned");
        }
        if let Some(handle) = self.live_handle.take() {
            let _ = self.transfer.revoke(&handle);
        }
        self.language.close(&self.uri);
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/kernel/editor/mod.rs"]
mod tests;

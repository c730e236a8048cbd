use super::analysis::{syntax_markers, SYNTAX_OWNER};
use super::worker::{spawn_worker, WorkerClient};
use crate::kernel::language::LanguageId;
use crate::kernel::problems::MarkerTable;
use crate::kernel::services::ports::{
    BoxFuture, CompileWorker, LanguageError, LanguageService, Marker, ResourceUri,
};
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub(super) struct Document {
    pub(super) language: LanguageId,
    pub(super) version: u64,
    pub(super) text: String,
}

#[derive(Default)]
pub(super) struct ServiceInner {
    pub(super) documents: FxHashMap<ResourceUri, Document>,
    markers: MarkerTable,
}

#[derive(Clone, Default)]
pub(super) struct SharedState {
    pub(super) inner: Arc<Mutex<ServiceInner>>,
    pub(super) emit_requests: Arc<AtomicUsize>,
}

/// In-process language service backed by tree-sitter.
///
/// Syntax markers are refreshed on every document sync. Emit goes through a
/// worker task that is started lazily on the current tokio runtime.
#[derive(Default)]
pub struct TreeSitterLanguageService {
    state: SharedState,
    worker: Mutex<Option<WorkerClient>>,
}

impl TreeSitterLanguageService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit requests the worker has handled so far.
    pub fn emit_request_count(&self) -> usize {
        self.state.emit_requests.load(Ordering::Relaxed)
    }

    pub fn document_version(&self, uri: &ResourceUri) -> Option<u64> {
        let inner = self.state.inner.lock().ok()?;
        inner.documents.get(uri).map(|doc| doc.version)
    }

    fn analyze(inner: &mut ServiceInner, uri: &ResourceUri) {
        let Some(doc) = inner.documents.get(uri) else {
            return;
        };
        let markers = syntax_markers(doc.language, &doc.text);
        if inner.markers.update(uri, SYNTAX_OWNER, markers) {
            tracing::trace!(uri = %uri, "syntax markers changed");
        }
    }

    fn worker_client(&self) -> Result<WorkerClient, LanguageError> {
        let mut slot = self
            .worker
            .lock()
            .map_err(|_| LanguageError::WorkerUnavailable)?;
        if let Some(client) = slot.as_ref().filter(|c| c.is_alive()) {
            return Ok(client.clone());
        }

        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| LanguageError::WorkerUnavailable)?;
        let client = spawn_worker(&runtime, self.state.clone());
        *slot = Some(client.clone());
        Ok(client)
    }
}

impl LanguageService for TreeSitterLanguageService {
    fn open(&self, uri: ResourceUri, language: LanguageId, text: String) {
        let Ok(mut inner) = self.state.inner.lock() else {
            return;
        };
        inner.documents.insert(
            uri.clone(),
            Document {
                language,
                version: 0,
                text,
            },
        );
        Self::analyze(&mut inner, &uri);
    }

    fn did_change(&self, uri: &ResourceUri, version: u64, text: String) {
        let Ok(mut inner) = self.state.inner.lock() else {
            return;
        };
        let Some(doc) = inner.documents.get_mut(uri) else {
            tracing::warn!(uri = %uri, "change for unopened document");
            return;
        };
        if version < doc.version {
            return;
        }
        doc.version = version;
        doc.text = text;
        Self::analyze(&mut inner, uri);
    }

    fn close(&self, uri: &ResourceUri) {
        if let Ok(mut inner) = self.state.inner.lock() {
            inner.documents.remove(uri);
            inner.markers.remove_resource(uri);
        }
    }

    fn markers(&self, uri: &ResourceUri) -> Vec<Marker> {
        self.state
            .inner
            .lock()
            .map(|inner| inner.markers.markers(uri))
            .unwrap_or_default()
    }

    fn set_markers(&self, uri: &ResourceUri, owner: &str, markers: Vec<Marker>) {
        if let Ok(mut inner) = self.state.inner.lock() {
            inner.markers.update(uri, owner, markers);
        }
    }

    fn worker(&self) -> BoxFuture<'_, Result<Arc<dyn CompileWorker>, LanguageError>> {
        let client = self.worker_client();
        Box::pin(async move { client.map(|c| Arc::new(c) as Arc<dyn CompileWorker>) })
    }
}

#[cfg(test)]
#[path = "../../../../../tests/unit/kernel/services/adapters/language/service.rs"]
mod tests;

//! Compile worker: a tokio task answering emit requests over a channel.

use super::emit::emit_javascript;
use super::service::SharedState;
use crate::kernel::services::ports::{
    BoxFuture, CompileWorker, EmitOutput, LanguageError, OutputFile, ResourceUri,
};
use std::sync::atomic::Ordering;
use tokio::sync::{mpsc, oneshot};

enum WorkerRequest {
    Emit {
        uri: ResourceUri,
        reply: oneshot::Sender<Result<EmitOutput, LanguageError>>,
    },
}

#[derive(Clone)]
pub struct WorkerClient {
    tx: mpsc::UnboundedSender<WorkerRequest>,
}

impl WorkerClient {
    pub fn is_alive(&self) -> bool {
        !self.tx.is_closed()
    }
}

impl CompileWorker for WorkerClient {
    fn emit_output<'a>(
        &'a self,
        uri: &'a ResourceUri,
    ) -> BoxFuture<'a, Result<EmitOutput, LanguageError>> {
        Box::pin(async move {
            let (reply, rx) = oneshot::channel();
            self.tx
                .send(WorkerRequest::Emit {
                    uri: uri.clone(),
                    reply,
                })
                .map_err(|_| LanguageError::WorkerUnavailable)?;
            rx.await.map_err(|_| LanguageError::WorkerUnavailable)?
        })
    }
}

pub(super) fn spawn_worker(runtime: &tokio::runtime::Handle, state: SharedState) -> WorkerClient {
    let (tx, rx) = mpsc::unbounded_channel();
    runtime.spawn(run_worker(state, rx));
    WorkerClient { tx }
}

async fn run_worker(state: SharedState, mut rx: mpsc::UnboundedReceiver<WorkerRequest>) {
    tracing::debug!("compile worker started");
    while let Some(request) = rx.recv().await {
        match request {
            WorkerRequest::Emit { uri, reply } => {
                let result = handle_emit(&state, &uri).await;
                if let Err(e) = &result {
                    tracing::debug!(uri = %uri, error = %e, "emit failed");
                }
                let _ = reply.send(result);
            }
        }
    }
    tracing::debug!("compile worker stopped");
}

async fn handle_emit(state: &SharedState, uri: &ResourceUri) -> Result<EmitOutput, LanguageError> {
    state.emit_requests.fetch_add(1, Ordering::Relaxed);

    // Snapshot the document as of this request; later edits do not leak in.
    let snapshot = state.inner.lock().ok().and_then(|inner| {
        inner
            .documents
            .get(uri)
            .map(|doc| (doc.language, doc.version, doc.text.clone()))
    });
    let Some((language, version, text)) = snapshot else {
        return Err(LanguageError::UnknownResource(uri.clone()));
    };

    let output = tokio::task::spawn_blocking(move || emit_javascript(language, &text))
        .await
        .map_err(|e| LanguageError::Parser(e.to_string()))??;

    tracing::trace!(uri = %uri, version, bytes = output.len(), "emitted");
    Ok(EmitOutput {
        output_files: vec![OutputFile {
            name: output_name(uri),
            text: output,
        }],
        emit_skipped: false,
    })
}

fn output_name(uri: &ResourceUri) -> String {
    let raw = uri.as_str();
    match raw.rsplit_once('.') {
        Some((stem, "ts" | "mts" | "cts")) => format!("{}.js", stem),
        _ => raw.to_string(),
    }
}

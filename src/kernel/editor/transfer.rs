use super::Editor;
use crate::kernel::services::ports::{FilePicker, TextArtifact, TransferHandle};
use std::io;

impl Editor {
    /// Exports the current buffer as `file_name`. The previous transfer
    /// handle is revoked before the new one is published; if revoking
    /// fails the handle stays live so a later download retries it.
    pub fn download(&mut self, file_name: &str) -> io::Result<()> {
        let artifact = TextArtifact::plain(self.buffer.text());
        let bytes = artifact.content.len();

        if let Some(previous) = self.live_handle.take() {
            if let Err(e) = self.transfer.revoke(&previous) {
                tracing::warn!(handle = previous.id(), error = %e, "revoke failed");
                self.live_handle = Some(previous);
                return Err(e);
            }
        }
        let handle = self.transfer.publish(artifact)?;
        self.live_handle = Some(handle.clone());
        self.transfer.save_as(&handle, file_name)?;

        tracing::info!(file = %file_name, bytes, "download saved");
        Ok(())
    }

    pub fn live_handle(&self) -> Option<&TransferHandle> {
        self.live_handle.as_ref()
    }

    /// Replaces the buffer with the first picked file. Dismissing the
    /// picker leaves everything untouched.
    pub async fn upload(&mut self, picker: &mut dyn FilePicker) -> io::Result<()> {
        let Some(path) = picker
            .pick()
            .await
            .and_then(|selection| selection.into_iter().next())
        else {
            tracing::debug!("upload cancelled");
            return Ok(());
        };

        let text = tokio::fs::read_to_string(&path).await?;
        tracing::info!(path = %path.display(), bytes = text.len(), "upload loaded");
        self.set_text(&text);
        Ok(())
    }
}

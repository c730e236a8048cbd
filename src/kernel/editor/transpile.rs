use super::Editor;
use crate::kernel::problems;
use crate::kernel::services::ports::LanguageError;
use crate::script::{ExecutableCallable, ExecutionBuilder, Scope, ScriptError};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum TranspileError {
    /// Joined `Line <N>: <message>` report; displayed verbatim.
    Diagnostics(String),
    Language(LanguageError),
    Script(ScriptError),
}

impl fmt::Display for TranspileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranspileError::Diagnostics(report) => f.write_str(report),
            TranspileError::Language(e) => write!(f, "{}", e),
            TranspileError::Script(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for TranspileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TranspileError::Diagnostics(_) => None,
            TranspileError::Language(e) => Some(e),
            TranspileError::Script(e) => Some(e),
        }
    }
}

impl From<LanguageError> for TranspileError {
    fn from(e: LanguageError) -> Self {
        TranspileError::Language(e)
    }
}

impl From<ScriptError> for TranspileError {
    fn from(e: ScriptError) -> Self {
        TranspileError::Script(e)
    }
}

impl Editor {
    /// Current diagnostics report for the buffer; empty when clean.
    pub fn diagnostics(&self) -> String {
        problems::collect(self.language.as_ref(), &self.uri)
    }

    /// Asks the compile worker for the buffer's primary output text.
    pub async fn emit(&self) -> Result<String, LanguageError> {
        let worker = self.language.worker().await?;
        let output = worker.emit_output(&self.uri).await?;
        match output.primary_text() {
            Some(text) if !output.emit_skipped => Ok(text.to_string()),
            _ => Err(LanguageError::EmptyOutput(self.uri.clone())),
        }
    }

    /// Compiles the buffer into a callable with `scope` bound as its
    /// parameters. Any diagnostic aborts before the worker is contacted.
    pub async fn transpile(&self, scope: Scope) -> Result<ExecutableCallable, TranspileError> {
        let (names, values) = scope.into_parts();

        let report = self.diagnostics();
        if !report.is_empty() {
            tracing::debug!(uri = %self.uri, "transpile rejected by diagnostics");
            return Err(TranspileError::Diagnostics(report));
        }

        let text = self.emit().await?;
        let callable = ExecutionBuilder::new().build(&text, names, values)?;
        tracing::debug!(uri = %self.uri, version = self.buffer.version(), "transpiled");
        Ok(callable)
    }
}

use super::runtime::BoxFuture;
use crate::kernel::language::LanguageId;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceUri(String);

impl ResourceUri {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    /// Identity of an editor model, derived from its storage key.
    pub fn for_model(storage_key: &str, language: LanguageId) -> Self {
        Self(format!(
            "inmemory://model/{}.{}",
            storage_key,
            language.extension()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerSeverity {
    Error,
    Warning,
    Information,
    Hint,
}

impl MarkerSeverity {
    pub fn label(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Information => "info",
            Self::Hint => "hint",
        }
    }
}

/// A positioned diagnostic. Lines and columns are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub severity: MarkerSeverity,
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
    pub message: String,
}

impl Marker {
    pub fn error(line: u32, col: u32, message: impl Into<String>) -> Self {
        Self {
            severity: MarkerSeverity::Error,
            start_line: line,
            start_col: col,
            end_line: line,
            end_col: col.saturating_add(1),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub name: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EmitOutput {
    pub output_files: Vec<OutputFile>,
    pub emit_skipped: bool,
}

impl EmitOutput {
    pub fn primary_text(&self) -> Option<&str> {
        self.output_files.first().map(|f| f.text.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageError {
    WorkerUnavailable,
    UnknownResource(ResourceUri),
    EmptyOutput(ResourceUri),
    Parser(String),
}

impl fmt::Display for LanguageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LanguageError::WorkerUnavailable => write!(f, "compile worker unavailable"),
            LanguageError::UnknownResource(uri) => write!(f, "unknown resource: {}", uri),
            LanguageError::EmptyOutput(uri) => write!(f, "no emit output for {}", uri),
            LanguageError::Parser(msg) => write!(f, "parser error: {}", msg),
        }
    }
}

impl std::error::Error for LanguageError {}

pub trait CompileWorker: Send + Sync {
    fn emit_output<'a>(
        &'a self,
        uri: &'a ResourceUri,
    ) -> BoxFuture<'a, Result<EmitOutput, LanguageError>>;
}

/// Background analysis + emit for editor models.
///
/// Markers are whatever has been computed so far; reading them never
/// triggers analysis.
pub trait LanguageService: Send + Sync {
    fn open(&self, uri: ResourceUri, language: LanguageId, text: String);

    fn did_change(&self, uri: &ResourceUri, version: u64, text: String);

    fn close(&self, uri: &ResourceUri);

    fn markers(&self, uri: &ResourceUri) -> Vec<Marker>;

    fn set_markers(&self, uri: &ResourceUri, owner: &str, markers: Vec<Marker>);

    fn worker(&self) -> BoxFuture<'_, Result<Arc<dyn CompileWorker>, LanguageError>>;
}

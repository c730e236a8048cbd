//! Runs one script file through the edit, compile and execute pipeline.

mod logging;

use livecode::kernel::editor::{Editor, EditorHost};
use livecode::kernel::language::LanguageId;
use livecode::kernel::services::adapters::{
    ensure_settings_file, load_settings, FileStore, LocalTransferHost, PresetPicker,
    TreeSitterLanguageService,
};
use livecode::script::{Scope, Value};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

const USAGE: &str = "usage: livecode [--key KEY] [--scope JSON] [--download NAME] <file>";

struct Args {
    key: Option<String>,
    scope: Scope,
    download: Option<String>,
    file: PathBuf,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut key = None;
    let mut scope = Scope::new();
    let mut download = None;
    let mut file = None;

    while let Some(arg) = args.next() {
        let mut value = |flag: &str| args.next().ok_or_else(|| format!("{} needs a value", flag));
        match arg.as_str() {
            "--key" => key = Some(value("--key")?),
            "--download" => download = Some(value("--download")?),
            "--scope" => {
                let raw = value("--scope")?;
                let json: serde_json::Value =
                    serde_json::from_str(&raw).map_err(|e| format!("--scope: {}", e))?;
                scope = Scope::from_json(json).map_err(|e| format!("--scope: {}", e))?;
            }
            flag if flag.starts_with("--") => return Err(format!("unknown flag {}", flag)),
            _ if file.is_none() => file = Some(PathBuf::from(&arg)),
            _ => return Err(format!("unexpected argument {}", arg)),
        }
    }

    Ok(Args {
        key,
        scope,
        download,
        file: file.ok_or_else(|| "missing <file>".to_string())?,
    })
}

fn default_key(file: &Path) -> String {
    file.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("main")
        .to_string()
}

fn render(value: &Value) -> String {
    match value {
        Value::Array(_) | Value::Object(_) => value
            .to_json()
            .ok()
            .flatten()
            .map(|json| json.to_string())
            .unwrap_or_else(|| value.to_display_string()),
        other => other.to_display_string(),
    }
}

async fn run(args: Args) -> Result<(), Box<dyn Error>> {
    if let Err(e) = ensure_settings_file() {
        tracing::warn!(error = %e, "settings file unavailable");
    }
    let mut config = load_settings().unwrap_or_default().editor;
    if let Some(language) = LanguageId::from_path(&args.file) {
        config.language = language;
    }

    let store = match &config.storage_dir {
        Some(dir) => FileStore::new(dir.clone()),
        None => FileStore::open_default()?,
    };
    let transfer = match &config.downloads_dir {
        Some(dir) => LocalTransferHost::new(dir.clone()),
        None => LocalTransferHost::open_default()?,
    };
    let host = EditorHost::new(store, transfer, Arc::new(TreeSitterLanguageService::new()));
    let key = args.key.unwrap_or_else(|| default_key(&args.file));
    let mut editor = Editor::with_config(host, "", key, &config);

    editor
        .upload(&mut PresetPicker::single(args.file.clone()))
        .await?;
    if let Some(name) = &args.download {
        editor.download(name)?;
    }

    let outcome = execute(&editor, args.scope).await;
    editor.flush()?;
    outcome
}

async fn execute(editor: &Editor, scope: Scope) -> Result<(), Box<dyn Error>> {
    let callable = editor.transpile(scope).await?;
    let result = callable.call();
    for line in callable.host().take_output() {
        println!("{}", line);
    }
    println!("{}", render(&result?));
    Ok(())
}

fn main() -> ExitCode {
    let _logging = logging::init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{}\n{}", msg, USAGE);
            return ExitCode::from(2);
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(args)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

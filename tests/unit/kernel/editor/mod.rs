use super::*;
use crate::kernel::services::adapters::{
    LocalTransferHost, ManualClock, MemoryStore, PresetPicker, TreeSitterLanguageService,
};
use crate::kernel::services::ports::Marker;
use crate::script::{ErrorKind, Scope, Value};
use tempfile::TempDir;

const QUIET: Duration = Duration::from_millis(5000);

struct Fixture {
    editor: Editor,
    store: MemoryStore,
    clock: ManualClock,
    language: Arc<TreeSitterLanguageService>,
    dir: TempDir,
}

fn host(dir: &TempDir, store: &MemoryStore, clock: &ManualClock) -> (EditorHost, Arc<TreeSitterLanguageService>) {
    let language = Arc::new(TreeSitterLanguageService::new());
    let host = EditorHost::new(
        store.clone(),
        LocalTransferHost::new(dir.path().join("downloads")),
        language.clone(),
    )
    .with_clock(Arc::new(clock.clone()));
    (host, language)
}

fn fixture(content: &str) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryStore::new();
    let clock = ManualClock::new();
    let (host, language) = host(&dir, &store, &clock);
    Fixture {
        editor: Editor::new(host, content, "unit", QUIET),
        store,
        clock,
        language,
        dir,
    }
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

#[test]
fn uri_is_derived_from_storage_key() {
    let f = fixture("");
    assert_eq!(f.editor.uri().as_str(), "inmemory://model/unit.ts");
    assert_eq!(f.editor.storage_key(), "unit");
}

#[test]
fn edit_fires_autosave_after_quiet_interval() {
    let mut f = fixture("");
    assert!(f.editor.insert(0, "abc"));
    assert!(f.editor.has_pending_autosave());

    f.clock.advance(QUIET - Duration::from_millis(1));
    assert!(!f.editor.poll_autosave().unwrap());
    f.clock.advance(Duration::from_millis(1));
    assert!(f.editor.poll_autosave().unwrap());

    assert_eq!(f.store.value("unit").as_deref(), Some("abc"));
    assert!(!f.editor.poll_autosave().unwrap());
    assert_eq!(f.store.write_count(), 1);
}

#[test]
fn autosave_reads_buffer_at_fire_time() {
    let mut f = fixture("");
    f.editor.set_text("a");
    f.clock.advance(Duration::from_millis(3000));
    f.editor.set_text("b");
    f.clock.advance(Duration::from_millis(3000));
    assert!(!f.editor.poll_autosave().unwrap());

    f.clock.advance(Duration::from_millis(2000));
    assert!(f.editor.poll_autosave().unwrap());
    assert_eq!(f.store.value("unit").as_deref(), Some("b"));
    assert_eq!(f.store.write_count(), 1);
}

#[test]
fn no_op_mutations_do_not_schedule() {
    let mut f = fixture("abc");
    assert!(!f.editor.insert(1, ""));
    assert!(!f.editor.delete(2..2));
    assert!(f.editor.autosave_deadline().is_none());
    assert_eq!(f.editor.version(), 0);
}

#[test]
fn flush_writes_now_and_clears_pending() {
    let mut f = fixture("");
    f.editor.set_text("draft");
    f.editor.flush().unwrap();

    assert_eq!(f.store.value("unit").as_deref(), Some("draft"));
    assert!(f.editor.autosave_deadline().is_none());
    f.clock.advance(QUIET * 2);
    assert!(!f.editor.poll_autosave().unwrap());
    assert_eq!(f.store.write_count(), 1);
}

#[test]
fn dropping_editor_abandons_pending_write() {
    let mut f = fixture("");
    f.editor.set_text("unsaved");
    let store = f.store.clone();
    drop(f);
    assert_eq!(store.write_count(), 0);
}

#[test]
fn restore_prefers_stored_content() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryStore::new();
    let clock = ManualClock::new();
    let config = EditorConfig::default();

    let (fresh_host, _) = host(&dir, &store, &clock);
    let fresh = Editor::restore(fresh_host, "k", "fallback", &config).unwrap();
    assert_eq!(fresh.text(), "fallback");
    drop(fresh);

    let mut writer = store.clone();
    writer.set("k", "stored").unwrap();
    let (stored_host, _) = host(&dir, &store, &clock);
    let restored = Editor::restore(stored_host, "k", "fallback", &config).unwrap();
    assert_eq!(restored.text(), "stored");
    assert!(!restored.has_pending_autosave());
}

#[test]
fn mutations_are_synced_to_language_service() {
    let mut f = fixture("let x = 1;");
    assert_eq!(f.editor.diagnostics(), "");

    f.editor.set_text("let = ;");
    assert_eq!(
        f.language.document_version(f.editor.uri()),
        Some(f.editor.version())
    );
    assert!(f.editor.diagnostics().starts_with("Line 1: "));
}

#[test]
fn download_keeps_one_live_handle() {
    let mut f = fixture("export me");
    f.editor.download("a.txt").unwrap();
    let first = f.editor.live_handle().cloned().unwrap();
    f.editor.download("b.txt").unwrap();
    let second = f.editor.live_handle().cloned().unwrap();

    assert_ne!(first, second);
    let downloads = f.dir.path().join("downloads");
    assert_eq!(std::fs::read_to_string(downloads.join("a.txt")).unwrap(), "export me");
    assert_eq!(std::fs::read_to_string(downloads.join("b.txt")).unwrap(), "export me");
    let staged = std::fs::read_dir(downloads.join(".staging")).unwrap().count();
    assert_eq!(staged, 1);
}

#[test]
fn upload_replaces_buffer_and_schedules_autosave() {
    let mut f = fixture("old");
    let path = f.dir.path().join("in.ts");
    std::fs::write(&path, "new content\n").unwrap();

    block_on(f.editor.upload(&mut PresetPicker::single(&path))).unwrap();
    assert_eq!(f.editor.text(), "new content\n");
    assert!(f.editor.has_pending_autosave());
}

#[test]
fn upload_of_several_files_takes_the_first() {
    let mut f = fixture("old");
    let first = f.dir.path().join("first.ts");
    let second = f.dir.path().join("second.ts");
    std::fs::write(&first, "from first").unwrap();
    std::fs::write(&second, "from second").unwrap();

    block_on(f.editor.upload(&mut PresetPicker::new(vec![first, second]))).unwrap();
    assert_eq!(f.editor.text(), "from first");
}

#[test]
fn cancelled_upload_changes_nothing() {
    let mut f = fixture("keep");
    block_on(f.editor.upload(&mut PresetPicker::cancelled())).unwrap();
    block_on(f.editor.upload(&mut PresetPicker::new(Vec::new()))).unwrap();
    assert_eq!(f.editor.text(), "keep");
    assert!(!f.editor.has_pending_autosave());
}

#[test]
fn upload_of_missing_file_is_an_io_error() {
    let mut f = fixture("keep");
    let missing = f.dir.path().join("missing.ts");
    let err = block_on(f.editor.upload(&mut PresetPicker::single(missing))).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    assert_eq!(f.editor.text(), "keep");
}

#[test]
fn transpile_strips_types_and_runs() {
    let f = fixture("let x: number = base;\nx * 2");
    let callable = block_on(f.editor.transpile(Scope::new().with("base", 21))).unwrap();
    assert_eq!(callable.call().unwrap(), Value::Number(42.0));
    assert_eq!(f.language.emit_request_count(), 1);
}

#[test]
fn transpile_rejects_on_diagnostics_without_emitting() {
    let f = fixture("1 + 1");
    f.language.set_markers(
        f.editor.uri(),
        "lint",
        vec![Marker::error(3, 1, "message M")],
    );

    let err = block_on(f.editor.transpile(Scope::new())).unwrap_err();
    assert_eq!(err, TranspileError::Diagnostics("Line 3: message M".to_string()));
    assert_eq!(err.to_string(), "Line 3: message M");
    assert_eq!(f.language.emit_request_count(), 0);
}

#[test]
fn transpile_reports_invalid_scope_names() {
    let f = fixture("1");
    let err = block_on(f.editor.transpile(Scope::new().with("not-valid", 1))).unwrap_err();
    assert!(matches!(err, TranspileError::Script(e) if e.kind == ErrorKind::SyntaxError));
}

use super::*;
use crate::kernel::language::LanguageId;
use tempfile::tempdir;

#[test]
fn load_settings_from_reads_editor_section() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(
        &path,
        r#"{ "editor": { "quiet_interval_ms": 1200, "language": "javascript" } }"#,
    )
    .unwrap();

    let settings = load_settings_from(&path).unwrap();
    assert_eq!(settings.editor.quiet_interval_ms, 1200);
    assert_eq!(settings.editor.language, LanguageId::JavaScript);
}

#[test]
fn load_settings_from_missing_section_uses_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, "{}").unwrap();

    let settings = load_settings_from(&path).unwrap();
    assert_eq!(settings, Settings::default());
}

#[test]
fn load_settings_from_invalid_json_is_none() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(load_settings_from(&path).is_none());
    assert!(load_settings_from(&dir.path().join("missing.json")).is_none());
}

#[test]
fn settings_path_ends_with_file_name() {
    if let Some(path) = get_settings_path() {
        assert!(path.ends_with(".livecode/settings.json"));
    }
}

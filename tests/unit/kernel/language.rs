use crate::kernel::language::LanguageId;
use std::path::Path;

#[test]
fn from_path_maps_all_supported_extensions() {
    let cases = [
        ("a.js", Some(LanguageId::JavaScript)),
        ("a.mjs", Some(LanguageId::JavaScript)),
        ("a.cjs", Some(LanguageId::JavaScript)),
        ("a.ts", Some(LanguageId::TypeScript)),
        ("a.mts", Some(LanguageId::TypeScript)),
        ("a.cts", Some(LanguageId::TypeScript)),
        ("a.rs", None),
        ("README", None),
    ];

    for (path, expected) in cases {
        assert_eq!(LanguageId::from_path(Path::new(path)), expected, "{path}");
    }
}

#[test]
fn default_language_is_typescript() {
    assert_eq!(LanguageId::default(), LanguageId::TypeScript);
    assert_eq!(LanguageId::default().language_id(), "typescript");
}

#[test]
fn language_id_round_trips_through_serde() {
    let json = serde_json::to_string(&LanguageId::JavaScript).unwrap();
    assert_eq!(json, "\"javascript\"");
    let parsed: LanguageId = serde_json::from_str("\"typescript\"").unwrap();
    assert_eq!(parsed, LanguageId::TypeScript);
}

use super::*;

#[test]
fn clean_source_has_no_markers() {
    assert!(syntax_markers(LanguageId::TypeScript, "1+1").is_empty());
    assert!(syntax_markers(LanguageId::TypeScript, "let x: number = 1;\nreturn x + 1;").is_empty());
    assert!(syntax_markers(LanguageId::JavaScript, "const a = [1, 2];\na.push(3);").is_empty());
}

#[test]
fn broken_source_reports_error_markers() {
    let markers = syntax_markers(LanguageId::TypeScript, "let = ;");
    assert!(!markers.is_empty());
    assert!(markers.iter().all(|m| m.start_line == 1));
}

#[test]
fn marker_lines_are_one_based() {
    let markers = syntax_markers(LanguageId::TypeScript, "let a = 1;\nlet b = (2;\n");
    assert!(!markers.is_empty());
    assert!(markers.iter().any(|m| m.start_line == 2), "{markers:?}");
    assert!(markers.iter().all(|m| m.start_col >= 1));
}

#[test]
fn empty_source_is_clean() {
    assert!(syntax_markers(LanguageId::TypeScript, "").is_empty());
}

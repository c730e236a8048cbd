use super::*;

#[test]
fn parse_number_literal_forms() {
    assert_eq!(parse_number("42"), Some(42.0));
    assert_eq!(parse_number("1_000"), Some(1000.0));
    assert_eq!(parse_number("0xff"), Some(255.0));
    assert_eq!(parse_number("0o17"), Some(15.0));
    assert_eq!(parse_number("0b101"), Some(5.0));
    assert_eq!(parse_number(".5"), Some(0.5));
    assert_eq!(parse_number("2e3"), Some(2000.0));
    assert_eq!(parse_number("10n"), None);
}

#[test]
fn unescape_handles_common_sequences() {
    assert_eq!(unescape(r"a\nb\t\\", 1).unwrap(), "a\nb\t\\");
    assert_eq!(unescape(r"\x41B\u{1F600}", 1).unwrap(), "AB\u{1F600}");
    assert_eq!(unescape(r"\'\q", 1).unwrap(), "'q");
    assert!(unescape(r"\u{110000}", 4).is_err());
}

#[test]
fn lowers_return_and_expression_statements() {
    let program = lower_program("let x = 1;\nreturn x + 1;").unwrap();
    assert_eq!(program.body.len(), 2);
    assert!(matches!(
        &program.body[0],
        Stmt::Decl {
            kind: DeclKind::Let,
            ..
        }
    ));
    assert!(matches!(&program.body[1], Stmt::Return(Some(_))));
}

#[test]
fn comments_are_skipped() {
    let program = lower_program("// leading\n1 /* inline */ + 1;").unwrap();
    assert_eq!(program.body.len(), 1);
}

#[test]
fn template_parts_split_text_and_substitutions() {
    let program = lower_program("`a${1}b\\n`").unwrap();
    let Stmt::Expr(Expr {
        kind: ExprKind::Template(parts),
        ..
    }) = &program.body[0]
    else {
        panic!("expected template expression");
    };
    assert_eq!(parts.len(), 3);
    assert!(matches!(&parts[0], TemplatePart::Text(t) if t == "a"));
    assert!(matches!(&parts[2], TemplatePart::Text(t) if t == "b\n"));
}

#[test]
fn syntax_error_reports_line() {
    let err = lower_program("let a = 1;\nlet = ;").unwrap_err();
    assert_eq!(err.kind, crate::script::ErrorKind::SyntaxError);
    assert_eq!(err.line, Some(2));
}

#[test]
fn unsupported_constructs_are_rejected() {
    let err = lower_program("class A {}").unwrap_err();
    assert_eq!(err.kind, crate::script::ErrorKind::SyntaxError);
    assert!(err.message.contains("class_declaration"), "{}", err.message);

    let err = lower_program("const { a } = b;").unwrap_err();
    assert!(err.message.contains("object_pattern"), "{}", err.message);
}

#[test]
fn invalid_assignment_target() {
    let err = lower_program("1 = 2;").unwrap_err();
    assert_eq!(err.kind, crate::script::ErrorKind::SyntaxError);
}

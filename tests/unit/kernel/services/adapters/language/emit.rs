use super::*;

fn ts(src: &str) -> String {
    emit_javascript(LanguageId::TypeScript, src).unwrap()
}

#[test]
fn strips_variable_annotations() {
    assert_eq!(ts("let x: number = 1;"), "let x = 1;");
}

#[test]
fn strips_parameter_and_return_types() {
    assert_eq!(
        ts("function add(a: number, b: number): number { return a + b; }"),
        "function add(a, b) { return a + b; }"
    );
}

#[test]
fn strips_generics() {
    assert_eq!(
        ts("function id<T>(v: T): T { return v; }"),
        "function id(v) { return v; }"
    );
}

#[test]
fn drops_interfaces_and_type_aliases() {
    assert_eq!(
        ts("interface P { x: number }\ntype N = number;\nlet p = 1;"),
        "\n\nlet p = 1;"
    );
}

#[test]
fn strips_as_and_non_null() {
    assert_eq!(
        ts("const n = (value as number) + 1;"),
        "const n = (value) + 1;"
    );
    assert_eq!(ts("let y = maybe!;"), "let y = maybe;");
}

#[test]
fn strips_optional_parameter_marker() {
    assert_eq!(
        ts("function f(a?: number) { return a; }"),
        "function f(a) { return a; }"
    );
}

#[test]
fn plain_expressions_pass_through() {
    assert_eq!(ts("1+1"), "1+1");
    assert_eq!(ts("return x+1"), "return x+1");
}

#[test]
fn javascript_is_emitted_verbatim() {
    let src = "let x = 1; // comment\n";
    assert_eq!(emit_javascript(LanguageId::JavaScript, src).unwrap(), src);
}

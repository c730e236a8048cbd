use super::*;
use crate::script::ErrorKind;
use serde_json::json;

#[test]
fn one_plus_one() {
    let callable = ExecutionBuilder::new()
        .build("1+1", Vec::new(), Vec::new())
        .unwrap();
    assert_eq!(callable.call().unwrap(), Value::Number(2.0));
}

#[test]
fn scope_names_become_parameters() {
    let (names, values) = Scope::new().with("x", 5).into_parts();
    let callable = ExecutionBuilder::new()
        .build("return x+1", names, values)
        .unwrap();
    assert_eq!(callable.params(), ["x".to_string()]);
    assert_eq!(callable.call().unwrap(), Value::Number(6.0));
}

#[test]
fn unlisted_identifier_fails() {
    let (names, values) = Scope::new().with("x", 5).into_parts();
    let callable = ExecutionBuilder::new()
        .build("return y+1", names, values)
        .unwrap();
    let err = callable.call().unwrap_err();
    assert_eq!(err.kind, ErrorKind::ReferenceError);
}

#[test]
fn each_call_starts_from_bound_values() {
    let (names, values) = Scope::new().with("n", 1).into_parts();
    let callable = ExecutionBuilder::new()
        .build("n += 1; n", names, values)
        .unwrap();
    assert_eq!(callable.call().unwrap(), Value::Number(2.0));
    assert_eq!(callable.call().unwrap(), Value::Number(2.0));
}

#[test]
fn scope_insert_replaces_in_place() {
    let mut scope = Scope::new().with("a", 1).with("b", 2);
    assert_eq!(scope.insert("a", 10), Some(Value::Number(1.0)));
    assert_eq!(scope.names().collect::<Vec<_>>(), ["a", "b"]);
    assert_eq!(scope.get("a"), Some(&Value::Number(10.0)));
    assert_eq!(scope.len(), 2);
}

#[test]
fn scope_from_json_keeps_order() {
    let scope = Scope::from_json(json!({ "z": 1, "a": "s" })).unwrap();
    assert_eq!(scope.names().collect::<Vec<_>>(), ["z", "a"]);
    assert!(Scope::from_json(json!([1])).is_err());
}

#[test]
fn invalid_parameter_names_are_rejected() {
    let builder = ExecutionBuilder::new();
    for bad in ["1x", "a-b", "", "class", "this"] {
        let err = builder
            .build("1", vec![bad.to_string()], vec![Value::Null])
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::SyntaxError, "{bad}");
    }

    let err = builder
        .build("1", vec!["a".into(), "a".into()], vec![Value::Null, Value::Null])
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::SyntaxError);

    let err = builder.build("1", vec!["a".into()], Vec::new()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeError);
}

#[test]
fn syntax_errors_surface_at_build_time() {
    let err = ExecutionBuilder::new()
        .build("let = ;", Vec::new(), Vec::new())
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::SyntaxError);
}

#[test]
fn lexical_declaration_cannot_shadow_a_parameter() {
    let err = ExecutionBuilder::new()
        .build("let x = 1; x", vec!["x".into()], vec![2.into()])
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::SyntaxError);
    assert_eq!(err.message, "Identifier 'x' has already been declared");

    let callable = ExecutionBuilder::new()
        .build("var x = x + 1; x", vec!["x".into()], vec![2.into()])
        .unwrap();
    assert_eq!(callable.call().unwrap(), Value::Number(3.0));
}

#[test]
fn reference_values_are_shared_with_the_caller() {
    let list = Value::array(vec![1.into()]);
    let callable = ExecutionBuilder::new()
        .build("items.push(2)", vec!["items".into()], vec![list.clone()])
        .unwrap();
    callable.call().unwrap();
    assert_eq!(list, Value::array(vec![1.into(), 2.into()]));
}

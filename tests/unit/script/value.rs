use super::*;
use serde_json::json;

#[test]
fn number_formatting_matches_js() {
    assert_eq!(number_to_string(2.0), "2");
    assert_eq!(number_to_string(-0.0), "0");
    assert_eq!(number_to_string(0.5), "0.5");
    assert_eq!(number_to_string(0.1 + 0.2), "0.30000000000000004");
    assert_eq!(number_to_string(f64::NAN), "NaN");
    assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
    assert_eq!(number_to_string(123.456), "123.456");
    assert_eq!(number_to_string(1e20), "100000000000000000000");
    assert_eq!(number_to_string(1e21), "1e+21");
    assert_eq!(number_to_string(1.5e300), "1.5e+300");
    assert_eq!(number_to_string(0.000001), "0.000001");
    assert_eq!(number_to_string(1e-7), "1e-7");
    assert_eq!(number_to_string(-1.5e-9), "-1.5e-9");
}

#[test]
fn string_to_number_coercions() {
    assert_eq!(string_to_number(" 12 "), 12.0);
    assert_eq!(string_to_number(""), 0.0);
    assert_eq!(string_to_number("0x1f"), 31.0);
    assert_eq!(string_to_number("1e3"), 1000.0);
    assert!(string_to_number("abc").is_nan());
    assert!(string_to_number("inf").is_nan());
}

#[test]
fn truthiness() {
    assert!(!Value::Undefined.truthy());
    assert!(!Value::Number(0.0).truthy());
    assert!(!Value::Number(f64::NAN).truthy());
    assert!(!Value::string("").truthy());
    assert!(Value::string("0").truthy());
    assert!(Value::array(Vec::new()).truthy());
}

#[test]
fn loose_and_strict_equality() {
    let one = Value::Number(1.0);
    assert!(one.loose_equals(&Value::string("1")));
    assert!(!one.strict_equals(&Value::string("1")));
    assert!(Value::Null.loose_equals(&Value::Undefined));
    assert!(!Value::Null.loose_equals(&Value::Number(0.0)));
    assert!(Value::Bool(true).loose_equals(&one));

    let list = Value::array(vec![1.into(), 2.into()]);
    assert!(list.loose_equals(&Value::string("1,2")));
    assert!(list.strict_equals(&list.clone()));
    assert!(!list.strict_equals(&Value::array(vec![1.into(), 2.into()])));
}

#[test]
fn display_of_containers() {
    let list = Value::array(vec![1.into(), Value::Null, "x".into()]);
    assert_eq!(list.to_display_string(), "1,,x");
    assert_eq!(Value::object(Vec::new()).to_display_string(), "[object Object]");
    assert_eq!(list.type_of(), "object");
}

#[test]
fn json_conversion_keeps_key_order_and_integers() {
    let source = json!({ "z": 1, "a": [1.5, "x", null, true] });
    let value = Value::from_json(source.clone());
    assert_eq!(value.to_json().unwrap(), Some(source));

    assert_eq!(Value::Number(f64::NAN).to_json().unwrap(), Some(serde_json::Value::Null));
    assert_eq!(Value::Undefined.to_json().unwrap(), None);
}

#[test]
fn cyclic_containers_terminate() {
    let object = Value::object(Vec::new());
    if let Value::Object(inner) = &object {
        inner.borrow_mut().set("me", object.clone());
    }
    let err = object.to_json().unwrap_err();
    assert_eq!(err.kind, crate::script::ErrorKind::TypeError);
    assert!(format!("{:?}", object).contains("[Circular]"));

    let list = Value::array(vec![1.into()]);
    if let Value::Array(items) = &list {
        items.borrow_mut().push(list.clone());
    }
    assert_eq!(list.to_display_string(), "1,");
    assert!(format!("{:?}", list).contains("[Circular]"));

    // Break the cycles so the test does not leak.
    if let Value::Object(inner) = &object {
        inner.borrow_mut().set("me", Value::Null);
    }
    if let Value::Array(items) = &list {
        items.borrow_mut().clear();
    }
}

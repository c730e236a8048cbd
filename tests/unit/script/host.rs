use super::*;
use crate::script::ExecutionBuilder;

fn eval(code: &str) -> Value {
    let builder = ExecutionBuilder::new();
    let callable = builder.build(code, Vec::new(), Vec::new()).unwrap();
    callable.call().unwrap()
}

#[test]
fn math_functions() {
    assert_eq!(eval("Math.max(1, 7, 3)"), Value::Number(7.0));
    assert_eq!(eval("Math.min()"), Value::Number(f64::INFINITY));
    assert_eq!(eval("Math.round(2.5) + Math.floor(-1.5)"), Value::Number(1.0));
    assert_eq!(eval("Math.pow(2, 10)"), Value::Number(1024.0));
    assert_eq!(eval("Math.abs(-3) + Math.sqrt(16)"), Value::Number(7.0));
    assert_eq!(eval("Math.PI > 3.14 && Math.E < 2.72"), Value::Bool(true));
    assert_eq!(eval("isNaN(Math.max(1, NaN))"), Value::Bool(true));
}

#[test]
fn conversions() {
    assert_eq!(eval("String(12) + Number('3')"), Value::string("123"));
    assert_eq!(eval("Boolean('') || Boolean(1)"), Value::Bool(true));
    assert_eq!(eval("parseInt('42px') + parseFloat('0.5em')"), Value::Number(42.5));
    assert_eq!(eval("isNaN('abc')"), Value::Bool(true));
}

#[test]
fn parse_int_radix_handling() {
    assert_eq!(parse_int("0x1A", None), 26.0);
    assert_eq!(parse_int("ff", Some(16.0)), 255.0);
    assert_eq!(parse_int("0x10", Some(10.0)), 0.0);
    assert_eq!(parse_int("  -17.9", None), -17.0);
    assert_eq!(parse_int("101", Some(2.0)), 5.0);
    assert!(parse_int("z", None).is_nan());
    assert!(parse_int("1", Some(37.0)).is_nan());
}

#[test]
fn parse_float_prefixes() {
    assert_eq!(parse_float("3.25abc"), 3.25);
    assert_eq!(parse_float("-.5"), -0.5);
    assert_eq!(parse_float("1e3x"), 1000.0);
    assert_eq!(parse_float("2e"), 2.0);
    assert_eq!(parse_float("-Infinity"), f64::NEG_INFINITY);
    assert!(parse_float(".").is_nan());
}

#[test]
fn json_stringify_and_parse() {
    assert_eq!(
        eval("JSON.stringify({ b: [1, 'x'], a: null, skip: undefined })"),
        Value::string(r#"{"b":[1,"x"],"a":null}"#)
    );
    assert_eq!(eval("JSON.stringify(undefined)"), Value::Undefined);
    assert_eq!(eval("JSON.parse('[1,2]').length"), Value::Number(2.0));
}

#[test]
fn console_output_is_captured() {
    let host = HostGlobals::new();
    let builder = ExecutionBuilder::with_host(host.clone());
    let callable = builder
        .build("console.log('a', 1, [2]); console.warn({ k: true });", Vec::new(), Vec::new())
        .unwrap();
    callable.call().unwrap();

    assert_eq!(host.output(), vec!["a 1 [2]", r#"{"k":true}"#]);
    assert_eq!(host.take_output().len(), 2);
    assert!(host.output().is_empty());
}

#[test]
fn globals_are_reachable_through_global_this() {
    assert_eq!(eval("globalThis.Math === Math"), Value::Bool(true));
    assert_eq!(eval("globalThis.answer = 42; answer"), Value::Number(42.0));
    assert_eq!(eval("typeof undefined + typeof NaN"), Value::string("undefinednumber"));
}

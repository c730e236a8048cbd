//! Global bindings visible to every script: `Math`, `console`, `JSON` and
//! the conversion functions.

use super::error::ScriptError;
use super::value::{Object, Value};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Clone)]
pub struct HostGlobals {
    global: Rc<RefCell<Object>>,
    output: Rc<RefCell<Vec<String>>>,
}

impl Default for HostGlobals {
    fn default() -> Self {
        Self::new()
    }
}

impl HostGlobals {
    pub fn new() -> Self {
        let host = Self {
            global: Rc::default(),
            output: Rc::default(),
        };
        host.install_standard();
        host
    }

    /// The object `this` and `globalThis` refer to at top level.
    pub fn global_object(&self) -> Value {
        Value::Object(Rc::clone(&self.global))
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.global.borrow().get(name).cloned()
    }

    pub fn has(&self, name: &str) -> bool {
        self.global.borrow().contains(name)
    }

    pub fn define(&self, name: &str, value: Value) {
        self.global.borrow_mut().set(name, value);
    }

    /// Lines written through `console` so far.
    pub fn output(&self) -> Vec<String> {
        self.output.borrow().clone()
    }

    pub fn take_output(&self) -> Vec<String> {
        std::mem::take(&mut *self.output.borrow_mut())
    }

    fn install_standard(&self) {
        self.define("undefined", Value::Undefined);
        self.define("NaN", Value::Number(f64::NAN));
        self.define("Infinity", Value::Number(f64::INFINITY));

        self.define("Math", math());
        self.define("JSON", json());
        self.define("console", self.console());

        self.define(
            "String",
            Value::native("String", |args| {
                Ok(Value::string(
                    args.first().map(Value::to_display_string).unwrap_or_default(),
                ))
            }),
        );
        self.define(
            "Number",
            Value::native("Number", |args| {
                Ok(Value::Number(args.first().map_or(0.0, Value::to_number)))
            }),
        );
        self.define(
            "Boolean",
            Value::native("Boolean", |args| {
                Ok(Value::Bool(args.first().is_some_and(Value::truthy)))
            }),
        );
        self.define(
            "parseInt",
            Value::native("parseInt", |args| {
                let text = args.first().map(Value::to_display_string).unwrap_or_default();
                let radix = args.get(1).map(Value::to_number);
                Ok(Value::Number(parse_int(&text, radix)))
            }),
        );
        self.define(
            "parseFloat",
            Value::native("parseFloat", |args| {
                let text = args.first().map(Value::to_display_string).unwrap_or_default();
                Ok(Value::Number(parse_float(&text)))
            }),
        );
        self.define(
            "isNaN",
            Value::native("isNaN", |args| {
                Ok(Value::Bool(arg_number(args, 0).is_nan()))
            }),
        );
        self.define(
            "Error",
            Value::native("Error", |args| {
                let message = match args.first() {
                    None | Some(Value::Undefined) => String::new(),
                    Some(v) => v.to_display_string(),
                };
                Ok(object(vec![
                    ("name", Value::string("Error")),
                    ("message", Value::string(message)),
                ]))
            }),
        );
    }

    fn console(&self) -> Value {
        let sink = |name: &'static str, output: Rc<RefCell<Vec<String>>>| {
            Value::native(name, move |args| {
                let line = args.iter().map(inspect).collect::<Vec<_>>().join(" ");
                match name {
                    "log" => tracing::info!(target: "livecode::script", "{}", line),
                    _ => tracing::warn!(target: "livecode::script", level = name, "{}", line),
                }
                output.borrow_mut().push(line);
                Ok(Value::Undefined)
            })
        };
        object(vec![
            ("log", sink("log", Rc::clone(&self.output))),
            ("warn", sink("warn", Rc::clone(&self.output))),
            ("error", sink("error", Rc::clone(&self.output))),
        ])
    }
}

fn object(entries: Vec<(&str, Value)>) -> Value {
    Value::object(
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
    )
}

fn arg_number(args: &[Value], i: usize) -> f64 {
    args.get(i).map_or(f64::NAN, Value::to_number)
}

/// Console rendering: strings bare, containers as JSON.
fn inspect(value: &Value) -> String {
    match value {
        Value::Array(_) | Value::Object(_) => value
            .to_json()
            .ok()
            .flatten()
            .and_then(|json| serde_json::to_string(&json).ok())
            .unwrap_or_else(|| value.to_display_string()),
        other => other.to_display_string(),
    }
}

fn math() -> Value {
    fn unary(name: &'static str, f: fn(f64) -> f64) -> (&'static str, Value) {
        (name, Value::native(name, move |args| Ok(Value::Number(f(arg_number(args, 0))))))
    }

    object(vec![
        ("PI", Value::Number(std::f64::consts::PI)),
        ("E", Value::Number(std::f64::consts::E)),
        unary("abs", f64::abs),
        unary("floor", f64::floor),
        unary("ceil", f64::ceil),
        unary("round", |x| (x + 0.5).floor()),
        unary("sqrt", f64::sqrt),
        unary("trunc", f64::trunc),
        unary("sin", f64::sin),
        unary("cos", f64::cos),
        (
            "pow",
            Value::native("pow", |args| {
                let (x, y) = (arg_number(args, 0), arg_number(args, 1));
                Ok(Value::Number(if y.is_nan() { f64::NAN } else { x.powf(y) }))
            }),
        ),
        (
            "min",
            Value::native("min", |args| {
                Ok(Value::Number(fold_numbers(args, f64::INFINITY, f64::min)))
            }),
        ),
        (
            "max",
            Value::native("max", |args| {
                Ok(Value::Number(fold_numbers(args, f64::NEG_INFINITY, f64::max)))
            }),
        ),
    ])
}

fn fold_numbers(args: &[Value], init: f64, pick: fn(f64, f64) -> f64) -> f64 {
    args.iter().map(Value::to_number).fold(init, |acc, n| {
        if acc.is_nan() || n.is_nan() {
            f64::NAN
        } else {
            pick(acc, n)
        }
    })
}

fn json() -> Value {
    object(vec![
        (
            "stringify",
            Value::native("stringify", |args| {
                let json = match args.first() {
                    Some(value) => value.to_json()?,
                    None => None,
                };
                let Some(json) = json else {
                    return Ok(Value::Undefined);
                };
                let pretty = args.get(2).is_some_and(|indent| indent.to_number() > 0.0);
                let text = if pretty {
                    serde_json::to_string_pretty(&json)
                } else {
                    serde_json::to_string(&json)
                };
                text.map(Value::string)
                    .map_err(|e| ScriptError::type_error(e.to_string()))
            }),
        ),
        (
            "parse",
            Value::native("parse", |args| {
                let text = args.first().map(Value::to_display_string).unwrap_or_default();
                serde_json::from_str(&text)
                    .map(Value::from_json)
                    .map_err(|e| ScriptError::syntax(format!("JSON.parse: {}", e)))
            }),
        ),
    ])
}

/// `parseInt`: longest valid digit prefix in `radix` (default 10, or 16
/// for a `0x` prefix).
pub(crate) fn parse_int(text: &str, radix: Option<f64>) -> f64 {
    let trimmed = text.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let explicit = match radix {
        Some(r) if r.is_finite() && r.trunc() != 0.0 => Some(r.trunc() as i64),
        _ => None,
    };
    let hex_prefix = rest.starts_with("0x") || rest.starts_with("0X");
    let (radix, digits) = match explicit {
        None if hex_prefix => (16, &rest[2..]),
        None => (10, rest),
        Some(16) if hex_prefix => (16, &rest[2..]),
        Some(r) => (r, rest),
    };
    if !(2..=36).contains(&radix) {
        return f64::NAN;
    }

    let mut value = 0.0_f64;
    let mut seen = false;
    for c in digits.chars() {
        let Some(d) = c.to_digit(radix as u32) else {
            break;
        };
        value = value * radix as f64 + d as f64;
        seen = true;
    }
    if !seen {
        return f64::NAN;
    }
    if negative {
        -value
    } else {
        value
    }
}

/// `parseFloat`: longest decimal literal prefix.
pub(crate) fn parse_float(text: &str) -> f64 {
    let t = text.trim_start();
    let bytes = t.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    if t[end..].starts_with("Infinity") {
        return if t.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    if end == digits_start || &t[digits_start..end] == "." {
        return f64::NAN;
    }
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp = end + 1;
        if exp < bytes.len() && matches!(bytes[exp], b'+' | b'-') {
            exp += 1;
        }
        let exp_digits = exp;
        while exp < bytes.len() && bytes[exp].is_ascii_digit() {
            exp += 1;
        }
        if exp > exp_digits {
            end = exp;
        }
    }
    t[..end].parse().unwrap_or(f64::NAN)
}

#[cfg(test)]
#[path = "../../tests/unit/script/host.rs"]
mod tests;

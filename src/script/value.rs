//! Runtime values of the script host.

use super::ast::FunctionDef;
use super::error::ScriptError;
use super::interp::Env;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde_json::Value as JsonValue;

pub type NativeFn = dyn Fn(&[Value]) -> Result<Value, ScriptError>;

pub struct NativeFunction {
    pub name: &'static str,
    call: Rc<NativeFn>,
}

impl NativeFunction {
    pub fn call(&self, args: &[Value]) -> Result<Value, ScriptError> {
        (self.call)(args)
    }
}

pub struct Closure {
    pub def: Rc<FunctionDef>,
    pub env: Rc<Env>,
}

pub enum Function {
    Native(NativeFunction),
    Closure(Closure),
}

impl Function {
    pub fn name(&self) -> &str {
        match self {
            Function::Native(native) => native.name,
            Function::Closure(closure) => closure.def.name.as_deref().unwrap_or(""),
        }
    }
}

/// Plain object. Keys keep insertion order, like JS property enumeration.
#[derive(Default)]
pub struct Object {
    props: Vec<(String, Value)>,
}

impl Object {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.props.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn set(&mut self, key: &str, value: Value) {
        match self.props.iter_mut().find(|(k, _)| k == key) {
            Some((_, slot)) => *slot = value,
            None => self.props.push((key.to_string(), value)),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.props.iter().any(|(k, _)| k == key)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.props.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Array(Rc<RefCell<Vec<Value>>>),
    Object(Rc<RefCell<Object>>),
    Function(Rc<Function>),
}

impl Value {
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::String(Rc::from(s.as_ref()))
    }

    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn object(entries: Vec<(String, Value)>) -> Self {
        let mut object = Object::default();
        for (k, v) in entries {
            object.set(&k, v);
        }
        Value::Object(Rc::new(RefCell::new(object)))
    }

    pub fn native(
        name: &'static str,
        call: impl Fn(&[Value]) -> Result<Value, ScriptError> + 'static,
    ) -> Self {
        Value::Function(Rc::new(Function::Native(NativeFunction {
            name,
            call: Rc::new(call),
        })))
    }

    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null | Value::Array(_) | Value::Object(_) => "object",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Function(_) => "function",
        }
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) | Value::Function(_) => true,
        }
    }

    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => *n,
            Value::String(s) => string_to_number(s),
            Value::Array(_) => string_to_number(&self.to_display_string()),
            Value::Object(_) | Value::Function(_) => f64::NAN,
        }
    }

    /// JS `ToString`.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => number_to_string(*n),
            Value::String(s) => s.to_string(),
            Value::Array(items) => join_array(items, ","),
            Value::Object(_) => "[object Object]".to_string(),
            Value::Function(f) => format!("function {}() {{ [code] }}", f.name()),
        }
    }

    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// `==` with the usual primitive coercions.
    pub fn loose_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (a, b) if a.is_nullish() && b.is_nullish() => true,
            (a, b) if a.is_nullish() || b.is_nullish() => false,
            (Value::Number(_), Value::String(_))
            | (Value::String(_), Value::Number(_))
            | (Value::Bool(_), _)
            | (_, Value::Bool(_)) => self.to_number() == other.to_number(),
            (Value::Array(_) | Value::Object(_), Value::String(_) | Value::Number(_))
            | (Value::String(_) | Value::Number(_), Value::Array(_) | Value::Object(_)) => {
                let (obj, prim) = if matches!(self, Value::Array(_) | Value::Object(_)) {
                    (self, other)
                } else {
                    (other, self)
                };
                Value::string(obj.to_display_string()).loose_equals(prim)
            }
            _ => self.strict_equals(other),
        }
    }

    /// `SameValueZero`, used by `includes`.
    pub fn same_value_zero(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) if a.is_nan() && b.is_nan() => true,
            _ => self.strict_equals(other),
        }
    }

    pub fn from_json(json: JsonValue) -> Value {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            JsonValue::String(s) => Value::string(s),
            JsonValue::Array(items) => Value::array(items.into_iter().map(Value::from_json).collect()),
            JsonValue::Object(map) => Value::object(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// `None` for values JSON cannot represent (undefined, functions).
    /// A container that contains itself is a `TypeError`.
    pub fn to_json(&self) -> Result<Option<JsonValue>, ScriptError> {
        self.json_with(&mut Vec::new())
    }

    fn json_with(&self, seen: &mut Vec<*const ()>) -> Result<Option<JsonValue>, ScriptError> {
        let id = container_id(self);
        if let Some(id) = id {
            if seen.contains(&id) {
                return Err(ScriptError::type_error(
                    "Converting circular structure to JSON",
                ));
            }
            seen.push(id);
        }

        let json = match self {
            Value::Undefined | Value::Function(_) => None,
            Value::Null => Some(JsonValue::Null),
            Value::Bool(b) => Some(JsonValue::Bool(*b)),
            Value::Number(n) => Some(if n.fract() == 0.0 && n.abs() < 1e15 {
                JsonValue::Number((*n as i64).into())
            } else {
                serde_json::Number::from_f64(*n).map_or(JsonValue::Null, JsonValue::Number)
            }),
            Value::String(s) => Some(JsonValue::String(s.to_string())),
            Value::Array(items) => {
                let mut out = Vec::new();
                for v in items.borrow().iter() {
                    out.push(v.json_with(seen)?.unwrap_or(JsonValue::Null));
                }
                Some(JsonValue::Array(out))
            }
            Value::Object(object) => {
                let mut map = serde_json::Map::new();
                for (k, v) in object.borrow().entries() {
                    if let Some(json) = v.json_with(seen)? {
                        map.insert(k.to_string(), json);
                    }
                }
                Some(JsonValue::Object(map))
            }
        };

        if id.is_some() {
            seen.pop();
        }
        Ok(json)
    }
}

fn container_id(value: &Value) -> Option<*const ()> {
    match value {
        Value::Array(items) => Some(Rc::as_ptr(items) as *const ()),
        Value::Object(object) => Some(Rc::as_ptr(object) as *const ()),
        _ => None,
    }
}

/// `Array.prototype.join`. Nullish elements and arrays already being
/// joined further up render as empty strings.
pub fn join_array(items: &Rc<RefCell<Vec<Value>>>, separator: &str) -> String {
    let mut seen = vec![Rc::as_ptr(items) as *const ()];
    join_items(&items.borrow(), separator, &mut seen)
}

fn join_items(items: &[Value], separator: &str, seen: &mut Vec<*const ()>) -> String {
    items
        .iter()
        .map(|v| match v {
            Value::Undefined | Value::Null => String::new(),
            Value::Array(inner) => {
                let id = Rc::as_ptr(inner) as *const ();
                if seen.contains(&id) {
                    return String::new();
                }
                seen.push(id);
                let text = join_items(&inner.borrow(), ",", seen);
                seen.pop();
                text
            }
            other => other.to_display_string(),
        })
        .collect::<Vec<_>>()
        .join(separator)
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) if a.is_nan() && b.is_nan() => true,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            _ => self.strict_equals(other),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let seen = RefCell::new(Vec::new());
        fmt::Debug::fmt(&Traced { value: self, seen: &seen }, f)
    }
}

/// Debug view that prints `[Circular]` instead of re-entering a container.
struct Traced<'a> {
    value: &'a Value,
    seen: &'a RefCell<Vec<*const ()>>,
}

impl Traced<'_> {
    fn child<'b>(&'b self, value: &'b Value) -> Traced<'b> {
        Traced {
            value,
            seen: self.seen,
        }
    }
}

impl fmt::Debug for Traced<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = container_id(self.value);
        if let Some(id) = id {
            if self.seen.borrow().contains(&id) {
                return f.write_str("[Circular]");
            }
            self.seen.borrow_mut().push(id);
        }

        let result = match self.value {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", number_to_string(*n)),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Array(items) => f
                .debug_list()
                .entries(items.borrow().iter().map(|v| self.child(v)))
                .finish(),
            Value::Object(object) => f
                .debug_map()
                .entries(object.borrow().entries().map(|(k, v)| (k, self.child(v))))
                .finish(),
            Value::Function(func) => write!(f, "[Function: {}]", func.name()),
        };

        if id.is_some() {
            self.seen.borrow_mut().pop();
        }
        result
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::string(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::array(items)
    }
}

/// JS `Number::toString` for radix 10: shortest round-trip digits, with
/// exponent notation outside `1e-7 < |n| < 1e21`.
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n < 0.0 {
        return format!("-{}", number_to_string(-n));
    }

    let sci = format!("{:e}", n);
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let k = digits.len() as i32;
    // Position of the decimal point relative to the first digit.
    let point = exponent + 1;

    if k <= point && point <= 21 {
        format!("{}{}", digits, "0".repeat((point - k) as usize))
    } else if 0 < point && point <= 21 {
        let (int, frac) = digits.split_at(point as usize);
        format!("{}.{}", int, frac)
    } else if -6 < point && point <= 0 {
        format!("0.{}{}", "0".repeat(-point as usize), digits)
    } else {
        let e = point - 1;
        let sign = if e >= 0 { '+' } else { '-' };
        let (first, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{}e{}{}", first, sign, e.abs())
        } else {
            format!("{}.{}e{}{}", first, rest, sign, e.abs())
        }
    }
}

pub fn string_to_number(s: &str) -> f64 {
    let t = s.trim();
    if t.is_empty() {
        return 0.0;
    }
    let parse_radix = |digits: &str, radix: u32| {
        i64::from_str_radix(digits, radix)
            .map(|v| v as f64)
            .unwrap_or(f64::NAN)
    };
    if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        return parse_radix(hex, 16);
    }
    if let Some(oct) = t.strip_prefix("0o").or_else(|| t.strip_prefix("0O")) {
        return parse_radix(oct, 8);
    }
    if let Some(bin) = t.strip_prefix("0b").or_else(|| t.strip_prefix("0B")) {
        return parse_radix(bin, 2);
    }
    match t {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ if t.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') => f64::NAN,
        _ => t.parse::<f64>().unwrap_or(f64::NAN),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/script/value.rs"]
mod tests;

// used for the dynamic values flowing between callers and storage
use serde_json::{Map, Value};

// used to check whether a string holds a number
use lazy_static::lazy_static;
use regex::Regex;

// used to print out readable forms of a cast kind
use std::fmt;

pub type Parameters = Map<String, Value>;

lazy_static! {
    static ref NUMERIC: Regex =
        Regex::new(r"^\s*[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?\s*$").unwrap();
    static ref LEADING_NUMERIC: Regex =
        Regex::new(r"^\s*([+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?)").unwrap();
    static ref INTEGRAL: Regex = Regex::new(r"^[+-]?\d+$").unwrap();
}

// ------------- Cast kinds --------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastKind {
    Int,
    Float,
    String,
    Bool,
    Array,
    Datetime,
    Date,
    Time,
    Timestamp,
}

impl CastKind {
    /// Returns the cast kind behind a declared type name, or `None` for
    /// type names the dispatcher does not know about.
    pub fn for_type(type_name: &str) -> Option<CastKind> {
        let kind = match type_name {
            "primary" | "bigPrimary" | "int" | "tinyInt" | "bigInt" => CastKind::Int,
            "bool" => CastKind::Bool,
            "char" | "string" | "text" => CastKind::String,
            "double" | "float" | "decimal" => CastKind::Float,
            "datetime" => CastKind::Datetime,
            "date" => CastKind::Date,
            "time" => CastKind::Time,
            "timestamp" => CastKind::Timestamp,
            "json" | "array" => CastKind::Array,
            _ => return None,
        };
        Some(kind)
    }
    pub fn as_str(&self) -> &'static str {
        match self {
            CastKind::Int => "int",
            CastKind::Float => "float",
            CastKind::String => "string",
            CastKind::Bool => "bool",
            CastKind::Array => "array",
            CastKind::Datetime => "datetime",
            CastKind::Date => "date",
            CastKind::Time => "time",
            CastKind::Timestamp => "timestamp",
        }
    }
}
impl fmt::Display for CastKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ------------- Type --------------
/// An immutable bag of named parameters describing a column type.
///
/// Besides `type` and `default` a type may carry any schema hint
/// (`length`, `nullable`, `unsigned`, `index`, ...). Those hints are never
/// interpreted here, they are only handed on to schema generation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Type {
    parameters: Parameters,
}

impl Type {
    pub fn new() -> Self {
        Self {
            parameters: Parameters::new(),
        }
    }
    pub fn named(type_name: &str) -> Self {
        Self::new().with("type", type_name)
    }
    pub fn from_parameters(parameters: Parameters) -> Self {
        Self { parameters }
    }
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.to_owned(), value.into());
        self
    }
    /// Merges parameters into the type. Once a type name is set it stays,
    /// any `type` entry among the new parameters is ignored.
    pub fn extend<K, I>(&mut self, parameters: I)
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let locked = self.parameters.contains_key("type");
        for (name, value) in parameters {
            let name = name.into();
            if locked && name == "type" {
                continue;
            }
            self.parameters.insert(name, value);
        }
    }
    pub fn type_name(&self) -> &str {
        match self.parameters.get("type") {
            Some(Value::String(type_name)) => type_name,
            _ => "string",
        }
    }
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }
    pub fn has(&self, name: &str) -> bool {
        self.parameters.contains_key(name)
    }
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name).filter(|value| !value.is_null())
    }
    pub fn get_or<'a>(&'a self, name: &str, default: &'a Value) -> &'a Value {
        self.get(name).unwrap_or(default)
    }
    pub fn is_primary(&self) -> bool {
        matches!(self.type_name(), "primary" | "bigPrimary")
    }
    pub fn cast_kind(&self) -> Option<CastKind> {
        CastKind::for_type(self.type_name())
    }
    /// Casts the value using the declared type and the `default` parameter.
    pub fn cast(&self, value: &Value) -> Value {
        self.cast_as(value, None, None)
    }
    /// Casts the value to the given type name, falling back to `default`.
    ///
    /// A missing (or falsy) default falls back to the `default` parameter of
    /// this type. Unknown type names return the value untouched. Casting
    /// never fails, non-conforming input degrades to the default.
    pub fn cast_as(&self, value: &Value, type_name: Option<&str>, default: Option<&Value>) -> Value {
        let type_name = type_name
            .filter(|type_name| !type_name.is_empty())
            .unwrap_or_else(|| self.type_name());
        let default = match default {
            Some(default) if to_bool(default) => default.clone(),
            _ => self.get("default").cloned().unwrap_or(Value::Null),
        };
        let kind = match CastKind::for_type(type_name) {
            Some(kind) => kind,
            None => return value.clone(),
        };
        match kind {
            CastKind::Int => {
                let source = if is_numeric(value) { value } else { &default };
                Value::from(to_int(source))
            }
            CastKind::Float => {
                let source = if is_numeric(value) { value } else { &default };
                Value::from(to_float(source))
            }
            CastKind::Bool => {
                let source = if is_scalar(value) { value } else { &default };
                Value::Bool(to_bool(source))
            }
            CastKind::Array => to_array(value, &default),
            // the temporal kinds only ensure a string, no reformatting
            CastKind::String
            | CastKind::Datetime
            | CastKind::Date
            | CastKind::Time
            | CastKind::Timestamp => {
                let source = if is_scalar(value) { value } else { &default };
                Value::String(to_string(source))
            }
        }
    }
}

// ------------- Loose scalar semantics --------------
pub fn empty_array() -> Value {
    Value::Array(Vec::new())
}

pub fn is_array(value: &Value) -> bool {
    matches!(value, Value::Array(_) | Value::Object(_))
}

pub fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::Bool(_) | Value::Number(_) | Value::String(_))
}

pub fn is_numeric(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(s) => NUMERIC.is_match(s),
        _ => false,
    }
}

fn leading_number(s: &str) -> Option<&str> {
    LEADING_NUMERIC
        .captures(s)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

pub fn to_int(value: &Value) -> i64 {
    match value {
        Value::Null => 0,
        Value::Bool(b) => *b as i64,
        Value::Number(n) => match n.as_i64() {
            Some(i) => i,
            None => n.as_f64().map(float_to_int).unwrap_or(0),
        },
        Value::String(s) => match leading_number(s) {
            Some(number) if INTEGRAL.is_match(number) => number
                .parse::<i64>()
                .unwrap_or_else(|_| float_to_int(number.parse::<f64>().unwrap_or(0.))),
            Some(number) => float_to_int(number.parse::<f64>().unwrap_or(0.)),
            None => 0,
        },
        Value::Array(a) => !a.is_empty() as i64,
        Value::Object(o) => !o.is_empty() as i64,
    }
}

fn float_to_int(f: f64) -> i64 {
    if f.is_finite() { f.trunc() as i64 } else { 0 }
}

pub fn to_float(value: &Value) -> f64 {
    match value {
        Value::Null => 0.,
        Value::Bool(b) => *b as i64 as f64,
        Value::Number(n) => n.as_f64().unwrap_or(0.),
        Value::String(s) => leading_number(s)
            .and_then(|number| number.parse::<f64>().ok())
            .unwrap_or(0.),
        Value::Array(a) => !a.is_empty() as i64 as f64,
        Value::Object(o) => !o.is_empty() as i64 as f64,
    }
}

pub fn to_bool(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.).unwrap_or(false),
        Value::String(s) => !(s.is_empty() || s == "0"),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

pub fn to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => String::from("1"),
        Value::Bool(false) => String::new(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => format_float(f),
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        // containers have no scalar form, their JSON text is the closest thing
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

fn format_float(f: f64) -> String {
    if f.fract() == 0. && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        format!("{}", f)
    }
}

/// Returns containers as they are, decodes JSON text holding a container
/// and otherwise retries once with the default.
pub fn to_array(value: &Value, default: &Value) -> Value {
    match value {
        Value::Array(_) | Value::Object(_) => value.clone(),
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(decoded) if is_array(&decoded) => decoded,
            _ => to_array(default, &empty_array()),
        },
        _ => to_array(default, &empty_array()),
    }
}

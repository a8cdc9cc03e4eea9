//! Dynamic values stored in a reactive model.
//!
//! A [`Value`] is what a model property holds. Primitive values compare by
//! value, while objects and arrays compare by identity: two handles to the
//! same reactive object are equal, two structurally identical objects are
//! not. This is the equality that decides whether a write notifies and
//! whether a [`Watcher`](crate::Watcher) fires.

use std::fmt;
use std::sync::Arc;

use crate::reactive::ReactiveObject;

/// A model value.
#[derive(Clone, Default)]
pub enum Value {
    /// The value of a property that was never set.
    #[default]
    Undefined,
    /// An explicit null.
    Null,
    /// A boolean.
    Bool(bool),
    /// A number. All numbers are `f64`.
    Number(f64),
    /// A string.
    String(String),
    /// An ordered list. Elements are not tracked individually.
    Array(Arc<[Value]>),
    /// A nested reactive object.
    Object(ReactiveObject),
}

impl Value {
    /// Whether this is [`Value::Undefined`].
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Borrow the inner reactive object, if this is one.
    pub fn as_object(&self) -> Option<&ReactiveObject> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Borrow the inner string, if this is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the inner number, if this is one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the inner boolean, if this is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Render the value the way it appears in text content or an input's
    /// value field. `Undefined` renders as an empty string.
    pub fn render(&self) -> String {
        match self {
            Self::Undefined => String::new(),
            Self::Null => "null".to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => format_number(*n),
            Self::String(s) => s.clone(),
            Self::Array(_) | Self::Object(_) => self.to_plain().to_string(),
        }
    }

    /// Take a plain, untracked snapshot of the value.
    ///
    /// `Undefined` becomes `null` since JSON has no undefined.
    pub fn to_plain(&self) -> serde_json::Value {
        match self {
            Self::Undefined | Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Number(n) => number_to_plain(*n),
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_plain).collect())
            }
            Self::Object(obj) => obj.to_plain(),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let sign = if n > 0.0 { "" } else { "-" };
        format!("{sign}Infinity")
    } else if n == 0.0 {
        // -0 renders as 0
        "0".to_string()
    } else if (1e-6..1e21).contains(&n.abs()) {
        n.to_string()
    } else {
        // Exponent form, with an explicit sign on positive exponents.
        let exp = format!("{n:e}");
        match exp.split_once('e') {
            Some((mantissa, power)) if !power.starts_with('-') => {
                format!("{mantissa}e+{power}")
            }
            _ => exp,
        }
    }
}

fn number_to_plain(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            // f64 equality: NaN is never equal to itself
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => Arc::ptr_eq(a, b),
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => write!(f, "Undefined"),
            Self::Null => write!(f, "Null"),
            Self::Bool(b) => write!(f, "Bool({b})"),
            Self::Number(n) => write!(f, "Number({n})"),
            Self::String(s) => write!(f, "String({s:?})"),
            Self::Array(items) => f.debug_list().entries(items.iter()).finish(),
            Self::Object(obj) => fmt::Debug::fmt(obj, f),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<ReactiveObject> for Value {
    fn from(obj: ReactiveObject) -> Self {
        Self::Object(obj)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Undefined, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    /// Convert plain data, making every nested object reactive.
    fn from(plain: serde_json::Value) -> Self {
        Self::from(&plain)
    }
}

impl From<&serde_json::Value> for Value {
    fn from(plain: &serde_json::Value) -> Self {
        match plain {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Self::String(s.clone()),
            serde_json::Value::Array(items) => {
                Self::Array(items.iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Self::Object(ReactiveObject::from_map(map)),
        }
    }
}

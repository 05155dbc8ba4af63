//! Runtime values.
//!
//! Collections and object instances are reference counted so that one
//! instance can appear in several places of a value graph and keep its
//! identity. Object instances may form cycles.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::object::ObjectValue;
use crate::semver::SemVer;
use crate::types::Type;
use crate::Guard;

#[derive(Clone)]
pub enum Value {
    /// The "no value" sentinel.
    Undef,
    /// The `default` literal.
    Default,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Array(Arc<Vec<Value>>),
    Hash(Arc<IndexMap<String, Value>>),
    SemVer(SemVer),
    Type(Type),
    Object(Arc<ObjectValue>),
    /// Placeholder for an object that is still being built. Only exists
    /// transiently while a value graph with back-references is assembled.
    Pending(usize),
}

impl Value {
    pub fn string(s: impl Into<String>) -> Value {
        Value::String(s.into())
    }

    pub fn array(elements: Vec<Value>) -> Value {
        Value::Array(Arc::new(elements))
    }

    pub fn hash(entries: IndexMap<String, Value>) -> Value {
        Value::Hash(Arc::new(entries))
    }

    pub fn object(instance: ObjectValue) -> Value {
        Value::Object(Arc::new(instance))
    }

    /// Address-based identity of shared values. Scalars have none.
    pub fn identity(&self) -> Option<usize> {
        match self {
            Value::Array(a) => Some(Arc::as_ptr(a) as usize),
            Value::Hash(h) => Some(Arc::as_ptr(h) as usize),
            Value::Object(o) => Some(Arc::as_ptr(o) as usize),
            Value::Type(t) => Some(t.identity()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_type(&self) -> Option<&Type> {
        match self {
            Value::Type(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Arc<ObjectValue>> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn is_undef(&self) -> bool {
        matches!(self, Value::Undef)
    }

    /// Whether a [`Value::Pending`] placeholder occurs in this value,
    /// looking through arrays and hashes but not into objects.
    pub fn contains_pending(&self) -> bool {
        match self {
            Value::Pending(_) => true,
            Value::Array(a) => a.iter().any(Value::contains_pending),
            Value::Hash(h) => h.values().any(Value::contains_pending),
            _ => false,
        }
    }

    /// The most specific type of this value.
    pub fn ptype(&self) -> Type {
        match self {
            Value::Undef => Type::undef(),
            Value::Default => Type::default_type(),
            Value::Boolean(_) => Type::boolean(),
            Value::Integer(i) => Type::integer_range(*i, *i),
            Value::Float(f) => Type::float_range(*f, *f),
            Value::String(s) => Type::constant_string(s.clone()),
            Value::Array(a) if a.is_empty() => Type::array_sized(Type::any(), 0, 0),
            Value::Array(a) => Type::tuple_of(a.iter().map(Value::ptype).collect()),
            Value::Hash(h) if h.is_empty() => Type::hash_sized(Type::any(), Type::any(), 0, 0),
            Value::Hash(h) => Type::struct_of(h.iter().map(|(k, v)| (k.clone(), v.ptype()))),
            Value::SemVer(_) => Type::semver(),
            Value::Type(t) => Type::type_of(t.clone()),
            Value::Object(o) => o.object_type().clone(),
            Value::Pending(_) => Type::any(),
        }
    }

    /// Structural equality. Object graphs are compared with `guard` so that
    /// cycles terminate.
    pub fn equals(&self, other: &Value, guard: &mut Guard) -> bool {
        match (self, other) {
            (Value::Undef, Value::Undef) | (Value::Default, Value::Default) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::SemVer(a), Value::SemVer(b)) => a == b,
            (Value::Type(a), Value::Type(b)) => a.equals(b, guard),
            (Value::Pending(a), Value::Pending(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => {
                Arc::ptr_eq(a, b)
                    || (a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.equals(y, guard)))
            }
            (Value::Hash(a), Value::Hash(b)) => {
                Arc::ptr_eq(a, b)
                    || (a.len() == b.len()
                        && a.iter().all(|(k, v)| match b.get(k) {
                            Some(w) => v.equals(w, guard),
                            None => false,
                        }))
            }
            (Value::Object(a), Value::Object(b)) => {
                if Arc::ptr_eq(a, b) {
                    return true;
                }
                let (ia, ib) = (Arc::as_ptr(a) as usize, Arc::as_ptr(b) as usize);
                guard.with(ia, ib, true, |g| {
                    if !a.object_type().equals(b.object_type(), g) {
                        return false;
                    }
                    let (va, vb) = (a.values(), b.values());
                    va.len() == vb.len() && va.iter().zip(vb.iter()).all(|(x, y)| x.equals(y, g))
                })
            }
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        self.equals(other, &mut Guard::new())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<SemVer> for Value {
    fn from(v: SemVer) -> Self {
        Value::SemVer(v)
    }
}

impl From<Type> for Value {
    fn from(t: Type) -> Self {
        Value::Type(t)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::array(v)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(h: IndexMap<String, Value>) -> Self {
        Value::hash(h)
    }
}

/// Convert plain JSON data. `null` becomes undef; integers that do not fit
/// an `i64` become floats.
impl From<&serde_json::Value> for Value {
    fn from(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Undef,
            serde_json::Value::Bool(b) => Value::Boolean(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(a) => Value::array(a.iter().map(Value::from).collect()),
            serde_json::Value::Object(m) => {
                Value::hash(m.iter().map(|(k, v)| (k.clone(), Value::from(v))).collect())
            }
        }
    }
}

/// Write `s` single-quoted, escaping backslashes and quotes.
pub(crate) fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("'")?;
    for c in s.chars() {
        match c {
            '\'' => f.write_str("\\'")?,
            '\\' => f.write_str("\\\\")?,
            c => write!(f, "{}", c)?,
        }
    }
    f.write_str("'")
}

fn write_value(f: &mut fmt::Formatter<'_>, v: &Value, open: &mut HashSet<usize>) -> fmt::Result {
    match v {
        Value::Undef => f.write_str("undef"),
        Value::Default => f.write_str("default"),
        Value::Boolean(b) => write!(f, "{}", b),
        Value::Integer(i) => write!(f, "{}", i),
        Value::Float(x) => write!(f, "{:?}", x),
        Value::String(s) => write_quoted(f, s),
        Value::SemVer(v) => {
            f.write_str("SemVer(")?;
            write_quoted(f, &v.to_string())?;
            f.write_str(")")
        }
        Value::Type(t) => write!(f, "{}", t),
        Value::Pending(n) => write!(f, "pending({})", n),
        Value::Array(a) => {
            f.write_str("[")?;
            for (i, e) in a.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_value(f, e, open)?;
            }
            f.write_str("]")
        }
        Value::Hash(h) => {
            f.write_str("{")?;
            for (i, (k, e)) in h.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_quoted(f, k)?;
                f.write_str(" => ")?;
                write_value(f, e, open)?;
            }
            f.write_str("}")
        }
        Value::Object(o) => {
            let id = Arc::as_ptr(o) as usize;
            write!(f, "{}(", o.object_type().name())?;
            if !open.insert(id) {
                return f.write_str("..)");
            }
            for (i, (k, e)) in o.init_hash().iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_quoted(f, k)?;
                f.write_str(" => ")?;
                write_value(f, e, open)?;
            }
            open.remove(&id);
            f.write_str(")")
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_value(f, self, &mut HashSet::new())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_value(f, self, &mut HashSet::new())
    }
}

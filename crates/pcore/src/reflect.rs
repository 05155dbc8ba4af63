//! Bridge between native Rust structs and object values.
//!
//! A struct opts in by implementing [`Reflected`]: serde does the field
//! walking, the trait supplies the object type name and the pcore type of
//! each field.
//!
//! ```rust
//! use pcore::reflect::{wrap, unwrap, FieldTag, Reflected};
//! use pcore::Loader;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Port {
//!     number: i64,
//!     protocol: Option<String>,
//! }
//!
//! impl Reflected for Port {
//!     const TYPE_NAME: &'static str = "Net::Port";
//!     fn field_tags() -> Vec<FieldTag> {
//!         vec![
//!             FieldTag::new("number", "Integer[0, 65535]"),
//!             FieldTag::new("protocol", "Optional[Enum[tcp, udp]]"),
//!         ]
//!     }
//! }
//!
//! let loader = Loader::new();
//! loader.register_reflected::<Port>().unwrap();
//! let port = Port { number: 22, protocol: Some("tcp".into()) };
//! let value = wrap(&*loader, &port).unwrap();
//! assert_eq!(value.to_string(), "Net::Port('number' => 22, 'protocol' => 'tcp')");
//! assert_eq!(unwrap::<Port>(&value).unwrap(), port);
//! ```

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{PcoreError, Result};
use crate::loader::{Loader, TypeResolver};
use crate::object::{Attribute, ObjectType, ObjectValue};
use crate::semver::SemVer;
use crate::types::{Type, TypeKind};
use crate::value::Value;

/// The declared pcore type of one native field.
#[derive(Debug, Clone)]
pub struct FieldTag {
    pub name: &'static str,
    pub type_expr: &'static str,
}

impl FieldTag {
    pub fn new(name: &'static str, type_expr: &'static str) -> Self {
        FieldTag { name, type_expr }
    }
}

pub trait Reflected: Serialize + DeserializeOwned {
    /// Qualified name of the object type.
    const TYPE_NAME: &'static str;

    /// Fields in declaration order.
    fn field_tags() -> Vec<FieldTag>;
}

impl Loader {
    /// Derive the object type of `T` and register it.
    pub fn register_reflected<T: Reflected>(&self) -> Result<Type> {
        let mut attributes = Vec::new();
        for tag in T::field_tags() {
            let ty = self.parse_type(tag.type_expr)?;
            attributes.push(Attribute::new(tag.name, ty));
        }
        let ty = Type::new(TypeKind::Object(ObjectType::new(
            T::TYPE_NAME,
            None,
            attributes,
        )));
        self.add_type(ty.clone())?;
        Ok(ty)
    }
}

/// Wrap a native value as an instance of its registered object type.
pub fn wrap<T: Reflected>(resolver: &dyn TypeResolver, native: &T) -> Result<Value> {
    let ty = resolver.resolve(T::TYPE_NAME)?;
    let json = serde_json::to_value(native).map_err(|e| PcoreError::Reflection {
        type_name: T::TYPE_NAME.to_string(),
        detail: e.to_string(),
    })?;
    convert(&json, &ty)
}

/// Read a native value back out of an object value.
pub fn unwrap<T: Reflected>(value: &Value) -> Result<T> {
    let json = to_json(value)?;
    serde_json::from_value(json).map_err(|e| PcoreError::Reflection {
        type_name: T::TYPE_NAME.to_string(),
        detail: e.to_string(),
    })
}

/// Convert JSON data to a value of `ty`, creating object instances where
/// the type calls for them.
pub fn convert(json: &serde_json::Value, ty: &Type) -> Result<Value> {
    let t = ty.deref();
    let value = match (t.kind(), json) {
        (TypeKind::Object(o), serde_json::Value::Object(fields)) => {
            let attributes = o.all_attributes();
            let mut args = IndexMap::with_capacity(fields.len());
            for (name, field) in fields {
                let value = match attributes.iter().find(|a| a.name == *name) {
                    Some(a) => convert(field, &a.ty)?,
                    None => Value::from(field),
                };
                // An absent optional and an explicit undef are the same.
                if !value.is_undef() {
                    args.insert(name.clone(), value);
                }
            }
            Value::object(ObjectValue::create(&t, &args)?)
        }
        (TypeKind::Optional(_), serde_json::Value::Null) => Value::Undef,
        (TypeKind::Optional(inner), _) => convert(json, inner)?,
        (TypeKind::SemVer, serde_json::Value::String(s)) => Value::SemVer(SemVer::parse(s)?),
        (TypeKind::Array(a), serde_json::Value::Array(elements)) => Value::array(
            elements
                .iter()
                .map(|e| convert(e, &a.element))
                .collect::<Result<_>>()?,
        ),
        (TypeKind::Hash(h), serde_json::Value::Object(entries)) => Value::hash(
            entries
                .iter()
                .map(|(k, v)| Ok((k.clone(), convert(v, &h.value)?)))
                .collect::<Result<_>>()?,
        ),
        (TypeKind::Variant(members), _) => {
            for member in members {
                if let Ok(v) = convert(json, member) {
                    if member.accepts(&v) {
                        return Ok(v);
                    }
                }
            }
            Value::from(json)
        }
        _ => Value::from(json),
    };
    Ok(value)
}

/// Plain JSON data for a value. Objects become maps of all their
/// attributes, types and versions become their canonical strings. A cyclic
/// object graph has no JSON form.
pub fn to_json(value: &Value) -> Result<serde_json::Value> {
    json_of(value, &mut HashSet::new())
}

/// `open` holds the objects on the current path.
fn json_of(value: &Value, open: &mut HashSet<usize>) -> Result<serde_json::Value> {
    let unsupported = |what: &str| PcoreError::Reflection {
        type_name: value.ptype().generic().to_string(),
        detail: format!("{} has no JSON form", what),
    };
    Ok(match value {
        Value::Undef => serde_json::Value::Null,
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Integer(i) => serde_json::Value::from(*i),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .ok_or_else(|| unsupported("a non-finite float"))?,
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::SemVer(v) => serde_json::Value::String(v.to_string()),
        Value::Type(t) => serde_json::Value::String(t.to_string()),
        Value::Array(a) => {
            let mut elements = Vec::with_capacity(a.len());
            for e in a.iter() {
                elements.push(json_of(e, open)?);
            }
            serde_json::Value::Array(elements)
        }
        Value::Hash(h) => {
            let mut fields = serde_json::Map::with_capacity(h.len());
            for (k, v) in h.iter() {
                fields.insert(k.clone(), json_of(v, open)?);
            }
            serde_json::Value::Object(fields)
        }
        Value::Object(o) => {
            let identity = value.identity().unwrap_or_default();
            if !open.insert(identity) {
                return Err(unsupported("a cyclic value"));
            }
            let mut fields = serde_json::Map::new();
            for (k, v) in o.attributes() {
                fields.insert(k, json_of(&v, open)?);
            }
            open.remove(&identity);
            serde_json::Value::Object(fields)
        }
        Value::Default => return Err(unsupported("default")),
        Value::Pending(_) => return Err(unsupported("an unfinished reference")),
    })
}

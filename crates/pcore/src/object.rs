//! Object types, their instances, and type-sets.
//!
//! An object type has a name, an optional parent (single inheritance) and an
//! ordered set of attributes, each with a type and an optional default. A
//! type-set bundles named object types that may refer to each other; the
//! references between members are bound when the set is built, so member
//! types can be mutually recursive.

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::error::{PcoreError, Result};
use crate::semver::SemVer;
use crate::types::{write_key, Type, TypeKind};
use crate::value::{write_quoted, Value};

/// Name authority used when a type-set does not declare one.
pub const RUNTIME_NAME_AUTHORITY: &str = "http://puppet.com/2016.1/runtime";

/// Pcore version assumed when a type-set does not declare one.
pub const PCORE_VERSION: SemVer = SemVer {
    major: 1,
    minor: 0,
    patch: 0,
    pre: Vec::new(),
    build: Vec::new(),
};

#[derive(Clone)]
pub struct Attribute {
    pub name: String,
    pub ty: Type,
    /// Declared default. `Some(Value::Undef)` is an explicit undef default.
    pub value: Option<Value>,
}

impl Attribute {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Attribute {
            name: name.into(),
            ty,
            value: None,
        }
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }
}

#[derive(Clone, Default)]
pub struct ObjectType {
    name: String,
    parent: Option<Type>,
    attributes: IndexMap<String, Attribute>,
}

impl ObjectType {
    pub fn new(
        name: impl Into<String>,
        parent: Option<Type>,
        attributes: impl IntoIterator<Item = Attribute>,
    ) -> Self {
        ObjectType {
            name: name.into(),
            parent,
            attributes: attributes
                .into_iter()
                .map(|a| (a.name.clone(), a))
                .collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The unnamed object type without parent or attributes, which every
    /// object type is assignable to.
    pub fn is_default(&self) -> bool {
        self.name.is_empty() && self.parent.is_none() && self.attributes.is_empty()
    }

    /// The declared parent exactly as written (possibly a reference).
    pub fn declared_parent(&self) -> Option<&Type> {
        self.parent.as_ref()
    }

    /// The parent, with references followed.
    pub fn parent(&self) -> Option<Type> {
        self.parent.as_ref().map(Type::deref)
    }

    /// Attributes declared on this type only.
    pub fn own_attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.values()
    }

    /// All attributes including inherited ones, ancestors first. An attribute
    /// redeclared by a descendant keeps its inherited position.
    pub fn all_attributes(&self) -> Vec<Attribute> {
        let mut ancestors: Vec<Type> = Vec::new();
        let mut seen = HashSet::new();
        let mut next = self.parent();
        while let Some(p) = next {
            if !seen.insert(p.identity()) {
                break;
            }
            next = match p.as_object() {
                Some(o) => o.parent(),
                None => None,
            };
            if p.as_object().is_some() {
                ancestors.push(p);
            }
        }
        let mut merged: IndexMap<String, Attribute> = IndexMap::new();
        for ancestor in ancestors.iter().rev() {
            if let Some(o) = ancestor.as_object() {
                for a in o.attributes.values() {
                    merged.insert(a.name.clone(), a.clone());
                }
            }
        }
        for a in self.attributes.values() {
            merged.insert(a.name.clone(), a.clone());
        }
        merged.into_values().collect()
    }

    /// A copy of this type under another name.
    pub fn renamed(&self, name: impl Into<String>) -> ObjectType {
        ObjectType {
            name: name.into(),
            parent: self.parent.clone(),
            attributes: self.attributes.clone(),
        }
    }

    /// Build an object type from its initialization hash:
    /// `{name => String, parent => Type, attributes => {name => Type | {type => Type, value => Any}}}`.
    pub fn from_hash(hash: &IndexMap<String, Value>) -> Result<ObjectType> {
        let mut name = String::new();
        let mut parent = None;
        let mut attributes = Vec::new();
        for (key, value) in hash {
            match (key.as_str(), value) {
                ("name", Value::String(s)) => name = s.clone(),
                ("parent", Value::Type(t)) => parent = Some(t.clone()),
                ("parent", Value::Undef) => {}
                ("attributes", Value::Hash(attrs)) => {
                    for (attr_name, spec) in attrs.iter() {
                        attributes.push(attribute_from_spec(attr_name, spec)?);
                    }
                }
                ("name", v) => return Err(mismatch("Object name", "String", v)),
                ("parent", v) => return Err(mismatch("Object parent", "Type", v)),
                ("attributes", v) => return Err(mismatch("Object attributes", "Hash", v)),
                (other, _) => {
                    return Err(PcoreError::UnknownAttribute {
                        type_name: "Object".to_string(),
                        attribute: other.to_string(),
                    })
                }
            }
        }
        Ok(ObjectType::new(name, parent, attributes))
    }

    /// The initialization hash that rebuilds this type through
    /// [`ObjectType::from_hash`].
    pub fn init_hash(&self) -> IndexMap<String, Value> {
        let mut hash = IndexMap::new();
        if !self.name.is_empty() {
            hash.insert("name".to_string(), Value::String(self.name.clone()));
        }
        if let Some(p) = &self.parent {
            hash.insert("parent".to_string(), Value::Type(p.clone()));
        }
        if !self.attributes.is_empty() {
            let attrs: IndexMap<String, Value> = self
                .attributes
                .values()
                .map(|a| (a.name.clone(), attribute_spec(a)))
                .collect();
            hash.insert("attributes".to_string(), Value::hash(attrs));
        }
        hash
    }

    pub(crate) fn write_definition(&self, f: &mut fmt::Formatter<'_>, with_name: bool) -> fmt::Result {
        f.write_str("{")?;
        let mut first = true;
        let mut sep = |f: &mut fmt::Formatter<'_>| -> fmt::Result {
            if !std::mem::take(&mut first) {
                f.write_str(", ")?;
            }
            Ok(())
        };
        if with_name && !self.name.is_empty() {
            sep(f)?;
            write_key(f, "name", true)?;
            write_quoted(f, &self.name)?;
        }
        if let Some(p) = &self.parent {
            sep(f)?;
            write_key(f, "parent", true)?;
            write!(f, "{}", p)?;
        }
        if !self.attributes.is_empty() {
            sep(f)?;
            write_key(f, "attributes", true)?;
            f.write_str("{")?;
            for (i, a) in self.attributes.values().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_key(f, &a.name, false)?;
                write!(f, "{}", attribute_spec(a))?;
            }
            f.write_str("}")?;
        }
        f.write_str("}")
    }
}

fn mismatch(context: &str, expected: &str, actual: &Value) -> PcoreError {
    PcoreError::TypeMismatch {
        context: context.to_string(),
        expected: expected.to_string(),
        actual: actual.ptype().generic().to_string(),
    }
}

fn attribute_spec(a: &Attribute) -> Value {
    match &a.value {
        None => Value::Type(a.ty.clone()),
        Some(v) => {
            let mut spec = IndexMap::new();
            spec.insert("type".to_string(), Value::Type(a.ty.clone()));
            spec.insert("value".to_string(), v.clone());
            Value::hash(spec)
        }
    }
}

fn attribute_from_spec(name: &str, spec: &Value) -> Result<Attribute> {
    let context = format!("Object attribute '{}'", name);
    match spec {
        Value::Type(t) => Ok(Attribute::new(name, t.clone())),
        Value::Hash(h) => {
            let mut ty = None;
            let mut value = None;
            for (k, v) in h.iter() {
                match (k.as_str(), v) {
                    ("type", Value::Type(t)) => ty = Some(t.clone()),
                    ("type", v) => return Err(mismatch(&context, "Type", v)),
                    ("value", v) => value = Some(v.clone()),
                    (other, _) => {
                        return Err(PcoreError::UnknownAttribute {
                            type_name: context,
                            attribute: other.to_string(),
                        })
                    }
                }
            }
            let ty = ty.ok_or_else(|| PcoreError::MissingAttribute {
                type_name: context.clone(),
                attribute: "type".to_string(),
            })?;
            if let Some(v) = &value {
                if !has_references(&ty) && !ty.is_instance(v, &mut crate::Guard::new()) {
                    return Err(PcoreError::TypeMismatch {
                        context: format!("{} default value", context),
                        expected: ty.to_string(),
                        actual: v.ptype().generic().to_string(),
                    });
                }
            }
            Ok(Attribute {
                name: name.to_string(),
                ty,
                value,
            })
        }
        v => Err(mismatch(&context, "Type or Hash", v)),
    }
}

fn has_references(t: &Type) -> bool {
    let mut found = false;
    t.for_each_reference(&mut |_| found = true);
    found
}

/// An instance of an object type. Attribute values are stored in the order
/// of [`ObjectType::all_attributes`].
///
/// Values are behind a lock only so that a deserializer can patch
/// back-references into an object after it has been created; the public
/// surface treats instances as immutable.
#[derive(Debug)]
pub struct ObjectValue {
    ty: Type,
    values: RwLock<Vec<Value>>,
}

impl ObjectValue {
    /// Create an instance of the object type `ty` from an attribute map.
    /// Missing attributes take their default (or undef when the attribute
    /// type accepts it); unknown names and non-conforming values fail.
    pub fn create(ty: &Type, args: &IndexMap<String, Value>) -> Result<ObjectValue> {
        let resolved = ty.deref();
        let Some(object) = resolved.as_object() else {
            return Err(PcoreError::NoConstructor {
                type_name: ty.to_string(),
                input: "an attribute hash".to_string(),
            });
        };
        let attributes = object.all_attributes();
        for key in args.keys() {
            if !attributes.iter().any(|a| a.name == *key) {
                return Err(PcoreError::UnknownAttribute {
                    type_name: resolved.name().to_string(),
                    attribute: key.clone(),
                });
            }
        }
        let mut values = Vec::with_capacity(attributes.len());
        for a in &attributes {
            let value = match args.get(&a.name) {
                Some(v) => {
                    if !v.contains_pending() && !a.ty.is_instance(v, &mut crate::Guard::new())
                    {
                        return Err(PcoreError::TypeMismatch {
                            context: format!("{} attribute '{}'", resolved.name(), a.name),
                            expected: a.ty.to_string(),
                            actual: v.ptype().generic().to_string(),
                        });
                    }
                    v.clone()
                }
                None => match &a.value {
                    Some(d) => d.clone(),
                    None if a.ty.accepts_undef() => Value::Undef,
                    None => {
                        return Err(PcoreError::MissingAttribute {
                            type_name: resolved.name().to_string(),
                            attribute: a.name.clone(),
                        })
                    }
                },
            };
            values.push(value);
        }
        Ok(ObjectValue {
            ty: resolved,
            values: RwLock::new(values),
        })
    }

    pub fn object_type(&self) -> &Type {
        &self.ty
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        let object = self.ty.as_object()?;
        let index = object.all_attributes().iter().position(|a| a.name == name)?;
        self.values.read().get(index).cloned()
    }

    pub fn values(&self) -> Vec<Value> {
        self.values.read().clone()
    }

    /// Attribute names paired with their values, in declaration order.
    pub fn attributes(&self) -> Vec<(String, Value)> {
        let names = self
            .ty
            .as_object()
            .map(ObjectType::all_attributes)
            .unwrap_or_default();
        let values = self.values.read();
        names
            .into_iter()
            .zip(values.iter().cloned())
            .map(|(a, v)| (a.name, v))
            .collect()
    }

    /// The attributes that differ from their declared defaults. This is the
    /// hash that recreates the instance through [`ObjectValue::create`].
    pub fn init_hash(&self) -> IndexMap<String, Value> {
        let declared = self
            .ty
            .as_object()
            .map(ObjectType::all_attributes)
            .unwrap_or_default();
        let values = self.values.read();
        let mut hash = IndexMap::new();
        for (a, v) in declared.iter().zip(values.iter()) {
            let is_default = match &a.value {
                Some(d) => d.equals(v, &mut crate::Guard::new()),
                None => false,
            };
            if !is_default {
                hash.insert(a.name.clone(), v.clone());
            }
        }
        hash
    }

    /// Replace the value at attribute position `index`.
    ///
    /// Only meant for completing an instance whose attributes held
    /// placeholders for objects that were still under construction.
    pub fn patch(&self, index: usize, value: Value) {
        if let Some(slot) = self.values.write().get_mut(index) {
            *slot = value;
        }
    }
}

/// A named, versioned bundle of object types.
#[derive(Clone, Default)]
pub struct TypeSet {
    name: String,
    name_authority: String,
    version: Option<SemVer>,
    pcore_version: Option<SemVer>,
    types: IndexMap<String, Type>,
}

impl TypeSet {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn name_authority(&self) -> &str {
        &self.name_authority
    }

    pub fn version(&self) -> Option<&SemVer> {
        self.version.as_ref()
    }

    pub fn pcore_version(&self) -> Option<&SemVer> {
        self.pcore_version.as_ref()
    }

    pub fn is_default(&self) -> bool {
        self.name.is_empty() && self.types.is_empty()
    }

    /// Member types keyed by their short name.
    pub fn types(&self) -> &IndexMap<String, Type> {
        &self.types
    }

    /// Find a member by short or qualified name, ignoring case.
    pub fn get(&self, name: &str) -> Option<&Type> {
        let short = match self.qualified_prefix_len(name) {
            Some(n) => &name[n..],
            None => name,
        };
        self.types
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(short))
            .map(|(_, t)| t)
    }

    fn qualified_prefix_len(&self, name: &str) -> Option<usize> {
        let prefix_len = self.name.len() + 2;
        if name.len() <= prefix_len {
            return None;
        }
        let head = name.get(..self.name.len())?;
        let separator = name.get(self.name.len()..prefix_len)?;
        (head.eq_ignore_ascii_case(&self.name) && separator == "::").then_some(prefix_len)
    }

    /// Build a type-set from its initialization hash:
    /// `{name => String, version => SemVer, pcore_version => SemVer,
    /// name_authority => String, types => {Short => Object | Hash}}`.
    ///
    /// Member object types are named `<set>::<Short>`. References from one
    /// member to another, by short or qualified name, are bound here.
    pub fn from_hash(hash: &IndexMap<String, Value>) -> Result<TypeSet> {
        let mut set = TypeSet {
            name_authority: RUNTIME_NAME_AUTHORITY.to_string(),
            pcore_version: Some(PCORE_VERSION),
            ..TypeSet::default()
        };
        let mut members: Vec<(String, Value)> = Vec::new();
        for (key, value) in hash {
            match (key.as_str(), value) {
                ("name", Value::String(s)) => set.name = s.clone(),
                ("name_authority", Value::String(s)) => set.name_authority = s.clone(),
                ("version", v) => set.version = Some(version_from(v, "TypeSet version")?),
                ("pcore_version", v) => {
                    set.pcore_version = Some(version_from(v, "TypeSet pcore_version")?)
                }
                ("types", Value::Hash(types)) => {
                    members = types.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
                }
                ("name", v) => return Err(mismatch("TypeSet name", "String", v)),
                ("name_authority", v) => {
                    return Err(mismatch("TypeSet name_authority", "String", v))
                }
                ("types", v) => return Err(mismatch("TypeSet types", "Hash", v)),
                (other, _) => {
                    return Err(PcoreError::UnknownAttribute {
                        type_name: "TypeSet".to_string(),
                        attribute: other.to_string(),
                    })
                }
            }
        }
        for required in ["name", "version"] {
            if !hash.contains_key(required) {
                return Err(PcoreError::MissingAttribute {
                    type_name: "TypeSet".to_string(),
                    attribute: required.to_string(),
                });
            }
        }

        for (short, spec) in members {
            let qualified = format!("{}::{}", set.name, short);
            let member = match &spec {
                Value::Type(t) => match t.kind() {
                    TypeKind::Object(o) if o.name().eq_ignore_ascii_case(&qualified) => t.clone(),
                    TypeKind::Object(o) => Type::new(TypeKind::Object(o.renamed(&qualified))),
                    _ => return Err(mismatch(&format!("TypeSet member {}", short), "Object", &spec)),
                },
                Value::Hash(h) => {
                    let o = ObjectType::from_hash(h)?;
                    Type::new(TypeKind::Object(o.renamed(&qualified)))
                }
                v => return Err(mismatch(&format!("TypeSet member {}", short), "Object", v)),
            };
            set.types.insert(short, member);
        }
        set.bind_member_references();
        Ok(set)
    }

    fn bind_member_references(&self) {
        for member in self.types.values() {
            let Some(object) = member.as_object() else {
                continue;
            };
            let mut bind = |r: &crate::reference::TypeReference| {
                if let Some(target) = self.get(r.name()) {
                    r.bind(target.clone());
                }
            };
            if let Some(p) = object.declared_parent() {
                p.for_each_reference(&mut bind);
            }
            for a in object.own_attributes() {
                a.ty.for_each_reference(&mut bind);
            }
        }
    }

    pub fn init_hash(&self) -> IndexMap<String, Value> {
        let mut hash = IndexMap::new();
        if let Some(v) = &self.pcore_version {
            hash.insert("pcore_version".to_string(), Value::SemVer(v.clone()));
        }
        hash.insert(
            "name_authority".to_string(),
            Value::String(self.name_authority.clone()),
        );
        hash.insert("name".to_string(), Value::String(self.name.clone()));
        if let Some(v) = &self.version {
            hash.insert("version".to_string(), Value::SemVer(v.clone()));
        }
        let types: IndexMap<String, Value> = self
            .types
            .iter()
            .map(|(k, t)| (k.clone(), Value::Type(t.clone())))
            .collect();
        hash.insert("types".to_string(), Value::hash(types));
        hash
    }

    pub(crate) fn write_definition(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        if let Some(v) = &self.pcore_version {
            write_key(f, "pcore_version", true)?;
            write_quoted(f, &v.to_string())?;
            f.write_str(", ")?;
        }
        write_key(f, "name_authority", true)?;
        write_quoted(f, &self.name_authority)?;
        f.write_str(", ")?;
        write_key(f, "name", true)?;
        write_quoted(f, &self.name)?;
        if let Some(v) = &self.version {
            f.write_str(", ")?;
            write_key(f, "version", true)?;
            write_quoted(f, &v.to_string())?;
        }
        f.write_str(", ")?;
        write_key(f, "types", true)?;
        f.write_str("{")?;
        for (i, (short, t)) in self.types.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write_key(f, short, true)?;
            match t.as_object() {
                Some(o) => o.write_definition(f, false)?,
                None => write!(f, "{}", t)?,
            }
        }
        f.write_str("}}")
    }
}

fn version_from(v: &Value, context: &str) -> Result<SemVer> {
    match v {
        Value::SemVer(v) => Ok(v.clone()),
        Value::String(s) => SemVer::parse(s),
        other => Err(mismatch(context, "SemVer", other)),
    }
}

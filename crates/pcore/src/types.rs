//! The closed set of type kinds and their canonical shape.
//!
//! A [`Type`] is a cheap handle (`Arc`) around a [`TypeKind`]. Types are
//! immutable once built and may be shared freely across threads. The only
//! mutation is the write-once resolution inside a [`TypeReference`].
//!
//! Every type exposes a canonical [`name`](Type::name), the ordered
//! [`parameters`](Type::parameters) that rebuild it through its constructor,
//! and its [`generic`](Type::generic) widening. `Display` renders the
//! canonical string form accepted by [`crate::parser`].
//!
//! Unparameterized kinds are process-wide singletons, so every `String` in a
//! program is the same `Arc` and shares identity.

use std::fmt;
use std::sync::{Arc, LazyLock};

use indexmap::IndexMap;
use regex::Regex;

use crate::object::{ObjectType, TypeSet};
use crate::reference::TypeReference;
use crate::value::{write_quoted, Value};

/// A handle to an immutable type description.
#[derive(Clone)]
pub struct Type(Arc<TypeKind>);

/// One variant per built-in kind.
pub enum TypeKind {
    Any,
    Undef,
    Default,
    Scalar,
    Boolean,
    Numeric,
    Integer(IntegerType),
    Float(FloatType),
    String(StringType),
    Pattern(PatternType),
    Enum(EnumType),
    Optional(Type),
    Variant(Vec<Type>),
    Array(ArrayType),
    Hash(HashType),
    Tuple(Vec<Type>),
    Struct(Vec<StructMember>),
    Type(Type),
    SemVer,
    Object(ObjectType),
    TypeSet(TypeSet),
    Reference(TypeReference),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegerType {
    pub min: i64,
    pub max: i64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatType {
    pub min: f64,
    pub max: f64,
}

/// A string type is either bounded by length or pinned to one value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StringType {
    Sized { min: usize, max: usize },
    Constant(String),
}

#[derive(Debug, Clone)]
pub struct PatternType {
    pub patterns: Vec<Regex>,
}

/// A closed set of string literals. Case-insensitive enums store their
/// literals lowercased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    values: Vec<String>,
    case_insensitive: bool,
}

impl EnumType {
    pub fn new(values: Vec<String>, case_insensitive: bool) -> Self {
        let values = if case_insensitive {
            values.iter().map(|v| v.to_lowercase()).collect()
        } else {
            values
        };
        EnumType {
            values,
            case_insensitive,
        }
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    /// Whether `s` is one of the literals, honoring this enum's case rule.
    /// The empty enum accepts every string.
    pub fn contains(&self, s: &str) -> bool {
        if self.values.is_empty() {
            return true;
        }
        if self.case_insensitive {
            let lower = s.to_lowercase();
            self.values.iter().any(|v| *v == lower)
        } else {
            self.values.iter().any(|v| v == s)
        }
    }
}

#[derive(Clone)]
pub struct ArrayType {
    pub element: Type,
    pub min: usize,
    pub max: usize,
}

#[derive(Clone)]
pub struct HashType {
    pub key: Type,
    pub value: Type,
    pub min: usize,
    pub max: usize,
}

#[derive(Clone)]
pub struct StructMember {
    pub key: String,
    pub value: Type,
}

macro_rules! singleton {
    ($(#[$doc:meta])* $name:ident => $kind:expr) => {
        $(#[$doc])*
        pub fn $name() -> Type {
            static TYPE: LazyLock<Type> = LazyLock::new(|| Type::new($kind));
            TYPE.clone()
        }
    };
}

impl Type {
    pub fn new(kind: TypeKind) -> Self {
        Type(Arc::new(kind))
    }

    pub fn kind(&self) -> &TypeKind {
        &self.0
    }

    /// Address-based identity, stable for the lifetime of the handle.
    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    pub fn ptr_eq(&self, other: &Type) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    singleton!(any => TypeKind::Any);
    singleton!(undef => TypeKind::Undef);
    singleton!(default_type => TypeKind::Default);
    singleton!(scalar => TypeKind::Scalar);
    singleton!(boolean => TypeKind::Boolean);
    singleton!(numeric => TypeKind::Numeric);
    singleton!(integer => TypeKind::Integer(IntegerType { min: i64::MIN, max: i64::MAX }));
    singleton!(float => TypeKind::Float(FloatType { min: f64::NEG_INFINITY, max: f64::INFINITY }));
    singleton!(string => TypeKind::String(StringType::Sized { min: 0, max: usize::MAX }));
    singleton!(pattern => TypeKind::Pattern(PatternType { patterns: Vec::new() }));
    singleton!(
        /// The empty enum, which behaves as "any string".
        enumeration => TypeKind::Enum(EnumType::new(Vec::new(), false))
    );
    singleton!(optional => TypeKind::Optional(Type::any()));
    singleton!(variant => TypeKind::Variant(Vec::new()));
    singleton!(array => TypeKind::Array(ArrayType { element: Type::any(), min: 0, max: usize::MAX }));
    singleton!(hash => TypeKind::Hash(HashType {
        key: Type::any(),
        value: Type::any(),
        min: 0,
        max: usize::MAX,
    }));
    singleton!(tuple => TypeKind::Tuple(Vec::new()));
    singleton!(struct_type => TypeKind::Struct(Vec::new()));
    singleton!(type_type => TypeKind::Type(Type::any()));
    singleton!(semver => TypeKind::SemVer);
    singleton!(object => TypeKind::Object(ObjectType::default()));
    singleton!(type_set => TypeKind::TypeSet(TypeSet::default()));
    singleton!(meta_object => TypeKind::Type(Type::object()));
    singleton!(meta_type_set => TypeKind::Type(Type::type_set()));

    pub fn integer_range(min: i64, max: i64) -> Type {
        if min == i64::MIN && max == i64::MAX {
            return Type::integer();
        }
        Type::new(TypeKind::Integer(IntegerType { min, max }))
    }

    pub fn float_range(min: f64, max: f64) -> Type {
        if min == f64::NEG_INFINITY && max == f64::INFINITY {
            return Type::float();
        }
        Type::new(TypeKind::Float(FloatType { min, max }))
    }

    pub fn string_sized(min: usize, max: usize) -> Type {
        if min == 0 && max == usize::MAX {
            return Type::string();
        }
        Type::new(TypeKind::String(StringType::Sized { min, max }))
    }

    /// The type whose only instance is `value`.
    pub fn constant_string(value: impl Into<String>) -> Type {
        Type::new(TypeKind::String(StringType::Constant(value.into())))
    }

    pub fn pattern_of(patterns: Vec<Regex>) -> Type {
        if patterns.is_empty() {
            return Type::pattern();
        }
        Type::new(TypeKind::Pattern(PatternType { patterns }))
    }

    pub fn enumeration_of<S: Into<String>>(
        values: impl IntoIterator<Item = S>,
        case_insensitive: bool,
    ) -> Type {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return Type::enumeration();
        }
        Type::new(TypeKind::Enum(EnumType::new(values, case_insensitive)))
    }

    pub fn optional_of(inner: Type) -> Type {
        if matches!(inner.kind(), TypeKind::Any) {
            return Type::optional();
        }
        Type::new(TypeKind::Optional(inner))
    }

    pub fn variant_of(types: Vec<Type>) -> Type {
        if types.is_empty() {
            return Type::variant();
        }
        Type::new(TypeKind::Variant(types))
    }

    pub fn array_of(element: Type) -> Type {
        Type::array_sized(element, 0, usize::MAX)
    }

    pub fn array_sized(element: Type, min: usize, max: usize) -> Type {
        if matches!(element.kind(), TypeKind::Any) && min == 0 && max == usize::MAX {
            return Type::array();
        }
        Type::new(TypeKind::Array(ArrayType { element, min, max }))
    }

    pub fn hash_of(key: Type, value: Type) -> Type {
        Type::hash_sized(key, value, 0, usize::MAX)
    }

    pub fn hash_sized(key: Type, value: Type, min: usize, max: usize) -> Type {
        if matches!(key.kind(), TypeKind::Any)
            && matches!(value.kind(), TypeKind::Any)
            && min == 0
            && max == usize::MAX
        {
            return Type::hash();
        }
        Type::new(TypeKind::Hash(HashType {
            key,
            value,
            min,
            max,
        }))
    }

    pub fn tuple_of(types: Vec<Type>) -> Type {
        if types.is_empty() {
            return Type::tuple();
        }
        Type::new(TypeKind::Tuple(types))
    }

    pub fn struct_of<K: Into<String>>(members: impl IntoIterator<Item = (K, Type)>) -> Type {
        let members: Vec<StructMember> = members
            .into_iter()
            .map(|(key, value)| StructMember {
                key: key.into(),
                value,
            })
            .collect();
        if members.is_empty() {
            return Type::struct_type();
        }
        Type::new(TypeKind::Struct(members))
    }

    /// `Type[inner]`, the type of types assignable to `inner`.
    pub fn type_of(inner: Type) -> Type {
        if matches!(inner.kind(), TypeKind::Any) {
            return Type::type_type();
        }
        Type::new(TypeKind::Type(inner))
    }

    /// Look up an unparameterized built-in by its canonical name.
    pub fn builtin(name: &str) -> Option<Type> {
        let t = match name {
            "Any" => Type::any(),
            "Undef" => Type::undef(),
            "Default" => Type::default_type(),
            "Scalar" => Type::scalar(),
            "Boolean" => Type::boolean(),
            "Numeric" => Type::numeric(),
            "Integer" => Type::integer(),
            "Float" => Type::float(),
            "String" => Type::string(),
            "Pattern" => Type::pattern(),
            "Enum" => Type::enumeration(),
            "Optional" => Type::optional(),
            "Variant" => Type::variant(),
            "Array" => Type::array(),
            "Hash" => Type::hash(),
            "Tuple" => Type::tuple(),
            "Struct" => Type::struct_type(),
            "Type" => Type::type_type(),
            "SemVer" => Type::semver(),
            "Object" => Type::object(),
            "TypeSet" => Type::type_set(),
            "Pcore::ObjectType" => Type::meta_object(),
            "Pcore::TypeSet" => Type::meta_type_set(),
            _ => return None,
        };
        Some(t)
    }

    /// The canonical name of this type's kind, or the declared name of a
    /// named object type, type-set or reference.
    pub fn name(&self) -> &str {
        match self.kind() {
            TypeKind::Any => "Any",
            TypeKind::Undef => "Undef",
            TypeKind::Default => "Default",
            TypeKind::Scalar => "Scalar",
            TypeKind::Boolean => "Boolean",
            TypeKind::Numeric => "Numeric",
            TypeKind::Integer(_) => "Integer",
            TypeKind::Float(_) => "Float",
            TypeKind::String(_) => "String",
            TypeKind::Pattern(_) => "Pattern",
            TypeKind::Enum(_) => "Enum",
            TypeKind::Optional(_) => "Optional",
            TypeKind::Variant(_) => "Variant",
            TypeKind::Array(_) => "Array",
            TypeKind::Hash(_) => "Hash",
            TypeKind::Tuple(_) => "Tuple",
            TypeKind::Struct(_) => "Struct",
            TypeKind::Type(_) => "Type",
            TypeKind::SemVer => "SemVer",
            TypeKind::Object(o) if !o.name().is_empty() => o.name(),
            TypeKind::Object(_) => "Object",
            TypeKind::TypeSet(ts) if !ts.name().is_empty() => ts.name(),
            TypeKind::TypeSet(_) => "TypeSet",
            TypeKind::Reference(r) => r.name(),
        }
    }

    /// The arguments that rebuild this type through its constructor, in
    /// constructor order. Default (widest) types have none.
    pub fn parameters(&self) -> Vec<Value> {
        match self.kind() {
            TypeKind::Integer(t) => {
                range_params(t.min != i64::MIN, t.max != i64::MAX, || {
                    (Value::Integer(t.min), Value::Integer(t.max))
                })
            }
            TypeKind::Float(t) => range_params(
                t.min != f64::NEG_INFINITY,
                t.max != f64::INFINITY,
                || (Value::Float(t.min), Value::Float(t.max)),
            ),
            TypeKind::String(StringType::Constant(s)) => vec![Value::String(s.clone())],
            TypeKind::String(StringType::Sized { min, max }) => {
                range_params(*min != 0, *max != usize::MAX, || {
                    (size_value(*min), size_value(*max))
                })
            }
            TypeKind::Pattern(p) => p
                .patterns
                .iter()
                .map(|r| Value::String(r.as_str().to_string()))
                .collect(),
            TypeKind::Enum(e) => {
                let mut params: Vec<Value> =
                    e.values.iter().map(|v| Value::String(v.clone())).collect();
                if e.case_insensitive {
                    params.push(Value::Boolean(true));
                }
                params
            }
            TypeKind::Optional(inner) => match inner.kind() {
                TypeKind::Any => Vec::new(),
                TypeKind::String(StringType::Constant(s)) if !s.is_empty() => {
                    vec![Value::String(s.clone())]
                }
                _ => vec![Value::Type(inner.clone())],
            },
            TypeKind::Variant(types) | TypeKind::Tuple(types) => {
                types.iter().cloned().map(Value::Type).collect()
            }
            TypeKind::Array(a) => {
                let mut params = Vec::new();
                let sized = a.min != 0 || a.max != usize::MAX;
                if sized || !matches!(a.element.kind(), TypeKind::Any) {
                    params.push(Value::Type(a.element.clone()));
                }
                if sized {
                    params.push(size_value(a.min));
                    params.push(size_value(a.max));
                }
                params
            }
            TypeKind::Hash(h) => {
                let mut params = Vec::new();
                let sized = h.min != 0 || h.max != usize::MAX;
                if sized
                    || !matches!(h.key.kind(), TypeKind::Any)
                    || !matches!(h.value.kind(), TypeKind::Any)
                {
                    params.push(Value::Type(h.key.clone()));
                    params.push(Value::Type(h.value.clone()));
                }
                if sized {
                    params.push(size_value(h.min));
                    params.push(size_value(h.max));
                }
                params
            }
            TypeKind::Struct(members) if members.is_empty() => Vec::new(),
            TypeKind::Struct(members) => {
                let map: IndexMap<String, Value> = members
                    .iter()
                    .map(|m| (m.key.clone(), Value::Type(m.value.clone())))
                    .collect();
                vec![Value::hash(map)]
            }
            TypeKind::Type(inner) => match inner.kind() {
                TypeKind::Any => Vec::new(),
                _ => vec![Value::Type(inner.clone())],
            },
            TypeKind::Object(o) if o.is_default() => Vec::new(),
            TypeKind::Object(o) => vec![Value::hash(o.init_hash())],
            TypeKind::TypeSet(ts) if ts.is_default() => Vec::new(),
            TypeKind::TypeSet(ts) => vec![Value::hash(ts.init_hash())],
            _ => Vec::new(),
        }
    }

    /// The least specific type of the same kind, used for display and
    /// inference fallbacks. Named object types, type-sets and references
    /// are their own generic form.
    pub fn generic(&self) -> Type {
        match self.kind() {
            TypeKind::Integer(_) => Type::integer(),
            TypeKind::Float(_) => Type::float(),
            TypeKind::String(_) => Type::string(),
            TypeKind::Pattern(_) => Type::pattern(),
            TypeKind::Enum(_) => Type::enumeration(),
            TypeKind::Optional(inner) => Type::optional_of(inner.generic()),
            TypeKind::Variant(types) => Type::variant_of(types.iter().map(Type::generic).collect()),
            TypeKind::Array(a) => Type::array_of(a.element.generic()),
            TypeKind::Hash(h) => Type::hash_of(h.key.generic(), h.value.generic()),
            TypeKind::Tuple(types) => Type::tuple_of(types.iter().map(Type::generic).collect()),
            TypeKind::Struct(members) => Type::struct_of(
                members
                    .iter()
                    .map(|m| (m.key.clone(), m.value.generic())),
            ),
            TypeKind::Type(inner) => Type::type_of(inner.generic()),
            _ => self.clone(),
        }
    }

    /// Follow a resolved reference to its target. Unresolvable references
    /// and every other kind return themselves.
    pub fn deref(&self) -> Type {
        let mut current = self.clone();
        // Bounded: a chain of references that never reaches a concrete
        // type stops where it is.
        for _ in 0..32 {
            let next = match current.kind() {
                TypeKind::Reference(r) => match r.resolved() {
                    Some(t) => t,
                    None => return current,
                },
                _ => return current,
            };
            current = next;
        }
        current
    }

    pub fn as_object(&self) -> Option<&ObjectType> {
        match self.kind() {
            TypeKind::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_type_set(&self) -> Option<&TypeSet> {
        match self.kind() {
            TypeKind::TypeSet(ts) => Some(ts),
            _ => None,
        }
    }

    /// Whether the type accepts the "no value" sentinel.
    pub fn accepts_undef(&self) -> bool {
        self.is_instance(&Value::Undef, &mut crate::Guard::new())
    }

    /// Call `f` for each type reference reachable through this type's
    /// parameters. Object types and type-sets are not entered.
    pub fn for_each_reference(&self, f: &mut dyn FnMut(&TypeReference)) {
        match self.kind() {
            TypeKind::Reference(r) => f(r),
            TypeKind::Optional(inner) | TypeKind::Type(inner) => inner.for_each_reference(f),
            TypeKind::Variant(types) | TypeKind::Tuple(types) => {
                types.iter().for_each(|t| t.for_each_reference(f))
            }
            TypeKind::Array(a) => a.element.for_each_reference(f),
            TypeKind::Hash(h) => {
                h.key.for_each_reference(f);
                h.value.for_each_reference(f);
            }
            TypeKind::Struct(members) => members.iter().for_each(|m| m.value.for_each_reference(f)),
            _ => {}
        }
    }
}

fn size_value(n: usize) -> Value {
    if n == usize::MAX {
        Value::Default
    } else {
        Value::Integer(n as i64)
    }
}

/// `[]`, `[min]` or `[min, max]`, using `default` for an unbounded min.
fn range_params(
    has_min: bool,
    has_max: bool,
    values: impl FnOnce() -> (Value, Value),
) -> Vec<Value> {
    let (min, max) = values();
    match (has_min, has_max) {
        (false, false) => Vec::new(),
        (true, false) => vec![min],
        (false, true) => vec![Value::Default, max],
        (true, true) => vec![min, max],
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            TypeKind::Object(o) if !o.name().is_empty() => return f.write_str(o.name()),
            TypeKind::Object(o) if !o.is_default() => {
                f.write_str("Object[")?;
                o.write_definition(f, true)?;
                return f.write_str("]");
            }
            TypeKind::TypeSet(ts) if !ts.is_default() => {
                f.write_str("TypeSet[")?;
                ts.write_definition(f)?;
                return f.write_str("]");
            }
            TypeKind::Reference(r) => return f.write_str(r.name()),
            _ => {}
        }
        f.write_str(self.name())?;
        let params = self.parameters();
        if params.is_empty() {
            return Ok(());
        }
        f.write_str("[")?;
        for (i, p) in params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", p)?;
        }
        f.write_str("]")
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type({})", self)
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Type) -> bool {
        self.equals(other, &mut crate::Guard::new())
    }
}

/// Write `key => ` with `key` bare when it is a simple lowercase word, as
/// used for the fixed keys of object and type-set definitions.
pub(crate) fn write_key(f: &mut fmt::Formatter<'_>, key: &str, bare: bool) -> fmt::Result {
    if bare {
        f.write_str(key)?;
    } else {
        write_quoted(f, key)?;
    }
    f.write_str(" => ")
}

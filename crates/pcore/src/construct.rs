//! Type constructors.
//!
//! [`parameterized`] builds a type from a kind name and the argument list
//! written inside its brackets, e.g. `Enum['a', 'b', true]`. Argument
//! mistakes are reported as illegal-argument errors naming the constructor,
//! the offending position and what was expected there.
//!
//! [`Type::construct`] is the other direction a type is used as a
//! constructor: creating a *value* of the type, either from an attribute
//! hash or from a single canonical payload.

use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use regex::Regex;

use crate::error::{PcoreError, Result};
use crate::loader::TypeResolver;
use crate::object::{ObjectType, ObjectValue, TypeSet};
use crate::parser::parse_type;
use crate::semver::SemVer;
use crate::types::{Type, TypeKind};
use crate::value::Value;

/// Build the built-in kind `name` from bracket arguments.
pub fn parameterized(name: &str, args: &[Value]) -> Result<Type> {
    match name {
        "Integer" => integer(args),
        "Float" => float(args),
        "String" => string(args),
        "Pattern" => pattern(args),
        "Enum" => enumeration(args),
        "Optional" => optional(args),
        "Variant" => Ok(Type::variant_of(types_of("Variant[]", args, 0)?)),
        "Tuple" => Ok(Type::tuple_of(types_of("Tuple[]", args, 0)?)),
        "Array" => array(args),
        "Hash" => hash(args),
        "Struct" => struct_type(args),
        "Type" => match args {
            [] => Ok(Type::type_type()),
            [Value::Type(t)] => Ok(Type::type_of(t.clone())),
            [v] => Err(PcoreError::illegal_argument("Type[]", 0, "Type", v)),
            _ => Err(PcoreError::illegal_count("Type[]", "0 - 1", args.len())),
        },
        "Object" => match args {
            [] => Ok(Type::object()),
            [Value::Hash(h)] => Ok(Type::new(TypeKind::Object(ObjectType::from_hash(h)?))),
            [v] => Err(PcoreError::illegal_argument("Object[]", 0, "Hash", v)),
            _ => Err(PcoreError::illegal_count("Object[]", "0 - 1", args.len())),
        },
        "TypeSet" => match args {
            [] => Ok(Type::type_set()),
            [Value::Hash(h)] => Ok(Type::new(TypeKind::TypeSet(TypeSet::from_hash(h)?))),
            [v] => Err(PcoreError::illegal_argument("TypeSet[]", 0, "Hash", v)),
            _ => Err(PcoreError::illegal_count("TypeSet[]", "0 - 1", args.len())),
        },
        _ => match Type::builtin(name) {
            Some(t) if args.is_empty() => Ok(t),
            Some(_) => Err(PcoreError::illegal_count(&format!("{}[]", name), "0", args.len())),
            None => Err(PcoreError::NotFound {
                name: name.to_string(),
            }),
        },
    }
}

fn integer(args: &[Value]) -> Result<Type> {
    const EXPECTED: &str = "Integer or Default";
    let bound = |i: usize, v: &Value, unbounded: i64| match v {
        Value::Integer(n) => Ok(*n),
        Value::Default => Ok(unbounded),
        v => Err(PcoreError::illegal_argument("Integer[]", i, EXPECTED, v)),
    };
    let (min, max) = match args {
        [] => (i64::MIN, i64::MAX),
        [a] => (bound(0, a, i64::MIN)?, i64::MAX),
        [a, b] => (bound(0, a, i64::MIN)?, bound(1, b, i64::MAX)?),
        _ => return Err(PcoreError::illegal_count("Integer[]", "0 - 2", args.len())),
    };
    if min > max {
        return Err(PcoreError::illegal_argument(
            "Integer[]",
            1,
            &format!("Integer >= {}", min),
            &Value::Integer(max),
        ));
    }
    Ok(Type::integer_range(min, max))
}

fn float(args: &[Value]) -> Result<Type> {
    const EXPECTED: &str = "Float, Integer or Default";
    let bound = |i: usize, v: &Value, unbounded: f64| match v {
        Value::Float(f) => Ok(*f),
        Value::Integer(n) => Ok(*n as f64),
        Value::Default => Ok(unbounded),
        v => Err(PcoreError::illegal_argument("Float[]", i, EXPECTED, v)),
    };
    let (min, max) = match args {
        [] => (f64::NEG_INFINITY, f64::INFINITY),
        [a] => (bound(0, a, f64::NEG_INFINITY)?, f64::INFINITY),
        [a, b] => (bound(0, a, f64::NEG_INFINITY)?, bound(1, b, f64::INFINITY)?),
        _ => return Err(PcoreError::illegal_count("Float[]", "0 - 2", args.len())),
    };
    if min > max {
        return Err(PcoreError::illegal_argument(
            "Float[]",
            1,
            &format!("Float >= {:?}", min),
            &Value::Float(max),
        ));
    }
    Ok(Type::float_range(min, max))
}

fn size_arg(type_name: &str, index: usize, v: &Value, unbounded: usize) -> Result<usize> {
    match v {
        Value::Integer(n) if *n >= 0 => Ok(*n as usize),
        Value::Default => Ok(unbounded),
        v => Err(PcoreError::illegal_argument(
            type_name,
            index,
            "Integer >= 0 or Default",
            v,
        )),
    }
}

fn string(args: &[Value]) -> Result<Type> {
    match args {
        [] => Ok(Type::string()),
        [Value::String(s)] => Ok(Type::constant_string(s.clone())),
        [min] => Ok(Type::string_sized(
            size_arg("String[]", 0, min, 0)?,
            usize::MAX,
        )),
        [min, max] => Ok(Type::string_sized(
            size_arg("String[]", 0, min, 0)?,
            size_arg("String[]", 1, max, usize::MAX)?,
        )),
        _ => Err(PcoreError::illegal_count("String[]", "0 - 2", args.len())),
    }
}

fn pattern(args: &[Value]) -> Result<Type> {
    let mut patterns = Vec::with_capacity(args.len());
    for (i, arg) in args.iter().enumerate() {
        let Value::String(source) = arg else {
            return Err(PcoreError::illegal_argument("Pattern[]", i, "String", arg));
        };
        let regex = Regex::new(source).map_err(|e| PcoreError::InvalidPattern {
            pattern: source.clone(),
            detail: e.to_string(),
        })?;
        patterns.push(regex);
    }
    Ok(Type::pattern_of(patterns))
}

/// Strings, or one array of strings, optionally followed by a boolean that
/// makes the enum case-insensitive.
fn enumeration(args: &[Value]) -> Result<Type> {
    let flattened: Vec<Value>;
    let args = match args {
        [] => return Ok(Type::enumeration()),
        [Value::String(s)] => return Ok(Type::enumeration_of([s.clone()], false)),
        [Value::Array(values)] => return enumeration(values),
        [other] => {
            return Err(PcoreError::illegal_argument(
                "Enum[]",
                0,
                "String or Array[String]",
                other,
            ))
        }
        [Value::Array(values), rest @ ..] => {
            flattened = values.iter().chain(rest).cloned().collect();
            if flattened.is_empty() {
                return Ok(Type::enumeration());
            }
            flattened.as_slice()
        }
        _ => args,
    };
    let last = args.len() - 1;
    let mut values = Vec::with_capacity(args.len());
    let mut case_insensitive = false;
    for (i, arg) in args.iter().enumerate() {
        match arg {
            Value::String(s) => values.push(s.clone()),
            Value::Boolean(b) if i == last => case_insensitive = *b,
            other => return Err(PcoreError::illegal_argument("Enum[]", i, "String", other)),
        }
    }
    Ok(Type::enumeration_of(values, case_insensitive))
}

/// A type, or a string that stands for the constant string type.
fn optional(args: &[Value]) -> Result<Type> {
    match args {
        [] => Ok(Type::optional()),
        [Value::Type(t)] => Ok(Type::optional_of(t.clone())),
        [Value::String(s)] => Ok(Type::optional_of(Type::constant_string(s.clone()))),
        [other] => Err(PcoreError::illegal_argument(
            "Optional[]",
            0,
            "Variant[Type,String]",
            other,
        )),
        _ => Err(PcoreError::illegal_count("Optional[]", "0 - 1", args.len())),
    }
}

fn types_of(type_name: &str, args: &[Value], offset: usize) -> Result<Vec<Type>> {
    args.iter()
        .enumerate()
        .map(|(i, v)| match v {
            Value::Type(t) => Ok(t.clone()),
            v => Err(PcoreError::illegal_argument(type_name, i + offset, "Type", v)),
        })
        .collect()
}

fn array(args: &[Value]) -> Result<Type> {
    const NAME: &str = "Array[]";
    let (element, sizes) = match args {
        [Value::Type(t), rest @ ..] => (t.clone(), rest),
        _ => (Type::any(), args),
    };
    let offset = args.len() - sizes.len();
    match sizes {
        [] => Ok(Type::array_of(element)),
        [min] => Ok(Type::array_sized(
            element,
            size_arg(NAME, offset, min, 0)?,
            usize::MAX,
        )),
        [min, max] => Ok(Type::array_sized(
            element,
            size_arg(NAME, offset, min, 0)?,
            size_arg(NAME, offset + 1, max, usize::MAX)?,
        )),
        _ => Err(PcoreError::illegal_count(NAME, "0 - 3", args.len())),
    }
}

fn hash(args: &[Value]) -> Result<Type> {
    const NAME: &str = "Hash[]";
    let key_value = |i: usize| match &args[i] {
        Value::Type(t) => Ok(t.clone()),
        v => Err(PcoreError::illegal_argument(NAME, i, "Type", v)),
    };
    match args.len() {
        0 => Ok(Type::hash()),
        2 => Ok(Type::hash_of(key_value(0)?, key_value(1)?)),
        3 => Ok(Type::hash_sized(
            key_value(0)?,
            key_value(1)?,
            size_arg(NAME, 2, &args[2], 0)?,
            usize::MAX,
        )),
        4 => Ok(Type::hash_sized(
            key_value(0)?,
            key_value(1)?,
            size_arg(NAME, 2, &args[2], 0)?,
            size_arg(NAME, 3, &args[3], usize::MAX)?,
        )),
        n => Err(PcoreError::illegal_count(NAME, "0, 2 - 4", n)),
    }
}

fn struct_type(args: &[Value]) -> Result<Type> {
    const NAME: &str = "Struct[]";
    match args {
        [] => Ok(Type::struct_type()),
        [Value::Hash(members)] => {
            let mut typed = Vec::with_capacity(members.len());
            for (key, value) in members.iter() {
                match value {
                    Value::Type(t) => typed.push((key.clone(), t.clone())),
                    v => {
                        return Err(PcoreError::illegal_argument(
                            NAME,
                            0,
                            "Hash[String, Type]",
                            v,
                        ))
                    }
                }
            }
            Ok(Type::struct_of(typed))
        }
        [v] => Err(PcoreError::illegal_argument(NAME, 0, "Hash[String, Type]", v)),
        _ => Err(PcoreError::illegal_count(NAME, "0 - 1", args.len())),
    }
}

/// Input for creating a value of a type.
#[derive(Debug, Clone)]
pub enum ConstructArgs {
    /// A single canonical payload, such as a version string or a type
    /// expression.
    Payload(Value),
    /// Named attribute values.
    Hash(IndexMap<String, Value>),
}

impl ConstructArgs {
    fn describe(&self) -> String {
        match self {
            ConstructArgs::Payload(v) => format!("payload {}", v.ptype().generic()),
            ConstructArgs::Hash(_) => "an attribute hash".to_string(),
        }
    }
}

impl Type {
    /// Create a value of this type.
    ///
    /// Object types take an attribute hash. `SemVer` and `Type` take their
    /// canonical string, the meta types `Pcore::ObjectType` and
    /// `Pcore::TypeSet` take an initialization hash, `Hash` takes a flat
    /// `[k1, v1, k2, v2, ...]` array, and `Default` takes an empty hash. Any
    /// other type accepts a payload that is already one of its instances.
    ///
    /// `resolver` resolves names met while parsing type expressions.
    pub fn construct(&self, args: ConstructArgs, resolver: &Arc<dyn TypeResolver>) -> Result<Value> {
        let t = self.deref();
        let no_constructor = |args: &ConstructArgs| PcoreError::NoConstructor {
            type_name: t.to_string(),
            input: args.describe(),
        };
        match (t.kind(), &args) {
            (TypeKind::Object(_), ConstructArgs::Hash(h)) => {
                Ok(Value::object(ObjectValue::create(&t, h)?))
            }
            (TypeKind::SemVer, ConstructArgs::Payload(Value::String(s))) => {
                Ok(Value::SemVer(SemVer::parse(s)?))
            }
            (TypeKind::Type(inner), ConstructArgs::Payload(Value::String(s))) => {
                let weak: Weak<dyn TypeResolver> = Arc::downgrade(resolver);
                let parsed = parse_type(s, Some(weak))?;
                if !inner.accepts_type(&parsed) {
                    return Err(PcoreError::TypeMismatch {
                        context: "Type payload".to_string(),
                        expected: inner.to_string(),
                        actual: parsed.to_string(),
                    });
                }
                Ok(Value::Type(parsed))
            }
            (TypeKind::Type(inner), ConstructArgs::Hash(h)) => match inner.kind() {
                TypeKind::Object(_) => Ok(Value::Type(Type::new(TypeKind::Object(
                    ObjectType::from_hash(h)?,
                )))),
                TypeKind::TypeSet(_) => Ok(Value::Type(Type::new(TypeKind::TypeSet(
                    TypeSet::from_hash(h)?,
                )))),
                _ => Err(no_constructor(&args)),
            },
            (TypeKind::Hash(_), ConstructArgs::Payload(Value::Array(flat))) => {
                if flat.len() % 2 != 0 {
                    return Err(PcoreError::illegal_argument(
                        "Hash",
                        0,
                        "an even number of elements",
                        &Value::Array(flat.clone()),
                    ));
                }
                let mut entries = IndexMap::with_capacity(flat.len() / 2);
                for pair in flat.chunks(2) {
                    let Value::String(key) = &pair[0] else {
                        return Err(PcoreError::illegal_argument("Hash", 0, "String keys", &pair[0]));
                    };
                    entries.insert(key.clone(), pair[1].clone());
                }
                let value = Value::hash(entries);
                if !t.accepts(&value) {
                    return Err(no_constructor(&args));
                }
                Ok(value)
            }
            (TypeKind::Default, ConstructArgs::Hash(h)) if h.is_empty() => Ok(Value::Default),
            (_, ConstructArgs::Payload(v)) if t.accepts(v) => Ok(v.clone()),
            _ => Err(no_constructor(&args)),
        }
    }
}

//! Equality, assignability and instance checks.
//!
//! Each kind has its own rule, selected by matching on the receiver's kind.
//! References are followed before comparing. Object types and type-sets are
//! the only kinds that can close a cycle, so they are the ones that enter the
//! [`Guard`]; a pair met again further down the same call chain is answered
//! optimistically.

use std::collections::HashSet;

use crate::object::{ObjectType, TypeSet};
use crate::types::{ArrayType, HashType, StringType, StructMember, Type, TypeKind};
use crate::value::Value;
use crate::Guard;

impl Type {
    /// Structural equality.
    pub fn equals(&self, other: &Type, guard: &mut Guard) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let (a, b) = (self.deref(), other.deref());
        if a.ptr_eq(&b) {
            return true;
        }
        match (a.kind(), b.kind()) {
            (TypeKind::Any, TypeKind::Any)
            | (TypeKind::Undef, TypeKind::Undef)
            | (TypeKind::Default, TypeKind::Default)
            | (TypeKind::Scalar, TypeKind::Scalar)
            | (TypeKind::Boolean, TypeKind::Boolean)
            | (TypeKind::Numeric, TypeKind::Numeric)
            | (TypeKind::SemVer, TypeKind::SemVer) => true,
            (TypeKind::Integer(x), TypeKind::Integer(y)) => x == y,
            (TypeKind::Float(x), TypeKind::Float(y)) => x == y,
            (TypeKind::String(x), TypeKind::String(y)) => x == y,
            (TypeKind::Pattern(x), TypeKind::Pattern(y)) => {
                x.patterns.len() == y.patterns.len()
                    && x
                        .patterns
                        .iter()
                        .all(|p| y.patterns.iter().any(|q| q.as_str() == p.as_str()))
            }
            (TypeKind::Enum(x), TypeKind::Enum(y)) => {
                x.is_case_insensitive() == y.is_case_insensitive()
                    && x.values().len() == y.values().len()
                    && x.values().iter().all(|v| y.values().contains(v))
            }
            (TypeKind::Optional(x), TypeKind::Optional(y)) | (TypeKind::Type(x), TypeKind::Type(y)) => {
                x.equals(y, guard)
            }
            (TypeKind::Variant(xs), TypeKind::Variant(ys)) => {
                xs.len() == ys.len() && xs.iter().all(|x| ys.iter().any(|y| x.equals(y, guard)))
            }
            (TypeKind::Tuple(xs), TypeKind::Tuple(ys)) => {
                xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| x.equals(y, guard))
            }
            (TypeKind::Array(x), TypeKind::Array(y)) => {
                x.min == y.min && x.max == y.max && x.element.equals(&y.element, guard)
            }
            (TypeKind::Hash(x), TypeKind::Hash(y)) => {
                x.min == y.min
                    && x.max == y.max
                    && x.key.equals(&y.key, guard)
                    && x.value.equals(&y.value, guard)
            }
            (TypeKind::Struct(xs), TypeKind::Struct(ys)) => {
                xs.len() == ys.len()
                    && xs.iter().all(|m| match ys.iter().find(|n| n.key == m.key) {
                        Some(n) => m.value.equals(&n.value, guard),
                        None => false,
                    })
            }
            (TypeKind::Object(x), TypeKind::Object(y)) => {
                guard.with(a.identity(), b.identity(), true, |g| object_equals(x, y, g))
            }
            (TypeKind::TypeSet(x), TypeKind::TypeSet(y)) => {
                guard.with(a.identity(), b.identity(), true, |g| type_set_equals(x, y, g))
            }
            (TypeKind::Reference(x), TypeKind::Reference(y)) => x.names(y.name()),
            _ => false,
        }
    }

    /// Whether every instance of `other` is an instance of `self`.
    pub fn is_assignable(&self, other: &Type, guard: &mut Guard) -> bool {
        if matches!(self.kind(), TypeKind::Any) {
            return true;
        }
        let (s, o) = (self.deref(), other.deref());
        if s.ptr_eq(&o) || matches!(s.kind(), TypeKind::Any) {
            return true;
        }
        // An unresolved name is only known to be itself.
        if let TypeKind::Reference(r) = o.kind() {
            return matches!(s.kind(), TypeKind::Reference(q) if q.names(r.name()));
        }
        match o.kind() {
            TypeKind::Variant(members) if !members.is_empty() => {
                return members.iter().all(|m| s.is_assignable(m, guard));
            }
            TypeKind::Optional(inner) => {
                return s.is_assignable(&Type::undef(), guard) && s.is_assignable(inner, guard);
            }
            _ => {}
        }
        match s.kind() {
            TypeKind::Any => true,
            TypeKind::Undef => matches!(o.kind(), TypeKind::Undef),
            TypeKind::Default => matches!(o.kind(), TypeKind::Default),
            TypeKind::Boolean => matches!(o.kind(), TypeKind::Boolean),
            TypeKind::SemVer => matches!(o.kind(), TypeKind::SemVer),
            TypeKind::Scalar => matches!(
                o.kind(),
                TypeKind::Scalar
                    | TypeKind::Boolean
                    | TypeKind::Numeric
                    | TypeKind::Integer(_)
                    | TypeKind::Float(_)
                    | TypeKind::String(_)
                    | TypeKind::Pattern(_)
                    | TypeKind::Enum(_)
                    | TypeKind::SemVer
            ),
            TypeKind::Numeric => matches!(
                o.kind(),
                TypeKind::Numeric | TypeKind::Integer(_) | TypeKind::Float(_)
            ),
            TypeKind::Integer(r) => match o.kind() {
                TypeKind::Integer(q) => r.min <= q.min && q.max <= r.max,
                _ => false,
            },
            TypeKind::Float(r) => match o.kind() {
                TypeKind::Float(q) => r.min <= q.min && q.max <= r.max,
                _ => false,
            },
            TypeKind::String(st) => string_assignable(st, &o),
            TypeKind::Pattern(p) => match o.kind() {
                _ if p.patterns.is_empty() => matches!(
                    o.kind(),
                    TypeKind::String(_) | TypeKind::Enum(_) | TypeKind::Pattern(_)
                ),
                TypeKind::String(StringType::Constant(c)) => {
                    p.patterns.iter().any(|r| r.is_match(c))
                }
                TypeKind::Enum(e) => {
                    !e.values().is_empty()
                        && e.values().iter().all(|v| p.patterns.iter().any(|r| r.is_match(v)))
                }
                TypeKind::Pattern(q) => {
                    !q.patterns.is_empty()
                        && q.patterns
                            .iter()
                            .all(|x| p.patterns.iter().any(|y| y.as_str() == x.as_str()))
                }
                _ => false,
            },
            TypeKind::Enum(e) => {
                if e.values().is_empty() {
                    return matches!(
                        o.kind(),
                        TypeKind::String(_) | TypeKind::Enum(_) | TypeKind::Pattern(_)
                    );
                }
                match o.kind() {
                    TypeKind::String(StringType::Constant(c)) => e.contains(c),
                    TypeKind::Enum(other) => {
                        !other.values().is_empty()
                            && (e.is_case_insensitive() || !other.is_case_insensitive())
                            && other.values().iter().all(|v| e.contains(v))
                    }
                    _ => false,
                }
            }
            TypeKind::Optional(inner) => {
                matches!(o.kind(), TypeKind::Undef) || inner.is_assignable(&o, guard)
            }
            TypeKind::Variant(members) => match o.kind() {
                TypeKind::Variant(others) if others.is_empty() => members.is_empty(),
                _ => members.iter().any(|m| m.is_assignable(&o, guard)),
            },
            TypeKind::Array(a) => array_assignable(a, &o, guard),
            TypeKind::Hash(h) => hash_assignable(h, &o, guard),
            TypeKind::Tuple(members) => tuple_assignable(members, &o, guard),
            TypeKind::Struct(members) => struct_assignable(members, &o, guard),
            TypeKind::Type(inner) => match o.kind() {
                TypeKind::Type(other) => inner.is_assignable(other, guard),
                _ => false,
            },
            TypeKind::Object(x) => match o.kind() {
                TypeKind::Object(_) if x.is_default() => true,
                TypeKind::Object(_) => guard.with(s.identity(), o.identity(), true, |g| {
                    descends_from(&o, &s, g) && attributes_compatible(x, &o, g)
                }),
                _ => false,
            },
            TypeKind::TypeSet(x) => match o.kind() {
                TypeKind::TypeSet(_) if x.is_default() => true,
                TypeKind::TypeSet(y) => guard.with(s.identity(), o.identity(), true, |g| {
                    x.name().eq_ignore_ascii_case(y.name())
                        && x.types().iter().all(|(short, member)| match y.get(short) {
                            Some(other) => member.is_assignable(other, g),
                            None => false,
                        })
                }),
                _ => false,
            },
            TypeKind::Reference(_) => false,
        }
    }

    /// Whether `value` is an instance of this type.
    pub fn is_instance(&self, value: &Value, guard: &mut Guard) -> bool {
        let s = self.deref();
        match s.kind() {
            TypeKind::Any => true,
            TypeKind::Undef => matches!(value, Value::Undef),
            TypeKind::Default => matches!(value, Value::Default),
            TypeKind::Boolean => matches!(value, Value::Boolean(_)),
            TypeKind::SemVer => matches!(value, Value::SemVer(_)),
            TypeKind::Scalar => matches!(
                value,
                Value::Boolean(_)
                    | Value::Integer(_)
                    | Value::Float(_)
                    | Value::String(_)
                    | Value::SemVer(_)
            ),
            TypeKind::Numeric => matches!(value, Value::Integer(_) | Value::Float(_)),
            TypeKind::Integer(r) => matches!(value, Value::Integer(i) if r.min <= *i && *i <= r.max),
            TypeKind::Float(r) => matches!(value, Value::Float(f) if r.min <= *f && *f <= r.max),
            TypeKind::String(StringType::Sized { min, max }) => match value {
                Value::String(v) => in_range(v.chars().count(), *min, *max),
                _ => false,
            },
            TypeKind::String(StringType::Constant(c)) => matches!(value, Value::String(v) if v == c),
            TypeKind::Pattern(p) => match value {
                Value::String(v) => {
                    p.patterns.is_empty() || p.patterns.iter().any(|r| r.is_match(v))
                }
                _ => false,
            },
            TypeKind::Enum(e) => matches!(value, Value::String(v) if e.contains(v)),
            TypeKind::Optional(inner) => value.is_undef() || inner.is_instance(value, guard),
            TypeKind::Variant(members) => members.iter().any(|m| m.is_instance(value, guard)),
            TypeKind::Array(a) => match value {
                Value::Array(xs) => {
                    in_range(xs.len(), a.min, a.max)
                        && xs.iter().all(|x| a.element.is_instance(x, guard))
                }
                _ => false,
            },
            TypeKind::Hash(h) => match value {
                Value::Hash(m) => {
                    in_range(m.len(), h.min, h.max)
                        && m.iter().all(|(k, v)| {
                            h.key.is_instance(&Value::String(k.clone()), guard)
                                && h.value.is_instance(v, guard)
                        })
                }
                _ => false,
            },
            TypeKind::Tuple(members) => match value {
                Value::Array(_) if members.is_empty() => true,
                Value::Array(xs) => {
                    xs.len() == members.len()
                        && members.iter().zip(xs.iter()).all(|(t, x)| t.is_instance(x, guard))
                }
                _ => false,
            },
            TypeKind::Struct(members) => match value {
                Value::Hash(_) if members.is_empty() => true,
                Value::Hash(m) => {
                    m.keys().all(|k| members.iter().any(|mem| mem.key == *k))
                        && members.iter().all(|mem| match m.get(&mem.key) {
                            Some(v) => mem.value.is_instance(v, guard),
                            None => mem.value.is_instance(&Value::Undef, guard),
                        })
                }
                _ => false,
            },
            TypeKind::Type(inner) => match value {
                Value::Type(t) => inner.is_assignable(t, guard),
                _ => false,
            },
            TypeKind::Object(_) => match value {
                Value::Object(o) => s.is_assignable(o.object_type(), guard),
                _ => false,
            },
            TypeKind::TypeSet(_) | TypeKind::Reference(_) => false,
        }
    }

    /// [`Type::is_assignable`] with a fresh guard.
    pub fn accepts_type(&self, other: &Type) -> bool {
        self.is_assignable(other, &mut Guard::new())
    }

    /// [`Type::is_instance`] with a fresh guard.
    pub fn accepts(&self, value: &Value) -> bool {
        self.is_instance(value, &mut Guard::new())
    }
}

fn in_range(n: usize, min: usize, max: usize) -> bool {
    min <= n && n <= max
}

fn string_assignable(st: &StringType, o: &Type) -> bool {
    match st {
        StringType::Constant(c) => match o.kind() {
            TypeKind::String(StringType::Constant(d)) => c == d,
            TypeKind::Enum(e) => {
                !e.is_case_insensitive() && e.values().len() == 1 && e.values()[0] == *c
            }
            _ => false,
        },
        StringType::Sized { min, max } => {
            let unbounded = *min == 0 && *max == usize::MAX;
            match o.kind() {
                TypeKind::String(StringType::Sized { min: a, max: b }) => min <= a && b <= max,
                TypeKind::String(StringType::Constant(c)) => in_range(c.chars().count(), *min, *max),
                TypeKind::Enum(e) if e.values().is_empty() => unbounded,
                TypeKind::Enum(e) => e
                    .values()
                    .iter()
                    .all(|v| in_range(v.chars().count(), *min, *max)),
                TypeKind::Pattern(_) => unbounded,
                _ => false,
            }
        }
    }
}

fn array_assignable(a: &ArrayType, o: &Type, guard: &mut Guard) -> bool {
    match o.kind() {
        TypeKind::Array(b) => {
            a.min <= b.min
                && b.max <= a.max
                && (b.max == 0 || a.element.is_assignable(&b.element, guard))
        }
        TypeKind::Tuple(members) if members.is_empty() => {
            a.min == 0 && a.max == usize::MAX && a.element.is_assignable(&Type::any(), guard)
        }
        TypeKind::Tuple(members) => {
            in_range(members.len(), a.min, a.max)
                && members.iter().all(|m| a.element.is_assignable(m, guard))
        }
        _ => false,
    }
}

fn hash_assignable(h: &HashType, o: &Type, guard: &mut Guard) -> bool {
    match o.kind() {
        TypeKind::Hash(k) => {
            h.min <= k.min
                && k.max <= h.max
                && (k.max == 0
                    || (h.key.is_assignable(&k.key, guard) && h.value.is_assignable(&k.value, guard)))
        }
        TypeKind::Struct(members) if members.is_empty() => {
            h.min == 0
                && h.max == usize::MAX
                && h.key.is_assignable(&Type::string(), guard)
                && h.value.is_assignable(&Type::any(), guard)
        }
        TypeKind::Struct(members) => {
            let required = members
                .iter()
                .filter(|m| !m.value.is_instance(&Value::Undef, guard))
                .count();
            h.min <= required
                && members.len() <= h.max
                && members.iter().all(|m| {
                    h.key.is_instance(&Value::String(m.key.clone()), guard)
                        && h.value.is_assignable(&m.value, guard)
                })
        }
        _ => false,
    }
}

fn tuple_assignable(members: &[Type], o: &Type, guard: &mut Guard) -> bool {
    if members.is_empty() {
        return matches!(o.kind(), TypeKind::Array(_) | TypeKind::Tuple(_));
    }
    match o.kind() {
        TypeKind::Tuple(others) => {
            members.len() == others.len()
                && members.iter().zip(others).all(|(m, x)| m.is_assignable(x, guard))
        }
        TypeKind::Array(b) => {
            b.min == members.len()
                && b.max == members.len()
                && members.iter().all(|m| m.is_assignable(&b.element, guard))
        }
        _ => false,
    }
}

fn struct_assignable(members: &[StructMember], o: &Type, guard: &mut Guard) -> bool {
    if members.is_empty() {
        return matches!(o.kind(), TypeKind::Hash(_) | TypeKind::Struct(_));
    }
    match o.kind() {
        TypeKind::Struct(others) => {
            others.iter().all(|n| members.iter().any(|m| m.key == n.key))
                && members.iter().all(|m| match others.iter().find(|n| n.key == m.key) {
                    Some(n) => m.value.is_assignable(&n.value, guard),
                    None => m.value.is_instance(&Value::Undef, guard),
                })
        }
        TypeKind::Hash(k) if k.max == 0 => members
            .iter()
            .all(|m| m.value.is_instance(&Value::Undef, guard)),
        _ => false,
    }
}

/// Whether `ancestor` is `descendant` or one of its parents.
fn descends_from(descendant: &Type, ancestor: &Type, guard: &mut Guard) -> bool {
    let mut seen = HashSet::new();
    let mut current = Some(descendant.clone());
    while let Some(t) = current {
        if !seen.insert(t.identity()) {
            return false;
        }
        if t.ptr_eq(ancestor) || t.equals(ancestor, guard) {
            return true;
        }
        current = t.as_object().and_then(ObjectType::parent);
    }
    false
}

/// Every attribute of `sup` exists in `sub` with an assignable type.
fn attributes_compatible(sup: &ObjectType, sub: &Type, guard: &mut Guard) -> bool {
    let Some(sub) = sub.as_object() else {
        return false;
    };
    let sub_attrs = sub.all_attributes();
    sup.all_attributes().iter().all(|a| {
        sub_attrs
            .iter()
            .find(|b| b.name == a.name)
            .is_some_and(|b| a.ty.is_assignable(&b.ty, guard))
    })
}

fn object_equals(x: &ObjectType, y: &ObjectType, guard: &mut Guard) -> bool {
    if !x.name().eq_ignore_ascii_case(y.name()) {
        return false;
    }
    let parents_equal = match (x.declared_parent(), y.declared_parent()) {
        (None, None) => true,
        (Some(p), Some(q)) => p.equals(q, guard),
        _ => false,
    };
    if !parents_equal {
        return false;
    }
    let (xs, ys): (Vec<_>, Vec<_>) = (x.own_attributes().collect(), y.own_attributes().collect());
    xs.len() == ys.len()
        && xs.iter().zip(ys.iter()).all(|(a, b)| {
            a.name == b.name
                && a.ty.equals(&b.ty, guard)
                && match (&a.value, &b.value) {
                    (None, None) => true,
                    (Some(v), Some(w)) => v.equals(w, guard),
                    _ => false,
                }
        })
}

fn type_set_equals(x: &TypeSet, y: &TypeSet, guard: &mut Guard) -> bool {
    x.name().eq_ignore_ascii_case(y.name())
        && x.name_authority() == y.name_authority()
        && x.version() == y.version()
        && x.types().len() == y.types().len()
        && x.types().iter().all(|(short, t)| match y.get(short) {
            Some(u) => t.equals(u, guard),
            None => false,
        })
}

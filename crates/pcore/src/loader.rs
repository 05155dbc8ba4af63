//! Type resolution by name.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::error::{PcoreError, Result};
use crate::parser::parse_type;
use crate::types::Type;

/// Resolves qualified type names. Implemented by [`Loader`]; callers of the
/// deserializer may supply their own.
pub trait TypeResolver: Send + Sync {
    fn resolve(&self, name: &str) -> Result<Type>;
}

/// A thread-safe registry of named types on top of the built-ins.
///
/// Names compare case-insensitively. Members of a registered type-set are
/// reachable under their qualified names.
pub struct Loader {
    this: Weak<Loader>,
    types: RwLock<HashMap<String, Type>>,
}

impl Loader {
    pub fn new() -> Arc<Loader> {
        Arc::new_cyclic(|this| Loader {
            this: this.clone(),
            types: RwLock::new(HashMap::new()),
        })
    }

    /// A weak handle suitable for lazily resolved references.
    pub fn resolver(&self) -> Weak<dyn TypeResolver> {
        let weak: Weak<dyn TypeResolver> = self.this.clone();
        weak
    }

    /// Register a named type. A later registration under the same name
    /// replaces the earlier one.
    pub fn add_type(&self, ty: Type) -> Result<()> {
        let name = ty.name().to_string();
        if name.is_empty() || Type::builtin(&name).is_some() {
            return Err(PcoreError::TypeMismatch {
                context: "Loader::add_type".to_string(),
                expected: "a named, non built-in type".to_string(),
                actual: ty.to_string(),
            });
        }
        tracing::debug!(%name, "registering type");
        self.types.write().insert(name.to_lowercase(), ty);
        Ok(())
    }

    /// Register a type-set and each of its members.
    pub fn add_type_set(&self, ty: Type) -> Result<()> {
        let Some(set) = ty.as_type_set() else {
            return Err(PcoreError::TypeMismatch {
                context: "Loader::add_type_set".to_string(),
                expected: "TypeSet".to_string(),
                actual: ty.to_string(),
            });
        };
        let members: Vec<Type> = set.types().values().cloned().collect();
        self.add_type(ty.clone())?;
        for member in members {
            self.add_type(member)?;
        }
        Ok(())
    }

    /// Parse a type expression, resolving names against this loader.
    pub fn parse_type(&self, expr: &str) -> Result<Type> {
        parse_type(expr, Some(self.resolver()))
    }

    pub fn len(&self) -> usize {
        self.types.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.read().is_empty()
    }
}

impl TypeResolver for Loader {
    fn resolve(&self, name: &str) -> Result<Type> {
        if let Some(t) = Type::builtin(name) {
            return Ok(t);
        }
        match self.types.read().get(&name.to_lowercase()) {
            Some(t) => Ok(t.clone()),
            None => {
                tracing::debug!(%name, "type not found");
                Err(PcoreError::NotFound {
                    name: name.to_string(),
                })
            }
        }
    }
}

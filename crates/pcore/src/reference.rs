//! Lazily resolved type names.

use std::fmt;
use std::sync::{OnceLock, Weak};

use crate::loader::TypeResolver;
use crate::types::Type;

/// A type known only by name until first use.
///
/// Resolution is write-once and idempotent: concurrent callers may each ask
/// the resolver, but only the first result is stored and all callers observe
/// that stored value. No lock is held while resolving.
pub struct TypeReference {
    name: String,
    resolver: Option<Weak<dyn TypeResolver>>,
    resolved: OnceLock<Type>,
}

impl TypeReference {
    pub fn new(name: impl Into<String>, resolver: Option<Weak<dyn TypeResolver>>) -> Self {
        TypeReference {
            name: name.into(),
            resolver,
            resolved: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this reference names `other`, ignoring case.
    pub fn names(&self, other: &str) -> bool {
        self.name.eq_ignore_ascii_case(other)
    }

    /// The target type, resolving it on first use. Returns `None` when no
    /// resolver is attached or the name is unknown.
    pub fn resolved(&self) -> Option<Type> {
        if let Some(t) = self.resolved.get() {
            return Some(t.clone());
        }
        let resolver = self.resolver.as_ref()?.upgrade()?;
        match resolver.resolve(&self.name) {
            Ok(t) => {
                tracing::trace!(name = %self.name, "resolved type reference");
                Some(self.resolved.get_or_init(|| t).clone())
            }
            Err(err) => {
                tracing::debug!(name = %self.name, %err, "type reference left unresolved");
                None
            }
        }
    }

    /// Bind the reference to `target` unless it is already bound. Used by
    /// type-sets to wire references between their own members.
    pub fn bind(&self, target: Type) {
        let _ = self.resolved.set(target);
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }
}

impl fmt::Debug for TypeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeReference")
            .field("name", &self.name)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

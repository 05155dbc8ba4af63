//! # pcore
//!
//! The Pcore runtime type system: a closed set of type kinds, the values they
//! describe, and the algorithms that decide equality, assignability and
//! instance membership between them.
//!
//! Types and values may be self-referential (object types whose attributes
//! name each other, object instances with back-pointers). Every recursive
//! check threads a [`Guard`] so it terminates on cyclic graphs.
//!
//! ## Quick start
//!
//! ```rust
//! use pcore::{Loader, Value};
//!
//! let loader = Loader::new();
//! let t = loader.parse_type("Optional[Enum['tcp', 'udp', true]]").unwrap();
//! assert!(t.accepts(&Value::Undef));
//! assert!(t.accepts(&Value::from("TCP")));
//! assert!(!t.accepts(&Value::from(22)));
//! assert_eq!(t.to_string(), "Optional[Enum['tcp', 'udp', true]]");
//! ```
//!
//! ## Modules
//!
//! - [`types`] — `Type` handle, the `TypeKind` variants and their canonical form
//! - [`assignable`] — equality, assignability and instance checks
//! - [`construct`] — building types from arguments and values from types
//! - [`parser`] — canonical string form → `Type`
//! - [`object`] — object types, object instances and type-sets
//! - [`value`] — runtime values
//! - [`loader`] — name resolution (`TypeResolver`, `Loader`)
//! - [`context`] — evaluation context with `fork` and `spawn`
//! - [`reflect`] — native Rust structs as object values
//! - [`issue`] — reportable diagnostics
//! - [`error`] — error types

pub mod assignable;
pub mod construct;
pub mod context;
pub mod error;
pub mod guard;
pub mod issue;
pub mod loader;
pub mod object;
pub mod parser;
pub mod reference;
pub mod reflect;
pub mod semver;
pub mod types;
pub mod value;

pub use construct::{parameterized, ConstructArgs};
pub use context::Context;
pub use error::{PcoreError, Result};
pub use guard::Guard;
pub use issue::{IssueCode, Location, Reported, Severity};
pub use loader::{Loader, TypeResolver};
pub use object::{Attribute, ObjectType, ObjectValue, TypeSet};
pub use parser::parse_type;
pub use semver::SemVer;
pub use types::{Type, TypeKind};
pub use value::Value;

//! # rich-data
//!
//! Serialization of Pcore values that keeps their types. Values are turned
//! into a wire-neutral token stream; object instances, types and versions
//! are tagged with `__ptype`, and an instance met a second time is replaced
//! by `{"__pref": n}`, so shared and cyclic graphs survive the trip.
//!
//! ## Quick start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use pcore::{Loader, SemVer, TypeResolver, Value};
//! use rich_data::{decode, encode, Options};
//!
//! let v = Value::SemVer(SemVer::new(1, 0, 0));
//! let json = encode(&v, Options::default()).unwrap();
//! assert_eq!(json, r#"{"__ptype":"SemVer","__pvalue":"1.0.0"}"#);
//!
//! let loader = Loader::new();
//! let resolver: Arc<dyn TypeResolver> = loader.clone();
//! assert_eq!(decode(&json, resolver).unwrap(), v);
//! ```
//!
//! ## Modules
//!
//! - [`consumer`] — the token stream (`ValueConsumer`, `Token`, `TokenRecorder`)
//! - [`serializer`] — value graph → tokens
//! - [`deserializer`] — tokens → value graph, with type resolution
//! - [`collector`] — tokens → plain data, without type resolution
//! - [`json`] — JSON writer and reader for the token stream
//! - [`tracker`] — identity-keyed sequence numbers
//! - [`options`] — conversion flags
//! - [`error`] — error types

pub mod collector;
pub mod consumer;
pub mod deserializer;
pub mod error;
pub mod json;
pub mod options;
pub mod serializer;
pub mod tracker;

pub use collector::Collector;
pub use consumer::{replay, Token, TokenRecorder, ValueConsumer};
pub use deserializer::Deserializer;
pub use error::{Result, RichDataError};
pub use json::{decode, encode, json_to_data, JsonStreamer};
pub use options::Options;
pub use serializer::Serializer;
pub use tracker::RefTracker;

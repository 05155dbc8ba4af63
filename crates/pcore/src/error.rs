//! Error types for type construction, resolution and instance creation.

use indexmap::IndexMap;
use thiserror::Error;

use crate::issue::{self, IssueCode, Location, Reported, Severity};

/// Errors raised by the type system.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PcoreError {
    /// A parameterized type was given an argument of the wrong kind.
    #[error("{type_name} expected argument {index} to be {expected}, got {actual}")]
    IllegalArgumentType {
        type_name: String,
        index: usize,
        expected: String,
        /// Canonical string form of the offending value.
        actual: String,
    },

    /// A parameterized type was given the wrong number of arguments.
    #[error("{type_name} expects {expected} arguments, got {actual}")]
    IllegalArgumentCount {
        type_name: String,
        expected: String,
        actual: usize,
    },

    /// A value did not conform to the type it was assigned to.
    #[error("{context} expects a value of type {expected}, got {actual}")]
    TypeMismatch {
        context: String,
        expected: String,
        actual: String,
    },

    /// An object was created without a required attribute.
    #[error("{type_name} is missing required attribute '{attribute}'")]
    MissingAttribute { type_name: String, attribute: String },

    /// An object was created with an attribute its type does not declare.
    #[error("{type_name} has no attribute named '{attribute}'")]
    UnknownAttribute { type_name: String, attribute: String },

    /// A type name could not be resolved.
    #[error("type '{name}' not found")]
    NotFound { name: String },

    /// A type expression could not be parsed.
    #[error("syntax error in type expression at offset {offset}: {message} (in '{expr}')")]
    Parse {
        expr: String,
        offset: usize,
        message: String,
    },

    /// A string was not a valid semantic version.
    #[error("'{0}' is not a valid semantic version")]
    InvalidSemVer(String),

    /// A pattern string was not a valid regular expression.
    #[error("invalid regular expression '{pattern}': {detail}")]
    InvalidPattern { pattern: String, detail: String },

    /// The type has no constructor for the given kind of input.
    #[error("{type_name} cannot be created from {input}")]
    NoConstructor { type_name: String, input: String },

    /// Conversion to or from a native structure failed.
    #[error("reflection of {type_name} failed: {detail}")]
    Reflection { type_name: String, detail: String },
}

impl PcoreError {
    /// Shorthand for the most common constructor failure.
    pub fn illegal_argument(
        type_name: &str,
        index: usize,
        expected: &str,
        actual: &crate::Value,
    ) -> Self {
        PcoreError::IllegalArgumentType {
            type_name: type_name.to_string(),
            index,
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    pub fn illegal_count(type_name: &str, expected: &str, actual: usize) -> Self {
        PcoreError::IllegalArgumentCount {
            type_name: type_name.to_string(),
            expected: expected.to_string(),
            actual,
        }
    }

    /// The issue code this error is reported under.
    pub fn issue_code(&self) -> IssueCode {
        match self {
            PcoreError::IllegalArgumentType { .. } => issue::ILLEGAL_ARGUMENT_TYPE,
            PcoreError::IllegalArgumentCount { .. } => issue::ILLEGAL_ARGUMENT_COUNT,
            PcoreError::TypeMismatch { .. } => issue::TYPE_MISMATCH,
            PcoreError::MissingAttribute { .. } => issue::MISSING_ATTRIBUTE,
            PcoreError::UnknownAttribute { .. } => issue::UNKNOWN_ATTRIBUTE,
            PcoreError::NotFound { .. } => issue::UNRESOLVED_TYPE,
            PcoreError::Parse { .. } => issue::PARSE_ERROR,
            PcoreError::InvalidSemVer(_) => issue::INVALID_VERSION,
            PcoreError::InvalidPattern { .. } => issue::INVALID_PATTERN,
            PcoreError::NoConstructor { .. } => issue::NO_CONSTRUCTOR,
            PcoreError::Reflection { .. } => issue::REFLECTION_FAILED,
        }
    }

    /// Structured arguments matching the issue code's message template.
    pub fn issue_args(&self) -> IndexMap<String, String> {
        let mut args = IndexMap::new();
        let mut put = |k: &str, v: String| {
            args.insert(k.to_string(), v);
        };
        match self {
            PcoreError::IllegalArgumentType {
                type_name,
                index,
                expected,
                actual,
            } => {
                put("type_name", type_name.clone());
                put("index", index.to_string());
                put("expected", expected.clone());
                put("actual", actual.clone());
            }
            PcoreError::IllegalArgumentCount {
                type_name,
                expected,
                actual,
            } => {
                put("type_name", type_name.clone());
                put("expected", expected.clone());
                put("actual", actual.to_string());
            }
            PcoreError::TypeMismatch {
                context,
                expected,
                actual,
            } => {
                put("context", context.clone());
                put("expected", expected.clone());
                put("actual", actual.clone());
            }
            PcoreError::MissingAttribute {
                type_name,
                attribute,
            }
            | PcoreError::UnknownAttribute {
                type_name,
                attribute,
            } => {
                put("type_name", type_name.clone());
                put("attribute", attribute.clone());
            }
            PcoreError::NotFound { name } => put("name", name.clone()),
            PcoreError::Parse {
                expr,
                offset,
                message,
            } => {
                put("expr", expr.clone());
                put("offset", offset.to_string());
                put("message", message.clone());
            }
            PcoreError::InvalidSemVer(s) => put("version", s.clone()),
            PcoreError::InvalidPattern { pattern, detail } => {
                put("pattern", pattern.clone());
                put("detail", detail.clone());
            }
            PcoreError::NoConstructor { type_name, input } => {
                put("type_name", type_name.clone());
                put("input", input.clone());
            }
            PcoreError::Reflection { type_name, detail } => {
                put("type_name", type_name.clone());
                put("detail", detail.clone());
            }
        }
        args
    }

    /// Render this error as a reportable diagnostic.
    pub fn to_reported(&self, location: Option<Location>) -> Reported {
        Reported::new(
            self.issue_code(),
            Severity::Error,
            location,
            self.issue_args(),
        )
    }
}

/// Convenience alias used throughout pcore.
pub type Result<T> = std::result::Result<T, PcoreError>;

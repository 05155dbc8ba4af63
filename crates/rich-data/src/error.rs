//! Error types for rich-data serialization and deserialization.

use indexmap::IndexMap;
use pcore::issue::{self, IssueCode, Location, Reported, Severity};
use pcore::PcoreError;
use thiserror::Error;

/// Errors that can occur while converting values to or from rich data.
#[derive(Error, Debug)]
pub enum RichDataError {
    /// The input was not valid JSON. `path` names the source.
    #[error("bad JSON in {path}: {detail}")]
    BadJson { path: String, detail: String },

    /// The token stream was well formed but did not describe a value:
    /// unknown `__ptype`, dangling `__pref`, malformed payload.
    /// `pointer` locates the offending node (JSON pointer syntax).
    #[error("bad data at {}: {detail}", pointer_or_root(.pointer))]
    BadData {
        path: Option<String>,
        pointer: String,
        detail: String,
    },

    /// A value kind that the target cannot represent.
    #[error("unable to serialize value of type {type_name}")]
    Unsupported { type_name: String },

    /// A cyclic object graph met in bare-data mode.
    #[error("value graph contains a cycle through {type_name}; rich data is required to serialize it")]
    Cycle { type_name: String },

    #[error(transparent)]
    Pcore(#[from] PcoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn pointer_or_root(pointer: &str) -> &str {
    if pointer.is_empty() {
        "/"
    } else {
        pointer
    }
}

impl RichDataError {
    pub fn issue_code(&self) -> IssueCode {
        match self {
            RichDataError::BadJson { .. } => issue::BAD_JSON,
            RichDataError::BadData { .. } => issue::BAD_DATA,
            RichDataError::Unsupported { .. } => issue::UNSUPPORTED_VALUE,
            RichDataError::Cycle { .. } => issue::CYCLIC_VALUE,
            RichDataError::Pcore(e) => e.issue_code(),
            RichDataError::Io(_) => issue::IO_ERROR,
        }
    }

    /// Render this error as a reportable diagnostic. Bad data carries its
    /// own location.
    pub fn to_reported(&self) -> Reported {
        let mut args = IndexMap::new();
        let mut location = None;
        match self {
            RichDataError::BadJson { path, detail } => {
                args.insert("path".to_string(), path.clone());
                args.insert("detail".to_string(), detail.clone());
                location = Some(Location::new(Some(path.as_str()), ""));
            }
            RichDataError::BadData {
                path,
                pointer,
                detail,
            } => {
                args.insert("pointer".to_string(), pointer_or_root(pointer).to_string());
                args.insert("detail".to_string(), detail.clone());
                location = Some(Location::new(path.as_deref(), pointer.clone()));
            }
            RichDataError::Unsupported { type_name } | RichDataError::Cycle { type_name } => {
                args.insert("type_name".to_string(), type_name.clone());
            }
            RichDataError::Pcore(e) => return e.to_reported(None),
            RichDataError::Io(e) => {
                args.insert("detail".to_string(), e.to_string());
            }
        }
        Reported::new(self.issue_code(), Severity::Error, location, args)
    }
}

/// Convenience alias used throughout rich-data.
pub type Result<T> = std::result::Result<T, RichDataError>;

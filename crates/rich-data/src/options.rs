//! Conversion options.

use pcore::{PcoreError, Type, Value};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Flags that control a serializer or deserializer.
///
/// Readable from JSON (`{"rich_data": false}`) and from a pcore hash such as
/// `{'type_by_reference' => false}`. Missing keys keep their defaults;
/// unknown keys are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    /// Tag values with `__ptype` and deduplicate with `__pref`. When off,
    /// objects become plain hashes and types become strings.
    pub rich_data: bool,
    /// Let Type values take part in `__pref` deduplication.
    pub type_by_reference: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            rich_data: true,
            type_by_reference: true,
        }
    }
}

impl Options {
    /// Plain data: no tags, no references.
    pub fn bare() -> Self {
        Options {
            rich_data: false,
            ..Options::default()
        }
    }

    /// The type a pcore options hash must conform to.
    pub fn ptype() -> Type {
        Type::struct_of([
            ("rich_data", Type::optional_of(Type::boolean())),
            ("type_by_reference", Type::optional_of(Type::boolean())),
        ])
    }

    /// Read options from a pcore value. `undef` gives the defaults.
    pub fn from_value(value: &Value) -> Result<Options> {
        let mut options = Options::default();
        let Value::Hash(entries) = value else {
            if value.is_undef() {
                return Ok(options);
            }
            return Err(mismatch(value).into());
        };
        if !Options::ptype().accepts(value) {
            return Err(mismatch(value).into());
        }
        if let Some(Value::Boolean(b)) = entries.get("rich_data") {
            options.rich_data = *b;
        }
        if let Some(Value::Boolean(b)) = entries.get("type_by_reference") {
            options.type_by_reference = *b;
        }
        Ok(options)
    }
}

fn mismatch(value: &Value) -> PcoreError {
    PcoreError::TypeMismatch {
        context: "rich data options".to_string(),
        expected: Options::ptype().to_string(),
        actual: value.ptype().generic().to_string(),
    }
}

//! Reportable diagnostics.
//!
//! An issue is identified by a code and carries a message template with
//! `%{name}` placeholders. A [`Reported`] binds an issue to a location and a
//! structured argument map, renders the message, and can log itself at its
//! severity through `tracing`.

use std::fmt;

use indexmap::IndexMap;

/// A stable issue identifier paired with its message template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IssueCode {
    pub code: &'static str,
    pub template: &'static str,
}

impl IssueCode {
    /// Substitute `%{key}` placeholders with values from `args`.
    /// Unknown placeholders are left as written.
    pub fn format(&self, args: &IndexMap<String, String>) -> String {
        let mut out = String::with_capacity(self.template.len() + 32);
        let mut rest = self.template;
        while let Some(start) = rest.find("%{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find('}') {
                Some(end) => {
                    let key = &after[..end];
                    match args.get(key) {
                        Some(v) => out.push_str(v),
                        None => out.push_str(&rest[start..start + 3 + end]),
                    }
                    rest = &after[end + 1..];
                }
                None => {
                    out.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code)
    }
}

pub const ILLEGAL_ARGUMENT_TYPE: IssueCode = IssueCode {
    code: "PCORE_ILLEGAL_ARGUMENT_TYPE",
    template: "%{type_name} expected argument %{index} to be %{expected}, got %{actual}",
};
pub const ILLEGAL_ARGUMENT_COUNT: IssueCode = IssueCode {
    code: "PCORE_ILLEGAL_ARGUMENT_COUNT",
    template: "%{type_name} expects %{expected} arguments, got %{actual}",
};
pub const TYPE_MISMATCH: IssueCode = IssueCode {
    code: "PCORE_TYPE_MISMATCH",
    template: "%{context} expects a value of type %{expected}, got %{actual}",
};
pub const MISSING_ATTRIBUTE: IssueCode = IssueCode {
    code: "PCORE_MISSING_ATTRIBUTE",
    template: "%{type_name} is missing required attribute '%{attribute}'",
};
pub const UNKNOWN_ATTRIBUTE: IssueCode = IssueCode {
    code: "PCORE_UNKNOWN_ATTRIBUTE",
    template: "%{type_name} has no attribute named '%{attribute}'",
};
pub const UNRESOLVED_TYPE: IssueCode = IssueCode {
    code: "PCORE_UNRESOLVED_TYPE",
    template: "type '%{name}' not found",
};
pub const PARSE_ERROR: IssueCode = IssueCode {
    code: "PCORE_PARSE_ERROR",
    template: "syntax error in type expression at offset %{offset}: %{message} (in '%{expr}')",
};
pub const INVALID_VERSION: IssueCode = IssueCode {
    code: "PCORE_INVALID_VERSION",
    template: "'%{version}' is not a valid semantic version",
};
pub const INVALID_PATTERN: IssueCode = IssueCode {
    code: "PCORE_INVALID_PATTERN",
    template: "invalid regular expression '%{pattern}': %{detail}",
};
pub const NO_CONSTRUCTOR: IssueCode = IssueCode {
    code: "PCORE_NO_CONSTRUCTOR",
    template: "%{type_name} cannot be created from %{input}",
};
pub const REFLECTION_FAILED: IssueCode = IssueCode {
    code: "PCORE_REFLECTION_FAILED",
    template: "reflection of %{type_name} failed: %{detail}",
};
pub const BAD_JSON: IssueCode = IssueCode {
    code: "PCORE_BAD_JSON",
    template: "bad JSON in %{path}: %{detail}",
};
pub const BAD_DATA: IssueCode = IssueCode {
    code: "PCORE_BAD_DATA",
    template: "bad data at %{pointer}: %{detail}",
};
pub const UNSUPPORTED_VALUE: IssueCode = IssueCode {
    code: "PCORE_UNSUPPORTED_VALUE",
    template: "unable to serialize value of type %{type_name}",
};
pub const CYCLIC_VALUE: IssueCode = IssueCode {
    code: "PCORE_CYCLIC_VALUE",
    template: "value graph contains a cycle through %{type_name}; rich data is required to serialize it",
};
pub const IO_ERROR: IssueCode = IssueCode {
    code: "PCORE_IO_ERROR",
    template: "I/O error: %{detail}",
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Ignore,
    Deprecation,
    Warning,
    Error,
}

/// Where an issue was detected. `path` names the source (a file or stream),
/// `pointer` the position inside the value (JSON pointer syntax).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    pub path: Option<String>,
    pub pointer: String,
}

impl Location {
    pub fn new(path: Option<&str>, pointer: impl Into<String>) -> Self {
        Location {
            path: path.map(str::to_string),
            pointer: pointer.into(),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) if self.pointer.is_empty() => f.write_str(path),
            Some(path) => write!(f, "{}#{}", path, self.pointer),
            None => f.write_str(&self.pointer),
        }
    }
}

/// An issue bound to a location and arguments, ready to be shown or logged.
#[derive(Debug, Clone, PartialEq)]
pub struct Reported {
    pub code: IssueCode,
    pub severity: Severity,
    pub location: Option<Location>,
    pub args: IndexMap<String, String>,
}

impl Reported {
    pub fn new(
        code: IssueCode,
        severity: Severity,
        location: Option<Location>,
        args: IndexMap<String, String>,
    ) -> Self {
        Reported {
            code,
            severity,
            location,
            args,
        }
    }

    pub fn message(&self) -> String {
        self.code.format(&self.args)
    }

    /// Log this issue at its severity. `Ignore` is dropped.
    pub fn log(&self) {
        let message = self.message();
        let location = self
            .location
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();
        match self.severity {
            Severity::Error => {
                tracing::error!(code = self.code.code, %location, "{}", message)
            }
            Severity::Warning => {
                tracing::warn!(code = self.code.code, %location, "{}", message)
            }
            Severity::Deprecation => {
                tracing::info!(code = self.code.code, %location, "deprecated: {}", message)
            }
            Severity::Ignore => {}
        }
    }
}

impl fmt::Display for Reported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(loc) => write!(f, "{} ({})", self.message(), loc),
            None => f.write_str(&self.message()),
        }
    }
}

impl std::error::Error for Reported {}

//! Semantic version values.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{PcoreError, Result};

/// A semantic version `major.minor.patch[-pre][+build]`.
///
/// Ordering follows version precedence: a version with a pre-release sorts
/// before the same version without one. Build metadata has no precedence;
/// [`Ord`] compares it last only so that ordering agrees with equality.
/// Use [`SemVer::cmp_precedence`] to compare by precedence alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SemVer {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre: Vec<String>,
    pub build: Vec<String>,
}

impl SemVer {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        SemVer {
            major,
            minor,
            patch,
            pre: Vec::new(),
            build: Vec::new(),
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || PcoreError::InvalidSemVer(s.to_string());
        let (rest, build) = match s.split_once('+') {
            Some((r, b)) => (r, split_identifiers(b).ok_or_else(invalid)?),
            None => (s, Vec::new()),
        };
        let (core, pre) = match rest.split_once('-') {
            Some((c, p)) => (c, split_identifiers(p).ok_or_else(invalid)?),
            None => (rest, Vec::new()),
        };
        let mut parts = core.split('.');
        let mut number = || -> Result<u64> {
            let part = parts.next().ok_or_else(invalid)?;
            if part.is_empty()
                || !part.bytes().all(|b| b.is_ascii_digit())
                || (part.len() > 1 && part.starts_with('0'))
            {
                return Err(invalid());
            }
            part.parse().map_err(|_| invalid())
        };
        let major = number()?;
        let minor = number()?;
        let patch = number()?;
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(SemVer {
            major,
            minor,
            patch,
            pre,
            build,
        })
    }

    /// Compare by version precedence, ignoring build metadata.
    pub fn cmp_precedence(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| compare_pre(&self.pre, &other.pre))
    }
}

fn split_identifiers(s: &str) -> Option<Vec<String>> {
    let ids: Vec<String> = s.split('.').map(str::to_string).collect();
    let valid = ids.iter().all(|id| {
        !id.is_empty() && id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
    });
    valid.then_some(ids)
}

fn compare_pre(a: &[String], b: &[String]) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        _ => {}
    }
    for (x, y) in a.iter().zip(b) {
        let ord = match (x.parse::<u64>(), y.parse::<u64>()) {
            (Ok(nx), Ok(ny)) => nx.cmp(&ny),
            (Ok(_), Err(_)) => Ordering::Less,
            (Err(_), Ok(_)) => Ordering::Greater,
            (Err(_), Err(_)) => x.cmp(y),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}

impl PartialOrd for SemVer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SemVer {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_precedence(other)
            .then_with(|| self.build.cmp(&other.build))
    }
}

impl FromStr for SemVer {
    type Err = PcoreError;

    fn from_str(s: &str) -> Result<Self> {
        SemVer::parse(s)
    }
}

impl fmt::Display for SemVer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if !self.pre.is_empty() {
            write!(f, "-{}", self.pre.join("."))?;
        }
        if !self.build.is_empty() {
            write!(f, "+{}", self.build.join("."))?;
        }
        Ok(())
    }
}

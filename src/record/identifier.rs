//! Typed identifiers attached to records

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The value half of an [`Identifier`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IdValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl fmt::Display for IdValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdValue::Bool(b) => write!(f, "{}", b),
            IdValue::Int(n) => write!(f, "{}", n),
            IdValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for IdValue {
    fn from(s: &str) -> Self {
        IdValue::Str(s.to_string())
    }
}

impl From<String> for IdValue {
    fn from(s: String) -> Self {
        IdValue::Str(s)
    }
}

impl From<i64> for IdValue {
    fn from(n: i64) -> Self {
        IdValue::Int(n)
    }
}

impl From<i32> for IdValue {
    fn from(n: i32) -> Self {
        IdValue::Int(n.into())
    }
}

impl From<bool> for IdValue {
    fn from(b: bool) -> Self {
        IdValue::Bool(b)
    }
}

/// A `(type, value)` pair naming a record in some external system.
///
/// Equality, ordering and hashing cover both fields.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawIdentifier")]
pub struct Identifier {
    #[serde(rename = "type")]
    kind: String,
    value: IdValue,
}

/// Unvalidated wire form of an [`Identifier`]
#[derive(Deserialize)]
struct RawIdentifier {
    #[serde(rename = "type")]
    kind: String,
    value: IdValue,
}

impl TryFrom<RawIdentifier> for Identifier {
    type Error = ValidationError;

    fn try_from(raw: RawIdentifier) -> Result<Self, Self::Error> {
        if raw.kind.is_empty() {
            return Err(ValidationError::EmptyIdentifierType);
        }
        Ok(Self {
            kind: raw.kind,
            value: raw.value,
        })
    }
}

impl Identifier {
    pub fn new(kind: impl Into<String>, value: impl Into<IdValue>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
        }
    }

    /// The identifier's type, e.g. `"email"` or `"crsid"`
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn value(&self) -> &IdValue {
        &self.value
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.value)
    }
}

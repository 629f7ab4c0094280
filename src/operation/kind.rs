//! Import kinds

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the records of a run relate to what the receiver already holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum ImportKind {
    /// The records are the complete set; anything not mentioned is gone
    FullSync,
    /// The records are changes; anything not mentioned is untouched
    PartialUpdate,
}

impl ImportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportKind::FullSync => "FULL_SYNC",
            ImportKind::PartialUpdate => "PARTIAL_UPDATE",
        }
    }
}

impl fmt::Display for ImportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImportKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FULL_SYNC" | "full-sync" => Ok(ImportKind::FullSync),
            "PARTIAL_UPDATE" | "partial-update" => Ok(ImportKind::PartialUpdate),
            other => Err(ValidationError::InvalidImportKind(other.to_string())),
        }
    }
}

impl TryFrom<String> for ImportKind {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

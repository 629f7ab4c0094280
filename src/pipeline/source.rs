//! Items a record source may yield

use crate::error::{ImportError, ValidationError};
use crate::record::Record;
use serde_json::Value;

/// Anything the pipeline can turn into a [`Record`], or a source failure.
pub trait SourceItem {
    fn into_record(self) -> Result<Record, ImportError>;
}

impl SourceItem for Record {
    fn into_record(self) -> Result<Record, ImportError> {
        Ok(self)
    }
}

/// Fallible sources: an `Err` is a failure of the source itself.
impl<E> SourceItem for Result<Record, E>
where
    E: Into<ImportError>,
{
    fn into_record(self) -> Result<Record, ImportError> {
        self.map_err(Into::into)
    }
}

/// Untyped JSON, e.g. one line of a JSON-lines file.
impl SourceItem for Value {
    fn into_record(self) -> Result<Record, ImportError> {
        serde_json::from_value(self)
            .map_err(|e| ValidationError::InvalidRecord(e.to_string()).into())
    }
}

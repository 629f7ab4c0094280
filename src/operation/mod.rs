//! Import operations: one per pipeline run

mod kind;
mod types;

pub use kind::ImportKind;
pub use types::{ImportOperation, OperationId, OperationInfo};

//! ImportHandler trait: the contract handlers implement
//!
//! A handler is attached to an operation by a "started" subscriber and then
//! receives each record in turn, followed by exactly one of
//! `on_import_finished` or `on_import_failed`.

use crate::error::ImportError;
use crate::operation::ImportOperation;
use crate::record::Record;
use async_trait::async_trait;

#[async_trait]
pub trait ImportHandler: Send + Sync {
    /// Name used in logs and aggregated errors
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Called once per record, in source order.
    ///
    /// Returning an error aborts the run; this handler will then not be
    /// told `on_import_finished`.
    async fn on_record_available(
        &self,
        op: &ImportOperation,
        record: &Record,
    ) -> Result<(), ImportError>;

    /// The run aborted. Errors are logged and do not stop other handlers
    /// being notified.
    async fn on_import_failed(&self, op: &ImportOperation) -> Result<(), ImportError>;

    /// Every record has been delivered.
    async fn on_import_finished(&self, op: &ImportOperation) -> Result<(), ImportError>;
}

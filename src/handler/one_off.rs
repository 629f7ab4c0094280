//! Handlers bound to a single operation

use super::traits::ImportHandler;
use crate::error::{ImportError, ValidationError};
use crate::operation::{ImportOperation, OperationId};
use crate::record::Record;
use async_trait::async_trait;

/// Remembers which operation a handler belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    operation: OperationId,
}

impl Binding {
    pub fn new(op: &ImportOperation) -> Self {
        Self {
            operation: op.id(),
        }
    }

    pub fn operation(&self) -> OperationId {
        self.operation
    }

    /// Reject events from any operation but our own.
    pub fn check(&self, op: &ImportOperation) -> Result<(), ValidationError> {
        if op.id() == self.operation {
            Ok(())
        } else {
            Err(ValidationError::ForeignOperation)
        }
    }
}

/// Wraps a handler so that it only accepts events for one operation.
///
/// Events from any other operation fail with
/// [`ValidationError::ForeignOperation`] and never reach the inner handler.
pub struct OneOffHandler<H> {
    binding: Binding,
    inner: H,
}

impl<H: ImportHandler> OneOffHandler<H> {
    pub fn new(op: &ImportOperation, inner: H) -> Self {
        Self {
            binding: Binding::new(op),
            inner,
        }
    }

    pub fn binding(&self) -> Binding {
        self.binding
    }

    pub fn inner(&self) -> &H {
        &self.inner
    }
}

#[async_trait]
impl<H: ImportHandler> ImportHandler for OneOffHandler<H> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn on_record_available(
        &self,
        op: &ImportOperation,
        record: &Record,
    ) -> Result<(), ImportError> {
        self.binding.check(op)?;
        self.inner.on_record_available(op, record).await
    }

    async fn on_import_failed(&self, op: &ImportOperation) -> Result<(), ImportError> {
        self.binding.check(op)?;
        self.inner.on_import_failed(op).await
    }

    async fn on_import_finished(&self, op: &ImportOperation) -> Result<(), ImportError> {
        self.binding.check(op)?;
        self.inner.on_import_finished(op).await
    }
}

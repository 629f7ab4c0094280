//! GeneratorHandler: a handler whose logic is a pull-style loop
//!
//! Each push callback becomes one step of the wrapped consumer, via an
//! inverted iteration [`Controller`].

use super::one_off::Binding;
use super::traits::ImportHandler;
use crate::error::{ImportError, ImportOperationError};
use crate::inversion::{Controller, ControllerConfig, Feeder};
use crate::operation::{ImportOperation, OperationInfo};
use crate::record::Record;
use async_trait::async_trait;
use tokio::sync::Mutex;

struct Inner {
    controller: Controller<Record>,
    error_raised: bool,
}

/// One-off handler that feeds records to a consumer loop.
///
/// The consumer receives a snapshot of the operation and a [`Feeder`] of
/// records. It runs on its own thread from the first event onwards.
///
/// ```text
/// |op, records| {
///     for record in &records {
///         stage(record?);
///         records.suspend()?;
///     }
///     commit(op.kind)
/// }
/// ```
pub struct GeneratorHandler {
    binding: Binding,
    name: String,
    inner: Mutex<Inner>,
}

impl GeneratorHandler {
    pub fn new<F>(op: &ImportOperation, consumer: F) -> Result<Self, ImportError>
    where
        F: FnOnce(OperationInfo, Feeder<Record>) -> Result<(), ImportError> + Send + 'static,
    {
        Self::with_config(op, ControllerConfig::default(), consumer)
    }

    pub fn with_config<F>(
        op: &ImportOperation,
        config: ControllerConfig,
        consumer: F,
    ) -> Result<Self, ImportError>
    where
        F: FnOnce(OperationInfo, Feeder<Record>) -> Result<(), ImportError> + Send + 'static,
    {
        let info = op.info();
        let name = format!("generator({})", info.record_type);
        let controller =
            Controller::with_config(move |feeder| move || consumer(info, feeder), config)?;

        Ok(Self {
            binding: Binding::new(op),
            name,
            inner: Mutex::new(Inner {
                controller,
                error_raised: false,
            }),
        })
    }

    /// Override the name used in logs and aggregated errors.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn binding(&self) -> Binding {
        self.binding
    }

    /// True once any event handed to the consumer has failed.
    pub async fn error_raised(&self) -> bool {
        self.inner.lock().await.error_raised
    }
}

#[async_trait]
impl ImportHandler for GeneratorHandler {
    fn name(&self) -> &str {
        &self.name
    }

    async fn on_record_available(
        &self,
        op: &ImportOperation,
        record: &Record,
    ) -> Result<(), ImportError> {
        self.binding.check(op)?;
        let mut inner = self.inner.lock().await;

        // An aborted run never offers another record.
        assert!(
            !inner.error_raised,
            "record offered to {} after it raised an error",
            self.name
        );

        let result = inner.controller.transmit_value(record.clone()).await;
        if result.is_err() {
            inner.error_raised = true;
        }
        result
    }

    async fn on_import_failed(&self, op: &ImportOperation) -> Result<(), ImportError> {
        self.binding.check(op)?;
        let mut inner = self.inner.lock().await;

        // The consumer already saw its own failure and can't take another.
        if inner.error_raised {
            tracing::debug!(handler = %self.name, "consumer already failed, not notifying");
            return Ok(());
        }

        inner
            .controller
            .fail(ImportOperationError::new("handler got on_import_failed()").into())
            .await
    }

    async fn on_import_finished(&self, op: &ImportOperation) -> Result<(), ImportError> {
        self.binding.check(op)?;
        let mut inner = self.inner.lock().await;

        assert!(
            !inner.error_raised,
            "{} told the import finished after it raised an error",
            self.name
        );

        let result = inner.controller.end().await;
        if result.is_err() {
            inner.error_raised = true;
        }
        result
    }
}

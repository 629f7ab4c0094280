//! ImportPipeline: runs one import from start to finish
//!
//! Guarantees that every handler attached while "started" was broadcast
//! later receives exactly one of `on_import_finished` or `on_import_failed`.

use super::bus::{StartedBus, StartedSubscriber};
use super::source::SourceItem;
use crate::error::{HandlerFailures, ImportError, ImportOperationError};
use crate::operation::{ImportKind, ImportOperation};
use std::sync::Arc;

/// Which outcome notification a round delivers.
#[derive(Debug, Clone, Copy)]
enum Round {
    Failed,
    Finished,
}

impl Round {
    fn callback(self) -> &'static str {
        match self {
            Round::Failed => "on_import_failed",
            Round::Finished => "on_import_finished",
        }
    }
}

/// Owns the started bus and drives imports through it.
#[derive(Debug, Default)]
pub struct ImportPipeline {
    bus: StartedBus,
}

impl ImportPipeline {
    pub fn new() -> Self {
        Self {
            bus: StartedBus::new(),
        }
    }

    pub fn with_bus(bus: StartedBus) -> Self {
        Self { bus }
    }

    pub fn bus(&self) -> &StartedBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut StartedBus {
        &mut self.bus
    }

    pub fn subscribe(&mut self, subscriber: Arc<dyn StartedSubscriber>) {
        self.bus.subscribe(subscriber);
    }

    /// Run one import.
    ///
    /// Broadcasts "started", delivers every record to every attached handler
    /// in order, then notifies finished. Any failure along the way notifies
    /// failed instead and returns an [`ImportOperationError`] describing
    /// where the run broke, with the original fault as its cause.
    pub async fn perform_import<I>(
        &self,
        record_type: impl Into<String>,
        kind: ImportKind,
        records: I,
    ) -> Result<ImportOperation, ImportError>
    where
        I: IntoIterator,
        I::Item: SourceItem,
    {
        let mut op = ImportOperation::new(record_type, kind);
        tracing::debug!(operation = %op, id = %op.id(), "import started");

        let report = self.bus.broadcast(&mut op);
        if let Some((subscriber, err)) = report.into_first_error() {
            notify(&op, Round::Failed).await;
            return Err(ImportOperationError::with_cause(
                format!(
                    "import_started subscriber raised error (subscriber: {})",
                    subscriber
                ),
                err,
            )
            .into());
        }

        let mut delivered = 0usize;
        for item in records {
            let record = match item.into_record() {
                Ok(record) => record,
                Err(e) => {
                    tracing::debug!(kind = e.as_label(), error = %e, "record source failed");
                    notify(&op, Round::Failed).await;
                    return Err(
                        ImportOperationError::with_cause("record source raised error", e).into(),
                    );
                }
            };

            for handler in op.handlers() {
                if let Err(e) = handler.on_record_available(&op, &record).await {
                    tracing::debug!(
                        handler = %handler.name(),
                        kind = e.as_label(),
                        error = %e,
                        "handler rejected record"
                    );
                    notify(&op, Round::Failed).await;
                    return Err(ImportOperationError::with_cause(
                        "handler raised from on_record_available()",
                        e,
                    )
                    .into());
                }
            }
            delivered += 1;
        }

        let failures = notify(&op, Round::Finished).await;
        if !failures.is_empty() {
            return Err(ImportOperationError::with_cause(
                "handler raised from on_import_finished()",
                ImportError::Handlers(failures),
            )
            .into());
        }

        tracing::debug!(operation = %op, records = delivered, "import finished");
        Ok(op)
    }
}

/// Notify every attached handler of the outcome, whatever earlier handlers do.
async fn notify(op: &ImportOperation, round: Round) -> HandlerFailures {
    let mut failures = HandlerFailures::default();

    for handler in op.handlers() {
        let result = match round {
            Round::Failed => handler.on_import_failed(op).await,
            Round::Finished => handler.on_import_finished(op).await,
        };
        if let Err(e) = result {
            tracing::warn!(
                handler = %handler.name(),
                operation = %op,
                kind = e.as_label(),
                error = %e,
                "handler raised from {}()",
                round.callback()
            );
            failures.0.push((handler.name().to_string(), e));
        }
    }

    failures
}

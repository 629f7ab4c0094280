//! Common test utilities for import scenarios
//!
//! Record builders and a handler that records every callback it receives.

#![allow(dead_code)]

use async_trait::async_trait;
use importar::{Identifier, ImportError, ImportHandler, ImportOperation, OperationId, Record};
use std::sync::{Arc, Mutex};

/// Live record keyed by identifier type `f`
pub fn live(key: &str, payload: &str) -> Record {
    Record::new([Identifier::new("f", key)], payload)
}

/// Deletion keyed by identifier type `f`
pub fn gone(key: &str) -> Record {
    Record::deleted([Identifier::new("f", key)])
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Record(OperationId, Record),
    Failed(OperationId),
    Finished(OperationId),
}

/// Which callback a [`RecordingHandler`] should fail, if any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailOn {
    #[default]
    Nothing,
    Record,
    Failed,
    Finished,
}

/// Logs every callback; shared log so several handlers can interleave.
pub struct RecordingHandler {
    name: String,
    log: Arc<Mutex<Vec<(String, Event)>>>,
    fail_on: FailOn,
}

impl RecordingHandler {
    pub fn new(name: &str, log: &Arc<Mutex<Vec<(String, Event)>>>) -> Self {
        Self {
            name: name.to_string(),
            log: log.clone(),
            fail_on: FailOn::Nothing,
        }
    }

    pub fn failing_on(mut self, fail_on: FailOn) -> Self {
        self.fail_on = fail_on;
        self
    }

    fn push(&self, event: Event, when: FailOn) -> Result<(), ImportError> {
        self.log.lock().unwrap().push((self.name.clone(), event));
        if self.fail_on == when {
            Err(ImportError::other(format!("{} failed", self.name)))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ImportHandler for RecordingHandler {
    fn name(&self) -> &str {
        &self.name
    }

    async fn on_record_available(
        &self,
        op: &ImportOperation,
        record: &Record,
    ) -> Result<(), ImportError> {
        self.push(Event::Record(op.id(), record.clone()), FailOn::Record)
    }

    async fn on_import_failed(&self, op: &ImportOperation) -> Result<(), ImportError> {
        self.push(Event::Failed(op.id()), FailOn::Failed)
    }

    async fn on_import_finished(&self, op: &ImportOperation) -> Result<(), ImportError> {
        self.push(Event::Finished(op.id()), FailOn::Finished)
    }
}

/// Events logged by handler `name`, in order
pub fn events_of(log: &Arc<Mutex<Vec<(String, Event)>>>, name: &str) -> Vec<Event> {
    log.lock()
        .unwrap()
        .iter()
        .filter(|(n, _)| n == name)
        .map(|(_, e)| e.clone())
        .collect()
}

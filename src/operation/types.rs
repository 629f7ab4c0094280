//! The identity object for one import run

use super::kind::ImportKind;
use crate::handler::ImportHandler;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Unique identifier for an import operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationId(Uuid);

impl OperationId {
    /// Create a new random OperationId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OperationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Owned snapshot of an operation's identity, for consumers on other threads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationInfo {
    pub id: OperationId,
    pub record_type: String,
    pub kind: ImportKind,
    pub started_at: DateTime<Utc>,
}

/// One run of the import pipeline.
///
/// Holds the handlers attached for this run, in attachment order. A handler
/// appears at most once, compared by identity.
pub struct ImportOperation {
    id: OperationId,
    record_type: String,
    kind: ImportKind,
    started_at: DateTime<Utc>,
    handlers: Vec<Arc<dyn ImportHandler>>,
}

impl ImportOperation {
    pub fn new(record_type: impl Into<String>, kind: ImportKind) -> Self {
        Self {
            id: OperationId::new(),
            record_type: record_type.into(),
            kind,
            started_at: Utc::now(),
            handlers: Vec::new(),
        }
    }

    pub fn id(&self) -> OperationId {
        self.id
    }

    pub fn record_type(&self) -> &str {
        &self.record_type
    }

    pub fn kind(&self) -> ImportKind {
        self.kind
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn info(&self) -> OperationInfo {
        OperationInfo {
            id: self.id,
            record_type: self.record_type.clone(),
            kind: self.kind,
            started_at: self.started_at,
        }
    }

    /// Attach a handler. Attaching one already present does nothing.
    pub fn attach_handler(&mut self, handler: Arc<dyn ImportHandler>) {
        if !self.handlers.iter().any(|h| Arc::ptr_eq(h, &handler)) {
            self.handlers.push(handler);
        }
    }

    /// Detach a handler. Detaching one not present does nothing.
    pub fn detach_handler(&mut self, handler: &Arc<dyn ImportHandler>) {
        self.handlers.retain(|h| !Arc::ptr_eq(h, handler));
    }

    pub fn handlers(&self) -> &[Arc<dyn ImportHandler>] {
        &self.handlers
    }
}

impl fmt::Display for ImportOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImportOperation({}, {})", self.record_type, self.kind)
    }
}

impl fmt::Debug for ImportOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.handlers.iter().map(|h| h.name()).collect();
        f.debug_struct("ImportOperation")
            .field("id", &self.id)
            .field("record_type", &self.record_type)
            .field("kind", &self.kind)
            .field("started_at", &self.started_at)
            .field("handlers", &names)
            .finish()
    }
}

//! Started bus: fault-tolerant broadcast of "an import has started"
//!
//! Every subscriber is invoked, in subscription order, regardless of
//! earlier failures. Subscribers typically inspect the operation and attach
//! handlers to it.

use crate::error::ImportError;
use crate::operation::ImportOperation;
use std::sync::Arc;

/// Receives "started" for every operation the owning pipeline runs.
pub trait StartedSubscriber: Send + Sync {
    /// Name used in logs and error messages
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn on_import_started(&self, op: &mut ImportOperation) -> Result<(), ImportError>;
}

impl<F> StartedSubscriber for F
where
    F: Fn(&mut ImportOperation) -> Result<(), ImportError> + Send + Sync,
{
    fn on_import_started(&self, op: &mut ImportOperation) -> Result<(), ImportError> {
        self(op)
    }
}

/// Result of broadcasting "started".
#[derive(Debug, Default)]
pub struct BroadcastReport {
    /// How many subscribers were invoked
    pub delivered: usize,
    /// Errors from individual subscribers (subscriber name, error)
    pub errors: Vec<(String, ImportError)>,
}

impl BroadcastReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Take the first failure, dropping the rest.
    pub fn into_first_error(self) -> Option<(String, ImportError)> {
        self.errors.into_iter().next()
    }
}

/// Ordered set of started subscribers, compared by identity.
#[derive(Default)]
pub struct StartedBus {
    subscribers: Vec<Arc<dyn StartedSubscriber>>,
}

impl StartedBus {
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }

    /// Subscribe. Subscribing one already present does nothing.
    pub fn subscribe(&mut self, subscriber: Arc<dyn StartedSubscriber>) {
        if !self.subscribers.iter().any(|s| Arc::ptr_eq(s, &subscriber)) {
            self.subscribers.push(subscriber);
        }
    }

    /// Returns whether the subscriber was present.
    pub fn unsubscribe(&mut self, subscriber: &Arc<dyn StartedSubscriber>) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| !Arc::ptr_eq(s, subscriber));
        self.subscribers.len() != before
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Deliver "started" to every subscriber.
    ///
    /// One subscriber's error does not affect others.
    pub fn broadcast(&self, op: &mut ImportOperation) -> BroadcastReport {
        let mut report = BroadcastReport::default();

        for subscriber in &self.subscribers {
            report.delivered += 1;
            if let Err(e) = subscriber.on_import_started(op) {
                tracing::warn!(
                    subscriber = %subscriber.name(),
                    operation = %op,
                    kind = e.as_label(),
                    error = %e,
                    "started subscriber raised error"
                );
                report.errors.push((subscriber.name().to_string(), e));
            }
        }

        report
    }
}

impl std::fmt::Debug for StartedBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.subscribers.iter().map(|s| s.name()).collect();
        f.debug_struct("StartedBus")
            .field("subscribers", &names)
            .finish()
    }
}

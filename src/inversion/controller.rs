//! Controller: drives a pull-style consumer from push-style calls
//!
//! The consumer runs on a dedicated thread, in lock-step with the caller.
//! Each `transmit_value`/`fail`/`end` registers one item in the rendezvous
//! cell, resumes the consumer, and waits until it suspends or returns.

use super::feeder::{lock, Feeder, Outcome, Shared, SharedState};
use crate::error::{ImportError, ProtocolError};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use std::thread;
use tokio::sync::mpsc;

/// The bound consumer: runs once, pulling from its feeder.
pub type Consumer = Box<dyn FnOnce() -> Result<(), ImportError> + Send + 'static>;

const DEFAULT_THREAD_NAME: &str = "importar-consumer";

/// Settings for the consumer thread a controller spawns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Name given to the consumer thread
    pub thread_name: String,
    /// Stack size in bytes; platform default when unset
    pub stack_size: Option<usize>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            thread_name: DEFAULT_THREAD_NAME.to_string(),
            stack_size: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Active,
    Finished,
    Dead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Value,
    Failure,
    End,
}

/// Consumer not yet started, plus the sender its thread reports on.
struct Pending {
    consumer: Consumer,
    outcome_tx: mpsc::Sender<Outcome>,
}

/// Converts pushes into single steps of a pull-style consumer.
///
/// Construction calls the binder once with a [`Feeder`]; the returned
/// consumer starts on its own thread at the first driving step.
pub struct Controller<T> {
    shared: SharedState<T>,
    pending: Option<Pending>,
    resume_tx: mpsc::Sender<()>,
    outcome_rx: mpsc::Receiver<Outcome>,
    config: ControllerConfig,
    phase: Phase,
}

impl<T: Send + 'static> Controller<T> {
    /// Bind a consumer with the default thread settings.
    ///
    /// Fails with [`ProtocolError::OverPulled`] if the binder pulls from the
    /// feeder itself instead of returning a consumer that does.
    pub fn new<B, C>(binder: B) -> Result<Self, ProtocolError>
    where
        B: FnOnce(Feeder<T>) -> C,
        C: FnOnce() -> Result<(), ImportError> + Send + 'static,
    {
        Self::with_config(binder, ControllerConfig::default())
    }

    pub fn with_config<B, C>(binder: B, config: ControllerConfig) -> Result<Self, ProtocolError>
    where
        B: FnOnce(Feeder<T>) -> C,
        C: FnOnce() -> Result<(), ImportError> + Send + 'static,
    {
        let shared = Arc::new(Mutex::new(Shared::new()));
        let (resume_tx, resume_rx) = mpsc::channel(1);
        let (outcome_tx, outcome_rx) = mpsc::channel(1);

        let feeder = Feeder::new(shared.clone(), resume_rx, outcome_tx.clone());
        let consumer = binder(feeder);

        if let Some(violation) = lock(&shared).violation.take() {
            return Err(violation);
        }

        Ok(Self {
            shared,
            pending: Some(Pending {
                consumer: Box::new(consumer),
                outcome_tx,
            }),
            resume_tx,
            outcome_rx,
            config,
            phase: Phase::Active,
        })
    }

    /// Hand `value` to the consumer and let it process exactly one item.
    pub async fn transmit_value(&mut self, value: T) -> Result<(), ImportError> {
        self.ensure_active()?;
        lock(&self.shared).state.register_value(value)?;
        self.drive(Step::Value).await
    }

    /// Raise `err` inside the consumer at its current suspension point.
    ///
    /// A consumer that handles the error and returns yields `Ok(())`; one
    /// that propagates it yields that error back. Any other error the
    /// consumer returns is its own, and leaves the controller dead.
    pub async fn fail(&mut self, err: ImportError) -> Result<(), ImportError> {
        self.ensure_active()?;
        lock(&self.shared).state.register_error(err)?;
        self.drive(Step::Failure).await
    }

    /// Signal end of sequence; the consumer is expected to finish its loop and return.
    pub async fn end(&mut self) -> Result<(), ImportError> {
        self.ensure_active()?;
        lock(&self.shared).state.register_end()?;
        self.drive(Step::End).await
    }
}

impl<T> Controller<T> {
    pub fn is_active(&self) -> bool {
        self.phase == Phase::Active
    }

    /// True once the consumer itself failed while being driven.
    pub fn is_dead(&self) -> bool {
        self.phase == Phase::Dead
    }

    pub fn step_count(&self) -> u64 {
        lock(&self.shared).step_count
    }

    pub fn yield_count(&self) -> u64 {
        lock(&self.shared).yield_count
    }

    fn ensure_active(&self) -> Result<(), ProtocolError> {
        match self.phase {
            Phase::Active => Ok(()),
            Phase::Dead => Err(ProtocolError::Dead),
            Phase::Finished => Err(ProtocolError::Finished),
        }
    }

    async fn drive(&mut self, step: Step) -> Result<(), ImportError> {
        let index = {
            let mut shared = lock(&self.shared);
            shared.driving = true;
            shared.step_count
        };
        let outcome = self.resume().await;

        let (violation, advanced, consumed) = {
            let mut shared = lock(&self.shared);
            shared.driving = false;
            shared.step_count += 1;
            (
                shared.violation.take(),
                shared.yield_count >= shared.step_count,
                shared.state.is_at_end(),
            )
        };

        let result = match outcome {
            Outcome::Suspended => {
                // end/fail are delivered once, whatever the consumer did with them
                if step != Step::Value {
                    self.phase = Phase::Finished;
                }
                match violation {
                    Some(v) => Err(v.into()),
                    None if !advanced => Err(ProtocolError::NotAdvanced.into()),
                    None if step != Step::Value => Err(ProtocolError::NotTerminated.into()),
                    None => Ok(()),
                }
            }
            Outcome::Returned(Ok(())) => {
                self.phase = Phase::Finished;
                match violation {
                    Some(v) => Err(v.into()),
                    None if !consumed => Err(ProtocolError::Terminated.into()),
                    None if !advanced => Err(ProtocolError::NotAdvanced.into()),
                    None => Ok(()),
                }
            }
            Outcome::Returned(Err(err)) => match violation {
                Some(v) => {
                    self.phase = Phase::Dead;
                    Err(v.into())
                }
                None => match err {
                    ImportError::Injected(f) if step == Step::Failure && f.step() == index => {
                        self.phase = Phase::Finished;
                        Err(f.into_inner())
                    }
                    err => {
                        self.phase = Phase::Dead;
                        Err(err)
                    }
                },
            },
            Outcome::Panicked(msg) => {
                self.phase = Phase::Dead;
                Err(ImportError::ConsumerPanicked(msg))
            }
        };

        if let Err(e) = &result {
            tracing::debug!(
                step = ?step,
                kind = e.as_label(),
                error = %e,
                dead = self.is_dead(),
                "consumer step failed"
            );
        }
        result
    }

    /// Start or resume the consumer and wait for it to suspend or return.
    async fn resume(&mut self) -> Outcome {
        if let Some(pending) = self.pending.take() {
            if let Err(e) = self.spawn(pending) {
                return Outcome::Returned(Err(e));
            }
        } else if self.resume_tx.send(()).await.is_err() {
            return Outcome::Returned(Err(ProtocolError::Detached.into()));
        }

        self.outcome_rx
            .recv()
            .await
            .unwrap_or(Outcome::Returned(Err(ProtocolError::Detached.into())))
    }

    fn spawn(&self, pending: Pending) -> Result<(), ImportError> {
        let Pending {
            consumer,
            outcome_tx,
        } = pending;

        let mut builder = thread::Builder::new().name(self.config.thread_name.clone());
        if let Some(size) = self.config.stack_size {
            builder = builder.stack_size(size);
        }

        builder.spawn(move || {
            let outcome = match panic::catch_unwind(AssertUnwindSafe(consumer)) {
                Ok(result) => Outcome::Returned(result),
                Err(payload) => Outcome::Panicked(panic_message(payload.as_ref())),
            };
            // The controller may already be gone; nobody is left to tell.
            let _ = outcome_tx.blocking_send(outcome);
        })
        .map_err(ImportError::Spawn)?;

        tracing::debug!(thread = %self.config.thread_name, "consumer thread started");
        Ok(())
    }
}

impl<T> std::fmt::Debug for Controller<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("phase", &self.phase)
            .field("started", &self.pending.is_none())
            .field("config", &self.config)
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

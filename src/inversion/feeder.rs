//! Feeder: the pull side handed to a bound consumer
//!
//! `&Feeder<T>` is an iterator over the values pushed into the owning
//! [`Controller`](super::Controller). Each item must be followed by exactly
//! one [`Feeder::suspend`] before the next pull.

use super::state::{Handoff, RendezvousState};
use crate::error::{ImportError, InjectedFailure, ProtocolError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

/// Step bookkeeping shared by a controller and its feeder.
#[derive(Debug)]
pub(crate) struct Shared<T> {
    pub(crate) state: RendezvousState<T, ImportError>,
    /// Driving steps completed
    pub(crate) step_count: u64,
    /// Items pulled from the feeder
    pub(crate) yield_count: u64,
    /// True while the controller is waiting on the consumer
    pub(crate) driving: bool,
    /// First contract violation seen since the last step
    pub(crate) violation: Option<ProtocolError>,
}

impl<T> Shared<T> {
    pub(crate) fn new() -> Self {
        Self {
            state: RendezvousState::new(),
            step_count: 0,
            yield_count: 0,
            driving: false,
            violation: None,
        }
    }
}

pub(crate) type SharedState<T> = Arc<Mutex<Shared<T>>>;

/// No user code runs while the lock is held, so a poisoned lock is still consistent.
pub(crate) fn lock<T>(shared: &Mutex<Shared<T>>) -> MutexGuard<'_, Shared<T>> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// What the consumer thread reports back at the end of a step.
#[derive(Debug)]
pub(crate) enum Outcome {
    Suspended,
    Returned(Result<(), ImportError>),
    Panicked(String),
}

/// The lazily-produced sequence a consumer iterates over.
///
/// ```text
/// for record in &feeder {
///     handle(record?);
///     feeder.suspend()?;
/// }
/// finalize();
/// ```
#[derive(Debug)]
pub struct Feeder<T> {
    shared: SharedState<T>,
    resume_rx: Mutex<mpsc::Receiver<()>>,
    outcome_tx: mpsc::Sender<Outcome>,
}

impl<T> Feeder<T> {
    pub(crate) fn new(
        shared: SharedState<T>,
        resume_rx: mpsc::Receiver<()>,
        outcome_tx: mpsc::Sender<Outcome>,
    ) -> Self {
        Self {
            shared,
            resume_rx: Mutex::new(resume_rx),
            outcome_tx,
        }
    }

    /// Pull the next item.
    ///
    /// - `Some(Ok(v))` for a transmitted value
    /// - `Some(Err(e))` for an injected failure ([`ImportError::Injected`])
    ///   or a contract violation
    /// - `None` at the end of the sequence
    ///
    /// After a violation has been reported every further pull returns `None`.
    pub fn pull(&self) -> Option<Result<T, ImportError>> {
        let mut shared = lock(&self.shared);
        if shared.violation.is_some() {
            return None;
        }
        if !shared.driving || shared.yield_count > shared.step_count {
            shared.violation = Some(ProtocolError::OverPulled);
            return Some(Err(ProtocolError::OverPulled.into()));
        }

        shared.yield_count += 1;
        let step = shared.step_count;
        match shared.state.take_next() {
            Ok(Handoff::Value(v)) => Some(Ok(v)),
            Ok(Handoff::Error(e)) => Some(Err(ImportError::Injected(InjectedFailure::new(step, e)))),
            Ok(Handoff::End) => None,
            Err(violation) => {
                shared.violation = Some(violation.clone());
                Some(Err(violation.into()))
            }
        }
    }

    /// Hand control back to the controller and block until the next step.
    ///
    /// Returns [`ProtocolError::Detached`] once the controller is gone.
    pub fn suspend(&self) -> Result<(), ImportError> {
        {
            let mut shared = lock(&self.shared);
            if !shared.driving {
                shared.violation.get_or_insert(ProtocolError::OutOfStep);
                return Err(ProtocolError::OutOfStep.into());
            }
        }

        self.outcome_tx
            .blocking_send(Outcome::Suspended)
            .map_err(|_| ProtocolError::Detached)?;

        let mut resume_rx = self
            .resume_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match resume_rx.blocking_recv() {
            Some(()) => Ok(()),
            None => Err(ProtocolError::Detached.into()),
        }
    }
}

impl<T> Iterator for &Feeder<T> {
    type Item = Result<T, ImportError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.pull()
    }
}

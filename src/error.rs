//! Error types for the import pipeline
//!
//! - [`ValidationError`]: malformed input at a boundary
//! - [`ProtocolError`]: the push/pull handoff contract was violated
//! - [`ImportOperationError`]: envelope for any aborted pipeline run
//! - [`ImportError`]: the crate-wide error handlers and consumers return

use crate::inversion::StateKind;
use std::fmt;
use thiserror::Error;

/// Boxed error for business-logic failures of arbitrary type.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Malformed input rejected at a boundary. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("import kind was not FULL_SYNC or PARTIAL_UPDATE: {0:?}")]
    InvalidImportKind(String),

    #[error("identifier type must not be empty")]
    EmptyIdentifierType,

    #[error("item is not a valid record: {0}")]
    InvalidRecord(String),

    #[error("record has no identifier of type {0:?}")]
    MissingIdentifier(String),

    #[error("received an import event from an operation other than our own")]
    ForeignOperation,
}

/// Violation of the inverted-iteration handoff contract.
///
/// These indicate a defect in a bound consumer and are not expected in
/// correct usage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("{call}() called in unexpected state: {state}")]
    UnexpectedState {
        call: &'static str,
        state: StateKind,
    },

    #[error("next value requested before value provided")]
    ValueNotProvided,

    #[error("consumer didn't advance its iterator (did you forget to loop over the feeder?)")]
    NotAdvanced,

    #[error(
        "consumer attempted to access a second value without yielding \
         (did you forget to call suspend() in your loop?)"
    )]
    OverPulled,

    #[error(
        "consumer unexpectedly terminated before the end of the sequence \
         (perhaps you're breaking before consuming the whole iterator?)"
    )]
    Terminated,

    #[error("consumer resumed iteration after the sequence ended")]
    NotTerminated,

    #[error("attempted to communicate with a failed iterator")]
    Dead,

    #[error("attempted to communicate with a finished iterator")]
    Finished,

    #[error("consumer was detached from its controller")]
    Detached,

    #[error("suspend() called outside of a driving step")]
    OutOfStep,
}

/// Raised by the pipeline whenever a run aborts.
///
/// Always describes where the run failed; `source()` yields the original
/// fault when there is one.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ImportOperationError {
    message: String,
    #[source]
    cause: Option<Box<ImportError>>,
}

impl ImportOperationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(message: impl Into<String>, cause: ImportError) -> Self {
        Self {
            message: message.into(),
            cause: Some(Box::new(cause)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The fault that aborted the run, if any.
    pub fn cause(&self) -> Option<&ImportError> {
        self.cause.as_deref()
    }
}

/// Errors collected from a fault-tolerant notification round.
#[derive(Debug, Default)]
pub struct HandlerFailures(pub Vec<(String, ImportError)>);

impl HandlerFailures {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, ImportError)> {
        self.0.iter()
    }
}

impl fmt::Display for HandlerFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} handler(s) failed", self.0.len())?;
        for (i, (name, err)) in self.0.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{}{}: {}", sep, name, err)?;
        }
        Ok(())
    }
}

/// A failure raised inside a consumer by `Controller::fail`.
///
/// Displays as the wrapped error. A consumer that returns it unchanged
/// propagates the failure; any other error is the consumer's own.
#[derive(Debug)]
pub struct InjectedFailure {
    step: u64,
    error: Box<ImportError>,
}

impl InjectedFailure {
    pub(crate) fn new(step: u64, error: ImportError) -> Self {
        Self {
            step,
            error: Box::new(error),
        }
    }

    /// Driving step the failure was injected at
    pub(crate) fn step(&self) -> u64 {
        self.step
    }

    pub fn get_ref(&self) -> &ImportError {
        &self.error
    }

    pub fn into_inner(self) -> ImportError {
        *self.error
    }
}

impl fmt::Display for InjectedFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl std::error::Error for InjectedFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.error.source()
    }
}

/// The crate-wide error type.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ImportError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Operation(#[from] ImportOperationError),

    #[error("consumer panicked: {0}")]
    ConsumerPanicked(String),

    #[error("{0}")]
    Handlers(HandlerFailures),

    #[error("failed to spawn consumer thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error(transparent)]
    Injected(InjectedFailure),

    #[error(transparent)]
    Other(BoxError),
}

impl ImportError {
    /// Wrap an arbitrary business-logic error.
    pub fn other<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Other(err.into())
    }

    /// Short stable label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ImportError::Validation(_) => "validation",
            ImportError::Protocol(_) => "protocol",
            ImportError::Operation(_) => "import_operation",
            ImportError::ConsumerPanicked(_) => "consumer_panicked",
            ImportError::Handlers(_) => "handlers",
            ImportError::Spawn(_) => "spawn",
            ImportError::Injected(f) => f.get_ref().as_label(),
            ImportError::Other(_) => "other",
        }
    }

    /// The protocol violation, if this is one.
    pub fn as_protocol(&self) -> Option<&ProtocolError> {
        match self {
            ImportError::Protocol(p) => Some(p),
            _ => None,
        }
    }

    /// The envelope, if this is an aborted pipeline run.
    pub fn as_operation(&self) -> Option<&ImportOperationError> {
        match self {
            ImportError::Operation(op) => Some(op),
            _ => None,
        }
    }
}

impl From<std::convert::Infallible> for ImportError {
    fn from(e: std::convert::Infallible) -> Self {
        match e {}
    }
}

//! Importar: record import pipeline with push-driven, pull-style handlers
//!
//! An import run delivers externally-produced records to whichever handlers
//! subscribers attach when the run starts. Every such handler is later told
//! exactly once whether the run finished or failed, however the source or
//! other handlers misbehave.
//!
//! # Core Concepts
//!
//! - **Operation**: one run, identifying the record type and import kind
//! - **Handler**: receives records, then a finished or failed notification
//! - **Controller**: drives a handler written as a plain loop over records,
//!   one pushed record at a time
//!
//! # Example
//!
//! ```
//! use importar::{ImportKind, ImportPipeline, Identifier, MirrorStore, MirrorSubscriber, Record};
//! use std::sync::Arc;
//!
//! let store = Arc::new(MirrorStore::new("f"));
//! let mut pipeline = ImportPipeline::new();
//! pipeline.subscribe(Arc::new(MirrorSubscriber::new(store.clone(), "foo")));
//!
//! let records = vec![Record::new([Identifier::new("f", "a")], "abc")];
//! tokio_test::block_on(pipeline.perform_import("foo", ImportKind::FullSync, records)).unwrap();
//!
//! assert_eq!(store.get("a"), Some(serde_json::json!("abc")));
//! ```

pub mod config;
pub mod error;
pub mod handler;
pub mod inversion;
pub mod mirror;
pub mod operation;
pub mod pipeline;
pub mod record;

pub use config::{ConfigError, ImporterConfig};
pub use error::{
    BoxError, HandlerFailures, ImportError, ImportOperationError, InjectedFailure, ProtocolError,
    ValidationError,
};
pub use handler::{GeneratorHandler, ImportHandler, OneOffHandler};
pub use inversion::{Controller, ControllerConfig, Feeder};
pub use mirror::{mirror_consumer, MirrorStore, MirrorSubscriber};
pub use operation::{ImportKind, ImportOperation, OperationId, OperationInfo};
pub use pipeline::{BroadcastReport, ImportPipeline, SourceItem, StartedBus, StartedSubscriber};
pub use record::{IdValue, Identifier, Record};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

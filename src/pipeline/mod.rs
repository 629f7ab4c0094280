//! Import pipeline
//!
//! [`ImportPipeline::perform_import`] announces a run on the [`StartedBus`],
//! pushes each record from the source to the handlers attached in response,
//! and finally tells them whether the run finished or failed.

mod bus;
mod driver;
mod source;

pub use bus::{BroadcastReport, StartedBus, StartedSubscriber};
pub use driver::ImportPipeline;
pub use source::SourceItem;

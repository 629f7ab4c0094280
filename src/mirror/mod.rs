//! Mirror: a downstream replica kept in sync by imports

mod consumer;
mod store;

pub use consumer::{mirror_consumer, MirrorSubscriber};
pub use store::MirrorStore;

//! Record model: identifiers and the records handlers receive

mod identifier;
mod types;

pub use identifier::{IdValue, Identifier};
pub use types::Record;

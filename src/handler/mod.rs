//! Import handlers
//!
//! [`ImportHandler`] is the push-style contract. [`OneOffHandler`] binds any
//! handler to one operation; [`GeneratorHandler`] lets the handler's logic
//! be written as a loop over the records instead.

mod generator;
mod one_off;
mod traits;

pub use generator::GeneratorHandler;
pub use one_off::{Binding, OneOffHandler};
pub use traits::ImportHandler;

//! Inverted iteration
//!
//! Lets a consumer written as an ordinary loop over "the items" be driven
//! one item at a time by a producer that pushes.
//!
//! # Example
//!
//! ```
//! use importar::inversion::{Controller, Feeder};
//! use importar::ImportError;
//! use std::sync::{Arc, Mutex};
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = seen.clone();
//!
//! let mut controller = Controller::new(move |feeder: Feeder<u32>| {
//!     move || -> Result<(), ImportError> {
//!         for n in &feeder {
//!             sink.lock().unwrap().push(n?);
//!             feeder.suspend()?;
//!         }
//!         Ok(())
//!     }
//! })
//! .unwrap();
//!
//! tokio_test::block_on(async {
//!     controller.transmit_value(1).await.unwrap();
//!     controller.transmit_value(2).await.unwrap();
//!     controller.end().await.unwrap();
//! });
//! assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
//! ```

mod controller;
mod feeder;
mod state;

pub use controller::{Consumer, Controller, ControllerConfig};
pub use feeder::Feeder;
pub use state::{Handoff, RendezvousState, StateKind};

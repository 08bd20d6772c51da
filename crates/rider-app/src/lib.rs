//! Application layer for the rider client
//!
//! Generic runtime for driving the [`rider_client::Client`] state machine,
//! enabling deterministic simulation testing with the same code that runs in
//! production.
//!
//! # Components
//!
//! - [`Driver`]: Trait for platform-specific I/O abstraction
//! - [`Runtime`]: Generic orchestration loop using Driver
//! - [`Snapshot`]: Read-only state handed to renderers
//! - [`input`]: Runtime inputs and the shared text command language

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod driver;
pub mod input;
mod runtime;
mod snapshot;

pub use driver::Driver;
pub use input::{Command, CommandError, Input};
pub use runtime::Runtime;
pub use snapshot::Snapshot;

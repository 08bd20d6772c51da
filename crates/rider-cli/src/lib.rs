//! Console client for riders
//!
//! A thin shell over [`rider_app::Driver`] that provides console-specific
//! I/O: commands are read line by line from stdin, frames are printed as
//! text. All orchestration logic lives in the generic [`rider_app::Runtime`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod console;
pub mod store;
pub mod view;

pub use console::{ConsoleDriver, ConsoleError};
pub use store::SessionStore;
pub use rider_app::{Driver, Runtime};

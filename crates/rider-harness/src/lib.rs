//! Deterministic simulation harness for the rider client.
//!
//! In-memory implementations of the [`Environment`](rider_client::Environment)
//! and [`Driver`](rider_app::Driver) traits plus a model of the backend, so
//! the production runtime can be exercised end to end without a network or
//! a wall clock.
//!
//! # Invariant Testing
//!
//! The `invariants` module provides behavioral testing through invariant
//! checks. Invariants verify WHAT must be true across all execution paths, not
//! specific scenarios. Use [`InvariantRegistry::standard()`] for the full
//! set; [`Simulation`] checks it on every render.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod invariants;
pub mod scenario;
pub mod sim_backend;
pub mod sim_driver;
pub mod sim_env;

pub use invariants::{
    BadgeMatchesUnreadThreads, EvidenceClearedOnDelivery, Invariant, InvariantRegistry,
    InvariantResult, LoggedOutIsEmpty, OrderIdsUnique, StatusHistoryMonotonic, Violation,
};
pub use scenario::Simulation;
pub use sim_backend::{Fault, RESET_CODE, RESET_COOLDOWN_SECS, RequestRecord, SimBackend};
pub use sim_driver::{Link, SimDriver, SimDriverError};
pub use sim_env::{SIM_EPOCH_MS, SimEnv};

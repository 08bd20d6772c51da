//! Invariant checking for deterministic simulation testing.
//!
//! Invariants are properties that must always hold during system execution.
//! Unlike example-based tests that check specific scenarios, invariants
//! verify behavioral properties across all possible execution paths.
//!
//! # Architecture
//!
//! Every render publishes a [`Snapshot`] of the client. The
//! [`SimDriver`](crate::SimDriver) runs registered [`Invariant`] checks
//! against it and fails the render on violation, which stops the runtime
//! with the violation as its error.
//!
//! # Usage
//!
//! ```ignore
//! let driver = SimDriver::new(env.clone(), SimBackend::new(env))
//!     .with_invariants(InvariantRegistry::standard());
//! ```

mod checks;

use rider_app::Snapshot;

pub use checks::{
    BadgeMatchesUnreadThreads, EvidenceClearedOnDelivery, LoggedOutIsEmpty, OrderIdsUnique,
    StatusHistoryMonotonic,
};

/// Invariant check result.
pub type InvariantResult = Result<(), Violation>;

/// Invariant violation with context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Name of the violated invariant.
    pub invariant: &'static str,
    /// Description of what went wrong.
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// An invariant that can be checked against client state.
///
/// Invariants are behavioral properties that must always hold.
/// They capture WHAT must be true, not specific test scenarios.
pub trait Invariant: Send + Sync {
    /// Invariant name for error reporting.
    fn name(&self) -> &'static str;

    /// Check the invariant against the current state.
    ///
    /// Returns `Ok(())` if the invariant holds, or a [`Violation`]
    /// describing what went wrong.
    fn check(&self, state: &Snapshot) -> InvariantResult;

    /// Build a violation of this invariant.
    fn violation(&self, message: String) -> Violation {
        Violation { invariant: self.name(), message }
    }
}

/// Registry of invariants to check.
///
/// Collects multiple invariants and runs them all against client state.
/// Use [`InvariantRegistry::standard()`] for the full set.
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl Default for InvariantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InvariantRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.invariants.iter().map(|i| i.name())).finish()
    }
}

impl InvariantRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { invariants: Vec::new() }
    }

    /// Create a registry with every standard invariant.
    ///
    /// Includes:
    /// - [`BadgeMatchesUnreadThreads`]: badge counts threads, not messages
    /// - [`StatusHistoryMonotonic`]: delivery history never goes backwards
    /// - [`EvidenceClearedOnDelivery`]: delivered orders hold no staged images
    /// - [`LoggedOutIsEmpty`]: no rider data survives logout
    /// - [`OrderIdsUnique`]: an order appears at most once
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(BadgeMatchesUnreadThreads);
        registry.add(StatusHistoryMonotonic);
        registry.add(EvidenceClearedOnDelivery);
        registry.add(LoggedOutIsEmpty);
        registry.add(OrderIdsUnique);
        registry
    }

    /// Add an invariant to the registry.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Check all invariants against the given state.
    ///
    /// Returns `Ok(())` if all invariants hold, or all violations found.
    pub fn check_all(&self, state: &Snapshot) -> Result<(), Vec<Violation>> {
        let violations: Vec<_> =
            self.invariants.iter().filter_map(|inv| inv.check(state).err()).collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Number of registered invariants.
    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }
}

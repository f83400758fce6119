//! Invariant checking for session tests.
//!
//! Invariants are properties that must hold after every event a session
//! handles, whatever the order, duplication, or timing of those events.
//!
//! # Architecture
//!
//! Each step of a test is captured as an [`Observation`]: the session snapshot
//! before the step, the snapshot after it, and the actions it produced.
//! Registered [`Invariant`]s run against that observation. Violations carry
//! enough context to debug the failing step.
//!
//! # Usage
//!
//! ```ignore
//! let registry = InvariantRegistry::standard();
//! let observation = Observation::new(before, session.snapshot(), actions);
//! registry.assert_all(&observation, "after history merge");
//! ```

mod checks;
mod snapshot;

pub use checks::{
    OutboundOnlyWhenOpen, SeenMonotonic, TimelineOrdered, TypingWindowRespected, UniqueMessageIds,
};
pub use snapshot::Observation;

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

/// A property checked against one step of a session.
pub trait Invariant: Send + Sync {
    /// Invariant name for error reporting.
    fn name(&self) -> &'static str;

    /// Check the invariant against an observed step.
    ///
    /// # Errors
    ///
    /// Returns a [`Violation`] describing what went wrong.
    fn check(&self, observation: &Observation) -> InvariantResult;
}

/// Registry of invariants to check.
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
        let names: Vec<_> = self.invariants.iter().map(|inv| inv.name()).collect();
        f.debug_struct("InvariantRegistry").field("invariants", &names).finish()
    }
}

impl InvariantRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { invariants: Vec::new() }
    }

    /// Create a registry with the standard session invariants.
    ///
    /// Includes:
    /// - [`TimelineOrdered`]: messages sorted by `created_at`
    /// - [`UniqueMessageIds`]: no id appears twice
    /// - [`SeenMonotonic`]: a seen message stays seen
    /// - [`OutboundOnlyWhenOpen`]: frames are only sent on an open connection
    /// - [`TypingWindowRespected`]: typing shown only within its window
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(TimelineOrdered);
        registry.add(UniqueMessageIds);
        registry.add(SeenMonotonic);
        registry.add(OutboundOnlyWhenOpen);
        registry.add(TypingWindowRespected);
        registry
    }

    /// Add an invariant to the registry.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Check all invariants against the observation.
    ///
    /// # Errors
    ///
    /// Returns every violation found.
    pub fn check_all(&self, observation: &Observation) -> Result<(), Vec<Violation>> {
        let violations: Vec<_> =
            self.invariants.iter().filter_map(|inv| inv.check(observation).err()).collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Check all invariants, panicking with every violation found.
    ///
    /// # Panics
    ///
    /// Panics if any invariant is violated.
    #[allow(clippy::panic, reason = "assertion helper for tests")]
    pub fn assert_all(&self, observation: &Observation, context: &str) {
        if let Err(violations) = self.check_all(observation) {
            let messages: Vec<_> = violations.iter().map(ToString::to_string).collect();
            panic!("Invariant violation {context}:\n  {}", messages.join("\n  "));
        }
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

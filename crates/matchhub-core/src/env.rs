//! Environment abstraction for deterministic testing.
//!
//! Decouples drivers from the system clock. Production drivers use real time
//! (and tokio's timer); the simulation harness uses a virtual clock that only
//! advances when a test says so.

use std::time::Duration;

/// Abstract environment providing time and async sleeping.
///
/// The [`ChatSession`](crate::ChatSession) itself never touches an
/// environment: time is passed into it explicitly. Drivers use the environment
/// to stamp inbound frames and to wait for the next typing deadline.
pub trait Environment: Clone + Send + Sync + 'static {
    /// The specific instant type used by this environment.
    ///
    /// Production environments use a real monotonic instant, simulation
    /// environments use virtual time.
    type Instant: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>;

    /// Current time (monotonic).
    ///
    /// # Invariants
    ///
    /// - Subsequent calls must return times >= previous calls.
    fn now(&self) -> Self::Instant;

    /// Sleeps for the specified duration.
    ///
    /// Only driver code sleeps; session logic never does.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;
}

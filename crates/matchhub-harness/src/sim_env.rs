//! Virtual clock.
//!
//! Time only moves when a test calls [`SimEnv::advance`] or a driver sleeps.
//! Clones share one clock, so a test can hold a clone while the code under
//! test holds another.

use std::{
    ops::{Add, Sub},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use matchhub_core::Environment;

/// Point on the virtual timeline, measured from the clock's creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SimInstant(Duration);

impl SimInstant {
    /// Time since the clock started.
    pub fn elapsed(self) -> Duration {
        self.0
    }
}

impl Sub for SimInstant {
    type Output = Duration;

    fn sub(self, earlier: Self) -> Duration {
        self.0.saturating_sub(earlier.0)
    }
}

impl Add<Duration> for SimInstant {
    type Output = Self;

    fn add(self, duration: Duration) -> Self {
        Self(self.0.saturating_add(duration))
    }
}

/// Shared virtual clock implementing [`Environment`].
#[derive(Debug, Clone, Default)]
pub struct SimEnv {
    nanos: Arc<AtomicU64>,
}

impl SimEnv {
    /// Clock at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward.
    pub fn advance(&self, duration: Duration) {
        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        self.nanos.fetch_add(nanos, Ordering::SeqCst);
    }
}

impl Environment for SimEnv {
    type Instant = SimInstant;

    fn now(&self) -> SimInstant {
        SimInstant(Duration::from_nanos(self.nanos.load(Ordering::SeqCst)))
    }

    /// Advances the clock by `duration` and completes immediately.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        self.advance(duration);
        async {}
    }
}

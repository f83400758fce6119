//! Production Environment implementation using tokio time.
//!
//! `SystemEnv` reads tokio's monotonic clock and sleeps on tokio's timer. Under
//! a paused tokio runtime both follow the runtime's virtual clock, so runner
//! tests stay fast and deterministic without a separate environment.

use std::time::Duration;

use matchhub_core::Environment;

/// Production environment backed by tokio's clock and timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    type Instant = tokio::time::Instant;

    fn now(&self) -> Self::Instant {
        tokio::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn system_env_sleep_works() {
        let env = SystemEnv::new();

        let start = env.now();
        env.sleep(Duration::from_millis(20)).await;
        let elapsed = env.now() - start;

        assert!(elapsed >= Duration::from_millis(20), "Sleep should wait at least 20ms");
    }
}

//! Real-time environment for runs against hardware.

use std::time::{Duration, Instant};

use troth_core::Environment;

/// Production [`Environment`] backed by system time and OS randomness.
///
/// Used when the conformance core drives real controllers, where settle
/// delays have to be real wall-clock waits.
#[derive(Clone, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer).unwrap_or_else(|e| {
            // Should never fail on supported platforms; zero-fill rather
            // than panic mid-run if it somehow does.
            tracing::error!("getrandom failed: {}", e);
            buffer.fill(0);
        });
    }
}

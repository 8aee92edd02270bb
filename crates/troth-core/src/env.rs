//! Environment abstraction for time and randomness.
//!
//! Settle waits and event timeouts go through this trait so the matrix can
//! run against virtual time in tests and real time against hardware. The
//! simulated peer service also draws its numeric comparison values from
//! here, which keeps whole runs reproducible from a seed.

use std::time::{Duration, Instant};

/// Abstract source of time and randomness.
///
/// Implementations must keep `now()` monotonic within one execution and, in
/// simulation, must derive `random_bytes()` from a logged seed so failures
/// reproduce.
pub trait Environment: Clone + Send + Sync + 'static {
    /// Returns the current time.
    fn now(&self) -> Instant;

    /// Sleeps for the specified duration.
    ///
    /// The only async method in the trait; used for settle waits, never for
    /// event synchronization.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;

    /// Fills the provided buffer with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random `u32`.
    ///
    /// Convenience for numeric comparison values and passkeys.
    fn random_u32(&self) -> u32 {
        let mut bytes = [0u8; 4];
        self.random_bytes(&mut bytes);
        u32::from_be_bytes(bytes)
    }
}

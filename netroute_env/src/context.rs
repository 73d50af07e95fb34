//! Core environment context trait for the routing engine.

use async_trait::async_trait;
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

/// The central interface for Environment Interaction.
///
/// This trait abstracts the "real world" so that the routing engine can run
/// against a real frame clock or a virtual one.
///
/// # Implementations
///
/// - **Production**: `TokioContext` - wraps `tokio::time`, `OsRng`
/// - **Simulation**: `SimContext` - virtual clock, `ChaCha8Rng(seed)`
///
/// # Determinism
///
/// All methods that would normally introduce non-determinism
/// (time, randomness) are controlled by the implementation.
#[async_trait]
pub trait RouteContext: Send + Sync + 'static {
    /// Returns the current monotonic time since context creation.
    ///
    /// This is the time source of the packet animation clock.
    /// In simulation, this is the virtual clock time.
    fn now(&self) -> Duration;

    /// Suspends execution for the given duration.
    ///
    /// In production: wraps `tokio::time::sleep`
    /// In simulation: advances virtual clock
    async fn sleep(&self, duration: Duration);

    /// Returns a random number generator derived from a seed extension.
    ///
    /// The topology generator draws from this. The implementation combines
    /// the global seed with `seed_extension` so that each regeneration gets
    /// a unique but reproducible stream.
    ///
    /// # Arguments
    /// * `seed_extension` - A value to combine with the global seed
    fn rng(&self, seed_extension: u64) -> ChaCha8Rng;

    /// Returns the context's seed (for logging/debugging).
    ///
    /// In production, returns 0 (not seeded).
    /// In simulation, returns the master seed.
    fn seed(&self) -> u64;
}

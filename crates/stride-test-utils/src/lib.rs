//! Shared test fixtures and utilities for stride crates.
//!
//! Provides mock collaborators for the constraint engine, deterministic RNG
//! setup and a tracing subscriber for test output.

pub mod mocks;
pub mod rng;

// ---------------------------------------------------------------------------
// Re-exports for convenience
// ---------------------------------------------------------------------------

pub use mocks::{ConstantSwingReference, FlatGround, PointFootKinematics};
pub use rng::{random_vector, seeded_rng};

/// Route `tracing` output through the test harness.
///
/// Honors `RUST_LOG`; safe to call from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

//! Core primitives.
//!
//! Simulated time, injectable randomness and state fingerprinting. Nothing
//! in here knows about players or rounds.

pub mod clock;
pub mod rng;
pub mod hash;

// Re-export core types
pub use clock::{Millis, SimClock, secs};
pub use rng::{DeterministicRng, RandomSource, ScriptedRng};
pub use hash::{StateHash, derive_session_seed};

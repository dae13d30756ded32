//! Snapshot Fingerprinting
//!
//! Deterministic hashing of session state for:
//! - Change detection on the presentation side (skip re-render when unchanged)
//! - Seed derivation from a session identifier

use sha2::{Sha256, Digest};

/// Hash output type (256 bits / 32 bytes)
pub type StateHash = [u8; 32];

/// Deterministic hasher for session state.
///
/// Wraps SHA-256 with length-prefixed helpers so adjacent strings
/// cannot collide ("ab" + "c" vs "a" + "bc").
/// Order of updates is critical for determinism.
pub struct StateHasher {
    hasher: Sha256,
}

impl StateHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Create hasher for session snapshots.
    pub fn for_snapshot() -> Self {
        Self::new(b"LIVESKETCH_SNAPSHOT_V1")
    }

    /// Update with a u8 value.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.hasher.update([value]);
    }

    /// Update with a u32 value (little-endian).
    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a u64 value (little-endian).
    #[inline]
    pub fn update_u64(&mut self, value: u64) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a boolean.
    #[inline]
    pub fn update_bool(&mut self, value: bool) {
        self.update_u8(value as u8);
    }

    /// Update with a length-prefixed UTF-8 string.
    #[inline]
    pub fn update_str(&mut self, value: &str) {
        self.update_u64(value.len() as u64);
        self.hasher.update(value.as_bytes());
    }

    /// Update with an optional value; `None` and `Some` hash differently.
    #[inline]
    pub fn update_opt_u64(&mut self, value: Option<u64>) {
        match value {
            Some(v) => {
                self.update_u8(1);
                self.update_u64(v);
            }
            None => self.update_u8(0),
        }
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> StateHash {
        self.hasher.finalize().into()
    }
}

/// Compute a snapshot hash.
///
/// This function is called by `SessionState::compute_hash()`.
/// The closure adds session-specific data after the round number.
pub fn compute_snapshot_hash<F>(round: u32, add_state: F) -> StateHash
where
    F: FnOnce(&mut StateHasher),
{
    let mut hasher = StateHasher::for_snapshot();
    hasher.update_u32(round);
    add_state(&mut hasher);
    hasher.finalize()
}

/// Derive an RNG seed from a session identifier.
///
/// Used when the configuration does not pin a seed: each session still gets
/// a reproducible sequence, recoverable from its id.
pub fn derive_session_seed(session_id: &[u8; 16]) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(b"LIVESKETCH_SEED_V1");
    hasher.update(session_id);
    let hash = hasher.finalize();

    let mut seed = [0u8; 8];
    seed.copy_from_slice(&hash[0..8]);
    u64::from_le_bytes(seed)
}

// =============================================================================
// TESTS
// =============================================================================

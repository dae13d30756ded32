//! # LiveSketch Engine
//!
//! Game-state engine for LiveSketch Battle, a drawing-and-guessing party
//! game where simulated bots stand in for remote players.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    LIVESKETCH ENGINE                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  config.rs       - Engine configuration (+ env overrides)    │
//! │                                                              │
//! │  core/           - Primitives                                │
//! │  ├── clock.rs    - Simulated millisecond clock               │
//! │  ├── rng.rs      - Injectable, seedable random sources       │
//! │  └── hash.rs     - Snapshot fingerprints, seed derivation    │
//! │                                                              │
//! │  game/           - Game logic (deterministic)                │
//! │  ├── matcher.rs  - Guess matching                            │
//! │  ├── state.rs    - Roster, messages, round state             │
//! │  ├── events.rs   - Transition records                        │
//! │  ├── round.rs    - Round/turn state machine                  │
//! │  ├── bot.rs      - Bot simulator                             │
//! │  ├── schedule.rs - Cancellable timers                        │
//! │  └── engine.rs   - Session orchestrator                      │
//! │                                                              │
//! │  runtime/        - Hosting (non-deterministic)               │
//! │  ├── protocol.rs - Actions and updates                       │
//! │  ├── session.rs  - tokio-driven live session                 │
//! │  └── manager.rs  - Registry of sessions                      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! The `core/` and `game/` modules never read the system clock or an
//! unseeded random source. Given the same configuration, seed and action
//! sequence at the same simulated instants, a session produces the same
//! log, scores and snapshot fingerprint.
//!
//! ## Example
//!
//! ```
//! use livesketch::{EngineConfig, GameEngine, IntendedKind, SubmitOutcome};
//!
//! let mut engine = GameEngine::new(EngineConfig::default());
//!
//! // Round 1: the local player draws, so their guesses are plain chat.
//! let outcome = engine.submit_message("cat", IntendedKind::Guess);
//! assert_eq!(outcome, SubmitOutcome::Chat);
//!
//! engine.report_time_up();
//! engine.advance_time(3_000);
//! assert_eq!(engine.snapshot().game.current_round, 2);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod core;
pub mod game;
pub mod runtime;

// Re-export commonly used types
pub use config::{ConfigError, EngineConfig};
pub use core::clock::{Millis, SimClock};
pub use core::rng::{DeterministicRng, RandomSource, ScriptedRng};
pub use game::engine::{GameEngine, IntendedKind, Snapshot, SubmitOutcome};
pub use game::state::{GamePhase, Message, MessageKind, Player, PlayerId};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Rounds per session
pub const DEFAULT_TOTAL_ROUNDS: u32 = 8;

/// Round length (seconds)
pub const DEFAULT_ROUND_DURATION_SECS: u32 = 90;

/// Points for a correct guess
pub const DEFAULT_POINTS_PER_GUESS: u32 = 100;

/// Bot decision cadence (ms)
pub const DEFAULT_BOT_INTERVAL_MS: u64 = 3000;

/// Countdown step while drawing (ms)
pub const DEFAULT_COUNTDOWN_INTERVAL_MS: u64 = 1000;

/// Pause between the reveal and the next round (ms)
pub const DEFAULT_RESULTS_DELAY_MS: u64 = 3000;

/// Simulated opponents per session
pub const DEFAULT_BOT_COUNT: usize = 3;

/// Real-time pacing step of a hosted session (ms)
pub const DEFAULT_FRAME_MS: u64 = 100;

/// Updates buffered per subscriber of a hosted session
pub const UPDATE_CHANNEL_CAPACITY: usize = 256;

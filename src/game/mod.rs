//! Game Logic Module
//!
//! Everything that decides what happens in a session. No I/O, no wall
//! clock; all randomness comes through [`RandomSource`](crate::core::rng::RandomSource).
//!
//! ## Module Structure
//!
//! - `matcher`: Guess evaluation against the prompt
//! - `state`: Roster, message log, round state
//! - `events`: Structured transition records
//! - `round`: Round/turn state machine
//! - `bot`: Simulated opponents
//! - `schedule`: Cancellable timers in simulated time
//! - `engine`: Session orchestrator and snapshot

pub mod matcher;
pub mod state;
pub mod events;
pub mod round;
pub mod bot;
pub mod schedule;
pub mod engine;

// Re-export key types
pub use state::{GamePhase, GameState, Message, MessageKind, Player, PlayerId, SessionState};
pub use events::{GameEvent, GameEventData};
pub use round::RoundTransition;
pub use bot::{BotDecision, BotTuning};
pub use engine::{GameEngine, IntendedKind, Snapshot, SubmitOutcome};

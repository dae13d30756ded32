//! Session Hosting
//!
//! Runs engines inside tokio tasks and exposes them to a presentation
//! layer. This layer is **non-deterministic** (wall-clock pacing); all game
//! decisions still happen in `game/`.

pub mod protocol;
pub mod session;
pub mod manager;

pub use protocol::{ClientAction, SessionUpdate, ErrorCode};
pub use session::{LiveSession, RuntimeConfig, SessionError, SessionId};
pub use manager::SessionManager;

//! Protocol Messages
//!
//! What a presentation layer sends to a live session and what it gets
//! back. Actions and updates are tagged JSON for a browser bridge; full
//! snapshots also have a compact binary (bincode) form.

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

use crate::game::engine::{IntendedKind, Snapshot, SubmitOutcome};
use crate::game::events::GameEvent;
use crate::game::state::{Player, PlayerId};

// =============================================================================
// CLIENT -> SESSION
// =============================================================================

/// Actions a presentation layer can take.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientAction {
    /// Post a guess or a chat line as the local player.
    Submit {
        /// Text as typed
        content: String,
        /// Guess or chat
        kind: IntendedKind,
    },

    /// The round timer widget ran out.
    TimeUp,

    /// The confetti animation finished.
    ConsumeConfetti,

    /// Skip the rest of the results pause.
    AdvanceRound,

    /// Request the current snapshot.
    SyncRequest,

    /// The local player is leaving; the session shuts down.
    Leave,
}

// =============================================================================
// SESSION -> CLIENT
// =============================================================================

/// Updates pushed by a live session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionUpdate {
    /// Sent once per subscriber on request.
    Joined(JoinInfo),

    /// The rendered state changed.
    Snapshot(Snapshot),

    /// Transitions since the previous update.
    Events {
        /// Events in occurrence order
        events: Vec<GameEvent>,
    },

    /// Result of a submitted message.
    Submitted {
        /// How the message was recorded
        outcome: SubmitOutcome,
    },

    /// The last round ended.
    Finished(FinalStandings),

    /// An action could not be applied.
    Error(SessionErrorInfo),

    /// The session shut down; no further updates follow.
    Closed,
}

/// Session metadata for a newly attached client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinInfo {
    /// Session id (hex)
    pub session_id: String,
    /// The local player
    pub local_player: PlayerId,
    /// Rounds in the session
    pub total_rounds: u32,
    /// Round length (seconds)
    pub round_duration_secs: u32,
    /// Wall-clock creation time
    pub created_at: DateTime<Utc>,
}

/// Final display data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalStandings {
    /// Players by descending score
    pub standings: Vec<Player>,
    /// Top scorer, if anyone scored
    pub winner: Option<PlayerId>,
}

/// Error payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionErrorInfo {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
}

/// Error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Payload did not parse.
    InvalidInput,
    /// No session with that id.
    SessionNotFound,
    /// Session already shut down.
    SessionClosed,
    /// Internal error.
    InternalError,
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientAction {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl SessionUpdate {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Build an error update.
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        SessionUpdate::Error(SessionErrorInfo {
            code,
            message: message.into(),
        })
    }
}

// Tagged enums (#[serde(tag = "type")]) are not supported by bincode, so
// only the flat snapshot struct gets a binary form.
impl Snapshot {
    /// Serialize to binary.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Deserialize from binary.
    pub fn from_bytes(data: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::game::engine::GameEngine;

    #[test]
    fn test_client_action_json_shape() {
        let action = ClientAction::from_json(
            r#"{"type":"submit","content":"ice cream","kind":"guess"}"#,
        )
        .unwrap();
        assert_eq!(
            action,
            ClientAction::Submit {
                content: "ice cream".into(),
                kind: IntendedKind::Guess,
            }
        );

        let json = ClientAction::ConsumeConfetti.to_json().unwrap();
        assert_eq!(json, r#"{"type":"consume_confetti"}"#);
    }

    #[test]
    fn test_invalid_action_rejected() {
        assert!(ClientAction::from_json(r#"{"type":"draw"}"#).is_err());
        assert!(ClientAction::from_json("not json").is_err());
    }

    #[test]
    fn test_update_json_roundtrip() {
        let update = SessionUpdate::Submitted {
            outcome: SubmitOutcome::Guess { correct: true, awarded: Some(100) },
        };
        let json = update.to_json().unwrap();
        assert!(json.contains(r#""type":"submitted""#));
        assert_eq!(SessionUpdate::from_json(&json).unwrap(), update);

        let error = SessionUpdate::error(ErrorCode::SessionClosed, "gone");
        let json = error.to_json().unwrap();
        assert!(json.contains("session_closed"));
    }

    #[test]
    fn test_snapshot_update_json() {
        let engine = GameEngine::new(EngineConfig::default());
        let update = SessionUpdate::Snapshot(engine.snapshot());

        let json = update.to_json().unwrap();
        assert!(json.contains(r#""type":"snapshot""#));
        assert!(json.contains(r#""phase":"drawing""#));
        assert_eq!(SessionUpdate::from_json(&json).unwrap(), update);
    }

    #[test]
    fn test_binary_snapshot() {
        let mut engine = GameEngine::new(EngineConfig { rng_seed: Some(9), ..Default::default() });
        engine.advance_time(30_000);
        let snapshot = engine.snapshot();

        let bytes = snapshot.to_bytes().unwrap();
        let decoded = Snapshot::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, snapshot);
        assert!(bytes.len() < snapshot_json_len(&snapshot));
    }

    fn snapshot_json_len(snapshot: &Snapshot) -> usize {
        serde_json::to_string(snapshot).map(|s| s.len()).unwrap_or(0)
    }
}

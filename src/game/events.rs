//! Game Events
//!
//! Structured record of every transition, drained by observers (the async
//! session host, the demo binary, tests). The message log is what players
//! read; events are what code reacts to.

use serde::{Serialize, Deserialize};

use crate::core::clock::Millis;
use crate::game::state::PlayerId;

/// Game event data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEventData {
    /// A round entered the drawing phase.
    RoundStarted {
        /// Player drawing the round
        artist_id: PlayerId,
        /// Hidden phrase
        prompt: String,
    },

    /// A scored guess was evaluated (chat-downgraded guesses are not recorded).
    GuessMade {
        /// Guesser
        player_id: PlayerId,
        /// Matcher verdict
        correct: bool,
    },

    /// Points were added to a player.
    PointsAwarded {
        /// Scorer
        player_id: PlayerId,
        /// Points added
        points: u32,
        /// Total after the award
        new_score: u32,
    },

    /// The confetti trigger went from lowered to raised.
    ConfettiRaised,

    /// The round timer ran out; the prompt is now public.
    TimeUp {
        /// The revealed phrase
        prompt: String,
    },

    /// The final round ended.
    GameFinished {
        /// Top scorer, if anyone scored
        winner_id: Option<PlayerId>,
    },
}

/// A game event with timing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Simulated instant the event occurred
    pub at: Millis,

    /// Round the event belongs to
    pub round: u32,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(at: Millis, round: u32, data: GameEventData) -> Self {
        Self { at, round, data }
    }

    /// Create round started event.
    pub fn round_started(at: Millis, round: u32, artist_id: PlayerId, prompt: String) -> Self {
        Self::new(at, round, GameEventData::RoundStarted { artist_id, prompt })
    }

    /// Create guess made event.
    pub fn guess_made(at: Millis, round: u32, player_id: PlayerId, correct: bool) -> Self {
        Self::new(at, round, GameEventData::GuessMade { player_id, correct })
    }

    /// Create points awarded event.
    pub fn points_awarded(
        at: Millis,
        round: u32,
        player_id: PlayerId,
        points: u32,
        new_score: u32,
    ) -> Self {
        Self::new(
            at,
            round,
            GameEventData::PointsAwarded {
                player_id,
                points,
                new_score,
            },
        )
    }

    /// Create time up event.
    pub fn time_up(at: Millis, round: u32, prompt: String) -> Self {
        Self::new(at, round, GameEventData::TimeUp { prompt })
    }

    /// Create game finished event.
    pub fn game_finished(at: Millis, round: u32, winner_id: Option<PlayerId>) -> Self {
        Self::new(at, round, GameEventData::GameFinished { winner_id })
    }

    /// Player the event is about, if any.
    pub fn player_id(&self) -> Option<&PlayerId> {
        match &self.data {
            GameEventData::RoundStarted { artist_id, .. } => Some(artist_id),
            GameEventData::GuessMade { player_id, .. } => Some(player_id),
            GameEventData::PointsAwarded { player_id, .. } => Some(player_id),
            GameEventData::GameFinished { winner_id, .. } => winner_id.as_ref(),
            GameEventData::ConfettiRaised | GameEventData::TimeUp { .. } => None,
        }
    }
}

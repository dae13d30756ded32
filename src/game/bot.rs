//! Bot Simulator
//!
//! Stands in for remote players. Each bot tick picks one eligible bot and
//! rolls whether it speaks up, and whether what it says is right. Both
//! rolls get likelier as the round runs on:
//!
//! ```text
//! correct_chance = min(elapsed_secs / 60, 0.8)
//! P(speak)       = correct_chance * 0.1
//! P(right|speak) = correct_chance
//! ```
//!
//! [`decide`] only reads the session; the engine applies the result.

use serde::{Serialize, Deserialize};

use crate::core::clock::{elapsed_secs, Millis};
use crate::core::rng::RandomSource;
use crate::game::matcher;
use crate::game::state::{GamePhase, Player, PlayerId, SessionState};

/// Filler posted by bots that guess wrong.
pub const WRONG_GUESSES: [&str; 9] = [
    "hmm...",
    "maybe a tree?",
    "is it a house?",
    "looks like a car",
    "dog?",
    "person?",
    "building?",
    "animal?",
    "not sure...",
];

/// Knobs of the bot behavior model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotTuning {
    /// Seconds of round time until the chance stops ramping
    pub ramp_secs: f64,
    /// Ceiling of the correct chance
    pub max_correct_chance: f64,
    /// Fraction of the correct chance used as the per-tick activation chance
    pub activation_factor: f64,
}

impl Default for BotTuning {
    fn default() -> Self {
        Self {
            ramp_secs: 60.0,
            max_correct_chance: 0.8,
            activation_factor: 0.1,
        }
    }
}

impl BotTuning {
    /// Chance that a guess made after `elapsed` seconds is right.
    pub fn correct_chance(&self, elapsed: f64) -> f64 {
        if self.ramp_secs <= 0.0 {
            return self.max_correct_chance;
        }
        (elapsed.max(0.0) / self.ramp_secs).min(self.max_correct_chance)
    }

    /// Chance that the selected bot says anything this tick.
    pub fn activation_chance(&self, elapsed: f64) -> f64 {
        self.correct_chance(elapsed) * self.activation_factor
    }
}

/// A guess a bot wants to post.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BotGuess {
    /// Bot making the guess
    pub player_id: PlayerId,
    /// Text to post
    pub content: String,
    /// Whether the guess counts as correct
    pub correct: bool,
}

/// Result of one bot tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BotDecision {
    /// Not drawing; bots stay quiet.
    Inactive,
    /// Every bot is either drawing or already scored.
    NoCandidates,
    /// A bot was picked but stayed quiet this tick.
    Idle {
        /// The bot that was picked
        player_id: PlayerId,
    },
    /// A bot posts a guess.
    Guess(BotGuess),
}

/// Bots that may guess this round: not the human, not the artist, not yet
/// scored. Roster order.
pub fn eligible_bots<'a>(state: &'a SessionState, human: &PlayerId) -> Vec<&'a Player> {
    state
        .players
        .iter()
        .filter(|p| &p.id != human)
        .filter(|p| !state.is_artist(&p.id))
        .filter(|p| !state.has_guessed_correctly(&p.id))
        .collect()
}

/// Run one bot tick against the current state.
///
/// Roll order is fixed (pick, speak, right, phrasing) so a seeded source
/// replays the same session.
pub fn decide<R: RandomSource>(
    state: &SessionState,
    human: &PlayerId,
    now: Millis,
    tuning: &BotTuning,
    rng: &mut R,
) -> BotDecision {
    if state.game.phase != GamePhase::Drawing {
        return BotDecision::Inactive;
    }

    let pool = eligible_bots(state, human);
    let Some(bot) = rng.choose(&pool) else {
        return BotDecision::NoCandidates;
    };
    let player_id = bot.id.clone();

    let elapsed = state
        .game
        .round_start
        .map(|start| elapsed_secs(start, now))
        .unwrap_or(0.0);
    let chance = tuning.correct_chance(elapsed);

    let speaks = rng.chance(chance * tuning.activation_factor);

    #[cfg(feature = "debug-tracing")]
    tracing::debug!(bot = %player_id, elapsed, chance, speaks, "Bot roll");

    if !speaks {
        return BotDecision::Idle { player_id };
    }

    let prompt = &state.game.current_prompt;
    let correct = rng.chance(chance);
    let content = if correct {
        correct_phrasing(prompt, rng)
    } else {
        wrong_phrasing(prompt, rng)
    };

    BotDecision::Guess(BotGuess {
        player_id,
        content,
        correct,
    })
}

/// One of: the prompt as written, lowercased, or its first word.
/// Only phrasings the matcher accepts are offered.
fn correct_phrasing<R: RandomSource>(prompt: &str, rng: &mut R) -> String {
    let first_word = prompt.split_whitespace().next().unwrap_or(prompt);
    let candidates: Vec<String> = [prompt.to_string(), prompt.to_lowercase(), first_word.to_string()]
        .into_iter()
        .filter(|c| matcher::is_correct(prompt, c))
        .collect();

    rng.choose(&candidates)
        .cloned()
        .unwrap_or_else(|| prompt.to_string())
}

/// Filler text that does not accidentally match the prompt.
fn wrong_phrasing<R: RandomSource>(prompt: &str, rng: &mut R) -> String {
    let candidates: Vec<&str> = WRONG_GUESSES
        .iter()
        .copied()
        .filter(|c| !matcher::is_correct(prompt, c))
        .collect();

    rng.choose(&candidates)
        .copied()
        .unwrap_or(WRONG_GUESSES[0])
        .to_string()
}

// =============================================================================
// TESTS
// =============================================================================

//! Round/Turn State Machine
//!
//! ```text
//!   waiting ──▶ drawing ──time up──▶ results ──advance──▶ drawing (round + 1)
//!                                        │
//!                                        └──advance on last round──▶ finished
//! ```
//!
//! These functions are the only writers of [`GameState`]. They do not
//! schedule anything themselves; the engine decides when they run and
//! guards stale callers.

use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::core::clock::Millis;
use crate::core::rng::RandomSource;
use crate::game::events::GameEvent;
use crate::game::state::{GamePhase, GameState, Player, PlayerId, SessionState, UNKNOWN_NAME};

/// Built-in prompt list. The first entry is the opening prompt.
pub const DEFAULT_PROMPTS: [&str; 20] = [
    "Cat sleeping on a windowsill",
    "Person riding a bicycle",
    "Sunset over mountains",
    "Birthday cake with candles",
    "Robot playing guitar",
    "Butterfly on a flower",
    "Pirate ship on the ocean",
    "Dragon breathing fire",
    "Ice cream cone",
    "Superhero flying",
    "House with a garden",
    "Elephant at the zoo",
    "Spaceship landing on Mars",
    "Chef cooking pasta",
    "Owl sitting on a branch",
    "Beach with palm trees",
    "Knight on a horse",
    "Raindrops on a window",
    "Dog playing fetch",
    "Wizard casting a spell",
];

/// First entry of every session log.
pub const WELCOME_MESSAGE: &str = "Welcome to LiveSketch Battle! Get ready to draw and guess!";

/// Closing entry once the last round ends.
pub const FINISHED_MESSAGE: &str = "Game finished! Thanks for playing!";

/// Announcement appended when a round starts.
pub fn round_announcement(round: u32, artist_name: &str) -> String {
    format!("Round {round} - {artist_name} is drawing!")
}

/// Reveal appended when the timer runs out.
pub fn reveal_message(prompt: &str) -> String {
    format!("Time's up! The answer was: {prompt}")
}

/// Outcome of [`advance`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundTransition {
    /// A new round entered the drawing phase.
    Started {
        /// The new round number
        round: u32,
    },
    /// The last round ended; the session is over.
    Finished,
    /// The session was already finished; nothing changed.
    Ignored,
}

/// Build the opening state of a session.
///
/// Round 1 starts immediately in the drawing phase with the first roster
/// entry (the human) as artist and the first configured prompt. The log
/// opens with the welcome message; no round announcement is posted for
/// round 1.
pub fn initial_state(config: &EngineConfig, players: Vec<Player>, now: Millis) -> SessionState {
    let artist = players
        .first()
        .map(|p| p.id.clone())
        .unwrap_or_else(PlayerId::human);
    let prompt = config
        .prompts
        .first()
        .cloned()
        .unwrap_or_else(|| DEFAULT_PROMPTS[0].to_string());

    let game = GameState {
        current_round: 1,
        total_rounds: config.total_rounds,
        current_artist: artist.clone(),
        current_prompt: prompt.clone(),
        time_left: config.round_duration_secs,
        phase: GamePhase::Drawing,
        round_start: Some(now),
    };

    let mut state = SessionState::new(players, game);
    state.push_system(WELCOME_MESSAGE, now);
    state.push_event(GameEvent::round_started(now, 1, artist, prompt));
    state
}

/// The player after the current artist in roster order, wrapping around.
///
/// Falls back to the first roster entry if the current artist is unknown.
pub fn next_artist(state: &SessionState) -> Option<&Player> {
    let len = state.players.len();
    if len == 0 {
        return None;
    }
    let next = state
        .player_index(&state.game.current_artist)
        .map(|idx| (idx + 1) % len)
        .unwrap_or(0);
    state.players.get(next)
}

/// Start the current round: rotate the artist, pick a prompt, reset the
/// countdown, clear correct guessers, announce, stamp the start time.
///
/// `current_round` must already hold the new round number.
pub fn start_round<R: RandomSource>(
    state: &mut SessionState,
    config: &EngineConfig,
    rng: &mut R,
    now: Millis,
) {
    let (artist_id, artist_name) = match next_artist(state) {
        Some(p) => (p.id.clone(), p.name.clone()),
        None => (state.game.current_artist.clone(), UNKNOWN_NAME.to_string()),
    };

    let prompt = rng
        .choose(&config.prompts)
        .cloned()
        .unwrap_or_else(|| DEFAULT_PROMPTS[0].to_string());

    let round = state.game.current_round;
    let game = &mut state.game;
    game.current_artist = artist_id.clone();
    game.current_prompt = prompt.clone();
    game.time_left = config.round_duration_secs;
    game.phase = GamePhase::Drawing;
    game.round_start = Some(now);

    state.correct_guessers.clear();
    state.push_system(round_announcement(round, &artist_name), now);

    info!(round, artist = %artist_id, "Round started");
    state.push_event(GameEvent::round_started(now, round, artist_id, prompt));
}

/// Drawing → results. Reveals the prompt.
///
/// Returns `false` (and changes nothing) unless the round is drawing, so a
/// duplicate time-up report cannot reveal twice or schedule a second advance.
pub fn time_up(state: &mut SessionState, now: Millis) -> bool {
    if state.game.phase != GamePhase::Drawing {
        return false;
    }

    state.game.phase = GamePhase::Results;
    state.game.time_left = 0;

    let prompt = state.game.current_prompt.clone();
    let round = state.game.current_round;
    state.push_system(reveal_message(&prompt), now);

    info!(round, "Time up");
    state.push_event(GameEvent::time_up(now, round, prompt));
    true
}

/// Move to the next round, or finish after the last one.
pub fn advance<R: RandomSource>(
    state: &mut SessionState,
    config: &EngineConfig,
    rng: &mut R,
    now: Millis,
) -> RoundTransition {
    if state.game.phase == GamePhase::Finished {
        warn!(round = state.game.current_round, "Advance requested on a finished session");
        return RoundTransition::Ignored;
    }

    if state.game.current_round >= state.game.total_rounds {
        finish(state, now);
        return RoundTransition::Finished;
    }

    state.game.current_round += 1;
    start_round(state, config, rng, now);
    RoundTransition::Started {
        round: state.game.current_round,
    }
}

/// Enter the terminal phase.
fn finish(state: &mut SessionState, now: Millis) {
    state.game.phase = GamePhase::Finished;
    state.game.round_start = None;
    state.push_system(FINISHED_MESSAGE, now);

    let winner = state.leader().map(|p| p.id.clone());
    let round = state.game.current_round;
    info!(round, winner = ?winner, "Game finished");
    state.push_event(GameEvent::game_finished(now, round, winner));
}

/// One countdown second. Returns `true` when the timer has just hit zero.
///
/// Only counts while drawing; the caller fires [`time_up`] on `true`.
pub fn tick_countdown(state: &mut SessionState) -> bool {
    if state.game.phase != GamePhase::Drawing || state.game.time_left == 0 {
        return false;
    }
    state.game.time_left -= 1;
    state.game.time_left == 0
}

// =============================================================================
// TESTS
// =============================================================================

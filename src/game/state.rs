//! Game State Definitions
//!
//! Everything a session owns: roster, message log, round state,
//! correct-guesser set and the confetti trigger. Only the round state
//! machine and the engine mutate it.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Serialize, Deserialize};

use crate::core::clock::Millis;
use crate::core::hash::{StateHash, compute_snapshot_hash};
use crate::game::events::{GameEvent, GameEventData};

/// Bot display names, assigned in order.
pub const BOT_NAMES: [&str; 7] = ["Alice", "Bob", "Charlie", "Diana", "Eve", "Frank", "Grace"];

/// Avatar tags handed to the presentation layer, assigned cyclically.
pub const AVATAR_TAGS: [&str; 8] = [
    "from-blue-400 to-blue-600",
    "from-green-400 to-green-600",
    "from-purple-400 to-purple-600",
    "from-red-400 to-red-600",
    "from-yellow-400 to-yellow-600",
    "from-pink-400 to-pink-600",
    "from-indigo-400 to-indigo-600",
    "from-teal-400 to-teal-600",
];

/// Author name shown on system messages.
pub const SYSTEM_NAME: &str = "System";

/// Author name used when a message names a player not in the roster.
pub const UNKNOWN_NAME: &str = "Unknown";

// =============================================================================
// PLAYER ID
// =============================================================================

/// Unique player identifier, stable for the session.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    /// Create from any string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The local human player.
    pub fn human() -> Self {
        Self::new("player-1")
    }

    /// The `n`th bot (1-based).
    pub fn bot(n: usize) -> Self {
        Self(format!("bot-{n}"))
    }

    /// Author id of system messages. Never a roster member.
    pub fn system() -> Self {
        Self::new("system")
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// PLAYER
// =============================================================================

/// A roster member.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Unique player ID
    pub id: PlayerId,

    /// Display name
    pub name: String,

    /// Accumulated score
    pub score: u32,

    /// Presentation hint for the avatar
    pub avatar: String,

    /// Shown in the "players online" counter
    pub is_online: bool,
}

impl Player {
    /// Create a new online player with zero score.
    pub fn new(id: PlayerId, name: impl Into<String>, avatar: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            score: 0,
            avatar: avatar.into(),
            is_online: true,
        }
    }

    /// Add score, returning the new total.
    pub fn add_score(&mut self, amount: u32) -> u32 {
        self.score = self.score.saturating_add(amount);
        self.score
    }
}

/// Build the session roster: the human first, then `bot_count` bots.
///
/// `bot_count` is capped at the number of bot names.
pub fn build_roster(human_name: &str, bot_count: usize) -> Vec<Player> {
    let bot_count = bot_count.min(BOT_NAMES.len());
    let mut players = Vec::with_capacity(bot_count + 1);

    players.push(Player::new(PlayerId::human(), human_name, AVATAR_TAGS[0]));
    for (i, name) in BOT_NAMES.iter().take(bot_count).enumerate() {
        let avatar = AVATAR_TAGS[(i + 1) % AVATAR_TAGS.len()];
        players.push(Player::new(PlayerId::bot(i + 1), *name, avatar));
    }

    players
}

// =============================================================================
// MESSAGE
// =============================================================================

/// Kind of a chat-log entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// A guess that was evaluated against the prompt
    Guess,
    /// Free chat (including guesses that could not be scored)
    Chat,
    /// Engine announcement
    System,
}

/// An entry of the append-only chat log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique, monotonically assigned id ("msg-1", "msg-2", ...)
    pub id: String,

    /// Author (or `system`)
    pub author_id: PlayerId,

    /// Author name at the time of posting
    pub author_name: String,

    /// Text as submitted
    pub content: String,

    /// Simulated instant of posting
    pub timestamp: Millis,

    /// Entry kind
    pub kind: MessageKind,

    /// Match result, present only on guesses
    pub is_correct: Option<bool>,
}

// =============================================================================
// GAME PHASE
// =============================================================================

/// Current phase of the game.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// Before the first round
    #[default]
    Waiting,
    /// Artist draws, others guess
    Drawing,
    /// Declared for clients; no transition enters it
    Guessing,
    /// Prompt revealed, next round pending
    Results,
    /// Terminal
    Finished,
}

impl GamePhase {
    fn tag(self) -> u8 {
        match self {
            GamePhase::Waiting => 0,
            GamePhase::Drawing => 1,
            GamePhase::Guessing => 2,
            GamePhase::Results => 3,
            GamePhase::Finished => 4,
        }
    }
}

// =============================================================================
// GAME STATE
// =============================================================================

/// Round bookkeeping, mutated only by the round state machine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// 1-based round number
    pub current_round: u32,

    /// Rounds in the session
    pub total_rounds: u32,

    /// Player drawing this round
    pub current_artist: PlayerId,

    /// Phrase being drawn
    pub current_prompt: String,

    /// Countdown seconds left in this round
    pub time_left: u32,

    /// Current phase
    pub phase: GamePhase,

    /// When the drawing phase of this round began
    pub round_start: Option<Millis>,
}

// =============================================================================
// SESSION STATE
// =============================================================================

/// Complete mutable state of one game session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionState {
    /// Roster in fixed order (artist rotation follows it)
    pub players: Vec<Player>,

    /// Append-only chat log
    pub messages: Vec<Message>,

    /// Round state
    pub game: GameState,

    /// Players already scored this round
    pub correct_guessers: BTreeSet<PlayerId>,

    /// Raised on a correct guess, lowered by the presentation layer
    pub confetti: bool,

    /// Next message id (monotonic counter)
    next_message_id: u64,

    /// Events generated since the last drain
    #[serde(skip)]
    pending_events: Vec<GameEvent>,
}

impl SessionState {
    /// Create a session state from a roster and initial round state.
    pub fn new(players: Vec<Player>, game: GameState) -> Self {
        Self {
            players,
            messages: Vec::new(),
            game,
            correct_guessers: BTreeSet::new(),
            confetti: false,
            next_message_id: 1,
            pending_events: Vec::new(),
        }
    }

    /// Get a player by ID.
    pub fn get_player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == id)
    }

    /// Get a player mutably by ID.
    pub fn get_player_mut(&mut self, id: &PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| &p.id == id)
    }

    /// Roster position of a player.
    pub fn player_index(&self, id: &PlayerId) -> Option<usize> {
        self.players.iter().position(|p| &p.id == id)
    }

    /// Is `id` drawing this round?
    pub fn is_artist(&self, id: &PlayerId) -> bool {
        &self.game.current_artist == id
    }

    /// Has `id` already scored this round?
    pub fn has_guessed_correctly(&self, id: &PlayerId) -> bool {
        self.correct_guessers.contains(id)
    }

    /// Append a message authored by `author_id`.
    ///
    /// The author name is looked up in the roster; system messages use
    /// [`SYSTEM_NAME`], unknown authors [`UNKNOWN_NAME`].
    pub fn push_message(
        &mut self,
        author_id: PlayerId,
        content: impl Into<String>,
        kind: MessageKind,
        is_correct: Option<bool>,
        now: Millis,
    ) -> &Message {
        let author_name = if author_id == PlayerId::system() {
            SYSTEM_NAME.to_string()
        } else {
            self.get_player(&author_id)
                .map(|p| p.name.clone())
                .unwrap_or_else(|| UNKNOWN_NAME.to_string())
        };

        let id = format!("msg-{}", self.next_message_id);
        self.next_message_id += 1;

        self.messages.push(Message {
            id,
            author_id,
            author_name,
            content: content.into(),
            timestamp: now,
            kind,
            is_correct,
        });
        &self.messages[self.messages.len() - 1]
    }

    /// Append a system announcement.
    pub fn push_system(&mut self, content: impl Into<String>, now: Millis) -> &Message {
        self.push_message(PlayerId::system(), content, MessageKind::System, None, now)
    }

    /// Record a correct guess: mark the guesser, add points, raise confetti.
    ///
    /// Returns the new score, or `None` if the player already scored this
    /// round or is not in the roster (nothing changes in that case).
    pub fn award_correct_guess(&mut self, id: &PlayerId, points: u32, now: Millis) -> Option<u32> {
        if self.correct_guessers.contains(id) {
            return None;
        }
        let round = self.game.current_round;
        let new_score = self.get_player_mut(id)?.add_score(points);
        self.correct_guessers.insert(id.clone());
        self.push_event(GameEvent::points_awarded(now, round, id.clone(), points, new_score));
        self.raise_confetti(now);
        Some(new_score)
    }

    /// Raise the confetti trigger. Coalesces with an unconsumed trigger.
    pub fn raise_confetti(&mut self, now: Millis) {
        if !self.confetti {
            self.confetti = true;
            let round = self.game.current_round;
            self.push_event(GameEvent::new(now, round, GameEventData::ConfettiRaised));
        }
    }

    /// Players sorted by descending score; ties keep roster order.
    pub fn standings(&self) -> Vec<Player> {
        rank_by_score(&self.players)
    }

    /// Number of players flagged online.
    pub fn online_count(&self) -> usize {
        self.players.iter().filter(|p| p.is_online).count()
    }

    /// Highest scorer, if anyone scored. Ties go to the earlier roster slot.
    pub fn leader(&self) -> Option<&Player> {
        self.players
            .iter()
            .filter(|p| p.score > 0)
            .fold(None, |best: Option<&Player>, p| match best {
                Some(b) if b.score >= p.score => Some(b),
                _ => Some(p),
            })
    }

    /// Compute a fingerprint of everything the presentation layer renders.
    pub fn compute_hash(&self) -> StateHash {
        compute_snapshot_hash(self.game.current_round, |hasher| {
            for player in &self.players {
                hasher.update_str(player.id.as_str());
                hasher.update_str(&player.name);
                hasher.update_u32(player.score);
                hasher.update_bool(player.is_online);
            }

            // Log is append-only: length plus last id identifies it
            hasher.update_u64(self.messages.len() as u64);
            if let Some(last) = self.messages.last() {
                hasher.update_str(&last.id);
            }

            let game = &self.game;
            hasher.update_u32(game.total_rounds);
            hasher.update_str(game.current_artist.as_str());
            hasher.update_str(&game.current_prompt);
            hasher.update_u32(game.time_left);
            hasher.update_u8(game.phase.tag());
            hasher.update_opt_u64(game.round_start);

            for id in &self.correct_guessers {
                hasher.update_str(id.as_str());
            }
            hasher.update_bool(self.confetti);
        })
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Push a game event.
    pub fn push_event(&mut self, event: GameEvent) {
        self.pending_events.push(event);
    }

    /// Count of messages of a given kind (handy for assertions and UIs).
    pub fn count_messages(&self, kind: MessageKind) -> usize {
        self.messages.iter().filter(|m| m.kind == kind).count()
    }
}

// =============================================================================
// TESTS
// =============================================================================

/// Copy of `players` sorted by descending score. The sort is stable, so
/// ties keep roster order.
pub fn rank_by_score(players: &[Player]) -> Vec<Player> {
    let mut sorted = players.to_vec();
    sorted.sort_by(|a, b| b.score.cmp(&a.score));
    sorted
}

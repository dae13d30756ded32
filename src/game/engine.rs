//! Game Engine
//!
//! Owns one session: roster, message log, round state, correct guessers,
//! confetti trigger, the random source, the simulated clock and the task
//! queue. Everything outside talks to it through a handful of actions and
//! a read-only [`Snapshot`].
//!
//! ## Time
//!
//! The engine does not read the system clock. The host calls
//! [`GameEngine::advance_time`] (or [`GameEngine::advance_to`]) and every
//! task due in that window fires in order, each at its own instant:
//!
//! ```text
//! BotTick      every bot_interval_ms while drawing
//! Countdown    every countdown_interval_ms while drawing (drive_countdown)
//! AdvanceRound once, results_delay_ms after time-up
//! ```
//!
//! A task re-checks the session when it fires. Tasks from an earlier round
//! are dropped; tasks that reach a finished session are logged and ignored.

use serde::{Serialize, Deserialize};
use tracing::{debug, info, instrument, warn};

use crate::config::EngineConfig;
use crate::core::clock::{Millis, SimClock};
use crate::core::hash::{derive_session_seed, StateHash};
use crate::core::rng::{DeterministicRng, RandomSource};
use crate::game::bot::{self, BotDecision, BotGuess};
use crate::game::events::GameEvent;
use crate::game::matcher;
use crate::game::round::{self, RoundTransition};
use crate::game::schedule::{ScheduledTask, Scheduler, TaskHandle, TaskKind};
use crate::game::state::{
    build_roster, rank_by_score, GamePhase, GameState, Message, MessageKind, Player, PlayerId,
    SessionState,
};

/// What the author meant to post.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntendedKind {
    /// Evaluate against the prompt when allowed
    Guess,
    /// Plain chat
    Chat,
}

/// Result of [`GameEngine::submit_message`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// Empty content; nothing was recorded.
    Ignored,
    /// Recorded as chat (requested, or the guess could not be scored).
    Chat,
    /// Recorded as an evaluated guess.
    Guess {
        /// Matcher verdict
        correct: bool,
        /// New score if points were awarded
        awarded: Option<u32>,
    },
}

/// Read-only view of a session for the presentation layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Roster in fixed order
    pub players: Vec<Player>,
    /// Chat log, oldest first
    pub messages: Vec<Message>,
    /// Round state
    pub game: GameState,
    /// Players already scored this round
    pub correct_guessers: Vec<PlayerId>,
    /// Confetti trigger
    pub confetti: bool,
    /// The local (human) player
    pub local_player: PlayerId,
    /// Simulated instant of the snapshot
    pub now: Millis,
    /// Fingerprint of the rendered state
    pub state_hash: StateHash,
}

impl Snapshot {
    /// Players by descending score, ties in roster order.
    pub fn standings(&self) -> Vec<Player> {
        rank_by_score(&self.players)
    }

    /// Players flagged online.
    pub fn online_count(&self) -> usize {
        self.players.iter().filter(|p| p.is_online).count()
    }

    /// Is the session over?
    pub fn is_finished(&self) -> bool {
        self.game.phase == GamePhase::Finished
    }
}

/// One game session.
pub struct GameEngine<R: RandomSource = DeterministicRng> {
    config: EngineConfig,
    state: SessionState,
    human: PlayerId,
    rng: R,
    clock: SimClock,
    scheduler: Scheduler,
    /// Pending automatic advance, if any
    advance_handle: Option<TaskHandle>,
}

impl GameEngine<DeterministicRng> {
    /// Start a session seeded from `config.rng_seed` (0 when unset).
    pub fn new(config: EngineConfig) -> Self {
        let seed = config.rng_seed.unwrap_or(0);
        Self::with_rng(config, DeterministicRng::new(seed))
    }

    /// Start a session whose seed, unless pinned by the configuration, is
    /// derived from the session id.
    pub fn for_session(config: EngineConfig, session_id: &[u8; 16]) -> Self {
        let seed = config
            .rng_seed
            .unwrap_or_else(|| derive_session_seed(session_id));
        Self::with_rng(config, DeterministicRng::new(seed))
    }
}

impl<R: RandomSource> GameEngine<R> {
    /// Start a session with an explicit random source.
    ///
    /// Round 1 is already drawing at instant 0 with its tasks queued.
    pub fn with_rng(config: EngineConfig, rng: R) -> Self {
        let players = build_roster(&config.human_name, config.bot_count);
        let human = players
            .first()
            .map(|p| p.id.clone())
            .unwrap_or_else(PlayerId::human);
        let clock = SimClock::new();
        let state = round::initial_state(&config, players, clock.now());

        let mut engine = Self {
            config,
            state,
            human,
            rng,
            clock,
            scheduler: Scheduler::new(),
            advance_handle: None,
        };
        engine.schedule_round_tasks();

        info!(
            rounds = engine.config.total_rounds,
            players = engine.state.players.len(),
            "Session started"
        );
        engine
    }

    // =========================================================================
    // ACTIONS
    // =========================================================================

    /// Post a message as the local player.
    pub fn submit_message(&mut self, content: &str, kind: IntendedKind) -> SubmitOutcome {
        let author = self.human.clone();
        self.submit_message_as(author, content, kind)
    }

    /// Post a message as any player.
    ///
    /// A guess is only evaluated while drawing and only from a non-artist;
    /// otherwise it is recorded as chat. Points go to a player at most once
    /// per round.
    pub fn submit_message_as(
        &mut self,
        author: PlayerId,
        content: &str,
        kind: IntendedKind,
    ) -> SubmitOutcome {
        let content = content.trim();
        if content.is_empty() {
            return SubmitOutcome::Ignored;
        }

        let now = self.clock.now();
        let scorable = kind == IntendedKind::Guess
            && self.state.game.phase == GamePhase::Drawing
            && !self.state.is_artist(&author);

        if !scorable {
            self.state
                .push_message(author, content, MessageKind::Chat, None, now);
            return SubmitOutcome::Chat;
        }

        let correct = matcher::is_correct(&self.state.game.current_prompt, content);
        let awarded = self.record_guess(author, content, correct, now);
        SubmitOutcome::Guess { correct, awarded }
    }

    /// The round timer ran out (drawing → results).
    ///
    /// Returns `false` if the round was not drawing; a duplicate report
    /// changes nothing.
    pub fn report_time_up(&mut self) -> bool {
        let now = self.clock.now();
        self.time_up_at(now)
    }

    /// Lower the confetti trigger once the animation is done.
    pub fn consume_confetti(&mut self) {
        self.state.confetti = false;
    }

    /// Leave the results phase now instead of waiting for the delay.
    ///
    /// Only acts from results; the pending automatic advance is cancelled so
    /// the next round is not started twice.
    pub fn advance_round(&mut self) -> RoundTransition {
        if self.state.game.phase != GamePhase::Results {
            debug!(phase = ?self.state.game.phase, "Manual advance outside results");
            return RoundTransition::Ignored;
        }
        if let Some(handle) = self.advance_handle.take() {
            self.scheduler.cancel(handle);
        }
        let now = self.clock.now();
        self.advance_at(now)
    }

    /// Run one bot decision now, outside the regular cadence.
    pub fn run_bot_tick(&mut self) -> BotDecision {
        let now = self.clock.now();
        self.bot_tick_at(now)
    }

    /// Stop the session: drop every pending task and refuse new ones.
    pub fn shutdown(&mut self) {
        self.scheduler.close();
        self.advance_handle = None;
        debug!("Session shut down");
    }

    // =========================================================================
    // TIME
    // =========================================================================

    /// Advance the simulated clock by `delta` ms. Returns tasks fired.
    pub fn advance_time(&mut self, delta: Millis) -> usize {
        let target = self.clock.now().saturating_add(delta);
        self.advance_to(target)
    }

    /// Advance the simulated clock to `target`, firing every task due on the
    /// way at its own instant. Returns tasks fired.
    #[instrument(level = "debug", skip(self))]
    pub fn advance_to(&mut self, target: Millis) -> usize {
        let mut fired = 0;
        while let Some(task) = self.scheduler.pop_due(target) {
            self.clock.set(task.due);
            self.run_task(task);
            fired += 1;
        }
        self.clock.set(target);
        fired
    }

    /// When the next task fires, if any.
    pub fn next_due(&self) -> Option<Millis> {
        self.scheduler.next_due()
    }

    fn run_task(&mut self, task: ScheduledTask) {
        let now = task.due;
        let game = &self.state.game;

        if game.phase == GamePhase::Finished || self.scheduler.is_closed() {
            warn!(kind = ?task.kind, round = task.round, "Task fired on a finished session");
            return;
        }
        if task.round != game.current_round {
            debug!(kind = ?task.kind, round = task.round, current = game.current_round, "Dropping stale task");
            return;
        }

        match task.kind {
            TaskKind::BotTick => {
                if self.state.game.phase != GamePhase::Drawing {
                    debug!(round = task.round, "Bot tick outside drawing");
                    return;
                }
                self.bot_tick_at(now);
                self.schedule_in(TaskKind::BotTick, self.config.bot_interval_ms.max(1));
            }
            TaskKind::Countdown => {
                if self.state.game.phase != GamePhase::Drawing {
                    return;
                }
                if round::tick_countdown(&mut self.state) {
                    self.time_up_at(now);
                } else {
                    self.schedule_in(TaskKind::Countdown, self.config.countdown_interval_ms.max(1));
                }
            }
            TaskKind::AdvanceRound => {
                if self.advance_handle == Some(task.handle) {
                    self.advance_handle = None;
                }
                if self.state.game.phase != GamePhase::Results {
                    debug!(round = task.round, "Advance outside results");
                    return;
                }
                self.advance_at(now);
            }
        }
    }

    // =========================================================================
    // TRANSITIONS
    // =========================================================================

    fn time_up_at(&mut self, now: Millis) -> bool {
        if !round::time_up(&mut self.state, now) {
            debug!(phase = ?self.state.game.phase, "Time-up outside drawing");
            return false;
        }

        let round = self.state.game.current_round;
        self.scheduler.cancel_round(round);
        self.advance_handle = self.scheduler.schedule(
            TaskKind::AdvanceRound,
            now.saturating_add(self.config.results_delay_ms),
            round,
        );
        true
    }

    fn advance_at(&mut self, now: Millis) -> RoundTransition {
        let transition = round::advance(&mut self.state, &self.config, &mut self.rng, now);
        match transition {
            RoundTransition::Started { .. } => self.schedule_round_tasks(),
            RoundTransition::Finished => {
                self.scheduler.cancel_all();
                self.advance_handle = None;
            }
            RoundTransition::Ignored => {}
        }
        transition
    }

    fn schedule_round_tasks(&mut self) {
        self.schedule_in(TaskKind::BotTick, self.config.bot_interval_ms.max(1));
        if self.config.drive_countdown {
            self.schedule_in(TaskKind::Countdown, self.config.countdown_interval_ms.max(1));
        }
    }

    fn schedule_in(&mut self, kind: TaskKind, delay: Millis) -> Option<TaskHandle> {
        let due = self.clock.now().saturating_add(delay);
        self.scheduler
            .schedule(kind, due, self.state.game.current_round)
    }

    fn bot_tick_at(&mut self, now: Millis) -> BotDecision {
        let decision = bot::decide(&self.state, &self.human, now, &self.config.bot, &mut self.rng);

        match &decision {
            BotDecision::Guess(guess) => self.apply_bot_guess(guess, now),
            BotDecision::Idle { player_id } => debug!(bot = %player_id, "Bot stays quiet"),
            BotDecision::NoCandidates => debug!("No eligible bots"),
            BotDecision::Inactive => {}
        }
        decision
    }

    fn apply_bot_guess(&mut self, guess: &BotGuess, now: Millis) {
        self.record_guess(guess.player_id.clone(), &guess.content, guess.correct, now);
    }

    /// Append an evaluated guess and award points if it is the author's
    /// first correct guess this round.
    fn record_guess(&mut self, author: PlayerId, content: &str, correct: bool, now: Millis) -> Option<u32> {
        let round = self.state.game.current_round;
        self.state
            .push_message(author.clone(), content, MessageKind::Guess, Some(correct), now);
        self.state
            .push_event(GameEvent::guess_made(now, round, author.clone(), correct));

        if !correct {
            return None;
        }
        let awarded = self
            .state
            .award_correct_guess(&author, self.config.points_per_guess, now);
        if let Some(score) = awarded {
            info!(round, player = %author, score, "Correct guess");
        }
        awarded
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Copy of everything the presentation layer renders.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            players: self.state.players.clone(),
            messages: self.state.messages.clone(),
            game: self.state.game.clone(),
            correct_guessers: self.state.correct_guessers.iter().cloned().collect(),
            confetti: self.state.confetti,
            local_player: self.human.clone(),
            now: self.clock.now(),
            state_hash: self.state.compute_hash(),
        }
    }

    /// Drain events recorded since the last call.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        self.state.take_events()
    }

    /// Session state (read-only).
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Players by descending score.
    pub fn standings(&self) -> Vec<Player> {
        self.state.standings()
    }

    /// The local player.
    pub fn local_player(&self) -> &PlayerId {
        &self.human
    }

    /// Current simulated instant.
    pub fn now(&self) -> Millis {
        self.clock.now()
    }

    /// Session configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Is the session over?
    pub fn is_finished(&self) -> bool {
        self.state.game.phase == GamePhase::Finished
    }

    /// Has [`shutdown`](Self::shutdown) been called?
    pub fn is_shut_down(&self) -> bool {
        self.scheduler.is_closed()
    }

    /// Random source (for scripting rolls in tests and tools).
    pub fn rng_mut(&mut self) -> &mut R {
        &mut self.rng
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::secs;
    use crate::core::rng::ScriptedRng;
    use crate::game::events::GameEventData;
    use crate::game::round::{FINISHED_MESSAGE, WELCOME_MESSAGE};

    fn ice_cream_config() -> EngineConfig {
        EngineConfig {
            prompts: vec!["Ice cream cone".into(), "Dragon breathing fire".into()],
            ..Default::default()
        }
    }

    /// Engine whose bots never speak unless rolls are pushed.
    fn quiet_engine(config: EngineConfig) -> GameEngine<ScriptedRng> {
        GameEngine::with_rng(config, ScriptedRng::new([]))
    }

    #[test]
    fn test_initial_session() {
        let engine = GameEngine::new(EngineConfig::default());
        let snap = engine.snapshot();

        assert_eq!(snap.players.len(), 4);
        assert_eq!(snap.local_player, PlayerId::human());
        assert_eq!(snap.game.phase, GamePhase::Drawing);
        assert_eq!(snap.game.current_round, 1);
        assert_eq!(snap.game.current_artist, PlayerId::human());
        assert_eq!(snap.game.current_prompt, "Cat sleeping on a windowsill");
        assert_eq!(snap.messages[0].content, WELCOME_MESSAGE);
        assert!(!snap.confetti);
        assert_eq!(engine.next_due(), Some(1000));
    }

    #[test]
    fn test_bot_guesses_ice_cream_late_in_round() {
        let mut engine = quiet_engine(ice_cream_config());
        engine.advance_to(secs(65));
        assert_eq!(engine.state().count_messages(MessageKind::Guess), 0);

        // pick bot-2, speak (0.05 < 0.08), right (0.3 < 0.8), verbatim phrasing
        engine.rng_mut().push_rolls([0.5, 0.05, 0.3, 0.0]);
        let decision = engine.run_bot_tick();
        assert!(matches!(decision, BotDecision::Guess(ref g) if g.correct));

        let snap = engine.snapshot();
        let bot = snap.players.iter().find(|p| p.id == PlayerId::bot(2)).unwrap();
        assert_eq!(bot.score, 100);
        assert!(snap.confetti);
        assert_eq!(snap.correct_guessers, vec![PlayerId::bot(2)]);

        let last = snap.messages.last().unwrap();
        assert_eq!(last.kind, MessageKind::Guess);
        assert_eq!(last.is_correct, Some(true));
        assert_eq!(last.author_name, "Bob");
        assert_eq!(last.content, "Ice cream cone");
        assert_eq!(last.timestamp, secs(65));
    }

    #[test]
    fn test_bot_cadence_only_while_drawing() {
        let mut engine = GameEngine::with_rng(ice_cream_config(), ScriptedRng::new([0.5; 10]));

        // Ticks at 3s and 6s; early in the round each one picks a bot and
        // fails the activation roll
        engine.advance_to(8_999);
        assert_eq!(engine.rng_mut().remaining(), 6);
        assert_eq!(engine.state().count_messages(MessageKind::Guess), 0);

        // No decisions while the answer is revealed
        assert!(engine.report_time_up());
        engine.advance_time(2_999);
        assert_eq!(engine.snapshot().game.phase, GamePhase::Results);
        assert_eq!(engine.rng_mut().remaining(), 6);
    }

    #[test]
    fn test_artist_guess_is_chat() {
        let mut engine = quiet_engine(ice_cream_config());
        let outcome = engine.submit_message("ice cream cone", IntendedKind::Guess);

        assert_eq!(outcome, SubmitOutcome::Chat);
        let snap = engine.snapshot();
        assert_eq!(snap.messages.last().unwrap().kind, MessageKind::Chat);
        assert_eq!(snap.messages.last().unwrap().is_correct, None);
        assert!(snap.players.iter().all(|p| p.score == 0));
        assert!(!snap.confetti);
    }

    #[test]
    fn test_empty_content_ignored() {
        let mut engine = quiet_engine(ice_cream_config());
        let before = engine.state().messages.len();

        assert_eq!(engine.submit_message("   ", IntendedKind::Chat), SubmitOutcome::Ignored);
        assert_eq!(engine.submit_message("", IntendedKind::Guess), SubmitOutcome::Ignored);
        assert_eq!(engine.state().messages.len(), before);
    }

    #[test]
    fn test_human_scores_once_per_round() {
        let mut engine = quiet_engine(ice_cream_config());
        engine.report_time_up();
        engine.advance_time(3000);
        assert_eq!(engine.state().game.current_artist, PlayerId::bot(1));

        let prompt = engine.state().game.current_prompt.clone();
        let first = engine.submit_message(&prompt, IntendedKind::Guess);
        let second = engine.submit_message(&prompt.to_lowercase(), IntendedKind::Guess);

        assert_eq!(first, SubmitOutcome::Guess { correct: true, awarded: Some(100) });
        assert_eq!(second, SubmitOutcome::Guess { correct: true, awarded: None });
        assert_eq!(engine.state().get_player(&PlayerId::human()).unwrap().score, 100);
        assert_eq!(engine.state().count_messages(MessageKind::Guess), 2);
    }

    #[test]
    fn test_wrong_guess_recorded() {
        let mut engine = quiet_engine(ice_cream_config());
        let outcome =
            engine.submit_message_as(PlayerId::bot(1), "xyz", IntendedKind::Guess);

        assert_eq!(outcome, SubmitOutcome::Guess { correct: false, awarded: None });
        let last = engine.state().messages.last().unwrap();
        assert_eq!(last.is_correct, Some(false));
        assert!(!engine.state().confetti);
    }

    #[test]
    fn test_chat_never_scores() {
        let mut engine = quiet_engine(ice_cream_config());
        let outcome = engine.submit_message_as(PlayerId::bot(1), "ice cream", IntendedKind::Chat);
        assert_eq!(outcome, SubmitOutcome::Chat);
        assert!(engine.state().correct_guessers.is_empty());
    }

    #[test]
    fn test_guess_in_results_is_chat() {
        let mut engine = quiet_engine(ice_cream_config());
        engine.report_time_up();
        let outcome = engine.submit_message_as(PlayerId::bot(1), "ice cream", IntendedKind::Guess);
        assert_eq!(outcome, SubmitOutcome::Chat);
    }

    #[test]
    fn test_confetti_consumed() {
        let mut engine = quiet_engine(ice_cream_config());
        engine.submit_message_as(PlayerId::bot(3), "cone", IntendedKind::Guess);
        assert!(engine.snapshot().confetti);

        engine.consume_confetti();
        assert!(!engine.snapshot().confetti);
    }

    #[test]
    fn test_time_up_then_next_round_after_delay() {
        let mut engine = quiet_engine(ice_cream_config());
        for _ in 0..2 {
            engine.report_time_up();
            engine.advance_time(3000);
        }
        assert_eq!(engine.state().game.current_round, 3);
        engine.submit_message_as(PlayerId::human(), "cone", IntendedKind::Guess);

        let t0 = engine.now();
        assert!(engine.report_time_up());
        let snap = engine.snapshot();
        assert_eq!(snap.game.phase, GamePhase::Results);
        assert!(snap.messages.last().unwrap().content.starts_with("Time's up! The answer was:"));

        engine.advance_to(t0 + 2999);
        assert_eq!(engine.state().game.current_round, 3);
        assert_eq!(engine.state().game.phase, GamePhase::Results);

        engine.advance_to(t0 + 3000);
        let snap = engine.snapshot();
        assert_eq!(snap.game.current_round, 4);
        assert_eq!(snap.game.phase, GamePhase::Drawing);
        assert_eq!(snap.game.current_artist, PlayerId::bot(3));
        assert_eq!(snap.game.round_start, Some(t0 + 3000));
        assert_eq!(snap.game.time_left, 90);
        assert!(snap.correct_guessers.is_empty());
        assert_eq!(
            snap.messages.last().unwrap().content,
            "Round 4 - Charlie is drawing!"
        );
    }

    #[test]
    fn test_duplicate_time_up_ignored() {
        let mut engine = quiet_engine(ice_cream_config());
        assert!(engine.report_time_up());
        engine.advance_time(1500);
        assert!(!engine.report_time_up());

        // Still exactly one advance, at the original deadline
        engine.advance_time(1500);
        assert_eq!(engine.state().game.current_round, 2);
        engine.advance_time(10_000);
        assert_eq!(engine.state().game.current_round, 2);
    }

    #[test]
    fn test_countdown_drives_time_up() {
        let mut engine = quiet_engine(ice_cream_config());
        engine.advance_to(secs(89));
        assert_eq!(engine.state().game.time_left, 1);
        assert_eq!(engine.state().game.phase, GamePhase::Drawing);

        engine.advance_to(secs(90));
        assert_eq!(engine.state().game.time_left, 0);
        assert_eq!(engine.state().game.phase, GamePhase::Results);

        engine.advance_to(secs(93));
        assert_eq!(engine.state().game.current_round, 2);
        assert_eq!(engine.state().game.time_left, 90);
    }

    #[test]
    fn test_external_timer_mode() {
        let config = EngineConfig { drive_countdown: false, ..ice_cream_config() };
        let mut engine = quiet_engine(config);
        engine.advance_to(secs(500));

        assert_eq!(engine.state().game.phase, GamePhase::Drawing);
        assert_eq!(engine.state().game.time_left, 90);
    }

    #[test]
    fn test_manual_advance_cancels_pending() {
        let mut engine = quiet_engine(ice_cream_config());
        assert_eq!(engine.advance_round(), RoundTransition::Ignored);

        engine.report_time_up();
        engine.advance_time(1000);
        assert_eq!(engine.advance_round(), RoundTransition::Started { round: 2 });

        // The automatic advance must not skip round 2
        engine.advance_time(5000);
        assert_eq!(engine.state().game.current_round, 2);
        assert_eq!(engine.state().game.phase, GamePhase::Drawing);
    }

    #[test]
    fn test_last_round_finishes() {
        let config = EngineConfig { total_rounds: 2, ..ice_cream_config() };
        let mut engine = quiet_engine(config);
        engine.report_time_up();
        engine.advance_time(3000);
        engine.report_time_up();
        engine.advance_time(3000);

        assert!(engine.is_finished());
        assert_eq!(engine.state().game.current_round, 2);
        assert_eq!(engine.state().messages.last().unwrap().content, FINISHED_MESSAGE);
        assert!(engine.next_due().is_none());

        let count = engine.state().messages.len();
        engine.advance_time(secs(600));
        assert_eq!(engine.state().messages.len(), count);
    }

    #[test]
    fn test_task_after_finish_ignored() {
        let config = EngineConfig { total_rounds: 1, ..ice_cream_config() };
        let mut engine = quiet_engine(config);
        engine.report_time_up();
        engine.advance_time(3000);
        assert!(engine.is_finished());

        let now = engine.now();
        engine.scheduler.schedule(TaskKind::BotTick, now + 10, 1);
        engine.scheduler.schedule(TaskKind::AdvanceRound, now + 20, 1);
        let before = engine.state().messages.len();

        assert_eq!(engine.advance_time(100), 2);
        assert!(engine.is_finished());
        assert_eq!(engine.state().messages.len(), before);
    }

    #[test]
    fn test_stale_task_dropped() {
        let mut engine = quiet_engine(ice_cream_config());
        engine.report_time_up();
        engine.advance_time(3000);

        // A countdown left over from round 1
        let now = engine.now();
        engine.scheduler.schedule(TaskKind::Countdown, now + 1, 1);
        engine.advance_time(1);
        assert_eq!(engine.state().game.time_left, 90);
    }

    #[test]
    fn test_shutdown_stops_everything() {
        let mut engine = quiet_engine(ice_cream_config());
        engine.shutdown();

        assert!(engine.is_shut_down());
        assert_eq!(engine.advance_time(secs(200)), 0);
        assert_eq!(engine.state().game.phase, GamePhase::Drawing);
        assert_eq!(engine.state().game.time_left, 90);
    }

    #[test]
    fn test_full_session_is_reproducible() {
        let config = EngineConfig { rng_seed: Some(42), ..Default::default() };
        let mut a = GameEngine::new(config.clone());
        let mut b = GameEngine::new(config);

        a.advance_to(secs(800));
        b.advance_to(secs(800));

        assert!(a.is_finished());
        assert_eq!(a.snapshot().state_hash, b.snapshot().state_hash);
        assert_eq!(a.state().count_messages(MessageKind::System), 1 + 7 + 8 + 1);

        let events = a.take_events();
        let finished = events
            .iter()
            .filter(|e| matches!(e.data, GameEventData::GameFinished { .. }))
            .count();
        assert_eq!(finished, 1);

        // Scores only ever move in whole awards
        assert!(a.standings().iter().all(|p| p.score % 100 == 0));
        assert_eq!(a.state().get_player(&PlayerId::human()).unwrap().score, 0);
    }

    #[test]
    fn test_session_seed_from_id() {
        let id = [7u8; 16];
        let mut a = GameEngine::for_session(EngineConfig::default(), &id);
        let mut b = GameEngine::for_session(EngineConfig::default(), &id);
        a.advance_to(secs(400));
        b.advance_to(secs(400));
        assert_eq!(a.snapshot(), b.snapshot());
    }

    #[test]
    fn test_snapshot_hash_changes() {
        let mut engine = quiet_engine(ice_cream_config());
        let first = engine.snapshot().state_hash;
        assert_eq!(first, engine.snapshot().state_hash);

        engine.advance_time(1000);
        assert_ne!(first, engine.snapshot().state_hash);
    }

    #[test]
    fn test_snapshot_standings() {
        let mut engine = quiet_engine(ice_cream_config());
        engine.submit_message_as(PlayerId::bot(3), "ice cream", IntendedKind::Guess);

        let snap = engine.snapshot();
        assert_eq!(snap.standings()[0].id, PlayerId::bot(3));
        assert_eq!(snap.standings(), engine.standings());
        assert_eq!(snap.players[0].id, PlayerId::human());
        assert_eq!(snap.online_count(), 4);
    }
}

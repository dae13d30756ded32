//! Live Session
//!
//! Hosts one [`GameEngine`] inside a tokio task. The task owns the engine
//! outright; everything else holds a [`LiveSession`] handle and talks to it
//! over channels:
//!
//! ```text
//! handle ──mpsc<Command>──▶ session task ──broadcast<SessionUpdate>──▶ subscribers
//!                                │
//!                         interval: advance simulated clock by real time
//! ```
//!
//! Dropping every handle (or calling [`LiveSession::shutdown`]) ends the
//! task and cancels the engine's pending timers.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::core::clock::Millis;
use crate::core::hash::StateHash;
use crate::game::engine::{GameEngine, IntendedKind, Snapshot, SubmitOutcome};
use crate::game::events::GameEventData;
use crate::game::round::RoundTransition;
use crate::runtime::protocol::{ClientAction, ErrorCode, FinalStandings, JoinInfo, SessionUpdate};
use crate::{DEFAULT_FRAME_MS, UPDATE_CHANNEL_CAPACITY};

/// Unique session identifier.
pub type SessionId = [u8; 16];

/// Hosting configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// How often the task advances the simulated clock (ms)
    pub frame_ms: u64,
    /// Advance the clock from real time. When off, time only moves through
    /// [`LiveSession::advance_time`].
    pub realtime: bool,
    /// Pending actions before senders wait
    pub command_capacity: usize,
    /// Updates buffered per subscriber
    pub update_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            frame_ms: DEFAULT_FRAME_MS,
            realtime: true,
            command_capacity: 64,
            update_capacity: UPDATE_CHANNEL_CAPACITY,
        }
    }
}

impl RuntimeConfig {
    /// Clock driven only by explicit advances.
    pub fn manual_clock() -> Self {
        Self {
            realtime: false,
            ..Self::default()
        }
    }
}

/// Session errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// No session with that id.
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// The session task has stopped.
    #[error("Session closed")]
    SessionClosed,

    /// The session task dropped a request without answering.
    #[error("Command channel closed")]
    CommandChannelClosed,
}

impl SessionError {
    /// Wire code reported to clients.
    pub fn code(&self) -> ErrorCode {
        match self {
            SessionError::SessionNotFound(_) => ErrorCode::SessionNotFound,
            SessionError::SessionClosed => ErrorCode::SessionClosed,
            SessionError::CommandChannelClosed => ErrorCode::InternalError,
        }
    }

    /// Convert into an error update for clients.
    pub fn to_update(&self) -> SessionUpdate {
        SessionUpdate::error(self.code(), self.to_string())
    }
}

/// Requests handled by the session task.
enum Command {
    Action {
        action: ClientAction,
        reply: oneshot::Sender<SessionUpdate>,
    },
    Submit {
        content: String,
        kind: IntendedKind,
        reply: oneshot::Sender<SubmitOutcome>,
    },
    TimeUp {
        reply: oneshot::Sender<bool>,
    },
    AdvanceRound {
        reply: oneshot::Sender<RoundTransition>,
    },
    AdvanceTime {
        delta: Millis,
        reply: oneshot::Sender<Snapshot>,
    },
    Snapshot {
        reply: oneshot::Sender<Snapshot>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Handle to a running session.
pub struct LiveSession {
    id: SessionId,
    created_at: DateTime<Utc>,
    join_info: JoinInfo,
    command_tx: mpsc::Sender<Command>,
    update_tx: broadcast::Sender<SessionUpdate>,
}

impl LiveSession {
    /// Spawn a session with a fresh random id.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(config: EngineConfig, runtime: RuntimeConfig) -> Self {
        Self::spawn_with_id(uuid::Uuid::new_v4().into_bytes(), config, runtime)
    }

    /// Spawn a session with a given id.
    pub fn spawn_with_id(id: SessionId, config: EngineConfig, runtime: RuntimeConfig) -> Self {
        let created_at = Utc::now();
        let engine = GameEngine::for_session(config, &id);

        let join_info = JoinInfo {
            session_id: hex::encode(id),
            local_player: engine.local_player().clone(),
            total_rounds: engine.config().total_rounds,
            round_duration_secs: engine.config().round_duration_secs,
            created_at,
        };

        let (command_tx, command_rx) = mpsc::channel(runtime.command_capacity.max(1));
        let (update_tx, _) = broadcast::channel(runtime.update_capacity.max(1));

        let task = SessionTask {
            id,
            engine,
            commands: command_rx,
            updates: update_tx.clone(),
            last_hash: None,
            finish_announced: false,
        };
        tokio::spawn(task.run(runtime));

        info!(session = %hex::encode(id), "Session spawned");

        Self {
            id,
            created_at,
            join_info,
            command_tx,
            update_tx,
        }
    }

    /// Session id.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Session id as hex.
    pub fn id_hex(&self) -> String {
        hex::encode(self.id)
    }

    /// Wall-clock creation time.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Metadata for a newly attached client.
    pub fn join_info(&self) -> SessionUpdate {
        SessionUpdate::Joined(self.join_info.clone())
    }

    /// Subscribe to session updates.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionUpdate> {
        self.update_tx.subscribe()
    }

    /// Has the session task stopped?
    pub fn is_closed(&self) -> bool {
        self.command_tx.is_closed()
    }

    /// Apply a presentation-layer action and return the direct reply.
    pub async fn apply(&self, action: ClientAction) -> Result<SessionUpdate, SessionError> {
        self.request(|reply| Command::Action { action, reply }).await
    }

    /// Post a message as the local player.
    pub async fn submit(
        &self,
        content: impl Into<String>,
        kind: IntendedKind,
    ) -> Result<SubmitOutcome, SessionError> {
        let content = content.into();
        self.request(|reply| Command::Submit { content, kind, reply }).await
    }

    /// Report that the round timer ran out.
    pub async fn report_time_up(&self) -> Result<bool, SessionError> {
        self.request(|reply| Command::TimeUp { reply }).await
    }

    /// Leave the results phase early.
    pub async fn advance_round(&self) -> Result<RoundTransition, SessionError> {
        self.request(|reply| Command::AdvanceRound { reply }).await
    }

    /// Move the simulated clock forward by `delta` ms.
    pub async fn advance_time(&self, delta: Millis) -> Result<Snapshot, SessionError> {
        self.request(|reply| Command::AdvanceTime { delta, reply }).await
    }

    /// Current snapshot.
    pub async fn snapshot(&self) -> Result<Snapshot, SessionError> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Stop the session and wait for the task to acknowledge.
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.request(|reply| Command::Shutdown { reply }).await
    }

    async fn request<T, F>(&self, make: F) -> Result<T, SessionError>
    where
        F: FnOnce(oneshot::Sender<T>) -> Command,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(make(reply_tx))
            .await
            .map_err(|_| SessionError::SessionClosed)?;
        reply_rx.await.map_err(|_| SessionError::CommandChannelClosed)
    }
}

/// State owned by the session task.
struct SessionTask {
    id: SessionId,
    engine: GameEngine,
    commands: mpsc::Receiver<Command>,
    updates: broadcast::Sender<SessionUpdate>,
    last_hash: Option<StateHash>,
    finish_announced: bool,
}

impl SessionTask {
    async fn run(mut self, runtime: RuntimeConfig) {
        let mut frame = interval(Duration::from_millis(runtime.frame_ms.max(1)));
        frame.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let started = Instant::now();

        loop {
            tokio::select! {
                _ = frame.tick(), if runtime.realtime => {
                    let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                    self.engine.advance_to(elapsed);
                    self.publish();
                }
                command = self.commands.recv() => {
                    let Some(command) = command else {
                        debug!(session = %hex::encode(self.id), "All handles dropped");
                        break;
                    };
                    if !self.handle(command) {
                        break;
                    }
                }
            }
        }

        self.engine.shutdown();
        let _ = self.updates.send(SessionUpdate::Closed);
        info!(session = %hex::encode(self.id), "Session closed");
    }

    /// Handle one command. Returns `false` when the session should stop.
    ///
    /// Updates are published before the reply so a caller that awaited the
    /// reply already finds them in its subscription.
    fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::Action { action, reply } => {
                if action == ClientAction::Leave {
                    self.commands.close();
                    let _ = reply.send(self.apply(action));
                    return false;
                }
                let update = self.apply(action);
                self.publish();
                let _ = reply.send(update);
            }
            Command::Submit { content, kind, reply } => {
                let outcome = self.engine.submit_message(&content, kind);
                self.publish();
                let _ = reply.send(outcome);
            }
            Command::TimeUp { reply } => {
                let changed = self.engine.report_time_up();
                self.publish();
                let _ = reply.send(changed);
            }
            Command::AdvanceRound { reply } => {
                let transition = self.engine.advance_round();
                self.publish();
                let _ = reply.send(transition);
            }
            Command::AdvanceTime { delta, reply } => {
                self.engine.advance_time(delta);
                self.publish();
                let _ = reply.send(self.engine.snapshot());
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.engine.snapshot());
            }
            Command::Shutdown { reply } => {
                self.commands.close();
                self.engine.shutdown();
                let _ = reply.send(());
                return false;
            }
        }
        true
    }

    fn apply(&mut self, action: ClientAction) -> SessionUpdate {
        match action {
            ClientAction::Submit { content, kind } => SessionUpdate::Submitted {
                outcome: self.engine.submit_message(&content, kind),
            },
            ClientAction::TimeUp => {
                self.engine.report_time_up();
                SessionUpdate::Snapshot(self.engine.snapshot())
            }
            ClientAction::ConsumeConfetti => {
                self.engine.consume_confetti();
                SessionUpdate::Snapshot(self.engine.snapshot())
            }
            ClientAction::AdvanceRound => {
                self.engine.advance_round();
                SessionUpdate::Snapshot(self.engine.snapshot())
            }
            ClientAction::SyncRequest => SessionUpdate::Snapshot(self.engine.snapshot()),
            ClientAction::Leave => {
                self.engine.shutdown();
                SessionUpdate::Closed
            }
        }
    }

    /// Broadcast drained events, a snapshot if the rendered state changed,
    /// and the final standings once.
    fn publish(&mut self) {
        let events = self.engine.take_events();
        let finished_now = events
            .iter()
            .any(|e| matches!(e.data, GameEventData::GameFinished { .. }));

        if !events.is_empty() {
            let _ = self.updates.send(SessionUpdate::Events { events });
        }

        let snapshot = self.engine.snapshot();
        if self.last_hash != Some(snapshot.state_hash) {
            self.last_hash = Some(snapshot.state_hash);
            let _ = self.updates.send(SessionUpdate::Snapshot(snapshot));
        }

        if (finished_now || self.engine.is_finished()) && !self.finish_announced {
            self.finish_announced = true;
            let standings = self.engine.standings();
            let winner = self.engine.state().leader().map(|p| p.id.clone());
            info!(session = %hex::encode(self.id), winner = ?winner, "Final standings published");
            let _ = self
                .updates
                .send(SessionUpdate::Finished(FinalStandings { standings, winner }));
        }
    }
}

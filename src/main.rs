//! LiveSketch Demo
//!
//! Plays a full seeded session in simulated time, replays it to check
//! determinism, then drives a hosted session through the async runtime.

use anyhow::{bail, Context};
use tracing::info;
use tracing_subscriber::EnvFilter;

use livesketch::{
    EngineConfig, GameEngine, IntendedKind, VERSION,
    core::clock::{secs, Millis},
    game::events::{GameEvent, GameEventData},
    runtime::{ClientAction, RuntimeConfig, SessionManager, SessionUpdate},
};

/// Fallback seed when `LIVESKETCH_SEED` is unset.
const DEMO_SEED: u64 = 12345;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("livesketch=info,livesketch_demo=info")),
        )
        .init();

    let mut config = EngineConfig::from_env().context("invalid LIVESKETCH_* configuration")?;
    if config.rng_seed.is_none() {
        config.rng_seed = Some(DEMO_SEED);
    }

    info!("LiveSketch Engine v{}", VERSION);
    info!(
        "Rounds: {}, round length: {}s, bots: {}",
        config.total_rounds, config.round_duration_secs, config.bot_count
    );

    demo_local(&config)?;
    demo_hosted(config).await?;
    Ok(())
}

/// One session, driven directly in simulated time.
fn demo_local(config: &EngineConfig) -> anyhow::Result<()> {
    info!("=== Local Session ===");

    let engine = play_session(config, true)?;

    info!("=== Final Standings ===");
    for (place, player) in engine.standings().iter().enumerate() {
        info!("#{}: {} - {} points", place + 1, player.name, player.score);
    }

    let hash = engine.snapshot().state_hash;
    info!("Final State Hash: {}", hex::encode(hash));

    // Same seed, same actions at the same instants: same session
    info!("=== Verifying Determinism ===");
    let replay_hash = play_session(config, false)?.snapshot().state_hash;
    info!("Replay State Hash: {}", hex::encode(replay_hash));

    if hash != replay_hash {
        bail!("DETERMINISM FAILURE: Hashes differ!");
    }
    info!("DETERMINISM VERIFIED: Hashes match!");
    Ok(())
}

/// Step one second at a time; 45 seconds into every round the local
/// player guesses the last word of the prompt.
fn play_session(config: &EngineConfig, verbose: bool) -> anyhow::Result<GameEngine> {
    let mut engine = GameEngine::new(config.clone());
    let end = session_length(config);

    let mut now: Millis = 0;
    while now < end && !engine.is_finished() {
        now += secs(1);
        engine.advance_to(now);

        let snap = engine.snapshot();
        let elapsed = snap.game.round_start.map(|s| now - s).unwrap_or(0);
        if elapsed == secs(45) {
            let guess = snap
                .game
                .current_prompt
                .split_whitespace()
                .last()
                .unwrap_or("cat")
                .to_string();
            let outcome = engine.submit_message(&guess, IntendedKind::Guess);
            if verbose {
                info!("Round {}: local player guessed {:?} -> {:?}", snap.game.current_round, guess, outcome);
            }
        }

        if snap.confetti {
            engine.consume_confetti();
        }

        let events = engine.take_events();
        if verbose {
            log_events(&events);
        }
    }

    if !engine.is_finished() {
        bail!("session did not finish within {}ms", end);
    }
    Ok(engine)
}

fn log_events(events: &[GameEvent]) {
    for event in events {
        match &event.data {
            GameEventData::RoundStarted { artist_id, prompt } => {
                info!("[{:>6}ms] round {} - {} draws {:?}", event.at, event.round, artist_id, prompt);
            }
            GameEventData::PointsAwarded { player_id, new_score, .. } => {
                info!("[{:>6}ms] {} scores, total {}", event.at, player_id, new_score);
            }
            GameEventData::TimeUp { prompt } => {
                info!("[{:>6}ms] time up, it was {:?}", event.at, prompt);
            }
            GameEventData::GameFinished { winner_id } => {
                info!("[{:>6}ms] game finished, winner {:?}", event.at, winner_id);
            }
            _ => {}
        }
    }
}

/// Upper bound on a session's simulated length.
fn session_length(config: &EngineConfig) -> Millis {
    let per_round = secs(config.round_duration_secs as u64) + config.results_delay_ms;
    per_round * config.total_rounds as u64 + secs(10)
}

/// One session hosted by the async runtime with a manual clock.
async fn demo_hosted(config: EngineConfig) -> anyhow::Result<()> {
    info!("=== Hosted Session ===");

    let end = session_length(&config);
    let manager = SessionManager::new(RuntimeConfig::manual_clock());
    let id = manager.create_session(config).await;
    let session = manager.require_session(&id).await?;
    let mut updates = session.subscribe();

    if let SessionUpdate::Joined(join) = session.join_info() {
        info!("Joined session {} created at {}", join.session_id, join.created_at);
    }

    let hello = ClientAction::Submit {
        content: "hi everyone!".into(),
        kind: IntendedKind::Chat,
    };
    let text = hello.to_json()?;
    info!("-> {}", text);
    let reply = manager.dispatch_json(&id, &text).await;
    if let SessionUpdate::Error(error) = &reply {
        bail!("session rejected action: {:?} {}", error.code, error.message);
    }

    let snapshot = session.advance_time(end).await?;
    info!("Snapshot: {} bytes (bincode)", snapshot.to_bytes()?.len());

    while let Ok(update) = updates.try_recv() {
        if let SessionUpdate::Finished(standings) = update {
            info!("<- {}", SessionUpdate::Finished(standings).to_json()?);
        }
    }

    manager.shutdown_all().await;
    Ok(())
}

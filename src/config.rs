//! Engine Configuration
//!
//! Defaults reproduce the stock game: 8 rounds of 90 seconds, 3 bots,
//! 100 points per correct guess. `from_env` overlays `LIVESKETCH_*`
//! variables for quick experiments without a rebuild.

use serde::{Serialize, Deserialize};

use crate::game::bot::BotTuning;
use crate::game::round::DEFAULT_PROMPTS;
use crate::game::state::BOT_NAMES;
use crate::{
    DEFAULT_BOT_COUNT, DEFAULT_BOT_INTERVAL_MS, DEFAULT_COUNTDOWN_INTERVAL_MS, DEFAULT_POINTS_PER_GUESS,
    DEFAULT_RESULTS_DELAY_MS, DEFAULT_ROUND_DURATION_SECS, DEFAULT_TOTAL_ROUNDS,
};

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable did not parse.
    #[error("Invalid value {value:?} for {key}")]
    InvalidValue {
        /// Variable name
        key: &'static str,
        /// Raw value
        value: String,
    },

    /// Zero rounds configured.
    #[error("total_rounds must be at least 1")]
    NoRounds,

    /// Zero-length rounds configured.
    #[error("round_duration_secs must be at least 1")]
    NoRoundTime,

    /// Empty prompt list.
    #[error("prompt list is empty")]
    NoPrompts,

    /// Bot count outside the available names.
    #[error("bot_count must be between 1 and {max}, got {got}")]
    BotCount {
        /// Requested count
        got: usize,
        /// Upper bound
        max: usize,
    },

    /// A periodic interval of zero would never let time advance.
    #[error("{0} must be non-zero")]
    ZeroInterval(&'static str),
}

/// Configuration for one game session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Rounds per session
    pub total_rounds: u32,
    /// Countdown length of a round (seconds)
    pub round_duration_secs: u32,
    /// Points for a correct guess
    pub points_per_guess: u32,
    /// Bot decision cadence (ms)
    pub bot_interval_ms: u64,
    /// Countdown cadence (ms)
    pub countdown_interval_ms: u64,
    /// Delay between the reveal and the next round (ms)
    pub results_delay_ms: u64,
    /// Simulated opponents
    pub bot_count: usize,
    /// Display name of the local player
    pub human_name: String,
    /// Prompt pool; the first entry opens round 1
    pub prompts: Vec<String>,
    /// Let the engine run the countdown and fire time-up itself
    pub drive_countdown: bool,
    /// Fixed RNG seed (derived from the session id when absent)
    pub rng_seed: Option<u64>,
    /// Bot behavior model
    pub bot: BotTuning,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            total_rounds: DEFAULT_TOTAL_ROUNDS,
            round_duration_secs: DEFAULT_ROUND_DURATION_SECS,
            points_per_guess: DEFAULT_POINTS_PER_GUESS,
            bot_interval_ms: DEFAULT_BOT_INTERVAL_MS,
            countdown_interval_ms: DEFAULT_COUNTDOWN_INTERVAL_MS,
            results_delay_ms: DEFAULT_RESULTS_DELAY_MS,
            bot_count: DEFAULT_BOT_COUNT,
            human_name: "You".to_string(),
            prompts: DEFAULT_PROMPTS.iter().map(|p| p.to_string()).collect(),
            drive_countdown: true,
            rng_seed: None,
            bot: BotTuning::default(),
        }
    }
}

impl EngineConfig {
    /// Defaults overlaid with `LIVESKETCH_TOTAL_ROUNDS`, `LIVESKETCH_ROUND_SECS`,
    /// `LIVESKETCH_BOT_COUNT` and `LIVESKETCH_SEED`, then validated.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = parse_var(&lookup, "LIVESKETCH_TOTAL_ROUNDS")? {
            config.total_rounds = v;
        }
        if let Some(v) = parse_var(&lookup, "LIVESKETCH_ROUND_SECS")? {
            config.round_duration_secs = v;
        }
        if let Some(v) = parse_var(&lookup, "LIVESKETCH_BOT_COUNT")? {
            config.bot_count = v;
        }
        if let Some(v) = parse_var(&lookup, "LIVESKETCH_SEED")? {
            config.rng_seed = Some(v);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration describes a playable session.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.total_rounds == 0 {
            return Err(ConfigError::NoRounds);
        }
        if self.round_duration_secs == 0 {
            return Err(ConfigError::NoRoundTime);
        }
        if self.prompts.is_empty() {
            return Err(ConfigError::NoPrompts);
        }
        if self.bot_count == 0 || self.bot_count > BOT_NAMES.len() {
            return Err(ConfigError::BotCount {
                got: self.bot_count,
                max: BOT_NAMES.len(),
            });
        }
        if self.bot_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval("bot_interval_ms"));
        }
        if self.countdown_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval("countdown_interval_ms"));
        }
        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.total_rounds, 8);
        assert_eq!(config.round_duration_secs, 90);
        assert_eq!(config.points_per_guess, 100);
        assert_eq!(config.bot_interval_ms, 3000);
        assert_eq!(config.results_delay_ms, 3000);
        assert_eq!(config.countdown_interval_ms, DEFAULT_COUNTDOWN_INTERVAL_MS);
        assert_eq!(config.prompts.len(), 20);
        assert_eq!(config.prompts[0], "Cat sleeping on a windowsill");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overlay() {
        let config = EngineConfig::from_lookup(lookup_from(&[
            ("LIVESKETCH_TOTAL_ROUNDS", "3"),
            ("LIVESKETCH_SEED", " 42 "),
        ]))
        .unwrap();
        assert_eq!(config.total_rounds, 3);
        assert_eq!(config.rng_seed, Some(42));
        assert_eq!(config.round_duration_secs, 90);
    }

    #[test]
    fn test_env_invalid_value() {
        let err = EngineConfig::from_lookup(lookup_from(&[("LIVESKETCH_BOT_COUNT", "many")]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: "LIVESKETCH_BOT_COUNT",
                value: "many".into()
            }
        );
    }

    #[test]
    fn test_validation() {
        let bad = EngineConfig { total_rounds: 0, ..Default::default() };
        assert_eq!(bad.validate(), Err(ConfigError::NoRounds));

        let bad = EngineConfig { prompts: vec![], ..Default::default() };
        assert_eq!(bad.validate(), Err(ConfigError::NoPrompts));

        let bad = EngineConfig { bot_count: 8, ..Default::default() };
        assert!(matches!(bad.validate(), Err(ConfigError::BotCount { got: 8, max: 7 })));

        let bad = EngineConfig { bot_interval_ms: 0, ..Default::default() };
        assert_eq!(bad.validate(), Err(ConfigError::ZeroInterval("bot_interval_ms")));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: EngineConfig = serde_json::from_str(r#"{"total_rounds": 2, "bot": {"ramp_secs": 30.0}}"#).unwrap();
        assert_eq!(config.total_rounds, 2);
        assert_eq!(config.bot.ramp_secs, 30.0);
        assert_eq!(config.bot.max_correct_chance, 0.8);
        assert_eq!(config.bot_count, 3);
    }
}

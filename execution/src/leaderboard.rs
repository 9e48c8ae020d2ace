//! Simulated bettors feeding the round leaderboard.
//!
//! The leaderboard is display-only; bot bets never touch the player's ledger or settlement.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use roulette_neo_types::roulette::LeaderboardEntry;
use roulette_neo_types::DEFAULT_CURRENCY;
use serde::{Deserialize, Serialize};

use crate::round_scheduler::ConfigError;

const BOT_NAMES: [&str; 8] = [
    "HighRoller99",
    "CryptoKing",
    "VegasDave",
    "LuckyLady",
    "WhaleWatcher",
    "ChipStacker",
    "RoulettePro",
    "SpeedBet",
];

const BOT_BET_LABELS: [&str; 9] = [
    "Red",
    "Black",
    "Zero",
    "Straight 17",
    "Straight 23",
    "Even",
    "Odd",
    "Tiers",
    "Orphelins",
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotFeedConfig {
    pub names: Vec<String>,
    /// Chance that a poll produces a bet.
    pub bet_chance: f64,
    pub bet_min: u64,
    pub bet_max: u64,
    pub currency: String,
}

impl Default for BotFeedConfig {
    fn default() -> Self {
        Self {
            names: BOT_NAMES.iter().map(|name| name.to_string()).collect(),
            bet_chance: 0.3,
            bet_min: 10,
            bet_max: 509,
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

impl BotFeedConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.bet_chance) {
            return Err(ConfigError::Table("bot_bet_chance must be within 0..=1"));
        }
        if self.bet_min == 0 || self.bet_min > self.bet_max {
            return Err(ConfigError::Table("bot bet range is invalid"));
        }
        Ok(())
    }
}

pub struct BotFeed<R = StdRng> {
    config: BotFeedConfig,
    rng: R,
}

impl BotFeed<StdRng> {
    pub fn seeded(config: BotFeedConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> BotFeed<R> {
    pub fn with_rng(config: BotFeedConfig, rng: R) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, rng })
    }

    pub fn is_empty(&self) -> bool {
        self.config.names.is_empty()
    }

    /// Roll for one bot bet. The entry's rank is assigned by the leaderboard.
    pub fn poll(&mut self) -> Option<LeaderboardEntry> {
        if !self.rng.gen_bool(self.config.bet_chance) {
            return None;
        }
        let name = self.config.names.choose(&mut self.rng)?.clone();
        let bet_type = BOT_BET_LABELS.choose(&mut self.rng)?.to_string();
        let amount = self
            .rng
            .gen_range(self.config.bet_min..=self.config.bet_max);
        Some(LeaderboardEntry {
            user_id: name.to_lowercase(),
            username: name,
            bet_type,
            amount,
            currency: self.config.currency.clone(),
            rank: 0,
        })
    }
}

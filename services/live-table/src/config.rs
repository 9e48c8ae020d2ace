use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Context;
use roulette_neo_execution::{BotFeedConfig, PhaseConfig, QuantumConfig, TableSettings};
use roulette_neo_types::{DEFAULT_CHIP, DEFAULT_CURRENCY, HISTORY_LIMIT, STARTING_BALANCE};
use serde::{Deserialize, Serialize};
use tracing::warn;

const ENV_PREFIX: &str = "ROULETTE_";

/// Service configuration. Read from an optional YAML file, then overridden by `ROULETTE_*`
/// environment variables.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,

    pub betting_secs: u32,
    pub tick_ms: u64,
    pub lock_ms: u64,
    pub spin_ms: u64,
    pub result_ms: u64,

    pub iframe_id: String,
    pub start_balance: u64,
    pub default_chip: u64,
    pub currency: String,
    pub history_limit: usize,
    pub quantum: QuantumConfig,
    pub layout_dir: PathBuf,
    /// Fixes the wheel and bot randomness when set.
    pub seed: Option<u64>,

    pub bot_count: usize,
    pub bot_interval_ms: u64,
    pub bot_bet_chance: f64,
    pub bot_bet_min: u64,
    pub bot_bet_max: u64,
}

impl Default for TableConfig {
    fn default() -> Self {
        let phases = PhaseConfig::default();
        let bots = BotFeedConfig::default();
        Self {
            host: "0.0.0.0".to_string(),
            port: 9123,
            log_level: "info".to_string(),
            betting_secs: phases.betting_secs,
            tick_ms: phases.tick_ms,
            lock_ms: phases.lock_ms,
            spin_ms: phases.spin_ms,
            result_ms: phases.result_ms,
            iframe_id: TableSettings::default().iframe_id,
            start_balance: STARTING_BALANCE,
            default_chip: DEFAULT_CHIP,
            currency: DEFAULT_CURRENCY.to_string(),
            history_limit: HISTORY_LIMIT,
            quantum: QuantumConfig::default(),
            layout_dir: PathBuf::from("layouts"),
            seed: None,
            bot_count: bots.names.len(),
            bot_interval_ms: 2_000,
            bot_bet_chance: bots.bet_chance,
            bot_bet_min: bots.bet_min,
            bot_bet_max: bots.bet_max,
        }
    }
}

impl TableConfig {
    /// Load the file (if any), apply environment overrides and validate.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("could not read config file {}", path.display()))?;
                serde_yaml::from_str(&raw)
                    .with_context(|| format!("could not parse config file {}", path.display()))?
            }
            None => TableConfig::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = &lookup;
        self.host = read_var(lookup, "HOST", self.host.clone());
        self.port = read_var(lookup, "PORT", self.port);
        self.log_level = read_var(lookup, "LOG_LEVEL", self.log_level.clone());
        self.betting_secs = read_var(lookup, "BETTING_SECS", self.betting_secs);
        self.tick_ms = read_ms(lookup, "TICK_MS", self.tick_ms);
        self.lock_ms = read_ms(lookup, "LOCK_MS", self.lock_ms);
        self.spin_ms = read_ms(lookup, "SPIN_MS", self.spin_ms);
        self.result_ms = read_ms(lookup, "RESULT_MS", self.result_ms);
        self.iframe_id = read_var(lookup, "IFRAME_ID", self.iframe_id.clone());
        self.start_balance = read_var(lookup, "START_BALANCE", self.start_balance);
        self.default_chip = read_var(lookup, "DEFAULT_CHIP", self.default_chip);
        self.currency = read_var(lookup, "CURRENCY", self.currency.clone());
        self.history_limit = read_var(lookup, "HISTORY_LIMIT", self.history_limit);
        self.layout_dir = read_var(lookup, "LAYOUT_DIR", self.layout_dir.clone());
        if let Some(seed) = read_override(lookup, "SEED") {
            self.seed = Some(seed);
        }
        self.bot_count = read_var(lookup, "BOT_COUNT", self.bot_count);
        self.bot_interval_ms = read_ms(lookup, "BOT_INTERVAL_MS", self.bot_interval_ms);
        self.bot_bet_chance = read_var(lookup, "BOT_BET_CHANCE", self.bot_bet_chance);
        self.bot_bet_min = read_var(lookup, "BOT_BET_MIN", self.bot_bet_min);
        self.bot_bet_max = read_var(lookup, "BOT_BET_MAX", self.bot_bet_max);
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        tracing::Level::from_str(&self.log_level)
            .map_err(|_| anyhow::anyhow!("invalid log level {:?}", self.log_level))?;
        self.phase_config()
            .validate()
            .context("invalid phase timings")?;
        self.quantum.validate().context("invalid quantum multipliers")?;
        self.table_settings()
            .validate()
            .context("invalid table settings")?;
        self.bot_feed().validate().context("invalid bot feed")?;
        if self.bot_count > 0 && self.bot_interval_ms == 0 {
            anyhow::bail!("bot_interval_ms must be greater than zero");
        }
        Ok(())
    }

    pub fn log_level(&self) -> tracing::Level {
        tracing::Level::from_str(&self.log_level).unwrap_or(tracing::Level::INFO)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn phase_config(&self) -> PhaseConfig {
        PhaseConfig {
            betting_secs: self.betting_secs,
            tick_ms: self.tick_ms,
            lock_ms: self.lock_ms,
            spin_ms: self.spin_ms,
            result_ms: self.result_ms,
        }
    }

    pub fn table_settings(&self) -> TableSettings {
        TableSettings {
            iframe_id: self.iframe_id.clone(),
            currency: self.currency.clone(),
            start_balance: self.start_balance,
            default_chip: self.default_chip,
            history_limit: self.history_limit,
        }
    }

    /// Bot names: the stock list first, then numbered bots past its end.
    pub fn bot_feed(&self) -> BotFeedConfig {
        let stock = BotFeedConfig::default();
        let names = (0..self.bot_count)
            .map(|idx| {
                stock
                    .names
                    .get(idx)
                    .cloned()
                    .unwrap_or_else(|| format!("Bot{idx:03}"))
            })
            .collect();
        BotFeedConfig {
            names,
            bet_chance: self.bot_bet_chance,
            bet_min: self.bot_bet_min,
            bet_max: self.bot_bet_max,
            currency: self.currency.clone(),
        }
    }
}

fn read_override<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let name = format!("{ENV_PREFIX}{key}");
    let raw = lookup(&name)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(var = %name, value = %raw, "ignoring unparseable override");
            None
        }
    }
}

fn read_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, fallback: T) -> T {
    read_override(lookup, key).unwrap_or(fallback)
}

fn read_ms(lookup: &impl Fn(&str) -> Option<String>, key: &str, fallback: u64) -> u64 {
    read_var(lookup, key, fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = TableConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.betting_secs, 60);
        assert_eq!(config.lock_ms, 1_000);
        assert_eq!(config.spin_ms, 10_000);
        assert_eq!(config.result_ms, 5_000);
        assert_eq!(config.start_balance, 25_000);
        assert_eq!(config.default_chip, 5);
        assert_eq!(config.currency, "USD");
        assert_eq!(config.history_limit, 50);
        assert_eq!(config.bot_interval_ms, 2_000);
        assert_eq!(config.log_level(), tracing::Level::INFO);
        assert_eq!(config.listen_addr(), "0.0.0.0:9123");
    }

    #[test]
    fn test_yaml_partial() {
        let yaml = r#"
port: 8080
betting_secs: 15
log_level: debug
seed: 7
quantum:
  min_count: 2
  max_count: 2
"#;
        let config: TableConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.betting_secs, 15);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.quantum.min_count, 2);
        // Missing nested fields fall back to defaults.
        assert_eq!(config.quantum.weights.len(), 3);
        assert_eq!(config.spin_ms, 10_000);
        assert!(config.validate().is_ok());
        assert_eq!(config.log_level(), tracing::Level::DEBUG);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = TableConfig::default();
        config.apply_overrides(env(&[
            ("ROULETTE_PORT", "7000"),
            ("ROULETTE_SPIN_MS", "2500"),
            ("ROULETTE_CURRENCY", "EUR"),
            ("ROULETTE_SEED", "99"),
            ("ROULETTE_BOT_BET_CHANCE", "0.5"),
            ("ROULETTE_LOCK_MS", "soon"),
        ]));
        assert_eq!(config.port, 7000);
        assert_eq!(config.spin_ms, 2_500);
        assert_eq!(config.currency, "EUR");
        assert_eq!(config.seed, Some(99));
        assert_eq!(config.bot_bet_chance, 0.5);
        // Unparseable values keep the previous setting.
        assert_eq!(config.lock_ms, 1_000);
        assert_eq!(config.bot_feed().currency, "EUR");
    }

    #[test]
    fn test_validation_failures() {
        let zero_spin = TableConfig {
            spin_ms: 0,
            ..TableConfig::default()
        };
        assert!(zero_spin.validate().is_err());

        let bad_chip = TableConfig {
            default_chip: 3,
            ..TableConfig::default()
        };
        assert!(bad_chip.validate().is_err());

        let bad_level = TableConfig {
            log_level: "loud".to_string(),
            ..TableConfig::default()
        };
        assert!(bad_level.validate().is_err());

        let bad_bots = TableConfig {
            bot_bet_min: 0,
            ..TableConfig::default()
        };
        assert!(bad_bots.validate().is_err());
    }

    #[test]
    fn test_bot_names() {
        let config = TableConfig {
            bot_count: 10,
            ..TableConfig::default()
        };
        let names = config.bot_feed().names;
        assert_eq!(names.len(), 10);
        assert_eq!(names[0], "HighRoller99");
        assert_eq!(names[9], "Bot009");

        let none = TableConfig {
            bot_count: 0,
            ..TableConfig::default()
        };
        assert!(none.bot_feed().names.is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let err = TableConfig::load(Some(Path::new("/nonexistent/roulette.yaml"))).unwrap_err();
        assert!(format!("{err:#}").contains("could not read config file"));
    }
}

//! Quantum multiplier generation.
//!
//! Each round draws between `min_count` and `max_count` distinct pockets from the wheel and
//! gives each one a bonus multiplier picked from a weighted table. A straight bet that wins on
//! one of those pockets is paid at the multiplier instead of 35:1.

use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::index;
use rand::Rng;
use roulette_neo_types::{Pocket, QuantumMultiplier, POCKET_COUNT};
use serde::{Deserialize, Serialize};

use crate::round_scheduler::ConfigError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiplierWeight {
    pub multiplier: u64,
    pub weight: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuantumConfig {
    pub min_count: usize,
    pub max_count: usize,
    pub weights: Vec<MultiplierWeight>,
}

impl Default for QuantumConfig {
    /// 1-3 pockets per round; 500x one time in five, otherwise 50x or 100x evenly.
    fn default() -> Self {
        Self {
            min_count: 1,
            max_count: 3,
            weights: vec![
                MultiplierWeight {
                    multiplier: 50,
                    weight: 40,
                },
                MultiplierWeight {
                    multiplier: 100,
                    weight: 40,
                },
                MultiplierWeight {
                    multiplier: 500,
                    weight: 20,
                },
            ],
        }
    }
}

impl QuantumConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_count == 0 || self.min_count > self.max_count || self.max_count > POCKET_COUNT
        {
            return Err(ConfigError::MultiplierCount {
                min: self.min_count,
                max: self.max_count,
            });
        }
        if self.weights.iter().any(|w| w.multiplier == 0) {
            return Err(ConfigError::MultiplierWeights(
                "multiplier values must be positive".to_string(),
            ));
        }
        WeightedIndex::new(self.weights.iter().map(|w| w.weight))
            .map(|_| ())
            .map_err(|err| ConfigError::MultiplierWeights(err.to_string()))
    }
}

/// Validated multiplier table, ready to draw from.
#[derive(Clone, Debug)]
pub struct QuantumGenerator {
    min_count: usize,
    max_count: usize,
    values: Vec<u64>,
    distribution: WeightedIndex<u32>,
}

impl QuantumGenerator {
    pub fn new(config: &QuantumConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let distribution = WeightedIndex::new(config.weights.iter().map(|w| w.weight))
            .map_err(|err| ConfigError::MultiplierWeights(err.to_string()))?;
        Ok(Self {
            min_count: config.min_count,
            max_count: config.max_count,
            values: config.weights.iter().map(|w| w.multiplier).collect(),
            distribution,
        })
    }

    /// Draw this round's multipliers. Pockets never repeat within a round.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<QuantumMultiplier> {
        let count = rng.gen_range(self.min_count..=self.max_count);
        index::sample(rng, POCKET_COUNT, count)
            .into_iter()
            .map(|position| QuantumMultiplier {
                number: Pocket::at_wheel_index(position),
                multiplier: self.values[self.distribution.sample(rng)],
            })
            .collect()
    }
}

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Pocket;

/// Round phases, strictly ordered within a cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoundPhase {
    Loading,
    WaitingForBets,
    BetsClosed,
    Spinning,
    ResultDisplay,
}

impl RoundPhase {
    /// Phase that follows this one. `ResultDisplay` wraps to a fresh round.
    pub fn next(&self) -> RoundPhase {
        match self {
            RoundPhase::Loading => RoundPhase::WaitingForBets,
            RoundPhase::WaitingForBets => RoundPhase::BetsClosed,
            RoundPhase::BetsClosed => RoundPhase::Spinning,
            RoundPhase::Spinning => RoundPhase::ResultDisplay,
            RoundPhase::ResultDisplay => RoundPhase::WaitingForBets,
        }
    }

    pub fn is_betting_open(&self) -> bool {
        matches!(self, RoundPhase::WaitingForBets)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RoundPhase::Loading => "LOADING",
            RoundPhase::WaitingForBets => "WAITING_FOR_BETS",
            RoundPhase::BetsClosed => "BETS_CLOSED",
            RoundPhase::Spinning => "SPINNING",
            RoundPhase::ResultDisplay => "RESULT_DISPLAY",
        }
    }
}

impl fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Round identity. Derived from the wall clock in milliseconds and strictly increasing, so
/// two rounds never share an id even when they start within the same millisecond.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoundId(u64);

impl RoundId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Id for a round starting at `now_ms`, never equal to or before `previous`.
    pub fn after(previous: Option<RoundId>, now_ms: u64) -> Self {
        match previous {
            Some(RoundId(prev)) => Self(now_ms.max(prev.saturating_add(1))),
            None => Self(now_ms),
        }
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "round_{}", self.0)
    }
}

impl FromStr for RoundId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix("round_").unwrap_or(s).parse().map(RoundId)
    }
}

impl TryFrom<String> for RoundId {
    type Error = ParseIntError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RoundId> for String {
    fn from(id: RoundId) -> Self {
        id.to_string()
    }
}

/// Per-round bonus: a winning straight bet on `number` pays `multiplier` instead of 35.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantumMultiplier {
    pub number: Pocket,
    pub multiplier: u64,
}

/// State delivered to round subscribers on every phase change and countdown tick.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundSnapshot {
    pub phase: RoundPhase,
    pub time_left: u32,
    pub winning_number: Option<Pocket>,
    pub round_id: RoundId,
    pub multipliers: Vec<QuantumMultiplier>,
}

impl RoundSnapshot {
    pub fn multiplier_for(&self, pocket: Pocket) -> Option<u64> {
        self.multipliers
            .iter()
            .find(|m| m.number == pocket)
            .map(|m| m.multiplier)
    }
}

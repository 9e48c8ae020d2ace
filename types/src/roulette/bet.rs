use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;
use uuid::Uuid;

use super::{coverage, Pocket};

/// Roulette bet shapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BetType {
    Straight,  // Single pocket (35:1)
    Split,     // Two adjacent numbers (17:1)
    Street,    // Row of three (11:1)
    Corner,    // Block of four (8:1)
    Line,      // Two rows, six numbers (5:1)
    Column,    // Twelve numbers (2:1)
    Dozen,     // 1-12, 13-24, 25-36 (2:1)
    RedBlack,  // Eighteen of one colour (1:1)
    EvenOdd,   // Eighteen of one parity (1:1)
    HighLow,   // 1-18 or 19-36 (1:1)
    Zero,      // `0` or `00` (35:1)
    Voisins,   // Racetrack sectors expand to straights (35:1)
    Tiers,
    Orphelins,
    Neighbors,
}

impl BetType {
    pub const ALL: [BetType; 15] = [
        BetType::Straight,
        BetType::Split,
        BetType::Street,
        BetType::Corner,
        BetType::Line,
        BetType::Column,
        BetType::Dozen,
        BetType::RedBlack,
        BetType::EvenOdd,
        BetType::HighLow,
        BetType::Zero,
        BetType::Voisins,
        BetType::Tiers,
        BetType::Orphelins,
        BetType::Neighbors,
    ];

    /// Standard payout ratio against a one unit stake (excludes the returned stake).
    pub fn standard_payout(&self) -> u64 {
        match self {
            BetType::Straight | BetType::Zero => 35,
            BetType::Voisins | BetType::Tiers | BetType::Orphelins | BetType::Neighbors => 35,
            BetType::Split => 17,
            BetType::Street => 11,
            BetType::Corner => 8,
            BetType::Line => 5,
            BetType::Column | BetType::Dozen => 2,
            BetType::RedBlack | BetType::EvenOdd | BetType::HighLow => 1,
        }
    }

    /// Racetrack bets that expand to a fixed set of straight numbers.
    pub fn is_racetrack(&self) -> bool {
        matches!(
            self,
            BetType::Voisins | BetType::Tiers | BetType::Orphelins | BetType::Neighbors
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BetType::Straight => "STRAIGHT",
            BetType::Split => "SPLIT",
            BetType::Street => "STREET",
            BetType::Corner => "CORNER",
            BetType::Line => "LINE",
            BetType::Column => "COLUMN",
            BetType::Dozen => "DOZEN",
            BetType::RedBlack => "RED_BLACK",
            BetType::EvenOdd => "EVEN_ODD",
            BetType::HighLow => "HIGH_LOW",
            BetType::Zero => "ZERO",
            BetType::Voisins => "VOISINS",
            BetType::Tiers => "TIERS",
            BetType::Orphelins => "ORPHELINS",
            BetType::Neighbors => "NEIGHBORS",
        }
    }

    /// Check that `numbers` is a selection a table position of this type can produce.
    pub fn validate_coverage(&self, numbers: &BTreeSet<Pocket>) -> Result<(), BetRejection> {
        if numbers.is_empty() {
            return Err(BetRejection::InvalidCoverage {
                bet_type: *self,
                reason: "no numbers covered".to_string(),
            });
        }
        if coverage::is_valid(*self, numbers) {
            return Ok(());
        }
        let labels: Vec<String> = numbers.iter().map(Pocket::label).collect();
        Err(BetRejection::InvalidCoverage {
            bet_type: *self,
            reason: format!("{} is not a {} position", labels.join(","), self.as_str()),
        })
    }
}

impl fmt::Display for BetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BetId(Uuid);

impl BetId {
    pub fn fresh() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for BetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A chip placed on the table.
///
/// Immutable once placed: the stake was debited from the balance at placement and is either
/// refunded (undo/clear) or consumed by settlement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedBet {
    pub id: BetId,
    #[serde(rename = "type")]
    pub bet_type: BetType,
    pub numbers: BTreeSet<Pocket>,
    pub amount: u64,
    pub payout_ratio: u64,
}

impl PlacedBet {
    pub fn covers(&self, pocket: Pocket) -> bool {
        self.numbers.contains(&pocket)
    }

    pub fn matches(&self, bet_type: BetType, numbers: &BTreeSet<Pocket>) -> bool {
        self.bet_type == bet_type && &self.numbers == numbers
    }

    /// Same shape and stake under a new id.
    pub fn replay(&self) -> Self {
        Self {
            id: BetId::fresh(),
            ..self.clone()
        }
    }
}

#[derive(Debug, ThisError, Clone, PartialEq, Eq)]
pub enum BetRejection {
    #[error("betting is closed for this round")]
    BettingClosed,
    #[error("insufficient balance (balance={balance}, required={required})")]
    InsufficientBalance { balance: u64, required: u64 },
    #[error("invalid {bet_type} coverage: {reason}")]
    InvalidCoverage { bet_type: BetType, reason: String },
    #[error("invalid payout ratio {ratio} for {bet_type}")]
    InvalidPayout { bet_type: BetType, ratio: u64 },
    #[error("unknown chip denomination {0}")]
    UnknownChip(u64),
    #[error("bet amount must be greater than zero")]
    InvalidAmount,
}

#[derive(Debug, ThisError, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("no bets to save")]
    Empty,
    #[error("no saved layout")]
    NotFound,
    #[error("insufficient funds to restore layout (balance={balance}, required={required})")]
    InsufficientFunds { balance: u64, required: u64 },
    #[error("betting is closed for this round")]
    BettingClosed,
    #[error("layout storage failed: {0}")]
    Storage(String),
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

use super::{DOUBLE_ZERO, POCKET_COUNT, RED_NUMBERS, WHEEL_ORDER};

#[derive(Debug, ThisError, Clone, PartialEq, Eq)]
pub enum PocketError {
    #[error("unknown pocket label {0:?}")]
    UnknownLabel(String),
    #[error("pocket value {0} out of range")]
    OutOfRange(u8),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PocketColor {
    Red,
    Black,
    Green,
}

/// One of the 38 labelled wheel positions.
///
/// Numbers 0-36 are stored as-is; `00` is stored as [`DOUBLE_ZERO`]. Serialized as its
/// label (`"0"`, `"00"`, `"17"`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pocket(u8);

impl Pocket {
    pub const ZERO: Pocket = Pocket(0);
    pub const DOUBLE_ZERO: Pocket = Pocket(DOUBLE_ZERO);

    pub fn new(value: u8) -> Result<Self, PocketError> {
        if value as usize >= POCKET_COUNT {
            return Err(PocketError::OutOfRange(value));
        }
        Ok(Self(value))
    }

    /// Pocket at a position on the wheel (see [`WHEEL_ORDER`]).
    pub fn at_wheel_index(index: usize) -> Self {
        Self(WHEEL_ORDER[index])
    }

    /// All 38 pockets in wheel order.
    pub fn wheel() -> impl Iterator<Item = Pocket> {
        WHEEL_ORDER.iter().map(|value| Pocket(*value))
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// The table number for 1-36, `None` for the zeros.
    pub fn table_number(&self) -> Option<u8> {
        match self.0 {
            1..=36 => Some(self.0),
            _ => None,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0 || self.0 == DOUBLE_ZERO
    }

    pub fn color(&self) -> PocketColor {
        if self.is_zero() {
            PocketColor::Green
        } else if RED_NUMBERS.contains(&self.0) {
            PocketColor::Red
        } else {
            PocketColor::Black
        }
    }

    pub fn wheel_index(&self) -> usize {
        // Every constructed pocket appears exactly once in the wheel order.
        WHEEL_ORDER
            .iter()
            .position(|value| *value == self.0)
            .unwrap_or_else(|| unreachable!("pocket {} missing from wheel order", self.0))
    }

    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Pocket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == DOUBLE_ZERO {
            f.write_str("00")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl FromStr for Pocket {
    type Err = PocketError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        let trimmed = label.trim();
        if trimmed == "00" {
            return Ok(Pocket::DOUBLE_ZERO);
        }
        // Reject "07" and friends so every pocket has one label.
        if trimmed.len() > 1 && trimmed.starts_with('0') {
            return Err(PocketError::UnknownLabel(label.to_string()));
        }
        match trimmed.parse::<u8>() {
            Ok(value) if value <= 36 => Ok(Pocket(value)),
            _ => Err(PocketError::UnknownLabel(label.to_string())),
        }
    }
}

impl TryFrom<String> for Pocket {
    type Error = PocketError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Pocket> for String {
    fn from(pocket: Pocket) -> Self {
        pocket.to_string()
    }
}

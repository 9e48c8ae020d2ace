use serde::{Deserialize, Serialize};

use super::{BetRejection, LayoutError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Info,
    Success,
}

/// User-visible notification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
}

impl Notice {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            message: message.into(),
        }
    }
}

impl From<&BetRejection> for Notice {
    fn from(rejection: &BetRejection) -> Self {
        match rejection {
            BetRejection::BettingClosed => Notice::error("Betting Closed"),
            BetRejection::InsufficientBalance { .. } => Notice::error("Insufficient Balance"),
            BetRejection::UnknownChip(value) => Notice::error(format!("Unknown Chip: {value}")),
            BetRejection::InvalidCoverage { .. }
            | BetRejection::InvalidPayout { .. }
            | BetRejection::InvalidAmount => Notice::error("Invalid Bet"),
        }
    }
}

impl From<&LayoutError> for Notice {
    fn from(err: &LayoutError) -> Self {
        match err {
            LayoutError::Empty => Notice::info("No Bets To Save"),
            LayoutError::NotFound => Notice::info("No Saved Layout"),
            LayoutError::InsufficientFunds { .. } => Notice::error("Insufficient Funds"),
            LayoutError::BettingClosed => Notice::error("Betting Closed"),
            LayoutError::Storage(_) => Notice::error("Layout Unavailable"),
        }
    }
}

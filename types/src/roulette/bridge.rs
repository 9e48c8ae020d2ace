//! Messages exchanged with the embedding frame.
//!
//! Both directions are tagged unions shaped `{"type": "BET_PLACED", "data": {...}}` with
//! camelCase payload fields. The table only ever emits outgoing messages; it never waits on a
//! reply.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{BetId, Pocket, RoundId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "data",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum OutgoingMessage {
    IframeReady {
        iframe_id: String,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        dimensions: Option<Dimensions>,
    },
    RequestAuth {
        reason: String,
    },
    BetPlaced {
        bet_ids: Vec<BetId>,
        round_id: RoundId,
        total_amount: u64,
        currency: String,
        bet_count: usize,
    },
    BetWon {
        bet_ids: Vec<BetId>,
        round_id: RoundId,
        winning_number: Pocket,
        total_win_amount: u64,
        currency: String,
        profit: i64,
    },
    BetLost {
        bet_ids: Vec<BetId>,
        round_id: RoundId,
        winning_number: Pocket,
        total_loss_amount: u64,
        currency: String,
    },
    BalanceRequest {
        currencies: Vec<String>,
    },
    SessionWarning {
        warning_type: String,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyBalance {
    pub currency: String,
    pub amount: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "data",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum IncomingMessage {
    AuthToken {
        session_token: String,
        expires_at: String,
    },
    BalanceUpdate {
        user_id: String,
        balances: Vec<CurrencyBalance>,
    },
    RoundStateUpdate {
        round_id: String,
        state: String,
        time_remaining_seconds: u32,
    },
    BetSettlement {
        round_id: String,
        total_payout: u64,
        new_balance: BTreeMap<String, String>,
    },
    TopBetsUpdate {
        round_id: String,
        top_bets: Vec<serde_json::Value>,
    },
}

impl IncomingMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            IncomingMessage::AuthToken { .. } => "AUTH_TOKEN",
            IncomingMessage::BalanceUpdate { .. } => "BALANCE_UPDATE",
            IncomingMessage::RoundStateUpdate { .. } => "ROUND_STATE_UPDATE",
            IncomingMessage::BetSettlement { .. } => "BET_SETTLEMENT",
            IncomingMessage::TopBetsUpdate { .. } => "TOP_BETS_UPDATE",
        }
    }

    /// Balance amount for `currency` carried by a `BALANCE_UPDATE`, in whole chips.
    ///
    /// Fractional amounts are floored; negative or unparseable amounts yield `None`.
    pub fn balance_for(&self, currency: &str) -> Option<u64> {
        let IncomingMessage::BalanceUpdate { balances, .. } = self else {
            return None;
        };
        let entry = balances.iter().find(|b| b.currency == currency)?;
        let value: f64 = entry.amount.trim().parse().ok()?;
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        Some(value.floor() as u64)
    }
}

use serde::{Deserialize, Serialize};

/// Running totals across settled rounds.
///
/// `net_profit` is always `total_won - total_wagered`; it is recomputed from the totals on
/// every update and never adjusted on its own.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_wagered: u64,
    pub total_won: u64,
    pub net_profit: i64,
    pub start_balance: u64,
}

impl UserStats {
    pub fn new(start_balance: u64) -> Self {
        Self {
            start_balance,
            ..Self::default()
        }
    }

    pub fn record_round(&mut self, wagered: u64, won: u64) {
        self.total_wagered = self.total_wagered.saturating_add(wagered);
        self.total_won = self.total_won.saturating_add(won);
        self.net_profit = clamp_i64(self.total_won as i128 - self.total_wagered as i128);
    }
}

fn clamp_i64(value: i128) -> i64 {
    value.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

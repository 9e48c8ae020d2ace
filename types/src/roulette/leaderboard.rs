use serde::{Deserialize, Serialize};

use super::LEADERBOARD_SIZE;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub username: String,
    pub bet_type: String,
    pub amount: u64,
    pub currency: String,
    pub rank: u32,
}

/// Top bets of the current round, largest first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    /// Insert an entry, keep the largest [`LEADERBOARD_SIZE`] and re-rank from 1.
    pub fn update(&mut self, entry: LeaderboardEntry) {
        self.entries.push(entry);
        // Stable sort keeps earlier entries ahead on ties.
        self.entries.sort_by(|a, b| b.amount.cmp(&a.amount));
        self.entries.truncate(LEADERBOARD_SIZE);
        for (i, entry) in self.entries.iter_mut().enumerate() {
            entry.rank = (i + 1) as u32;
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

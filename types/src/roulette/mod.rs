//! Roulette domain types.
//!
//! Defines the static wheel, bet shapes, placed bets, round state, statistics and the
//! bridge/leaderboard payloads shared by the execution layer and the live table service.

mod bet;
mod bridge;
mod constants;
pub mod coverage;
mod leaderboard;
mod notice;
mod pocket;
mod round;
mod stats;

pub use bet::*;
pub use bridge::*;
pub use constants::*;
pub use leaderboard::*;
pub use notice::*;
pub use pocket::*;
pub use round::*;
pub use stats::*;

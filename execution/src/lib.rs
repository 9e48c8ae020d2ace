//! Roulette-neo execution layer.
//!
//! This crate contains the round state machine ([`RoundEngine`]), the per-player bet ledger,
//! settlement, autoplay and the [`Table`] controller that wires them together for a single
//! player.
//!
//! ## Clock
//! Nothing in this crate reads the wall clock. Every time-dependent operation takes `now_ms`
//! from the caller, and the engine reports the next instant it needs to be woken through
//! [`RoundEngine::next_wake`]. A driver (the live table service, or a test) sleeps until then
//! and calls back in.
//!
//! ## Money
//! Amounts are whole chips (`u64`). A stake leaves the balance when the bet is placed, is
//! returned by undo/clear, and is otherwise consumed by exactly one settlement.
//!
//! ```rust,ignore
//! use roulette_neo_execution::{PhaseConfig, QuantumConfig, RoundEngine};
//!
//! let mut engine = RoundEngine::new(PhaseConfig::default(), QuantumConfig::default(), 0)?;
//! engine.start(0);
//! while let Some(wake) = engine.next_wake() {
//!     // sleep until wake.at_ms
//!     for snapshot in engine.fire(wake, wake.at_ms) {
//!         println!("{} {}", snapshot.phase, snapshot.time_left);
//!     }
//! }
//! ```

pub mod autoplay;
pub mod engine;
pub mod layout;
pub mod leaderboard;
pub mod ledger;
pub mod quantum;
pub mod round_scheduler;
pub mod settlement;
pub mod table;

pub use autoplay::{AutoplayController, AutoplayOutcome};
pub use engine::{RoundEngine, SubscriptionId};
pub use layout::{JsonFileLayoutStore, LayoutStore, MemoryLayoutStore};
pub use leaderboard::{BotFeed, BotFeedConfig};
pub use ledger::BetLedger;
pub use quantum::{MultiplierWeight, QuantumConfig, QuantumGenerator};
pub use round_scheduler::{ConfigError, PhaseConfig, Wake};
pub use settlement::{settle, BetOutcome, Settlement, SettlementEngine};
pub use table::{Table, TableEvent, TableSettings, TableView};

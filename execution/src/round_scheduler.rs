//! Round scheduler for the live roulette table.
//!
//! Pure transition rules and phase timing, kept apart from the engine that owns state and
//! randomness.
//!
//! ## Phases
//!
//! A round progresses through four live phases:
//! 1. **WaitingForBets** - countdown in whole seconds, one tick per `tick_ms`
//! 2. **BetsClosed** - short lock before the wheel spins
//! 3. **Spinning** - winning number and multipliers are drawn on entry
//! 4. **ResultDisplay** - winnings are shown, then the next round starts
//!
//! `Loading` only exists before the engine is started.
//!
//! ## Wakes
//!
//! The engine never keeps more than one pending timer. Each scheduled instant is a [`Wake`]
//! tagged with the round and phase it was scheduled for; a wake whose tag no longer matches the
//! engine's current one is stale and is dropped.

use roulette_neo_types::{RoundId, RoundPhase};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

/// Milliseconds per countdown second.
pub const MS_PER_SECOND: u64 = 1_000;

#[derive(Debug, ThisError, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
    #[error("multiplier count range {min}..={max} is invalid")]
    MultiplierCount { min: usize, max: usize },
    #[error("multiplier weights are invalid: {0}")]
    MultiplierWeights(String),
    #[error("invalid table settings: {0}")]
    Table(&'static str),
}

/// Phase configuration. The betting window is counted in whole seconds; the rest are
/// milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseConfig {
    /// Countdown length of the betting phase, in seconds.
    pub betting_secs: u32,
    /// Interval between countdown ticks.
    pub tick_ms: u64,
    /// Time between bets closing and the wheel spinning.
    pub lock_ms: u64,
    /// Spin animation length.
    pub spin_ms: u64,
    /// How long the result stays on screen before the next round.
    pub result_ms: u64,
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self {
            betting_secs: 60,
            tick_ms: MS_PER_SECOND,
            lock_ms: 1_000,
            spin_ms: 10_000,
            result_ms: 5_000,
        }
    }
}

impl PhaseConfig {
    /// Validate the configuration (all durations must be > 0).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.betting_secs == 0 {
            return Err(ConfigError::ZeroDuration("betting_secs"));
        }
        if self.tick_ms == 0 {
            return Err(ConfigError::ZeroDuration("tick_ms"));
        }
        if self.lock_ms == 0 {
            return Err(ConfigError::ZeroDuration("lock_ms"));
        }
        if self.spin_ms == 0 {
            return Err(ConfigError::ZeroDuration("spin_ms"));
        }
        if self.result_ms == 0 {
            return Err(ConfigError::ZeroDuration("result_ms"));
        }
        Ok(())
    }

    /// Delay until the next wake after entering (or ticking within) `phase`.
    pub fn duration_for_phase(&self, phase: RoundPhase) -> u64 {
        match phase {
            RoundPhase::Loading => 0,
            RoundPhase::WaitingForBets => self.tick_ms,
            RoundPhase::BetsClosed => self.lock_ms,
            RoundPhase::Spinning => self.spin_ms,
            RoundPhase::ResultDisplay => self.result_ms,
        }
    }

    /// Countdown value shown when `phase` is entered.
    pub fn time_left_on_entry(&self, phase: RoundPhase) -> u32 {
        match phase {
            RoundPhase::Loading | RoundPhase::WaitingForBets => self.betting_secs,
            RoundPhase::BetsClosed | RoundPhase::Spinning => 0,
            RoundPhase::ResultDisplay => {
                u32::try_from(self.result_ms.div_ceil(MS_PER_SECOND)).unwrap_or(u32::MAX)
            }
        }
    }

    /// Calculate total round duration in milliseconds.
    pub fn total_round_duration_ms(&self) -> u64 {
        (self.betting_secs as u64)
            .saturating_mul(self.tick_ms)
            .saturating_add(self.lock_ms)
            .saturating_add(self.spin_ms)
            .saturating_add(self.result_ms)
    }
}

/// A scheduled instant, tagged with the round and phase it belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Wake {
    pub round_id: RoundId,
    pub phase: RoundPhase,
    pub at_ms: u64,
}

impl Wake {
    pub fn is_due(&self, now_ms: u64) -> bool {
        now_ms >= self.at_ms
    }

    /// Milliseconds until the wake is due (zero if already due).
    pub fn delay_from(&self, now_ms: u64) -> u64 {
        self.at_ms.saturating_sub(now_ms)
    }
}

/// What a due wake does to the round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Countdown decremented, phase unchanged.
    Tick { time_left: u32 },
    /// Move to the given phase. Entering `WaitingForBets` from `ResultDisplay` starts a new round.
    Enter(RoundPhase),
}

/// Pure transition rules for round phase management.
#[derive(Clone, Debug)]
pub struct RoundScheduler {
    config: PhaseConfig,
}

impl RoundScheduler {
    pub fn new(config: PhaseConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PhaseConfig {
        &self.config
    }

    /// Step taken when the wake for `phase` fires with `time_left` on the countdown.
    ///
    /// The betting countdown closes bets on the tick that would take it to zero.
    pub fn step(&self, phase: RoundPhase, time_left: u32) -> Step {
        match phase {
            RoundPhase::WaitingForBets if time_left > 1 => Step::Tick {
                time_left: time_left - 1,
            },
            other => Step::Enter(other.next()),
        }
    }

    /// Schedule the wake that follows `phase`, counting from `from_ms`.
    pub fn wake_after(&self, round_id: RoundId, phase: RoundPhase, from_ms: u64) -> Wake {
        Wake {
            round_id,
            phase,
            at_ms: from_ms.saturating_add(self.config.duration_for_phase(phase)),
        }
    }
}

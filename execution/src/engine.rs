//! Round engine: the table's clock-driven state machine.
//!
//! The engine owns the current phase, the betting countdown, the round id, the winning number
//! and the round's quantum multipliers. It keeps exactly one pending [`Wake`]; the driver
//! sleeps until that instant and hands it back through [`RoundEngine::fire`]. Every transition
//! replaces the pending wake, so a wake scheduled for an earlier phase or round can never be
//! applied twice.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use roulette_neo_types::{
    Pocket, QuantumMultiplier, RoundId, RoundPhase, RoundSnapshot, POCKET_COUNT,
};
use tracing::{debug, info};

use crate::quantum::{QuantumConfig, QuantumGenerator};
use crate::round_scheduler::{ConfigError, PhaseConfig, RoundScheduler, Step, Wake};

pub type StateListener = Box<dyn FnMut(&RoundSnapshot) + Send>;

/// Handle returned by [`RoundEngine::subscribe_state`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

pub struct RoundEngine<R = StdRng> {
    scheduler: RoundScheduler,
    quantum: QuantumGenerator,
    rng: R,

    phase: RoundPhase,
    time_left: u32,
    round_id: RoundId,
    winning_number: Option<Pocket>,
    multipliers: Vec<QuantumMultiplier>,
    pending: Option<Wake>,

    listeners: BTreeMap<SubscriptionId, StateListener>,
    next_subscription: u64,
}

impl RoundEngine<StdRng> {
    pub fn new(
        config: PhaseConfig,
        quantum: QuantumConfig,
        now_ms: u64,
    ) -> Result<Self, ConfigError> {
        Self::with_rng(config, quantum, StdRng::from_entropy(), now_ms)
    }

    pub fn seeded(
        config: PhaseConfig,
        quantum: QuantumConfig,
        seed: u64,
        now_ms: u64,
    ) -> Result<Self, ConfigError> {
        Self::with_rng(config, quantum, StdRng::seed_from_u64(seed), now_ms)
    }
}

impl<R: Rng> RoundEngine<R> {
    pub fn with_rng(
        config: PhaseConfig,
        quantum: QuantumConfig,
        rng: R,
        now_ms: u64,
    ) -> Result<Self, ConfigError> {
        let scheduler = RoundScheduler::new(config)?;
        let quantum = QuantumGenerator::new(&quantum)?;
        Ok(Self {
            time_left: config.betting_secs,
            scheduler,
            quantum,
            rng,
            phase: RoundPhase::Loading,
            round_id: RoundId::after(None, now_ms),
            winning_number: None,
            multipliers: Vec::new(),
            pending: None,
            listeners: BTreeMap::new(),
            next_subscription: 0,
        })
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn round_id(&self) -> RoundId {
        self.round_id
    }

    pub fn config(&self) -> &PhaseConfig {
        self.scheduler.config()
    }

    pub fn is_running(&self) -> bool {
        self.pending.is_some()
    }

    pub fn snapshot(&self) -> RoundSnapshot {
        RoundSnapshot {
            phase: self.phase,
            time_left: self.time_left,
            winning_number: self.winning_number,
            round_id: self.round_id,
            multipliers: self.multipliers.clone(),
        }
    }

    /// Start the clock. Returns the snapshot published on start, or `None` if the engine was
    /// already running.
    ///
    /// A stopped engine resumes its current phase with a full phase delay.
    pub fn start(&mut self, now_ms: u64) -> Option<RoundSnapshot> {
        if self.is_running() {
            return None;
        }
        if self.phase == RoundPhase::Loading {
            self.phase = RoundPhase::WaitingForBets;
            self.time_left = self.config().time_left_on_entry(RoundPhase::WaitingForBets);
        }
        self.schedule(now_ms);
        info!(round = %self.round_id, phase = %self.phase, "round engine started");
        Some(self.notify())
    }

    /// Stop the clock. The pending wake is dropped; state is kept for a later [`start`].
    ///
    /// [`start`]: RoundEngine::start
    pub fn stop(&mut self) {
        if self.pending.take().is_some() {
            info!(round = %self.round_id, phase = %self.phase, "round engine stopped");
        }
    }

    /// Register a listener. It is called right away with the current snapshot, then on every
    /// phase change and countdown tick until unsubscribed.
    pub fn subscribe_state<F>(&mut self, mut listener: F) -> SubscriptionId
    where
        F: FnMut(&RoundSnapshot) + Send + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        listener(&self.snapshot());
        self.listeners.insert(id, Box::new(listener));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    pub fn next_wake(&self) -> Option<Wake> {
        self.pending
    }

    /// Apply a wake. Stale wakes (not the one currently pending) and wakes fired early are
    /// ignored and yield no snapshots.
    pub fn fire(&mut self, wake: Wake, now_ms: u64) -> Vec<RoundSnapshot> {
        if self.pending != Some(wake) {
            debug!(
                round = %wake.round_id,
                phase = %wake.phase,
                at_ms = wake.at_ms,
                "ignoring stale wake"
            );
            return Vec::new();
        }
        if !wake.is_due(now_ms) {
            debug!(at_ms = wake.at_ms, now_ms, "wake fired early");
            return Vec::new();
        }

        // Subsequent wakes are counted from the scheduled instant so a late driver catches up
        // instead of stretching the round.
        match self.scheduler.step(self.phase, self.time_left) {
            Step::Tick { time_left } => {
                self.time_left = time_left;
                debug!(round = %self.round_id, time_left, "tick");
            }
            Step::Enter(RoundPhase::WaitingForBets) => self.reset(wake.at_ms.max(now_ms)),
            Step::Enter(RoundPhase::Spinning) => self.spin(),
            Step::Enter(phase) => {
                self.phase = phase;
                self.time_left = self.config().time_left_on_entry(phase);
                info!(round = %self.round_id, %phase, "phase changed");
            }
        }
        self.schedule(wake.at_ms);
        vec![self.notify()]
    }

    /// Fire every wake due at `now_ms`, in order.
    pub fn advance(&mut self, now_ms: u64) -> Vec<RoundSnapshot> {
        let mut snapshots = Vec::new();
        while let Some(wake) = self.pending {
            if !wake.is_due(now_ms) {
                break;
            }
            snapshots.extend(self.fire(wake, now_ms));
        }
        snapshots
    }

    /// Entering `Spinning` is the only place the outcome is drawn; it stays frozen until reset.
    fn spin(&mut self) {
        let index = self.rng.gen_range(0..POCKET_COUNT);
        let winning = Pocket::at_wheel_index(index);
        self.multipliers = self.quantum.generate(&mut self.rng);
        self.winning_number = Some(winning);
        self.phase = RoundPhase::Spinning;
        self.time_left = self.config().time_left_on_entry(RoundPhase::Spinning);
        info!(
            round = %self.round_id,
            winning = %winning,
            multipliers = self.multipliers.len(),
            "wheel spinning"
        );
    }

    fn reset(&mut self, now_ms: u64) {
        let previous = self.round_id;
        self.round_id = RoundId::after(Some(previous), now_ms);
        self.phase = RoundPhase::WaitingForBets;
        self.time_left = self.config().time_left_on_entry(RoundPhase::WaitingForBets);
        self.winning_number = None;
        self.multipliers.clear();
        info!(previous = %previous, round = %self.round_id, "new round");
    }

    fn schedule(&mut self, from_ms: u64) {
        self.pending = Some(self.scheduler.wake_after(self.round_id, self.phase, from_ms));
    }

    fn notify(&mut self) -> RoundSnapshot {
        let snapshot = self.snapshot();
        for listener in self.listeners.values_mut() {
            listener(&snapshot);
        }
        snapshot
    }
}

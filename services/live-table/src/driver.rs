//! Background tasks: the round clock and the bot leaderboard feed.
//!
//! The table never reads wall time. The driver owns a monotonic origin, sleeps until the
//! engine's next wake and hands it the elapsed milliseconds.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use roulette_neo_execution::{BotFeed, Table, TableEvent};
use tokio::sync::broadcast;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

pub type SharedTable = Arc<Mutex<Table>>;

/// Locks the table. A panic while settling must not wedge every other client, so a
/// poisoned lock is taken over as is.
pub fn lock(table: &SharedTable) -> MutexGuard<'_, Table> {
    table.lock().unwrap_or_else(PoisonError::into_inner)
}

pub fn publish(broadcaster: &broadcast::Sender<TableEvent>, events: Vec<TableEvent>) {
    for event in events {
        // No subscribers is fine.
        let _ = broadcaster.send(event);
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Clock {
    origin: Instant,
}

impl Clock {
    pub fn start() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    pub fn now_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    pub fn instant_at(&self, at_ms: u64) -> Instant {
        self.origin + Duration::from_millis(at_ms)
    }
}

/// Fire each scheduled wake when it falls due. Returns once the engine is stopped.
pub async fn run_rounds(
    table: SharedTable,
    broadcaster: broadcast::Sender<TableEvent>,
    clock: Clock,
) {
    loop {
        let next = lock(&table).next_wake();
        let Some(wake) = next else {
            info!("round clock stopped");
            return;
        };
        time::sleep_until(clock.instant_at(wake.at_ms)).await;
        let events = lock(&table).fire(wake, clock.now_ms());
        debug!(round = %wake.round_id, phase = ?wake.phase, events = events.len(), "wake fired");
        publish(&broadcaster, events);
    }
}

/// Poll the bot feed every `interval_ms` and post hits to the leaderboard.
pub async fn run_bots(
    table: SharedTable,
    broadcaster: broadcast::Sender<TableEvent>,
    mut feed: BotFeed,
    interval_ms: u64,
) {
    let mut interval = time::interval(Duration::from_millis(interval_ms));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    interval.tick().await;
    loop {
        interval.tick().await;
        let Some(entry) = feed.poll() else {
            continue;
        };
        let events = lock(&table).record_top_bet(entry);
        publish(&broadcaster, events);
    }
}

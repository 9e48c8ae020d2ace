//! Single-player table controller.
//!
//! [`Table`] wires the round engine to the player's ledger, settlement, autoplay, saved layouts
//! and the round leaderboard. Every operation returns the [`TableEvent`]s it produced, in
//! order, for the caller to fan out; nothing here performs I/O except through the injected
//! [`LayoutStore`].

use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::Rng;
use roulette_neo_types::roulette::{IncomingMessage, Leaderboard, LeaderboardEntry, OutgoingMessage};
use roulette_neo_types::{
    BetId, BetRejection, BetType, LayoutError, Notice, PlacedBet, Pocket, RoundId, RoundPhase,
    RoundSnapshot, UserStats, AVAILABLE_CHIPS, DEFAULT_CHIP, DEFAULT_CURRENCY, HISTORY_LIMIT,
    SAVED_LAYOUT_KEY, STARTING_BALANCE,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::autoplay::{AutoplayController, AutoplayOutcome};
use crate::engine::RoundEngine;
use crate::layout::LayoutStore;
use crate::ledger::BetLedger;
use crate::round_scheduler::{ConfigError, Wake};
use crate::settlement::{Settlement, SettlementEngine};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSettings {
    pub iframe_id: String,
    pub currency: String,
    pub start_balance: u64,
    pub default_chip: u64,
    pub history_limit: usize,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            iframe_id: "roulette_neo".to_string(),
            currency: DEFAULT_CURRENCY.to_string(),
            start_balance: STARTING_BALANCE,
            default_chip: DEFAULT_CHIP,
            history_limit: HISTORY_LIMIT,
        }
    }
}

impl TableSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !AVAILABLE_CHIPS.contains(&self.default_chip) {
            return Err(ConfigError::Table("default_chip is not an available chip"));
        }
        if self.history_limit == 0 {
            return Err(ConfigError::Table("history_limit must be greater than zero"));
        }
        if self.currency.is_empty() {
            return Err(ConfigError::Table("currency must not be empty"));
        }
        Ok(())
    }
}

/// Player-facing state of the table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableView {
    pub balance: u64,
    pub total_staked: u64,
    pub selected_chip: u64,
    pub currency: String,
    pub autoplay: bool,
    pub bets: Vec<PlacedBet>,
    pub history: Vec<Pocket>,
    pub stats: UserStats,
    pub last_win: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum TableEvent {
    Round(RoundSnapshot),
    Notice(Notice),
    Bridge(OutgoingMessage),
    Leaderboard(Vec<LeaderboardEntry>),
    Table(TableView),
}

/// Whole chips with thousands separators.
pub fn format_amount(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub struct Table<R = StdRng> {
    settings: TableSettings,
    engine: RoundEngine<R>,
    ledger: BetLedger,
    settlement: SettlementEngine,
    autoplay: AutoplayController,
    leaderboard: Leaderboard,
    layouts: Box<dyn LayoutStore>,
    current_round: Option<RoundId>,
    last_win: u64,
    session_token: Option<String>,
}

impl<R: Rng> Table<R> {
    pub fn new(
        settings: TableSettings,
        engine: RoundEngine<R>,
        layouts: Box<dyn LayoutStore>,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;
        let mut ledger = BetLedger::new(settings.start_balance);
        ledger
            .select_chip(settings.default_chip)
            .map_err(|_| ConfigError::Table("default_chip is not an available chip"))?;
        Ok(Self {
            settlement: SettlementEngine::new(settings.start_balance, settings.history_limit),
            settings,
            engine,
            ledger,
            autoplay: AutoplayController::default(),
            leaderboard: Leaderboard::default(),
            layouts,
            current_round: None,
            last_win: 0,
            session_token: None,
        })
    }

    pub fn settings(&self) -> &TableSettings {
        &self.settings
    }

    pub fn engine(&self) -> &RoundEngine<R> {
        &self.engine
    }

    /// For registering extra state listeners.
    pub fn engine_mut(&mut self) -> &mut RoundEngine<R> {
        &mut self.engine
    }

    pub fn ledger(&self) -> &BetLedger {
        &self.ledger
    }

    pub fn stats(&self) -> &UserStats {
        self.settlement.stats()
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    pub fn autoplay(&self) -> &AutoplayController {
        &self.autoplay
    }

    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }

    pub fn phase(&self) -> RoundPhase {
        self.engine.phase()
    }

    pub fn next_wake(&self) -> Option<Wake> {
        self.engine.next_wake()
    }

    pub fn view(&self) -> TableView {
        TableView {
            balance: self.ledger.balance(),
            total_staked: self.ledger.total_staked(),
            selected_chip: self.ledger.stake_unit(),
            currency: self.settings.currency.clone(),
            autoplay: self.autoplay.is_enabled(),
            bets: self.ledger.bets().to_vec(),
            history: self.settlement.history().iter().copied().collect(),
            stats: self.settlement.stats().clone(),
            last_win: self.last_win,
        }
    }

    /// Announce the table to the embedding frame and start the round clock.
    pub fn start(&mut self, now_ms: u64) -> Vec<TableEvent> {
        let Some(snapshot) = self.engine.start(now_ms) else {
            return Vec::new();
        };
        let mut events = vec![TableEvent::Bridge(OutgoingMessage::IframeReady {
            iframe_id: self.settings.iframe_id.clone(),
            dimensions: None,
        })];
        events.extend(self.handle_round(snapshot));
        events
    }

    pub fn stop(&mut self) {
        self.engine.stop();
    }

    pub fn fire(&mut self, wake: Wake, now_ms: u64) -> Vec<TableEvent> {
        let snapshots = self.engine.fire(wake, now_ms);
        self.handle_snapshots(snapshots)
    }

    pub fn advance(&mut self, now_ms: u64) -> Vec<TableEvent> {
        let snapshots = self.engine.advance(now_ms);
        self.handle_snapshots(snapshots)
    }

    fn handle_snapshots(&mut self, snapshots: Vec<RoundSnapshot>) -> Vec<TableEvent> {
        snapshots
            .into_iter()
            .flat_map(|snapshot| self.handle_round(snapshot))
            .collect()
    }

    /// React to a round notification: roll over on a new round id and settle once when the
    /// result is shown.
    pub fn handle_round(&mut self, snapshot: RoundSnapshot) -> Vec<TableEvent> {
        let rolled_over = self
            .current_round
            .is_some_and(|current| current != snapshot.round_id);
        self.current_round = Some(snapshot.round_id);
        self.ledger.on_phase(snapshot.phase);

        let mut events = vec![TableEvent::Round(snapshot.clone())];
        if rolled_over {
            events.extend(self.rollover(snapshot.round_id));
        }
        if snapshot.phase == RoundPhase::ResultDisplay
            && !self.settlement.is_settled(snapshot.round_id)
        {
            events.extend(self.settle(&snapshot));
        }
        events
    }

    fn rollover(&mut self, round_id: RoundId) -> Vec<TableEvent> {
        let mut events = Vec::new();
        self.last_win = 0;
        self.leaderboard.clear();
        events.push(TableEvent::Leaderboard(Vec::new()));

        if !self.ledger.is_empty() {
            let refund = self.ledger.clear_all();
            warn!(round = %round_id, refund, "unsettled bets refunded at rollover");
        }

        match self.autoplay.on_rollover(&mut self.ledger) {
            AutoplayOutcome::Idle => {}
            AutoplayOutcome::Rebet { bet_ids, cost } => {
                events.push(TableEvent::Notice(Notice::info("Autoplay: Bets Placed")));
                events.push(self.bet_placed(bet_ids, cost));
            }
            AutoplayOutcome::InsufficientFunds { .. } => {
                events.push(TableEvent::Notice(Notice::error("Insufficient Funds")));
            }
            AutoplayOutcome::Rejected(rejection) => {
                events.push(TableEvent::Notice(Notice::from(&rejection)));
            }
        }
        events.push(TableEvent::Table(self.view()));
        events
    }

    fn settle(&mut self, snapshot: &RoundSnapshot) -> Vec<TableEvent> {
        let Some(winning) = snapshot.winning_number else {
            error!(round = %snapshot.round_id, "result shown without a winning number");
            panic!("round {} reached result display without a winning number", snapshot.round_id);
        };
        let bets = self.ledger.take_for_settlement();
        let settlement = self.settlement.settle_round(
            snapshot.round_id,
            winning,
            &bets,
            &snapshot.multipliers,
            &mut self.ledger,
        );
        self.autoplay.remember(&bets);
        self.last_win = settlement.total_win;

        let mut events = Vec::new();
        if settlement.is_win() {
            events.push(TableEvent::Notice(Notice::success(format!(
                "WIN: ${}",
                format_amount(settlement.total_win)
            ))));
        } else {
            events.push(TableEvent::Notice(Notice::info(format!("No Win - {winning}"))));
        }
        if !bets.is_empty() {
            events.push(TableEvent::Bridge(self.outcome_message(snapshot.round_id, &settlement)));
        }
        events.push(TableEvent::Table(self.view()));
        events
    }

    fn outcome_message(&self, round_id: RoundId, settlement: &Settlement) -> OutgoingMessage {
        if settlement.is_win() {
            OutgoingMessage::BetWon {
                bet_ids: settlement.bet_ids(),
                round_id,
                winning_number: settlement.winning_number,
                total_win_amount: settlement.total_win,
                currency: self.settings.currency.clone(),
                profit: settlement.profit(),
            }
        } else {
            OutgoingMessage::BetLost {
                bet_ids: settlement.bet_ids(),
                round_id,
                winning_number: settlement.winning_number,
                total_loss_amount: settlement.total_wagered,
                currency: self.settings.currency.clone(),
            }
        }
    }

    fn bet_placed(&self, bet_ids: Vec<BetId>, total_amount: u64) -> TableEvent {
        TableEvent::Bridge(OutgoingMessage::BetPlaced {
            bet_count: bet_ids.len(),
            bet_ids,
            round_id: self.engine.round_id(),
            total_amount,
            currency: self.settings.currency.clone(),
        })
    }

    fn rejected(&self, rejection: &BetRejection) -> Vec<TableEvent> {
        warn!(%rejection, phase = %self.ledger.phase(), "bet rejected");
        vec![TableEvent::Notice(Notice::from(rejection))]
    }

    /// Place one chip of the selected denomination. A supplied `payout_ratio` must equal the bet
    /// type's standard payout; the client can echo the odds but never set them.
    pub fn place_bet(
        &mut self,
        bet_type: BetType,
        numbers: BTreeSet<Pocket>,
        payout_ratio: Option<u64>,
    ) -> Vec<TableEvent> {
        let ratio = payout_ratio.unwrap_or_else(|| bet_type.standard_payout());
        let (id, amount) = match self.ledger.place_bet(bet_type, numbers, ratio) {
            Ok(bet) => (bet.id, bet.amount),
            Err(rejection) => return self.rejected(&rejection),
        };
        vec![
            self.bet_placed(vec![id], amount),
            TableEvent::Table(self.view()),
        ]
    }

    pub fn undo(&mut self) -> Vec<TableEvent> {
        match self.ledger.undo_last() {
            Some(bet) => {
                debug!(bet = %bet.id, "undo");
                vec![TableEvent::Table(self.view())]
            }
            None => Vec::new(),
        }
    }

    pub fn clear(&mut self) -> Vec<TableEvent> {
        if self.ledger.clear_all() == 0 {
            return Vec::new();
        }
        vec![TableEvent::Table(self.view())]
    }

    pub fn select_chip(&mut self, value: u64) -> Vec<TableEvent> {
        match self.ledger.select_chip(value) {
            Ok(()) => vec![TableEvent::Table(self.view())],
            Err(rejection) => self.rejected(&rejection),
        }
    }

    /// Takes effect at the next round.
    pub fn set_autoplay(&mut self, enabled: bool) -> Vec<TableEvent> {
        self.autoplay.set_enabled(enabled);
        info!(enabled, "autoplay toggled");
        vec![TableEvent::Table(self.view())]
    }

    pub fn save_layout(&mut self) -> Vec<TableEvent> {
        let result = if self.ledger.is_empty() {
            Err(LayoutError::Empty)
        } else {
            self.layouts.save(SAVED_LAYOUT_KEY, self.ledger.bets())
        };
        match result {
            Ok(()) => {
                info!(count = self.ledger.bets().len(), "layout saved");
                vec![TableEvent::Notice(Notice::success("Configuration Saved"))]
            }
            Err(err) => self.layout_failed(err),
        }
    }

    /// Replace the current bets with the saved layout. Current bets are refunded first; the
    /// layout is placed only if the whole of it can be afforded.
    pub fn load_layout(&mut self) -> Vec<TableEvent> {
        match self.try_load_layout() {
            Ok((bet_ids, cost)) => {
                info!(count = bet_ids.len(), cost, "layout loaded");
                vec![
                    TableEvent::Notice(Notice::success("Bets Loaded")),
                    self.bet_placed(bet_ids, cost),
                    TableEvent::Table(self.view()),
                ]
            }
            Err(err) => self.layout_failed(err),
        }
    }

    fn try_load_layout(&mut self) -> Result<(Vec<BetId>, u64), LayoutError> {
        if !self.ledger.phase().is_betting_open() {
            return Err(LayoutError::BettingClosed);
        }
        let bets = self
            .layouts
            .load(SAVED_LAYOUT_KEY)?
            .filter(|bets| !bets.is_empty())
            .ok_or(LayoutError::NotFound)?;
        let cost: u64 = bets.iter().map(|bet| bet.amount).sum();
        let available = self.ledger.balance().saturating_add(self.ledger.total_staked());
        if available < cost {
            return Err(LayoutError::InsufficientFunds {
                balance: available,
                required: cost,
            });
        }

        // Checked above, so the only way restore fails now is a malformed layout. Put the
        // refunded bets back in that case.
        let previous = self.ledger.bets().to_vec();
        self.ledger.clear_all();
        match self.ledger.restore(&bets) {
            Ok(placed) => Ok((placed.iter().map(|bet| bet.id).collect(), cost)),
            Err(rejection) => {
                if self.ledger.restore(&previous).is_err() {
                    error!("failed to put back bets after a rejected layout");
                }
                Err(LayoutError::Storage(rejection.to_string()))
            }
        }
    }

    fn layout_failed(&self, err: LayoutError) -> Vec<TableEvent> {
        match err {
            LayoutError::Empty | LayoutError::NotFound => debug!(%err, "layout skipped"),
            _ => warn!(%err, "layout operation failed"),
        }
        vec![TableEvent::Notice(Notice::from(&err))]
    }

    /// Apply a message from the embedding frame. The local engine stays authoritative for
    /// round state and settlement.
    pub fn handle_bridge(&mut self, message: IncomingMessage) -> Vec<TableEvent> {
        match message {
            IncomingMessage::AuthToken { session_token, .. } => {
                info!("session token received");
                self.session_token = Some(session_token);
                Vec::new()
            }
            ref update @ IncomingMessage::BalanceUpdate { .. } => {
                match update.balance_for(&self.settings.currency) {
                    Some(balance) => {
                        self.ledger.set_balance(balance);
                        vec![TableEvent::Table(self.view())]
                    }
                    None => {
                        warn!(
                            currency = %self.settings.currency,
                            "balance update without a usable amount"
                        );
                        Vec::new()
                    }
                }
            }
            other => {
                debug!(kind = other.kind(), "ignoring bridge message");
                Vec::new()
            }
        }
    }

    /// Add a top bet to the round leaderboard. Only accepted while bets are open.
    pub fn record_top_bet(&mut self, entry: LeaderboardEntry) -> Vec<TableEvent> {
        if !self.ledger.phase().is_betting_open() {
            return Vec::new();
        }
        self.leaderboard.update(entry);
        vec![TableEvent::Leaderboard(self.leaderboard.entries.clone())]
    }
}

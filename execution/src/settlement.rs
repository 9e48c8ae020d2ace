//! Round settlement.
//!
//! [`settle`] is a pure function of the winning pocket, the bets and the round's multipliers.
//! [`SettlementEngine`] applies its result: it credits the ledger, folds the round into the
//! player's stats and records the spin in history. A round can be settled only once.

use std::collections::VecDeque;

use roulette_neo_types::{
    BetId, BetType, PlacedBet, Pocket, QuantumMultiplier, RoundId, UserStats, HISTORY_LIMIT,
    STARTING_BALANCE,
};
use tracing::{error, info};

use crate::ledger::BetLedger;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BetOutcome {
    pub bet_id: BetId,
    pub hit: bool,
    /// Ratio the bet was paid at; zero on a miss.
    pub effective_ratio: u64,
    /// Stake plus profit returned to the balance; zero on a miss.
    pub win: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settlement {
    pub winning_number: Pocket,
    pub total_wagered: u64,
    pub total_win: u64,
    pub outcomes: Vec<BetOutcome>,
}

impl Settlement {
    pub fn profit(&self) -> i64 {
        let profit = self.total_win as i128 - self.total_wagered as i128;
        profit.clamp(i64::MIN as i128, i64::MAX as i128) as i64
    }

    pub fn bet_ids(&self) -> Vec<BetId> {
        self.outcomes.iter().map(|o| o.bet_id).collect()
    }

    pub fn is_win(&self) -> bool {
        self.total_win > 0
    }
}

/// Ratio paid on a winning bet. A straight bet on a multiplied pocket is paid at the
/// multiplier, which replaces 35:1 rather than adding to it.
pub fn effective_ratio(bet: &PlacedBet, winning: Pocket, multipliers: &[QuantumMultiplier]) -> u64 {
    if bet.bet_type == BetType::Straight {
        if let Some(bonus) = multipliers.iter().find(|m| m.number == winning) {
            return bonus.multiplier;
        }
    }
    bet.payout_ratio
}

pub fn settle(
    winning: Pocket,
    bets: &[PlacedBet],
    multipliers: &[QuantumMultiplier],
) -> Settlement {
    let mut total_wagered = 0u64;
    let mut total_win = 0u64;
    let outcomes = bets
        .iter()
        .map(|bet| {
            total_wagered = total_wagered.saturating_add(bet.amount);
            if !bet.covers(winning) {
                return BetOutcome {
                    bet_id: bet.id,
                    hit: false,
                    effective_ratio: 0,
                    win: 0,
                };
            }
            let ratio = effective_ratio(bet, winning, multipliers);
            let win = bet.amount.saturating_mul(ratio).saturating_add(bet.amount);
            total_win = total_win.saturating_add(win);
            BetOutcome {
                bet_id: bet.id,
                hit: true,
                effective_ratio: ratio,
                win,
            }
        })
        .collect();

    Settlement {
        winning_number: winning,
        total_wagered,
        total_win,
        outcomes,
    }
}

/// Applies settlements to the player's session state.
#[derive(Clone, Debug)]
pub struct SettlementEngine {
    stats: UserStats,
    history: VecDeque<Pocket>,
    history_limit: usize,
    last_settled: Option<RoundId>,
}

impl SettlementEngine {
    pub fn new(start_balance: u64, history_limit: usize) -> Self {
        Self {
            stats: UserStats::new(start_balance),
            history: VecDeque::with_capacity(history_limit),
            history_limit,
            last_settled: None,
        }
    }

    pub fn stats(&self) -> &UserStats {
        &self.stats
    }

    /// Winning pockets, newest first.
    pub fn history(&self) -> &VecDeque<Pocket> {
        &self.history
    }

    pub fn last_settled(&self) -> Option<RoundId> {
        self.last_settled
    }

    pub fn is_settled(&self, round_id: RoundId) -> bool {
        self.last_settled.is_some_and(|last| last >= round_id)
    }

    /// Settle `bets` (already taken off the ledger) for `round_id` and credit the winnings.
    ///
    /// # Panics
    ///
    /// Settling a round at or before the last settled one is a logic error and panics.
    pub fn settle_round(
        &mut self,
        round_id: RoundId,
        winning: Pocket,
        bets: &[PlacedBet],
        multipliers: &[QuantumMultiplier],
        ledger: &mut BetLedger,
    ) -> Settlement {
        if self.is_settled(round_id) {
            error!(round = %round_id, last = ?self.last_settled, "round settled twice");
            panic!("round {round_id} settled twice");
        }
        self.last_settled = Some(round_id);

        let settlement = settle(winning, bets, multipliers);
        ledger.credit(settlement.total_win);
        self.stats
            .record_round(settlement.total_wagered, settlement.total_win);

        self.history.push_front(winning);
        self.history.truncate(self.history_limit);

        info!(
            round = %round_id,
            winning = %winning,
            bets = bets.len(),
            wagered = settlement.total_wagered,
            won = settlement.total_win,
            balance = ledger.balance(),
            "round settled"
        );
        settlement
    }
}

impl Default for SettlementEngine {
    fn default() -> Self {
        Self::new(STARTING_BALANCE, HISTORY_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use roulette_neo_types::roulette::coverage;
    use roulette_neo_types::{PocketColor, RoundPhase};

    fn pocket(n: u8) -> Pocket {
        Pocket::new(n).unwrap()
    }

    fn bet(
        bet_type: BetType,
        numbers: std::collections::BTreeSet<Pocket>,
        amount: u64,
    ) -> PlacedBet {
        PlacedBet {
            id: BetId::fresh(),
            bet_type,
            numbers,
            amount,
            payout_ratio: bet_type.standard_payout(),
        }
    }

    #[test]
    fn test_straight_with_multiplier_replaces_payout() {
        let bets = vec![bet(BetType::Straight, coverage::straight(pocket(17)), 10)];
        let multipliers = vec![QuantumMultiplier {
            number: pocket(17),
            multiplier: 100,
        }];
        let settlement = settle(pocket(17), &bets, &multipliers);
        assert_eq!(settlement.total_win, 1_010);
        assert_eq!(settlement.outcomes[0].effective_ratio, 100);
        assert_eq!(settlement.profit(), 1_000);
    }

    #[test]
    fn test_straight_without_multiplier() {
        let bets = vec![bet(BetType::Straight, coverage::straight(pocket(17)), 10)];
        let multipliers = vec![QuantumMultiplier {
            number: pocket(4),
            multiplier: 500,
        }];
        assert_eq!(settle(pocket(17), &bets, &multipliers).total_win, 360);
    }

    #[test]
    fn test_multiplier_ignored_for_other_bet_types() {
        let split = coverage::split(pocket(17), pocket(18)).unwrap();
        let bets = vec![bet(BetType::Split, split, 10)];
        let multipliers = vec![QuantumMultiplier {
            number: pocket(17),
            multiplier: 500,
        }];
        assert_eq!(settle(pocket(17), &bets, &multipliers).total_win, 180);
    }

    #[test]
    fn test_column_miss() {
        let bets = vec![bet(BetType::Column, coverage::column(0).unwrap(), 50)];
        let settlement = settle(pocket(2), &bets, &[]);
        assert_eq!(settlement.total_win, 0);
        assert!(!settlement.outcomes[0].hit);
        assert_eq!(settlement.profit(), -50);
    }

    #[test]
    fn test_zero_loses_outside_bets() {
        let bets = vec![
            bet(BetType::RedBlack, coverage::color(PocketColor::Red), 10),
            bet(BetType::EvenOdd, coverage::even(), 10),
            bet(BetType::HighLow, coverage::low(), 10),
        ];
        assert_eq!(settle(Pocket::ZERO, &bets, &[]).total_win, 0);
        assert_eq!(settle(Pocket::DOUBLE_ZERO, &bets, &[]).total_win, 0);
    }

    #[test]
    fn test_mixed_bets() {
        let bets = vec![
            bet(BetType::Straight, coverage::straight(pocket(32)), 5),
            bet(BetType::Voisins, coverage::voisins(), 10),
            bet(BetType::Dozen, coverage::dozen(2).unwrap(), 20),
        ];
        let settlement = settle(pocket(32), &bets, &[]);
        // 5*35+5 + 10*35+10 + 20*2+20
        assert_eq!(settlement.total_win, 180 + 360 + 60);
        assert_eq!(settlement.total_wagered, 35);
        assert!(settlement.outcomes.iter().all(|o| o.hit));
    }

    #[test]
    fn test_empty_settlement() {
        let settlement = settle(pocket(5), &[], &[]);
        assert_eq!(settlement.total_win, 0);
        assert_eq!(settlement.total_wagered, 0);
        assert!(settlement.outcomes.is_empty());
    }

    #[test]
    fn test_settle_round_credits_and_records() {
        let mut ledger = BetLedger::new(100);
        ledger.on_phase(RoundPhase::WaitingForBets);
        ledger.select_chip(10).unwrap();
        ledger
            .place_bet(BetType::Straight, coverage::straight(pocket(17)), 35)
            .unwrap();
        ledger.on_phase(RoundPhase::ResultDisplay);
        let bets = ledger.take_for_settlement();

        let mut engine = SettlementEngine::new(100, 3);
        let multipliers = [QuantumMultiplier {
            number: pocket(17),
            multiplier: 100,
        }];
        let settlement =
            engine.settle_round(RoundId::new(1), pocket(17), &bets, &multipliers, &mut ledger);
        assert_eq!(settlement.total_win, 1_010);
        assert_eq!(ledger.balance(), 1_100);
        assert_eq!(engine.stats().total_wagered, 10);
        assert_eq!(engine.stats().total_won, 1_010);
        assert_eq!(engine.stats().net_profit, 1_000);
        assert_eq!(engine.history().front(), Some(&pocket(17)));
    }

    #[test]
    fn test_history_capped_newest_first() {
        let mut ledger = BetLedger::new(0);
        let mut engine = SettlementEngine::new(0, 3);
        for (round, n) in [1u8, 2, 3, 4, 5].into_iter().enumerate() {
            engine.settle_round(RoundId::new(round as u64 + 1), pocket(n), &[], &[], &mut ledger);
        }
        let history: Vec<u8> = engine.history().iter().map(|p| p.value()).collect();
        assert_eq!(history, vec![5, 4, 3]);
        // Zero-bet rounds add nothing to the totals.
        assert_eq!(engine.stats().total_wagered, 0);
        assert_eq!(engine.stats().net_profit, 0);
    }

    #[test]
    #[should_panic(expected = "settled twice")]
    fn test_double_settlement_panics() {
        let mut ledger = BetLedger::new(0);
        let mut engine = SettlementEngine::new(0, 3);
        engine.settle_round(RoundId::new(9), pocket(1), &[], &[], &mut ledger);
        engine.settle_round(RoundId::new(9), pocket(1), &[], &[], &mut ledger);
    }

    proptest! {
        #[test]
        fn prop_stats_identity(rounds in prop::collection::vec((0u8..38, 1u64..100, 0u8..38), 1..40)) {
            let mut ledger = BetLedger::new(0);
            let mut engine = SettlementEngine::new(0, HISTORY_LIMIT);
            for (i, (winning, amount, picked)) in rounds.into_iter().enumerate() {
                let bets = vec![bet(BetType::Straight, coverage::straight(pocket(picked)), amount)];
                let settlement = engine.settle_round(
                    RoundId::new(i as u64 + 1),
                    pocket(winning),
                    &bets,
                    &[],
                    &mut ledger,
                );
                prop_assert_eq!(settlement.total_win > 0, winning == picked);
                let stats = engine.stats();
                prop_assert_eq!(
                    stats.net_profit as i128,
                    stats.total_won as i128 - stats.total_wagered as i128
                );
            }
            prop_assert_eq!(ledger.balance(), engine.stats().total_won);
        }
    }
}

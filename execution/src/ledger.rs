//! Per-player bet ledger.
//!
//! The ledger owns the free balance and the current round's bets. A stake moves from the
//! balance onto the table when placed; it only moves back through undo/clear. Settlement takes
//! the bets off the table and credits winnings separately, so at any instant
//! `balance + total_staked()` equals what the player started the round with plus credits.

use std::collections::BTreeSet;

use roulette_neo_types::{
    BetId, BetRejection, BetType, PlacedBet, Pocket, RoundPhase, AVAILABLE_CHIPS, DEFAULT_CHIP,
};
use tracing::debug;

#[derive(Clone, Debug)]
pub struct BetLedger {
    balance: u64,
    stake_unit: u64,
    phase: RoundPhase,
    bets: Vec<PlacedBet>,
}

impl BetLedger {
    pub fn new(balance: u64) -> Self {
        Self {
            balance,
            stake_unit: DEFAULT_CHIP,
            phase: RoundPhase::Loading,
            bets: Vec::new(),
        }
    }

    /// Free balance, not counting stakes already on the table.
    pub fn balance(&self) -> u64 {
        self.balance
    }

    pub fn stake_unit(&self) -> u64 {
        self.stake_unit
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn bets(&self) -> &[PlacedBet] {
        &self.bets
    }

    pub fn is_empty(&self) -> bool {
        self.bets.is_empty()
    }

    pub fn bet_ids(&self) -> Vec<BetId> {
        self.bets.iter().map(|bet| bet.id).collect()
    }

    pub fn on_phase(&mut self, phase: RoundPhase) {
        self.phase = phase;
    }

    pub fn select_chip(&mut self, value: u64) -> Result<(), BetRejection> {
        if !AVAILABLE_CHIPS.contains(&value) {
            return Err(BetRejection::UnknownChip(value));
        }
        self.stake_unit = value;
        Ok(())
    }

    /// Place one chip of the selected denomination.
    pub fn place_bet(
        &mut self,
        bet_type: BetType,
        numbers: BTreeSet<Pocket>,
        payout_ratio: u64,
    ) -> Result<&PlacedBet, BetRejection> {
        if !self.phase.is_betting_open() {
            return Err(BetRejection::BettingClosed);
        }
        check_payout(bet_type, payout_ratio)?;
        bet_type.validate_coverage(&numbers)?;

        // Stakes already on the table have left the balance, so the free balance is what's
        // left to commit.
        let stake = self.stake_unit;
        if self.balance < stake {
            return Err(BetRejection::InsufficientBalance {
                balance: self.balance,
                required: stake,
            });
        }

        self.balance -= stake;
        let bet = PlacedBet {
            id: BetId::fresh(),
            bet_type,
            numbers,
            amount: stake,
            payout_ratio,
        };
        debug!(bet = %bet.id, %bet_type, amount = stake, balance = self.balance, "bet placed");
        self.bets.push(bet);
        Ok(&self.bets[self.bets.len() - 1])
    }

    /// Remove the most recent bet and refund it. No-op outside the betting window.
    pub fn undo_last(&mut self) -> Option<PlacedBet> {
        if !self.phase.is_betting_open() {
            return None;
        }
        let bet = self.bets.pop()?;
        self.balance = self.balance.saturating_add(bet.amount);
        debug!(bet = %bet.id, refund = bet.amount, "bet undone");
        Some(bet)
    }

    /// Remove every bet and refund the total. Returns the refunded amount.
    pub fn clear_all(&mut self) -> u64 {
        if !self.phase.is_betting_open() || self.bets.is_empty() {
            return 0;
        }
        let refund = self.total_staked();
        self.bets.clear();
        self.balance = self.balance.saturating_add(refund);
        debug!(refund, "bets cleared");
        refund
    }

    pub fn total_staked(&self) -> u64 {
        self.bets.iter().map(|bet| bet.amount).sum()
    }

    /// Total stacked on exactly this selection, ignoring number order.
    pub fn stake_on(&self, bet_type: BetType, numbers: &BTreeSet<Pocket>) -> u64 {
        self.bets
            .iter()
            .filter(|bet| bet.matches(bet_type, numbers))
            .map(|bet| bet.amount)
            .sum()
    }

    /// Profit if this selection hits, before any multiplier.
    pub fn potential_win(&self, bet_type: BetType, numbers: &BTreeSet<Pocket>) -> u64 {
        self.bets
            .iter()
            .filter(|bet| bet.matches(bet_type, numbers))
            .map(|bet| bet.amount.saturating_mul(bet.payout_ratio))
            .sum()
    }

    /// Re-place a saved set of bets under fresh ids, all or nothing.
    pub fn restore(&mut self, template: &[PlacedBet]) -> Result<&[PlacedBet], BetRejection> {
        if !self.phase.is_betting_open() {
            return Err(BetRejection::BettingClosed);
        }
        let mut cost = 0u64;
        for bet in template {
            if bet.amount == 0 {
                return Err(BetRejection::InvalidAmount);
            }
            check_payout(bet.bet_type, bet.payout_ratio)?;
            bet.bet_type.validate_coverage(&bet.numbers)?;
            cost = cost.saturating_add(bet.amount);
        }
        if self.balance < cost {
            return Err(BetRejection::InsufficientBalance {
                balance: self.balance,
                required: cost,
            });
        }

        self.balance -= cost;
        let start = self.bets.len();
        self.bets.extend(template.iter().map(PlacedBet::replay));
        debug!(count = template.len(), cost, balance = self.balance, "bets restored");
        Ok(&self.bets[start..])
    }

    /// Hand the round's bets to settlement. The table is empty afterwards.
    pub fn take_for_settlement(&mut self) -> Vec<PlacedBet> {
        std::mem::take(&mut self.bets)
    }

    pub fn credit(&mut self, amount: u64) {
        self.balance = self.balance.saturating_add(amount);
    }

    /// Replace the free balance with an externally reported one. Stakes on the table are kept.
    pub fn set_balance(&mut self, amount: u64) {
        debug!(previous = self.balance, balance = amount, "balance replaced");
        self.balance = amount;
    }
}

/// Odds are fixed per bet type. Anything else came from a client or a tampered layout.
fn check_payout(bet_type: BetType, ratio: u64) -> Result<(), BetRejection> {
    if ratio != bet_type.standard_payout() {
        return Err(BetRejection::InvalidPayout { bet_type, ratio });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use roulette_neo_types::roulette::coverage;
    use roulette_neo_types::PocketColor;

    fn open_ledger(balance: u64) -> BetLedger {
        let mut ledger = BetLedger::new(balance);
        ledger.on_phase(RoundPhase::WaitingForBets);
        ledger
    }

    fn straight(n: u8) -> BTreeSet<Pocket> {
        coverage::straight(Pocket::new(n).unwrap())
    }

    #[test]
    fn test_place_debits_immediately() {
        let mut ledger = open_ledger(100);
        ledger.select_chip(25).unwrap();
        let bet = ledger.place_bet(BetType::Straight, straight(17), 35).unwrap();
        assert_eq!(bet.amount, 25);
        assert_eq!(bet.payout_ratio, 35);
        assert_eq!(ledger.balance(), 75);
        assert_eq!(ledger.total_staked(), 25);
    }

    #[test]
    fn test_place_rejected_when_closed() {
        let mut ledger = BetLedger::new(100);
        assert_eq!(
            ledger.place_bet(BetType::Straight, straight(1), 35),
            Err(BetRejection::BettingClosed)
        );
        ledger.on_phase(RoundPhase::BetsClosed);
        assert!(ledger
            .place_bet(BetType::RedBlack, coverage::color(PocketColor::Red), 1)
            .is_err());
        assert_eq!(ledger.balance(), 100);
    }

    #[test]
    fn test_insufficient_balance() {
        let mut ledger = open_ledger(7);
        ledger.place_bet(BetType::Straight, straight(1), 35).unwrap();
        assert_eq!(ledger.balance(), 2);
        assert_eq!(
            ledger.place_bet(BetType::Straight, straight(2), 35),
            Err(BetRejection::InsufficientBalance {
                balance: 2,
                required: 5
            })
        );
        assert_eq!(ledger.bets().len(), 1);
        assert_eq!(ledger.balance(), 2);
    }

    #[test]
    fn test_exact_balance_accepted() {
        let mut ledger = open_ledger(5);
        ledger.place_bet(BetType::EvenOdd, coverage::even(), 1).unwrap();
        assert_eq!(ledger.balance(), 0);
    }

    #[test]
    fn test_invalid_bets_rejected() {
        let mut ledger = open_ledger(100);
        assert!(matches!(
            ledger.place_bet(BetType::Straight, straight(1), 0),
            Err(BetRejection::InvalidPayout { ratio: 0, .. })
        ));
        let wrong: BTreeSet<Pocket> = [1u8, 2, 3]
            .into_iter()
            .map(|n| Pocket::new(n).unwrap())
            .collect();
        assert!(matches!(
            ledger.place_bet(BetType::Split, wrong, 17),
            Err(BetRejection::InvalidCoverage { .. })
        ));
        assert_eq!(ledger.balance(), 100);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_wide_neighbors_rejected() {
        let mut ledger = open_ledger(100);
        let arc = coverage::neighbors(Pocket::ZERO, 18);
        assert!(matches!(
            ledger.place_bet(BetType::Neighbors, arc, 35),
            Err(BetRejection::InvalidCoverage { .. })
        ));
        ledger
            .place_bet(BetType::Neighbors, coverage::default_neighbors(Pocket::ZERO), 35)
            .unwrap();
        assert_eq!(ledger.balance(), 95);
    }

    #[test]
    fn test_nonstandard_payout_rejected() {
        let mut ledger = open_ledger(100);
        assert_eq!(
            ledger.place_bet(BetType::Straight, straight(17), 1_000_000),
            Err(BetRejection::InvalidPayout {
                bet_type: BetType::Straight,
                ratio: 1_000_000
            })
        );
        assert!(matches!(
            ledger.place_bet(BetType::RedBlack, coverage::color(PocketColor::Red), 35),
            Err(BetRejection::InvalidPayout { ratio: 35, .. })
        ));
        assert_eq!(ledger.balance(), 100);
        assert!(ledger.is_empty());

        let inflated = PlacedBet {
            id: BetId::fresh(),
            bet_type: BetType::Straight,
            numbers: straight(17),
            amount: 5,
            payout_ratio: 1_000_000,
        };
        assert!(matches!(
            ledger.restore(&[inflated]),
            Err(BetRejection::InvalidPayout { ratio: 1_000_000, .. })
        ));
        assert_eq!(ledger.balance(), 100);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_select_chip() {
        let mut ledger = open_ledger(100);
        assert_eq!(ledger.stake_unit(), DEFAULT_CHIP);
        assert_eq!(ledger.select_chip(7), Err(BetRejection::UnknownChip(7)));
        assert_eq!(ledger.stake_unit(), DEFAULT_CHIP);
        for chip in AVAILABLE_CHIPS {
            ledger.select_chip(chip).unwrap();
            assert_eq!(ledger.stake_unit(), chip);
        }
    }

    #[test]
    fn test_undo_is_lifo() {
        let mut ledger = open_ledger(100);
        let first = ledger.place_bet(BetType::Straight, straight(1), 35).unwrap().id;
        ledger.select_chip(10).unwrap();
        let second = ledger.place_bet(BetType::Straight, straight(2), 35).unwrap().id;
        assert_eq!(ledger.balance(), 85);

        assert_eq!(ledger.undo_last().map(|b| b.id), Some(second));
        assert_eq!(ledger.balance(), 95);
        assert_eq!(ledger.undo_last().map(|b| b.id), Some(first));
        assert_eq!(ledger.balance(), 100);
        assert!(ledger.undo_last().is_none());
    }

    #[test]
    fn test_undo_and_clear_noop_when_closed() {
        let mut ledger = open_ledger(100);
        ledger.place_bet(BetType::Straight, straight(1), 35).unwrap();
        ledger.on_phase(RoundPhase::BetsClosed);
        assert!(ledger.undo_last().is_none());
        assert_eq!(ledger.clear_all(), 0);
        assert_eq!(ledger.total_staked(), 5);
        assert_eq!(ledger.balance(), 95);
    }

    #[test]
    fn test_clear_refunds_everything() {
        let mut ledger = open_ledger(100);
        ledger.place_bet(BetType::Straight, straight(1), 35).unwrap();
        ledger.place_bet(BetType::HighLow, coverage::low(), 1).unwrap();
        assert_eq!(ledger.clear_all(), 10);
        assert_eq!(ledger.balance(), 100);
        assert!(ledger.is_empty());
        assert_eq!(ledger.clear_all(), 0);
    }

    #[test]
    fn test_stake_on_and_potential_win() {
        let mut ledger = open_ledger(1_000);
        let split = coverage::split(Pocket::new(1).unwrap(), Pocket::new(2).unwrap()).unwrap();
        ledger.place_bet(BetType::Split, split.clone(), 17).unwrap();
        ledger.select_chip(10).unwrap();
        ledger.place_bet(BetType::Split, split.clone(), 17).unwrap();
        ledger.place_bet(BetType::Straight, straight(1), 35).unwrap();

        // Order of numbers does not matter.
        let reversed: BTreeSet<Pocket> = split.iter().rev().copied().collect();
        assert_eq!(ledger.stake_on(BetType::Split, &reversed), 15);
        assert_eq!(ledger.potential_win(BetType::Split, &split), 15 * 17);
        assert_eq!(ledger.stake_on(BetType::Straight, &straight(2)), 0);
        assert_eq!(ledger.stake_on(BetType::Straight, &straight(1)), 10);
    }

    #[test]
    fn test_restore_all_or_nothing() {
        let mut ledger = open_ledger(100);
        ledger.select_chip(50).unwrap();
        ledger.place_bet(BetType::Straight, straight(3), 35).unwrap();
        ledger.place_bet(BetType::RedBlack, coverage::color(PocketColor::Red), 1).unwrap();
        let template = ledger.take_for_settlement();
        assert_eq!(ledger.balance(), 0);

        ledger.credit(60);
        assert_eq!(
            ledger.restore(&template),
            Err(BetRejection::InsufficientBalance {
                balance: 60,
                required: 100
            })
        );
        assert!(ledger.is_empty());

        ledger.credit(40);
        let restored = ledger.restore(&template).unwrap().to_vec();
        assert_eq!(restored.len(), 2);
        for (old, new) in template.iter().zip(&restored) {
            assert_ne!(old.id, new.id);
            assert!(new.matches(old.bet_type, &old.numbers));
            assert_eq!(new.amount, old.amount);
        }
        assert_eq!(ledger.balance(), 0);
        assert_eq!(ledger.total_staked(), 100);
    }

    #[test]
    fn test_restore_rejects_tampered_bets() {
        let mut ledger = open_ledger(100);
        let bad = PlacedBet {
            id: BetId::fresh(),
            bet_type: BetType::Corner,
            numbers: straight(4),
            amount: 5,
            payout_ratio: 8,
        };
        assert!(ledger.restore(&[bad.clone()]).is_err());
        let free = PlacedBet {
            bet_type: BetType::Straight,
            amount: 0,
            ..bad
        };
        assert_eq!(ledger.restore(&[free]), Err(BetRejection::InvalidAmount));
        assert_eq!(ledger.balance(), 100);
    }

    #[test]
    fn test_set_balance_keeps_stakes() {
        let mut ledger = open_ledger(100);
        ledger.place_bet(BetType::Straight, straight(1), 35).unwrap();
        ledger.set_balance(500);
        assert_eq!(ledger.balance(), 500);
        assert_eq!(ledger.total_staked(), 5);
    }

    #[derive(Clone, Debug)]
    enum Op {
        Place(u8, usize),
        Undo,
        Clear,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..37, 0usize..AVAILABLE_CHIPS.len()).prop_map(|(n, chip)| Op::Place(n, chip)),
            Just(Op::Undo),
            Just(Op::Clear),
        ]
    }

    proptest! {
        #[test]
        fn prop_balance_conserved(start in 0u64..500, ops in prop::collection::vec(op(), 0..64)) {
            let mut ledger = open_ledger(start);
            for op in ops {
                match op {
                    Op::Place(n, chip) => {
                        ledger.select_chip(AVAILABLE_CHIPS[chip]).unwrap();
                        let _ = ledger.place_bet(BetType::Straight, straight(n), 35);
                    }
                    Op::Undo => {
                        ledger.undo_last();
                    }
                    Op::Clear => {
                        ledger.clear_all();
                    }
                }
                prop_assert_eq!(ledger.balance() + ledger.total_staked(), start);
            }
        }
    }
}

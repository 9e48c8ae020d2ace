//! Autoplay: repeat the previous round's bets when a new round opens.

use roulette_neo_types::{BetId, BetRejection, PlacedBet};
use tracing::{info, warn};

use crate::ledger::BetLedger;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AutoplayOutcome {
    /// Autoplay is off or there was nothing to repeat.
    Idle,
    /// The previous bets were placed again under fresh ids.
    Rebet { bet_ids: Vec<BetId>, cost: u64 },
    /// The balance could not cover the rebet. Autoplay has been switched off.
    InsufficientFunds { balance: u64, cost: u64 },
    /// The ledger refused the rebet for another reason. Autoplay has been switched off.
    Rejected(BetRejection),
}

#[derive(Clone, Debug, Default)]
pub struct AutoplayController {
    enabled: bool,
    last_bets: Vec<PlacedBet>,
}

impl AutoplayController {
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Takes effect at the next rollover.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn last_bets(&self) -> &[PlacedBet] {
        &self.last_bets
    }

    /// Remember a settled round's bets. Rounds without bets leave the previous set in place.
    pub fn remember(&mut self, bets: &[PlacedBet]) {
        if !bets.is_empty() {
            self.last_bets = bets.to_vec();
        }
    }

    pub fn rebet_cost(&self) -> u64 {
        self.last_bets.iter().map(|bet| bet.amount).sum()
    }

    /// Called once when a new round opens for bets.
    pub fn on_rollover(&mut self, ledger: &mut BetLedger) -> AutoplayOutcome {
        if !self.enabled || self.last_bets.is_empty() {
            return AutoplayOutcome::Idle;
        }
        let cost = self.rebet_cost();
        match ledger.restore(&self.last_bets) {
            Ok(placed) => {
                let bet_ids: Vec<BetId> = placed.iter().map(|bet| bet.id).collect();
                info!(count = bet_ids.len(), cost, "autoplay rebet placed");
                AutoplayOutcome::Rebet { bet_ids, cost }
            }
            Err(BetRejection::InsufficientBalance { balance, required }) => {
                self.enabled = false;
                warn!(balance, required, "autoplay disabled: insufficient funds");
                AutoplayOutcome::InsufficientFunds {
                    balance,
                    cost: required,
                }
            }
            Err(rejection) => {
                self.enabled = false;
                warn!(%rejection, "autoplay disabled: rebet rejected");
                AutoplayOutcome::Rejected(rejection)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roulette_neo_types::roulette::coverage;
    use roulette_neo_types::{BetType, Pocket, RoundPhase};

    fn round_with_bets(balance: u64, stakes: &[u64]) -> (BetLedger, Vec<PlacedBet>) {
        let mut ledger = BetLedger::new(balance);
        ledger.on_phase(RoundPhase::WaitingForBets);
        for (i, stake) in stakes.iter().enumerate() {
            ledger.select_chip(*stake).unwrap();
            ledger
                .place_bet(
                    BetType::Straight,
                    coverage::straight(Pocket::new(i as u8 + 1).unwrap()),
                    35,
                )
                .unwrap();
        }
        ledger.on_phase(RoundPhase::ResultDisplay);
        let bets = ledger.take_for_settlement();
        (ledger, bets)
    }

    #[test]
    fn test_disabled_is_idle() {
        let (mut ledger, bets) = round_with_bets(100, &[5]);
        let mut autoplay = AutoplayController::default();
        autoplay.remember(&bets);
        ledger.on_phase(RoundPhase::WaitingForBets);
        assert_eq!(autoplay.on_rollover(&mut ledger), AutoplayOutcome::Idle);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_nothing_to_repeat() {
        let mut ledger = BetLedger::new(100);
        ledger.on_phase(RoundPhase::WaitingForBets);
        let mut autoplay = AutoplayController::default();
        autoplay.set_enabled(true);
        autoplay.remember(&[]);
        assert_eq!(autoplay.on_rollover(&mut ledger), AutoplayOutcome::Idle);
        assert!(autoplay.is_enabled());
    }

    #[test]
    fn test_rebet_places_fresh_copies() {
        let (mut ledger, bets) = round_with_bets(100, &[10, 25]);
        let mut autoplay = AutoplayController::default();
        autoplay.set_enabled(true);
        autoplay.remember(&bets);
        ledger.credit(100);
        ledger.on_phase(RoundPhase::WaitingForBets);

        let outcome = autoplay.on_rollover(&mut ledger);
        let AutoplayOutcome::Rebet { bet_ids, cost } = outcome else {
            panic!("expected rebet, got {outcome:?}");
        };
        assert_eq!(cost, 35);
        assert_eq!(bet_ids.len(), 2);
        assert!(bets.iter().all(|b| !bet_ids.contains(&b.id)));
        assert_eq!(ledger.total_staked(), 35);
        assert_eq!(ledger.balance(), 65 + 100 - 35);
        assert!(autoplay.is_enabled());
    }

    #[test]
    fn test_insufficient_funds_disables() {
        // Previous round staked 40 and lost; only 30 is left.
        let (mut ledger, bets) = round_with_bets(70, &[15, 25]);
        assert_eq!(ledger.balance(), 30);
        let mut autoplay = AutoplayController::default();
        autoplay.set_enabled(true);
        autoplay.remember(&bets);
        ledger.on_phase(RoundPhase::WaitingForBets);

        assert_eq!(
            autoplay.on_rollover(&mut ledger),
            AutoplayOutcome::InsufficientFunds {
                balance: 30,
                cost: 40
            }
        );
        assert!(!autoplay.is_enabled());
        assert!(ledger.is_empty());
        assert_eq!(ledger.balance(), 30);

        // Stays off on the next rollover.
        assert_eq!(autoplay.on_rollover(&mut ledger), AutoplayOutcome::Idle);
    }

    #[test]
    fn test_rejected_when_closed() {
        let (mut ledger, bets) = round_with_bets(100, &[5]);
        let mut autoplay = AutoplayController::default();
        autoplay.set_enabled(true);
        autoplay.remember(&bets);
        assert_eq!(
            autoplay.on_rollover(&mut ledger),
            AutoplayOutcome::Rejected(BetRejection::BettingClosed)
        );
        assert!(!autoplay.is_enabled());
    }
}

//! Off-chain prediction of the game's roll.
//!
//! The attacker reads the same public inputs the game will hash, rolls the
//! die locally and only sends a wager when the local roll wins. Prediction
//! ([`Predictor::evaluate`]) and submission ([`PredictiveAttacker::commit`])
//! only share the [`LedgerView`] snapshot they were given.

use {
    crate::{
        error::DiceResult,
        game::{LedgerClient, LedgerView, WagerReceipt},
        roll::RollOutcome,
        types::{Address, Wei},
    },
    tracing::{debug, info},
};

/// What to do with a snapshot of the ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    /// The predicted roll loses (or is not worth it). Nothing is sent.
    Skip { predicted: RollOutcome },
    /// The predicted roll wins. Send exactly one wager of `fee`.
    Commit {
        predicted: RollOutcome,
        fee: Wei,
        /// Pool at observation time minus the fee.
        expected_profit: i128,
    },
}

impl Decision {
    pub fn predicted(&self) -> RollOutcome {
        match self {
            Decision::Skip { predicted } | Decision::Commit { predicted, .. } => *predicted,
        }
    }
}

pub trait Predictor {
    fn evaluate(&self, view: &LedgerView) -> Decision;
}

/// Result of a single exploit attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Skipped { predicted: RollOutcome },
    Committed {
        /// Expected profit at decision time.
        profit: i128,
        receipt: WagerReceipt,
    },
}

impl Outcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, Outcome::Committed { .. })
    }

    /// Committed on a winning prediction but the roll at execution lost,
    /// because the reference block or nonce moved in between.
    pub fn lost_race(&self) -> bool {
        matches!(self, Outcome::Committed { receipt, .. } if !receipt.won)
    }

    /// Payout minus fee for committed attempts, zero for skips.
    pub fn realized_profit(&self) -> i128 {
        match self {
            Outcome::Skipped { .. } => 0,
            Outcome::Committed { receipt, .. } => signed(receipt.payout) - signed(receipt.payment),
        }
    }
}

fn signed(amount: Wei) -> i128 {
    i128::try_from(amount).unwrap_or(i128::MAX)
}

#[derive(Clone, Debug)]
pub struct PredictiveAttacker {
    address: Address,
    min_profit: Option<i128>,
}

impl PredictiveAttacker {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            min_profit: None,
        }
    }

    /// Skip winning rolls whose expected profit is below `min_profit`.
    pub fn with_min_profit(mut self, min_profit: i128) -> Self {
        self.min_profit = Some(min_profit);
        self
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Sends the wager a `Commit` decision asks for. A `Skip` sends nothing.
    pub fn commit<L: LedgerClient + ?Sized>(
        &self,
        ledger: &mut L,
        decision: &Decision,
    ) -> DiceResult<Outcome> {
        match *decision {
            Decision::Skip { predicted } => Ok(Outcome::Skipped { predicted }),
            Decision::Commit {
                predicted,
                fee,
                expected_profit,
            } => {
                let receipt = ledger.submit_wager(&self.address, fee)?;
                if receipt.roll != predicted {
                    info!(
                        predicted = predicted.value(),
                        rolled = receipt.roll.value(),
                        "Prediction went stale before execution"
                    );
                }
                Ok(Outcome::Committed {
                    profit: expected_profit,
                    receipt,
                })
            }
        }
    }

    /// Read, predict, and wager only on a predicted win. At most one
    /// submission, never a retry.
    pub fn attempt_exploit<L: LedgerClient + ?Sized>(&self, ledger: &mut L) -> DiceResult<Outcome> {
        let view = ledger.read_state(&self.address);
        let decision = self.evaluate(&view);
        self.commit(ledger, &decision)
    }
}

impl Predictor for PredictiveAttacker {
    fn evaluate(&self, view: &LedgerView) -> Decision {
        let predicted = view.predicted_roll();
        let expected_profit = signed(view.pool_balance) - signed(view.entry_fee);
        debug!(
            nonce = view.nonce,
            block = %view.prev_block_hash,
            predicted = predicted.value(),
            expected_profit,
            "Evaluated roll"
        );

        if !view.win_condition.is_win(predicted) {
            return Decision::Skip { predicted };
        }
        if matches!(self.min_profit, Some(floor) if expected_profit < floor) {
            return Decision::Skip { predicted };
        }
        Decision::Commit {
            predicted,
            fee: view.entry_fee,
            expected_profit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        roll::WinCondition,
        types::{BlockHash, REFERENCE_ENTRY_FEE},
    };
    use hex_literal::hex;

    fn view(nonce: u64, pool_balance: Wei) -> LedgerView {
        LedgerView {
            participant: Address::labeled("attacker"),
            game_address: Address(hex!("f3ae4cc418223e902daf667b462d38856b08f1e3")),
            prev_block_hash: BlockHash([0x11; 32]),
            block_number: 101,
            nonce,
            pool_balance,
            entry_fee: REFERENCE_ENTRY_FEE,
            win_condition: WinCondition::Equals(0),
        }
    }

    #[test]
    fn test_losing_prediction_skips() {
        let attacker = PredictiveAttacker::new(Address::labeled("attacker"));
        let decision = attacker.evaluate(&view(0, 10 * REFERENCE_ENTRY_FEE));
        assert_eq!(
            decision,
            Decision::Skip {
                predicted: RollOutcome::try_from(12).unwrap()
            }
        );
    }

    #[test]
    fn test_winning_prediction_commits_with_fee() {
        let attacker = PredictiveAttacker::new(Address::labeled("attacker"));
        let decision = attacker.evaluate(&view(7, 10 * REFERENCE_ENTRY_FEE));
        assert_eq!(
            decision,
            Decision::Commit {
                predicted: RollOutcome::try_from(0).unwrap(),
                fee: REFERENCE_ENTRY_FEE,
                expected_profit: 9 * REFERENCE_ENTRY_FEE as i128,
            }
        );
    }

    #[test]
    fn test_profit_floor() {
        let attacker =
            PredictiveAttacker::new(Address::labeled("attacker")).with_min_profit(1);
        let decision = attacker.evaluate(&view(7, REFERENCE_ENTRY_FEE / 2));
        assert!(matches!(decision, Decision::Skip { .. }));
        assert_eq!(decision.predicted().value(), 0);

        let decision = attacker.evaluate(&view(7, REFERENCE_ENTRY_FEE * 2));
        assert!(matches!(decision, Decision::Commit { .. }));
    }

    #[test]
    fn test_without_floor_unprofitable_wins_still_commit() {
        let attacker = PredictiveAttacker::new(Address::labeled("attacker"));
        let decision = attacker.evaluate(&view(7, 0));
        assert!(matches!(
            decision,
            Decision::Commit { expected_profit, .. } if expected_profit == -(REFERENCE_ENTRY_FEE as i128)
        ));
    }
}

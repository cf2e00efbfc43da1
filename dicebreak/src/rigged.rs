use {
    crate::{
        error::{DiceError, DiceResult},
        game::{instruction::DiceInstruction, PoolLedger, Receipt, WagerReceipt},
        types::{Address, Wei},
    },
    tracing::{debug, info},
};

/// A contract that plays the dice game from its own wallet, but only when the
/// roll it computes in the same transaction wins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RiggedRoll {
    /// Wallet the contract wagers from and receives payouts into
    pub address: Address,
    /// The only caller allowed to withdraw
    pub owner: Address,
}

impl RiggedRoll {
    pub fn new(address: Address, owner: Address) -> Self {
        Self { address, owner }
    }

    pub fn balance(&self, ledger: &PoolLedger) -> Wei {
        ledger.balance_of(&self.address)
    }

    /// Predicts and wagers inside one transaction. A losing prediction
    /// reverts with `NotWinningRoll`, so no fee is spent and no nonce is used.
    pub fn rigged_roll(&self, ledger: &mut PoolLedger) -> DiceResult<WagerReceipt> {
        let result = ledger.transact(|tx| {
            let fee = tx.config().entry_fee;
            let available = tx.balance_of(&self.address);
            if available < fee {
                return Err(DiceError::InsufficientFunds {
                    account: self.address,
                    needed: fee,
                    available,
                });
            }

            let view = tx.view(&self.address);
            let predicted = view.predicted_roll();
            debug!(nonce = view.nonce, predicted = predicted.value(), "RiggedRoll prediction");
            if !view.win_condition.is_win(predicted) {
                return Err(DiceError::NotWinningRoll {
                    roll: predicted.value(),
                });
            }

            match tx.execute(&self.address, &DiceInstruction::RollTheDice { payment: fee })? {
                Receipt::Wager(receipt) => Ok(receipt),
                _ => Err(DiceError::InvalidInstruction),
            }
        })?;

        info!(
            contract = %self.address,
            roll = result.roll.value(),
            payout = result.payout,
            "RiggedRoll won"
        );
        Ok(result)
    }

    /// Moves `amount` out of the contract wallet. Owner only.
    pub fn withdraw(
        &self,
        ledger: &mut PoolLedger,
        caller: &Address,
        to: &Address,
        amount: Wei,
    ) -> DiceResult<()> {
        if *caller != self.owner {
            return Err(DiceError::NotOwner { caller: *caller });
        }
        ledger.transfer(&self.address, to, amount)
    }
}

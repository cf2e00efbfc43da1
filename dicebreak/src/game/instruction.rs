use {
    crate::types::{Address, Wei},
    borsh::{BorshDeserialize, BorshSerialize},
};

/// Instructions accepted by the dice game ledger.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum DiceInstruction {
    /// Pay at least the entry fee and roll against the current reference block.
    /// Paid from the caller's wallet.
    RollTheDice { payment: Wei },

    /// Donate to the game. The whole amount leaves the caller's wallet and
    /// lands in the prize pool.
    FundPool { amount: Wei },

    /// Move native currency between wallets.
    /// Debits the caller's wallet and credits `to`.
    Transfer { to: Address, amount: Wei },
}

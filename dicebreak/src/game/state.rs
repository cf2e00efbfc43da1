use {
    crate::{
        config::NonceScope,
        error::{DiceError, DiceResult},
        types::{Address, Wei},
    },
    borsh::{BorshDeserialize, BorshSerialize},
    std::collections::BTreeMap,
};

/// Balances held by the game program.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct GameState {
    /// Paid in full to the next winner.
    pub prize: Wei,
    /// Retained share of every fee, used to re-seed the prize.
    pub reserve: Wei,
    /// Shared counter, advanced once per accepted wager in either scope.
    pub global_nonce: u64,
}

impl GameState {
    /// Everything the game program holds.
    pub fn total_balance(&self) -> Wei {
        self.prize.saturating_add(self.reserve)
    }
}

/// Everything a transaction may mutate. Cloned before each transaction and
/// restored if it fails.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LedgerState {
    pub game: GameState,
    pub wallets: BTreeMap<Address, Wei>,
    pub nonces: BTreeMap<Address, u64>,
}

impl LedgerState {
    pub fn balance_of(&self, account: &Address) -> Wei {
        self.wallets.get(account).copied().unwrap_or(0)
    }

    pub fn credit(&mut self, account: &Address, amount: Wei) -> DiceResult<()> {
        let balance = self.wallets.entry(*account).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(DiceError::Overflow)?;
        Ok(())
    }

    pub fn debit(&mut self, account: &Address, amount: Wei) -> DiceResult<()> {
        let available = self.balance_of(account);
        if available < amount {
            return Err(DiceError::InsufficientFunds {
                account: *account,
                needed: amount,
                available,
            });
        }
        self.wallets.insert(*account, available - amount);
        Ok(())
    }

    /// The counter the next roll by `participant` consumes.
    pub fn nonce_for(&self, scope: NonceScope, participant: &Address) -> u64 {
        match scope {
            NonceScope::PerParticipant => self.nonces.get(participant).copied().unwrap_or(0),
            NonceScope::Global => self.game.global_nonce,
        }
    }

    /// Advances the participant's counter and the shared one.
    pub fn bump_nonce(&mut self, participant: &Address) -> DiceResult<()> {
        let nonce = self.nonces.entry(*participant).or_insert(0);
        *nonce = nonce.checked_add(1).ok_or(DiceError::Overflow)?;
        self.game.global_nonce = self
            .game
            .global_nonce
            .checked_add(1)
            .ok_or(DiceError::Overflow)?;
        Ok(())
    }
}

use crate::types::{Address, Wei};
use thiserror::Error;

/// Errors surfaced by the dice ledger and the actors that talk to it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiceError {
    #[error("Insufficient payment: required {required} wei, offered {offered} wei")]
    InsufficientPayment { required: Wei, offered: Wei },

    #[error("Insufficient funds: {account} holds {available} wei, needs {needed} wei")]
    InsufficientFunds {
        account: Address,
        needed: Wei,
        available: Wei,
    },

    #[error("Not a winning roll: {roll}")]
    NotWinningRoll { roll: u8 },

    #[error("Caller {caller} is not the owner")]
    NotOwner { caller: Address },

    #[error("Invalid instruction")]
    InvalidInstruction,

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl DiceError {
    /// True for errors that reject a submitted transaction without mutating state.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            DiceError::InsufficientPayment { .. }
                | DiceError::InsufficientFunds { .. }
                | DiceError::NotWinningRoll { .. }
                | DiceError::NotOwner { .. }
                | DiceError::InvalidInstruction
        )
    }
}

impl From<std::io::Error> for DiceError {
    fn from(e: std::io::Error) -> Self {
        DiceError::Io(e.to_string())
    }
}

pub type DiceResult<T> = Result<T, DiceError>;

//! A dice game that rolls from public block data, and the actors that beat it
//! by computing the same roll before they pay.

pub mod attacker;
pub mod chain;
pub mod config;
pub mod error;
pub mod game;
pub mod rigged;
pub mod roll;
pub mod simulation;
pub mod types;

pub use {
    attacker::{Outcome, PredictiveAttacker},
    error::{DiceError, DiceResult},
    game::{LedgerClient, LedgerView, PoolLedger, WagerReceipt},
    roll::{compute_roll, RollInput, RollOutcome},
};

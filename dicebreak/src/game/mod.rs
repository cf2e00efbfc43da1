//! In-memory dice game ledger.
//!
//! `PoolLedger` plays the part of the chain plus the deployed game program:
//! it seals blocks, keeps wallets and nonces, and runs every instruction as an
//! all-or-nothing transaction. Outside code only sees it through
//! [`LedgerClient`]: a state read, the latest block hash, wager submission and
//! the event feed.

pub mod event;
pub mod instruction;
pub mod processor;
pub mod state;

use {
    crate::{
        chain::{Block, Chain},
        config::{GameConfig, MiningMode},
        error::{DiceError, DiceResult},
        roll::{RollInput, RollOutcome, WinCondition},
        types::{Address, BlockHash, Wei},
    },
    event::DiceEvent,
    instruction::DiceInstruction,
    processor::Processor,
    state::LedgerState,
    tracing::{info, warn},
};

/// Everything a participant can observe before deciding to wager.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerView {
    pub participant: Address,
    pub game_address: Address,
    /// Reference hash the next transaction will roll against.
    pub prev_block_hash: BlockHash,
    /// Number of the block the next transaction will land in.
    pub block_number: u64,
    /// Counter the participant's next roll consumes.
    pub nonce: u64,
    pub pool_balance: Wei,
    pub entry_fee: Wei,
    pub win_condition: WinCondition,
}

impl LedgerView {
    pub fn roll_input(&self) -> RollInput {
        RollInput::new(self.prev_block_hash, self.game_address, self.nonce)
    }

    /// The roll the game will produce if nothing else lands first.
    pub fn predicted_roll(&self) -> RollOutcome {
        self.roll_input().roll()
    }
}

/// Result of an accepted wager.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WagerReceipt {
    pub caller: Address,
    pub payment: Wei,
    pub nonce: u64,
    pub prev_block_hash: BlockHash,
    pub block_number: u64,
    pub roll: RollOutcome,
    pub won: bool,
    pub payout: Wei,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Receipt {
    Wager(WagerReceipt),
    Funded { amount: Wei },
    Transferred { to: Address, amount: Wei },
}

/// The boundary between the game and anyone playing it.
pub trait LedgerClient {
    fn read_state(&self, participant: &Address) -> LedgerView;

    fn latest_block_hash(&self) -> BlockHash;

    /// One atomic wager. The outcome is only known once this returns.
    fn submit_wager(&mut self, caller: &Address, payment: Wei) -> DiceResult<WagerReceipt>;

    fn events_since(&self, cursor: usize) -> &[DiceEvent];
}

/// Mutable view handed to the body of a transaction.
pub struct TxContext<'a> {
    pub(crate) config: &'a GameConfig,
    pub(crate) state: &'a mut LedgerState,
    pub(crate) prev_block_hash: BlockHash,
    pub(crate) block_number: u64,
    events: Vec<DiceEvent>,
    calls: Vec<Vec<u8>>,
}

impl<'a> TxContext<'a> {
    pub fn config(&self) -> &GameConfig {
        self.config
    }

    pub fn balance_of(&self, account: &Address) -> Wei {
        self.state.balance_of(account)
    }

    /// What `participant` would read if it queried the ledger right now,
    /// including effects of earlier calls in this transaction.
    pub fn view(&self, participant: &Address) -> LedgerView {
        capture_view(
            self.config,
            self.state,
            self.prev_block_hash,
            self.block_number,
            participant,
        )
    }

    /// Runs one instruction as part of this transaction.
    pub fn execute(
        &mut self,
        caller: &Address,
        instruction: &DiceInstruction,
    ) -> DiceResult<Receipt> {
        let data = borsh::to_vec(instruction)?;
        Processor::process(self, caller, &data)
    }

    pub(crate) fn emit(&mut self, event: DiceEvent) {
        self.events.push(event);
    }

    pub(crate) fn record_call(&mut self, caller: &Address, instruction_data: &[u8]) {
        let mut call = Vec::with_capacity(Address::LEN + instruction_data.len());
        call.extend_from_slice(caller.as_bytes());
        call.extend_from_slice(instruction_data);
        self.calls.push(call);
    }
}

fn capture_view(
    config: &GameConfig,
    state: &LedgerState,
    prev_block_hash: BlockHash,
    block_number: u64,
    participant: &Address,
) -> LedgerView {
    LedgerView {
        participant: *participant,
        game_address: config.game_address,
        prev_block_hash,
        block_number,
        nonce: state.nonce_for(config.nonce_scope, participant),
        pool_balance: state.game.prize,
        entry_fee: config.entry_fee,
        win_condition: config.win_condition,
    }
}

pub struct PoolLedger {
    config: GameConfig,
    state: LedgerState,
    chain: Chain,
    events: Vec<DiceEvent>,
}

impl PoolLedger {
    pub fn new(config: GameConfig) -> DiceResult<Self> {
        let chain = Chain::new(config.chain_seed);
        Self::with_chain(config, chain)
    }

    /// Deploys the game on top of an existing chain.
    pub fn with_chain(config: GameConfig, chain: Chain) -> DiceResult<Self> {
        config.validate()?;
        let mut state = LedgerState::default();
        state.game.prize = config.initial_prize;
        state.game.reserve = config.initial_reserve;
        info!(
            game = %config.game_address,
            prize = state.game.prize,
            reserve = state.game.reserve,
            win = %config.win_condition,
            "Dice game deployed"
        );
        Ok(Self {
            config,
            state,
            chain,
            events: Vec::new(),
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn pool_balance(&self) -> Wei {
        self.state.game.prize
    }

    pub fn reserve_balance(&self) -> Wei {
        self.state.game.reserve
    }

    pub fn balance_of(&self, account: &Address) -> Wei {
        self.state.balance_of(account)
    }

    pub fn nonce_of(&self, participant: &Address) -> u64 {
        self.state.nonce_for(self.config.nonce_scope, participant)
    }

    pub fn events(&self) -> &[DiceEvent] {
        &self.events
    }

    /// Wallets plus the game's own balance. Only `fund_account` changes it.
    pub fn total_supply(&self) -> Wei {
        self.state
            .wallets
            .values()
            .fold(self.state.game.total_balance(), |sum, balance| {
                sum.saturating_add(*balance)
            })
    }

    /// Genesis allocation. Not a transaction and never sealed into a block.
    pub fn fund_account(&mut self, account: &Address, amount: Wei) -> DiceResult<()> {
        self.state.credit(account, amount)
    }

    /// Runs `body` as one transaction. Either every state change it makes is
    /// committed along with its events, or none is.
    pub fn transact<T, F>(&mut self, body: F) -> DiceResult<T>
    where
        F: FnOnce(&mut TxContext<'_>) -> DiceResult<T>,
    {
        let snapshot = self.state.clone();
        let mut ctx = TxContext {
            config: &self.config,
            state: &mut self.state,
            prev_block_hash: self.chain.latest_hash(),
            block_number: self.chain.pending_number(),
            events: Vec::new(),
            calls: Vec::new(),
        };
        let result = body(&mut ctx);
        let TxContext { events, calls, .. } = ctx;

        match result {
            Ok(value) => {
                for call in &calls {
                    self.chain.record(call);
                }
                for event in events {
                    event.emit();
                    self.events.push(event);
                }
                if self.config.mining == MiningMode::Auto && !calls.is_empty() {
                    self.chain.seal();
                }
                Ok(value)
            }
            Err(e) => {
                warn!("Transaction reverted: {}", e);
                self.state = snapshot;
                Err(e)
            }
        }
    }

    pub fn submit(&mut self, caller: &Address, instruction: &DiceInstruction) -> DiceResult<Receipt> {
        self.transact(|tx| tx.execute(caller, instruction))
    }

    pub fn roll_the_dice(&mut self, caller: &Address, payment: Wei) -> DiceResult<WagerReceipt> {
        match self.submit(caller, &DiceInstruction::RollTheDice { payment })? {
            Receipt::Wager(receipt) => Ok(receipt),
            _ => Err(DiceError::InvalidInstruction),
        }
    }

    pub fn fund_pool(&mut self, funder: &Address, amount: Wei) -> DiceResult<()> {
        self.submit(funder, &DiceInstruction::FundPool { amount })
            .map(|_| ())
    }

    pub fn transfer(&mut self, from: &Address, to: &Address, amount: Wei) -> DiceResult<()> {
        self.submit(from, &DiceInstruction::Transfer { to: *to, amount })
            .map(|_| ())
    }

    /// Seals the pending block, even if it is empty.
    pub fn mine_block(&mut self) -> Block {
        self.chain.seal().clone()
    }
}

impl LedgerClient for PoolLedger {
    fn read_state(&self, participant: &Address) -> LedgerView {
        capture_view(
            &self.config,
            &self.state,
            self.chain.latest_hash(),
            self.chain.pending_number(),
            participant,
        )
    }

    fn latest_block_hash(&self) -> BlockHash {
        self.chain.latest_hash()
    }

    fn submit_wager(&mut self, caller: &Address, payment: Wei) -> DiceResult<WagerReceipt> {
        self.roll_the_dice(caller, payment)
    }

    fn events_since(&self, cursor: usize) -> &[DiceEvent] {
        self.events.get(cursor..).unwrap_or(&[])
    }
}

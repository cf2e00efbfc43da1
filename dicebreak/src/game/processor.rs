use {
    crate::{
        config::PrizeReset,
        error::{DiceError, DiceResult},
        game::{
            event::DiceEvent,
            instruction::DiceInstruction,
            state::GameState,
            Receipt, TxContext, WagerReceipt,
        },
        roll::RollInput,
        types::{Address, Wei},
    },
    borsh::BorshDeserialize,
    tracing::{debug, info, warn},
};

pub struct Processor;

impl Processor {
    pub fn process(
        ctx: &mut TxContext<'_>,
        caller: &Address,
        instruction_data: &[u8],
    ) -> DiceResult<Receipt> {
        let instruction = DiceInstruction::try_from_slice(instruction_data).map_err(|e| {
            warn!("Failed to deserialize instruction: {}", e);
            DiceError::InvalidInstruction
        })?;

        let receipt = match instruction {
            DiceInstruction::RollTheDice { payment } => {
                debug!("Instruction: RollTheDice");
                Self::process_roll_the_dice(ctx, caller, payment).map(Receipt::Wager)
            }
            DiceInstruction::FundPool { amount } => {
                debug!("Instruction: FundPool");
                Self::process_fund_pool(ctx, caller, amount)
            }
            DiceInstruction::Transfer { to, amount } => {
                debug!("Instruction: Transfer");
                Self::process_transfer(ctx, caller, to, amount)
            }
        }?;

        ctx.record_call(caller, instruction_data);
        Ok(receipt)
    }

    fn process_roll_the_dice(
        ctx: &mut TxContext<'_>,
        caller: &Address,
        payment: Wei,
    ) -> DiceResult<WagerReceipt> {
        let config = ctx.config;
        if payment < config.entry_fee {
            return Err(DiceError::InsufficientPayment {
                required: config.entry_fee,
                offered: payment,
            });
        }
        ctx.state.debit(caller, payment)?;

        // The roll is derived here, inside the transaction that pays out.
        let nonce = ctx.state.nonce_for(config.nonce_scope, caller);
        let input = RollInput::new(ctx.prev_block_hash, config.game_address, nonce);
        if input.is_degenerate() {
            warn!(
                player = %caller,
                nonce,
                "Rolling against the zero block hash, outcome is known to everyone"
            );
        }
        let roll = input.roll();
        ctx.state.bump_nonce(caller)?;

        let (prize_share, reserve_share) = config.split_payment(payment);
        let game = &mut ctx.state.game;
        game.prize = game.prize.checked_add(prize_share).ok_or(DiceError::Overflow)?;
        game.reserve = game
            .reserve
            .checked_add(reserve_share)
            .ok_or(DiceError::Overflow)?;

        let won = config.win_condition.is_win(roll);
        let payout = if won {
            let payout = std::mem::take(&mut game.prize);
            Self::reseed_prize(config.prize_reset, game, reserve_share)?;
            ctx.state.credit(caller, payout)?;
            payout
        } else {
            0
        };

        ctx.emit(DiceEvent::Roll {
            player: *caller,
            amount: payment,
            roll: roll.value(),
            won,
            payout,
        });
        if won {
            ctx.emit(DiceEvent::Winner {
                winner: *caller,
                amount: payout,
            });
        }
        info!(
            player = %caller,
            nonce,
            roll = roll.value(),
            won,
            payout,
            "Dice rolled"
        );

        Ok(WagerReceipt {
            caller: *caller,
            payment,
            nonce,
            prev_block_hash: ctx.prev_block_hash,
            block_number: ctx.block_number,
            roll,
            won,
            payout,
        })
    }

    /// Moves funds from the reserve back into an empty prize pool.
    pub(crate) fn reseed_prize(
        rule: PrizeReset,
        game: &mut GameState,
        reserve_share: Wei,
    ) -> DiceResult<()> {
        let amount = match rule {
            PrizeReset::Zero => 0,
            PrizeReset::CarryReserveShare => reserve_share.min(game.reserve),
            PrizeReset::ReserveFraction(percent) => {
                let total = game.total_balance();
                let percent = Wei::from(percent);
                (total / 100 * percent + total % 100 * percent / 100).min(game.reserve)
            }
        };
        game.reserve -= amount;
        game.prize = game.prize.checked_add(amount).ok_or(DiceError::Overflow)?;
        Ok(())
    }

    fn process_fund_pool(
        ctx: &mut TxContext<'_>,
        funder: &Address,
        amount: Wei,
    ) -> DiceResult<Receipt> {
        ctx.state.debit(funder, amount)?;
        let game = &mut ctx.state.game;
        game.prize = game.prize.checked_add(amount).ok_or(DiceError::Overflow)?;

        ctx.emit(DiceEvent::PoolFunded {
            funder: *funder,
            amount,
        });
        Ok(Receipt::Funded { amount })
    }

    fn process_transfer(
        ctx: &mut TxContext<'_>,
        from: &Address,
        to: Address,
        amount: Wei,
    ) -> DiceResult<Receipt> {
        ctx.state.debit(from, amount)?;
        ctx.state.credit(&to, amount)?;

        ctx.emit(DiceEvent::Transferred {
            from: *from,
            to,
            amount,
        });
        Ok(Receipt::Transferred { to, amount })
    }
}

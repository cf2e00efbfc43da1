use {
    crate::{
        error::DiceResult,
        types::{Address, Wei},
    },
    base64::Engine,
    borsh::{BorshDeserialize, BorshSerialize},
    tracing::{error, info},
};

/// Prefix of the log line every committed event is emitted on.
pub const EVENT_LOG_PREFIX: &str = "DICE_EVENT:";

#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum DiceEvent {
    /// One per accepted wager, win or lose.
    Roll {
        player: Address,
        amount: Wei,
        roll: u8,
        won: bool,
        payout: Wei,
    },
    Winner {
        winner: Address,
        amount: Wei,
    },
    PoolFunded {
        funder: Address,
        amount: Wei,
    },
    Transferred {
        from: Address,
        to: Address,
        amount: Wei,
    },
}

impl DiceEvent {
    /// Renders the event as a `DICE_EVENT:<base64>` log line.
    pub fn to_log_line(&self) -> DiceResult<String> {
        let data = borsh::to_vec(self)?;
        let b64 = base64::engine::general_purpose::STANDARD.encode(data);
        Ok(format!("{}{}", EVENT_LOG_PREFIX, b64))
    }

    pub fn emit(&self) {
        match self.to_log_line() {
            Ok(line) => info!("{}", line),
            Err(e) => error!(event = ?self, "Failed to encode event: {}", e),
        }
    }

    pub fn parse_log(log_msg: &str) -> Option<Self> {
        let base64_data = log_msg.strip_prefix(EVENT_LOG_PREFIX)?.trim();
        let event_data = base64::engine::general_purpose::STANDARD
            .decode(base64_data)
            .ok()?;
        Self::try_from_slice(&event_data).ok()
    }
}

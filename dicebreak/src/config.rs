use {
    crate::{
        error::{DiceError, DiceResult},
        roll::WinCondition,
        types::{Address, Wei, REFERENCE_ENTRY_FEE, WEI_PER_ETHER},
    },
    serde::{Deserialize, Serialize},
    serde_with::{serde_as, DisplayFromStr},
    std::{fs, path::Path},
};

/// Address the reference DiceGame was deployed at.
pub const REFERENCE_GAME_ADDRESS: Address = Address([
    0xf3, 0xae, 0x4c, 0xc4, 0x18, 0x22, 0x3e, 0x90, 0x2d, 0xaf, 0x66, 0x7b, 0x46, 0x2d, 0x38, 0x85,
    0x6b, 0x08, 0xf1, 0xe3,
]);

/// Share of every entry fee credited to the prize pool.
pub const DEFAULT_PRIZE_SHARE_PERCENT: u8 = 40;

/// How the prize pool is re-seeded after it has been paid out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrizeReset {
    /// The pool restarts empty.
    #[default]
    Zero,
    /// The reserve share of the winning fee is moved back into the pool.
    CarryReserveShare,
    /// This percentage of the game's remaining balance is moved from the
    /// reserve into the pool.
    ReserveFraction(u8),
}

/// Which counter feeds the roll.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NonceScope {
    /// Each participant has its own counter.
    #[default]
    PerParticipant,
    /// One counter shared by every participant of the game.
    Global,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MiningMode {
    /// Every committed transaction is sealed into its own block.
    #[default]
    Auto,
    /// Transactions wait in the pending block until it is mined explicitly.
    Manual,
}

/// Deployment parameters of a dice game ledger.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    pub game_address: Address,
    #[serde_as(as = "DisplayFromStr")]
    pub entry_fee: Wei,
    pub prize_share_percent: u8,
    pub win_condition: WinCondition,
    pub prize_reset: PrizeReset,
    pub nonce_scope: NonceScope,
    pub mining: MiningMode,
    /// Mixed into every block hash so separate chains diverge.
    pub chain_seed: u64,
    /// Prize pool at deployment.
    #[serde_as(as = "DisplayFromStr")]
    pub initial_prize: Wei,
    /// Reserve at deployment.
    #[serde_as(as = "DisplayFromStr")]
    pub initial_reserve: Wei,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            game_address: REFERENCE_GAME_ADDRESS,
            entry_fee: REFERENCE_ENTRY_FEE,
            prize_share_percent: DEFAULT_PRIZE_SHARE_PERCENT,
            win_condition: WinCondition::default(),
            prize_reset: PrizeReset::default(),
            nonce_scope: NonceScope::default(),
            mining: MiningMode::default(),
            chain_seed: 0,
            initial_prize: WEI_PER_ETHER / 20,
            initial_reserve: 0,
        }
    }
}

impl GameConfig {
    /// The parameters of the original challenge deployment: low rolls win,
    /// one shared counter, and 10% of the balance re-seeds the pool. The game
    /// was deployed with 0.05 ether, a tenth of which formed the first prize.
    pub fn original_challenge() -> Self {
        Self {
            win_condition: WinCondition::AtMost(5),
            prize_reset: PrizeReset::ReserveFraction(10),
            nonce_scope: NonceScope::Global,
            initial_prize: WEI_PER_ETHER / 200,
            initial_reserve: WEI_PER_ETHER / 200 * 9,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> DiceResult<()> {
        self.win_condition.validate()?;
        if self.entry_fee == 0 {
            return Err(DiceError::InvalidConfig(
                "entry_fee must be positive".to_string(),
            ));
        }
        if self.prize_share_percent > 100 {
            return Err(DiceError::InvalidConfig(format!(
                "prize_share_percent {} exceeds 100",
                self.prize_share_percent
            )));
        }
        if let PrizeReset::ReserveFraction(percent) = self.prize_reset {
            if percent > 100 {
                return Err(DiceError::InvalidConfig(format!(
                    "reserve_fraction {} exceeds 100",
                    percent
                )));
            }
        }
        if self.game_address.is_zero() {
            return Err(DiceError::InvalidConfig(
                "game_address must not be zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Splits a payment into `(prize_share, reserve_share)`. The reserve takes
    /// the rounding remainder so both shares always add up to the payment.
    pub fn split_payment(&self, payment: Wei) -> (Wei, Wei) {
        let prize = payment / 100 * Wei::from(self.prize_share_percent)
            + payment % 100 * Wei::from(self.prize_share_percent) / 100;
        (prize, payment - prize)
    }

    pub fn from_json_str(json: &str) -> DiceResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| DiceError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> DiceResult<Self> {
        let json = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&json)
    }

    pub fn to_json_pretty(&self) -> DiceResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| DiceError::InvalidConfig(e.to_string()))
    }
}

//! Blockhash-seeded dice roll derivation.
//!
//! The game computes its roll as
//! `uint256(keccak256(abi.encodePacked(prevBlockHash, gameAddress, nonce))) % 16`.
//! Every input is public before the wager executes, so anyone can run the
//! same function and know the outcome in advance.

use {
    crate::{
        error::DiceError,
        types::{Address, BlockHash},
    },
    borsh::{BorshDeserialize, BorshSerialize},
    serde::{Deserialize, Serialize},
    sha3::{Digest, Keccak256},
    std::fmt,
};

/// Number of faces on the die.
pub const ROLL_MODULUS: u8 = 16;

/// Width of a Solidity `uint256` word.
const WORD_LEN: usize = 32;

/// Packed length: block hash (32) + address (20) + nonce word (32).
pub const ROLL_INPUT_LEN: usize = BlockHash::LEN + Address::LEN + WORD_LEN;

/// Public inputs of a single roll.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, BorshSerialize, BorshDeserialize)]
pub struct RollInput {
    /// Hash of the most recently finalized block when the roll executes.
    pub prev_block_hash: BlockHash,
    /// Address of the game program doing the rolling.
    pub subject: Address,
    /// Counter value consumed by the roll.
    pub nonce: u64,
}

impl RollInput {
    pub fn new(prev_block_hash: BlockHash, subject: Address, nonce: u64) -> Self {
        Self {
            prev_block_hash,
            subject,
            nonce,
        }
    }

    /// `abi.encodePacked(bytes32, address, uint256)`: the nonce is widened to a
    /// 32-byte big-endian word.
    pub fn encode_packed(&self) -> [u8; ROLL_INPUT_LEN] {
        let mut packed = [0u8; ROLL_INPUT_LEN];
        let (hash, rest) = packed.split_at_mut(BlockHash::LEN);
        let (subject, nonce) = rest.split_at_mut(Address::LEN);
        hash.copy_from_slice(self.prev_block_hash.as_bytes());
        subject.copy_from_slice(self.subject.as_bytes());
        nonce[WORD_LEN - 8..].copy_from_slice(&self.nonce.to_be_bytes());
        packed
    }

    pub fn digest(&self) -> [u8; 32] {
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&Keccak256::digest(self.encode_packed()));
        digest
    }

    pub fn roll(&self) -> RollOutcome {
        RollOutcome::from_digest(&self.digest())
    }

    /// A zero block hash means no block has been observed yet. The roll is
    /// still defined, just trivially known to everyone.
    pub fn is_degenerate(&self) -> bool {
        self.prev_block_hash.is_zero()
    }
}

/// A die face in `0..16`.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct RollOutcome(u8);

impl RollOutcome {
    /// Reduces a big-endian 256-bit digest modulo 16. Since 16 divides 256,
    /// only the low nibble of the last byte survives.
    pub fn from_digest(digest: &[u8; 32]) -> Self {
        Self(digest[31] % ROLL_MODULUS)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for RollOutcome {
    type Error = DiceError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value >= ROLL_MODULUS {
            return Err(DiceError::InvalidConfig(format!(
                "roll {} is outside 0..{}",
                value, ROLL_MODULUS
            )));
        }
        Ok(Self(value))
    }
}

impl From<RollOutcome> for u8 {
    fn from(roll: RollOutcome) -> Self {
        roll.0
    }
}

impl fmt::Display for RollOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Predicate deciding which faces pay out.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum WinCondition {
    /// Exactly this face wins.
    Equals(u8),
    /// Every face up to and including this one wins.
    AtMost(u8),
}

impl Default for WinCondition {
    fn default() -> Self {
        WinCondition::Equals(0)
    }
}

impl WinCondition {
    pub fn is_win(&self, roll: RollOutcome) -> bool {
        match *self {
            WinCondition::Equals(face) => roll.value() == face,
            WinCondition::AtMost(face) => roll.value() <= face,
        }
    }

    /// How many of the sixteen faces pay out.
    pub fn winning_faces(&self) -> u8 {
        match *self {
            WinCondition::Equals(face) if face < ROLL_MODULUS => 1,
            WinCondition::Equals(_) => 0,
            WinCondition::AtMost(face) => face.min(ROLL_MODULUS - 1) + 1,
        }
    }

    pub fn validate(&self) -> Result<(), DiceError> {
        let face = match *self {
            WinCondition::Equals(face) | WinCondition::AtMost(face) => face,
        };
        if face >= ROLL_MODULUS {
            return Err(DiceError::InvalidConfig(format!(
                "winning face {} can never be rolled",
                face
            )));
        }
        Ok(())
    }
}

impl fmt::Display for WinCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WinCondition::Equals(face) => write!(f, "roll == {}", face),
            WinCondition::AtMost(face) => write!(f, "roll <= {}", face),
        }
    }
}

/// The roll a game at `subject` would produce for `nonce` on top of
/// `prev_block_hash`.
pub fn compute_roll(prev_block_hash: &BlockHash, subject: &Address, nonce: u64) -> RollOutcome {
    RollInput::new(*prev_block_hash, *subject, nonce).roll()
}

/// Rolls for `start_nonce`, `start_nonce + 1`, ... while the reference block
/// stays the same.
pub fn upcoming_rolls(
    prev_block_hash: BlockHash,
    subject: Address,
    start_nonce: u64,
) -> impl Iterator<Item = (u64, RollOutcome)> {
    (start_nonce..=u64::MAX).map(move |nonce| (nonce, compute_roll(&prev_block_hash, &subject, nonce)))
}

/// First nonce within `horizon` attempts whose roll satisfies `condition`.
pub fn next_winning_nonce(
    prev_block_hash: BlockHash,
    subject: Address,
    start_nonce: u64,
    condition: WinCondition,
    horizon: usize,
) -> Option<u64> {
    upcoming_rolls(prev_block_hash, subject, start_nonce)
        .take(horizon)
        .find(|(_, roll)| condition.is_win(*roll))
        .map(|(nonce, _)| nonce)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use num_bigint::BigUint;
    use proptest::prelude::*;

    const GAME: [u8; 20] = hex!("f3ae4cc418223e902daf667b462d38856b08f1e3");

    #[test]
    fn test_packed_layout() {
        let input = RollInput::new(BlockHash([0x11; 32]), Address(GAME), 0x0102);
        let packed = input.encode_packed();
        assert_eq!(packed.len(), 84);
        assert_eq!(&packed[..32], &[0x11; 32]);
        assert_eq!(&packed[32..52], &GAME);
        assert_eq!(&packed[52..82], &[0u8; 30]);
        assert_eq!(&packed[82..], &[0x01, 0x02]);
    }

    #[test]
    fn test_known_digests() {
        let hash = BlockHash([0x11; 32]);
        let game = Address(GAME);

        let input = RollInput::new(hash, game, 0);
        assert_eq!(
            input.digest(),
            hex!("f27576214dbee22f3f83955b1b69711652a88a5308085c516af5e9f2ddd8098c")
        );
        assert_eq!(input.roll().value(), 12);

        let input = RollInput::new(hash, game, 7);
        assert_eq!(
            input.digest(),
            hex!("1edb7605e7e0ba72a0304b6a4959c3ac27287be599a7fab987535265413013a0")
        );
        assert_eq!(input.roll().value(), 0);
    }

    #[test]
    fn test_degenerate_zero_hash_is_still_defined() {
        let input = RollInput::new(BlockHash::ZERO, Address(GAME), 0);
        assert!(input.is_degenerate());
        assert_eq!(
            input.digest(),
            hex!("74fc395768588f861f7216ca2e4b93073b16c1289bbec425b723b113d1b187f1")
        );
        assert_eq!(input.roll().value(), 1);
    }

    #[test]
    fn test_upcoming_rolls() {
        let rolls: Vec<u8> = upcoming_rolls(BlockHash([0x11; 32]), Address(GAME), 0)
            .take(16)
            .map(|(_, roll)| roll.value())
            .collect();
        assert_eq!(rolls, vec![12, 12, 7, 6, 4, 11, 3, 0, 10, 3, 6, 0, 0, 8, 2, 2]);

        let hash = BlockHash([0x11; 32]);
        assert_eq!(next_winning_nonce(hash, Address(GAME), 0, WinCondition::Equals(0), 16), Some(7));
        assert_eq!(next_winning_nonce(hash, Address(GAME), 8, WinCondition::Equals(0), 16), Some(11));
        assert_eq!(next_winning_nonce(hash, Address(GAME), 0, WinCondition::AtMost(5), 16), Some(4));
        assert_eq!(next_winning_nonce(hash, Address(GAME), 0, WinCondition::Equals(0), 7), None);
    }

    #[test]
    fn test_win_conditions() {
        let zero = RollOutcome::try_from(0).unwrap();
        let five = RollOutcome::try_from(5).unwrap();
        let six = RollOutcome::try_from(6).unwrap();
        assert!(WinCondition::Equals(0).is_win(zero));
        assert!(!WinCondition::Equals(0).is_win(five));
        assert!(WinCondition::AtMost(5).is_win(five));
        assert!(!WinCondition::AtMost(5).is_win(six));
        assert_eq!(WinCondition::Equals(0).winning_faces(), 1);
        assert_eq!(WinCondition::AtMost(5).winning_faces(), 6);
        assert!(WinCondition::Equals(16).validate().is_err());
        assert!(RollOutcome::try_from(16).is_err());
    }

    #[test]
    fn test_win_condition_json_shape() {
        let json = serde_json::to_string(&WinCondition::AtMost(5)).unwrap();
        assert_eq!(json, r#"{"at_most":5}"#);
        let parsed: WinCondition = serde_json::from_str(r#"{"equals":0}"#).unwrap();
        assert_eq!(parsed, WinCondition::Equals(0));
    }

    proptest! {
        #[test]
        fn roll_is_in_range_and_deterministic(
            hash in any::<[u8; 32]>(),
            subject in any::<[u8; 20]>(),
            nonce in any::<u64>(),
        ) {
            let first = compute_roll(&BlockHash(hash), &Address(subject), nonce);
            let second = compute_roll(&BlockHash(hash), &Address(subject), nonce);
            prop_assert!(first.value() < ROLL_MODULUS);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn roll_matches_uint256_modulo(
            hash in any::<[u8; 32]>(),
            subject in any::<[u8; 20]>(),
            nonce in any::<u64>(),
        ) {
            let input = RollInput::new(BlockHash(hash), Address(subject), nonce);
            let wide = BigUint::from_bytes_be(&input.digest()) % 16u32;
            prop_assert_eq!(wide, BigUint::from(input.roll().value()));
        }
    }
}

use {
    crate::error::DiceError,
    borsh::{BorshDeserialize, BorshSerialize},
    serde_with::{DeserializeFromStr, SerializeDisplay},
    sha3::{Digest, Keccak256},
    std::{fmt, str::FromStr},
};

/// Native currency amount in its smallest indivisible unit.
pub type Wei = u128;

pub const WEI_PER_ETHER: Wei = 1_000_000_000_000_000_000;

/// Entry fee of the reference deployment: 0.002 ether.
pub const REFERENCE_ENTRY_FEE: Wei = 2_000_000_000_000_000;

const ETHER_DECIMALS: usize = 18;

macro_rules! fixed_bytes_id {
    ($(#[$meta:meta])* $name:ident, $len:expr) => {
        $(#[$meta])*
        #[derive(
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            Default,
            BorshSerialize,
            BorshDeserialize,
            SerializeDisplay,
            DeserializeFromStr,
        )]
        pub struct $name(pub [u8; $len]);

        impl $name {
            pub const LEN: usize = $len;
            pub const ZERO: Self = Self([0u8; $len]);

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            pub fn is_zero(&self) -> bool {
                self.0.iter().all(|&b| b == 0)
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl FromStr for $name {
            type Err = DiceError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let digits = s.strip_prefix("0x").unwrap_or(s);
                let bytes = hex::decode(digits)
                    .map_err(|e| DiceError::InvalidIdentifier(format!("{}: {}", s, e)))?;
                let bytes: [u8; $len] = bytes.try_into().map_err(|v: Vec<u8>| {
                    DiceError::InvalidIdentifier(format!(
                        "{} must be {} bytes, got {}",
                        stringify!($name),
                        $len,
                        v.len()
                    ))
                })?;
                Ok(Self(bytes))
            }
        }
    };
}

fixed_bytes_id!(
    /// Identifier of a finalized block, used by the game as its roll seed.
    BlockHash,
    32
);

fixed_bytes_id!(
    /// 160-bit account or program address.
    Address,
    20
);

impl Address {
    /// Derives a stable address from a human readable label, the same way an
    /// account address is cut from the tail of a Keccak-256 digest.
    pub fn labeled(label: &str) -> Self {
        let digest = Keccak256::digest(label.as_bytes());
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest[12..32]);
        Self(bytes)
    }
}

/// Renders a wei amount as a decimal ether string without trailing zeros.
pub fn format_ether(amount: Wei) -> String {
    let whole = amount / WEI_PER_ETHER;
    let fraction = amount % WEI_PER_ETHER;
    if fraction == 0 {
        return whole.to_string();
    }
    let digits = format!("{:0width$}", fraction, width = ETHER_DECIMALS);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}

/// Parses a decimal ether string ("0.002", "1", "1.5") into wei.
pub fn parse_ether(s: &str) -> Result<Wei, DiceError> {
    let invalid = || DiceError::InvalidAmount(s.to_string());
    let (whole, fraction) = match s.trim().split_once('.') {
        Some((w, f)) => (w, f),
        None => (s.trim(), ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    let digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if fraction.len() > ETHER_DECIMALS || !digits(whole) || !digits(fraction) {
        return Err(invalid());
    }

    let whole: Wei = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid())?
    };
    let fraction: Wei = if fraction.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", fraction, width = ETHER_DECIMALS);
        padded.parse().map_err(|_| invalid())?
    };

    whole
        .checked_mul(WEI_PER_ETHER)
        .and_then(|w| w.checked_add(fraction))
        .ok_or_else(invalid)
}

use crate::uint::U256;
use crate::{Result, TypesError, H160};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;

/// A 160-bit account address.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Address(H160);

impl Address {
    pub const ZERO: Address = Address(H160::zero());

    pub fn zero() -> Self {
        Self::ZERO
    }

    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Address(H160::from(bytes))
    }

    pub fn from_slice(slice: &[u8]) -> Result<Self> {
        if slice.len() != 20 {
            return Err(TypesError::InvalidLength {
                expected: 20,
                actual: slice.len(),
            });
        }
        Ok(Address(H160::from_slice(slice)))
    }

    /// Truncate a 256-bit word to an address, keeping the low 160 bits.
    pub fn from_word(word: U256) -> Self {
        let mut bytes = [0u8; 32];
        word.to_big_endian(&mut bytes);
        let mut addr = [0u8; 20];
        addr.copy_from_slice(&bytes[12..]);
        Address::from_bytes(addr)
    }

    /// Zero-extend the address into a 256-bit word.
    pub fn to_word(&self) -> U256 {
        U256::from_big_endian(self.0.as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn to_bytes(&self) -> [u8; 20] {
        self.0.to_fixed_bytes()
    }

    /// EIP-55 mixed-case checksum encoding.
    pub fn checksum(&self) -> String {
        let address_hex = hex::encode(self.0.as_bytes());
        let hash = Keccak256::digest(address_hex.as_bytes());

        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, ch) in address_hex.chars().enumerate() {
            let nibble = (hash[i / 2] >> (4 * (1 - i % 2))) & 0xf;
            if nibble >= 8 {
                out.push(ch.to_ascii_uppercase());
            } else {
                out.push(ch);
            }
        }
        out
    }
}

impl FromStr for Address {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        if stripped.len() != 40 {
            return Err(TypesError::InvalidLength {
                expected: 40,
                actual: stripped.len(),
            });
        }

        let bytes =
            hex::decode(stripped).map_err(|_| TypesError::InvalidHex(stripped.to_string()))?;
        let mut array = [0u8; 20];
        array.copy_from_slice(&bytes);
        let addr = Address::from_bytes(array);

        // Mixed-case input must carry a valid EIP-55 checksum.
        if stripped.chars().any(|c| c.is_uppercase())
            && stripped.chars().any(|c| c.is_lowercase())
            && addr.checksum()[2..] != *stripped
        {
            return Err(TypesError::InvalidChecksum);
        }

        Ok(addr)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.checksum())
    }
}

impl fmt::LowerHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0.as_bytes()))
    }
}

impl From<H160> for Address {
    fn from(hash: H160) -> Self {
        Address(hash)
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Address::from_bytes(bytes)
    }
}

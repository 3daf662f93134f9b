use crate::hash::H256;
use primitive_types::{U256 as PrimitiveU256, U512 as PrimitiveU512};

pub type U256 = PrimitiveU256;
pub type U512 = PrimitiveU512;

/// EVM-flavoured conversions on the 256-bit word.
pub trait WordExt: Sized {
    fn to_h256(&self) -> H256;
    fn from_h256(hash: &H256) -> Self;
}

impl WordExt for U256 {
    fn to_h256(&self) -> H256 {
        let mut bytes = [0u8; 32];
        self.to_big_endian(&mut bytes);
        H256::from(bytes)
    }

    fn from_h256(hash: &H256) -> Self {
        U256::from_big_endian(hash.as_bytes())
    }
}

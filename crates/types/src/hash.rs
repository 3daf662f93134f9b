use primitive_types::{H160 as PrimitiveH160, H256 as PrimitiveH256};

pub type H160 = PrimitiveH160;
pub type H256 = PrimitiveH256;

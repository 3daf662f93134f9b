//! Gas constants and cost helpers for dynamic (non-table) charges.

use crate::revision::Revision;

/// EIP-2929 access-list costs. The warm cost is the instruction table's base
/// cost from Berlin on; the cold surcharges are applied dynamically.
pub const WARM_STORAGE_READ_COST: i64 = 100;
pub const COLD_SLOAD_COST: i64 = 2100;
pub const COLD_ACCOUNT_ACCESS_COST: i64 = 2600;
pub const ADDITIONAL_COLD_SLOAD_COST: i64 = COLD_SLOAD_COST - WARM_STORAGE_READ_COST;
pub const ADDITIONAL_COLD_ACCOUNT_ACCESS_COST: i64 =
    COLD_ACCOUNT_ACCESS_COST - WARM_STORAGE_READ_COST;

/// Charged when a call transfers a nonzero value.
pub const CALL_VALUE_COST: i64 = 9000;
/// Gas gifted to the callee of a value transfer, and the SSTORE reserve
/// below which the opcode refuses to run (EIP-2200).
pub const CALL_STIPEND: i64 = 2300;
/// Charged when a call or selfdestruct brings a new account into existence.
pub const ACCOUNT_CREATION_COST: i64 = 25000;

pub const COPY_WORD_COST: i64 = 3;
pub const KECCAK256_WORD_COST: i64 = 6;
pub const LOG_DATA_COST: i64 = 8;

/// SELFDESTRUCT refund, removed in London (EIP-3529).
pub const SELFDESTRUCT_REFUND: i64 = 24000;

/// EIP-3860 init code limit and per-word cost (Shanghai).
pub const MAX_INIT_CODE_SIZE: usize = 0xC000;
pub const INIT_CODE_WORD_COST: i64 = 2;
/// CREATE2 hashing cost per init code word.
pub const CREATE2_HASH_WORD_COST: i64 = 6;

pub const MAX_CALL_DEPTH: i32 = 1024;

/// Number of 32-byte words needed to cover `byte_count` bytes.
pub fn num_words(byte_count: usize) -> i64 {
    ((byte_count + 31) / 32) as i64
}

/// Total cost of a memory of `words` words: `3·w + ⌊w²/512⌋`. Expansion is
/// charged as the difference of this value at the new and old sizes.
pub fn memory_cost(words: i64) -> i64 {
    3 * words + words * words / 512
}

/// EXP charges per significant byte of the exponent; repriced by EIP-160.
pub fn exp_byte_cost(rev: Revision) -> i64 {
    if rev >= Revision::SpuriousDragon {
        50
    } else {
        10
    }
}

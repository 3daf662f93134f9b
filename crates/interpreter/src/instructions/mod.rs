//! Opcode implementations. The dispatch loop has already performed the
//! pre-flight checks (defined, base gas, stack bounds) by the time a routine
//! runs; routines charge only their dynamic costs.

pub mod calls;
pub mod environment;
pub mod storage;

use crate::arith;
use crate::error::{EvmResult, StatusCode};
use crate::gas::{
    ADDITIONAL_COLD_ACCOUNT_ACCESS_COST, COPY_WORD_COST, KECCAK256_WORD_COST,
};
use crate::host::{AccessStatus, Host};
use crate::revision::Revision;
use crate::state::ExecutionState;
use evm_types::{Address, U256};

/// Berlin cold-account surcharge on top of the warm base cost. The query
/// itself marks the address warm.
pub(crate) fn charge_account_access<H: Host>(
    state: &mut ExecutionState<H>,
    address: &Address,
) -> EvmResult<()> {
    if state.rev >= Revision::Berlin
        && state.host.access_account(address) == AccessStatus::Cold
    {
        state.consume_gas(ADDITIONAL_COLD_ACCOUNT_ACCESS_COST)?;
    }
    Ok(())
}

fn bool_to_word(v: bool) -> U256 {
    if v {
        U256::one()
    } else {
        U256::zero()
    }
}

// Arithmetic.

pub fn add<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let a = state.stack.pop()?;
    let b = state.stack.pop()?;
    state.stack.push(a.overflowing_add(b).0)
}

pub fn mul<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let a = state.stack.pop()?;
    let b = state.stack.pop()?;
    state.stack.push(a.overflowing_mul(b).0)
}

pub fn sub<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let a = state.stack.pop()?;
    let b = state.stack.pop()?;
    state.stack.push(a.overflowing_sub(b).0)
}

pub fn div<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let a = state.stack.pop()?;
    let b = state.stack.pop()?;
    state.stack.push(arith::div(a, b))
}

pub fn sdiv<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let a = state.stack.pop()?;
    let b = state.stack.pop()?;
    state.stack.push(arith::sdiv(a, b))
}

pub fn modulo<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let a = state.stack.pop()?;
    let b = state.stack.pop()?;
    state.stack.push(arith::rem(a, b))
}

pub fn smod<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let a = state.stack.pop()?;
    let b = state.stack.pop()?;
    state.stack.push(arith::smod(a, b))
}

pub fn addmod<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let a = state.stack.pop()?;
    let b = state.stack.pop()?;
    let m = state.stack.pop()?;
    state.stack.push(arith::addmod(a, b, m))
}

pub fn mulmod<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let a = state.stack.pop()?;
    let b = state.stack.pop()?;
    let m = state.stack.pop()?;
    state.stack.push(arith::mulmod(a, b, m))
}

pub fn exp<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let base = state.stack.pop()?;
    let exponent = state.stack.pop()?;
    let byte_cost = crate::gas::exp_byte_cost(state.rev);
    state.consume_gas(byte_cost * arith::exponent_bytes(exponent) as i64)?;
    state.stack.push(base.overflowing_pow(exponent).0)
}

pub fn signextend<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let b = state.stack.pop()?;
    let x = state.stack.pop()?;
    state.stack.push(arith::signextend(b, x))
}

// Comparison and bitwise.

pub fn lt<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let a = state.stack.pop()?;
    let b = state.stack.pop()?;
    state.stack.push(bool_to_word(a < b))
}

pub fn gt<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let a = state.stack.pop()?;
    let b = state.stack.pop()?;
    state.stack.push(bool_to_word(a > b))
}

pub fn slt<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let a = state.stack.pop()?;
    let b = state.stack.pop()?;
    state.stack.push(bool_to_word(arith::slt(a, b)))
}

pub fn sgt<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let a = state.stack.pop()?;
    let b = state.stack.pop()?;
    state.stack.push(bool_to_word(arith::sgt(a, b)))
}

pub fn eq<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let a = state.stack.pop()?;
    let b = state.stack.pop()?;
    state.stack.push(bool_to_word(a == b))
}

pub fn iszero<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let a = state.stack.pop()?;
    state.stack.push(bool_to_word(a.is_zero()))
}

pub fn and<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let a = state.stack.pop()?;
    let b = state.stack.pop()?;
    state.stack.push(a & b)
}

pub fn or<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let a = state.stack.pop()?;
    let b = state.stack.pop()?;
    state.stack.push(a | b)
}

pub fn xor<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let a = state.stack.pop()?;
    let b = state.stack.pop()?;
    state.stack.push(a ^ b)
}

pub fn not<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let a = state.stack.pop()?;
    state.stack.push(!a)
}

pub fn byte<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let i = state.stack.pop()?;
    let x = state.stack.pop()?;
    state.stack.push(arith::byte(i, x))
}

pub fn shl<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let shift = state.stack.pop()?;
    let value = state.stack.pop()?;
    state.stack.push(arith::shl(shift, value))
}

pub fn shr<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let shift = state.stack.pop()?;
    let value = state.stack.pop()?;
    state.stack.push(arith::shr(shift, value))
}

pub fn sar<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let shift = state.stack.pop()?;
    let value = state.stack.pop()?;
    state.stack.push(arith::sar(shift, value))
}

pub fn keccak256<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let offset = state.stack.pop()?;
    let size = state.stack.pop()?;
    let region = state.memory_region(offset, size)?;
    state.consume_gas(KECCAK256_WORD_COST * crate::gas::num_words(region.size))?;
    let hash = evm_crypto::keccak256(state.memory.slice(region.offset, region.size));
    state.stack.push(U256::from_big_endian(hash.as_bytes()))
}

// Memory.

pub fn mload<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let offset = state.stack.pop()?;
    let region = state.memory_region(offset, U256::from(32))?;
    let value = state.memory.read_word(region.offset);
    state.stack.push(value)
}

pub fn mstore<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let offset = state.stack.pop()?;
    let value = state.stack.pop()?;
    let region = state.memory_region(offset, U256::from(32))?;
    state.memory.write_word(region.offset, value);
    Ok(())
}

pub fn mstore8<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let offset = state.stack.pop()?;
    let value = state.stack.pop()?;
    let region = state.memory_region(offset, U256::one())?;
    state.memory.write_byte(region.offset, value.byte(0));
    Ok(())
}

pub fn msize<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    state.stack.push(U256::from(state.memory.len()))
}

/// MCOPY (EIP-5656): overlapping copy within memory.
pub fn mcopy<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let dst = state.stack.pop()?;
    let src = state.stack.pop()?;
    let size = state.stack.pop()?;
    let dst_region = state.memory_region(dst, size)?;
    let src_region = state.memory_region(src, size)?;
    state.consume_gas(COPY_WORD_COST * crate::gas::num_words(dst_region.size))?;
    if dst_region.size > 0 {
        state
            .memory
            .copy_within(dst_region.offset, src_region.offset, dst_region.size);
    }
    Ok(())
}

// Control flow.

fn jump_target<H: Host>(state: &ExecutionState<H>, dst: U256) -> EvmResult<usize> {
    // The bitmap covers the original code only; anything past it, including
    // the padding, is not a destination.
    if dst >= U256::from(state.analysis.code_size()) {
        return Err(StatusCode::BadJumpDestination);
    }
    let dst = dst.as_usize();
    if !state.analysis.is_jumpdest(dst) {
        return Err(StatusCode::BadJumpDestination);
    }
    Ok(dst)
}

pub fn jump<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<usize> {
    let dst = state.stack.pop()?;
    jump_target(state, dst)
}

pub fn jumpi<H: Host>(state: &mut ExecutionState<H>, pc: usize) -> EvmResult<usize> {
    let dst = state.stack.pop()?;
    let condition = state.stack.pop()?;
    if condition.is_zero() {
        Ok(pc + 1)
    } else {
        jump_target(state, dst)
    }
}

pub fn pc<H: Host>(state: &mut ExecutionState<H>, pc: usize) -> EvmResult<()> {
    state.stack.push(U256::from(pc))
}

/// Pushes the gas remaining after the base cost of GAS itself.
pub fn gas<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    state.stack.push(U256::from(state.gas_left as u64))
}

// Stack manipulation.

pub fn pop<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    state.stack.pop()?;
    Ok(())
}

pub fn push0<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    state.stack.push(U256::zero())
}

/// PUSH1..PUSH32: read the `n`-byte big-endian immediate following the
/// opcode. The code buffer is padded, so a trailing PUSH reads zeros.
/// Returns the next program counter.
pub fn push<H: Host>(
    state: &mut ExecutionState<H>,
    code: &[u8],
    pc: usize,
    n: usize,
) -> EvmResult<usize> {
    let immediate = &code[pc + 1..pc + 1 + n];
    state.stack.push(U256::from_big_endian(immediate))?;
    Ok(pc + 1 + n)
}

pub fn dup<H: Host>(state: &mut ExecutionState<H>, n: usize) -> EvmResult<()> {
    state.stack.dup(n)
}

pub fn swap<H: Host>(state: &mut ExecutionState<H>, n: usize) -> EvmResult<()> {
    state.stack.swap(n)
}

// Frame output.

/// Shared tail of RETURN and REVERT: capture the output region.
pub fn capture_output<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let offset = state.stack.pop()?;
    let size = state.stack.pop()?;
    let region = state.memory_region(offset, size)?;
    state.output_offset = region.offset;
    state.output_size = region.size;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::host::Message;
    use crate::mocked::MockedHost;

    fn with_state<F: FnOnce(&mut ExecutionState<'_, MockedHost>)>(code: &[u8], f: F) {
        let msg = Message {
            gas: 1_000_000,
            ..Message::default()
        };
        let analysis = analyze(code);
        let mut host = MockedHost::default();
        let mut state =
            ExecutionState::new(&msg, Revision::LATEST, &mut host, code, &analysis);
        f(&mut state);
    }

    #[test]
    fn test_push_reads_padded_immediate() {
        // PUSH4 with only two immediate bytes in the code.
        let code = [0x63, 0xaa, 0xbb];
        with_state(&code, |state| {
            let analysis = analyze(&code);
            let next = push(state, analysis.padded_code(), 0, 4).unwrap();
            assert_eq!(next, 5);
            assert_eq!(state.stack.pop().unwrap(), U256::from(0xaabb0000_u64));
        });
    }

    #[test]
    fn test_push32_full_immediate() {
        let mut code = vec![0x7f];
        code.extend(1..=32u8);
        with_state(&code, |state| {
            let analysis = analyze(&code);
            push(state, analysis.padded_code(), 0, 32).unwrap();
            let expected: Vec<u8> = (1..=32).collect();
            assert_eq!(state.stack.pop().unwrap(), U256::from_big_endian(&expected));
        });
    }

    #[test]
    fn test_jump_rejects_push_data_target() {
        // PUSH1 0x5b, STOP: offset 1 holds 0x5b but is immediate data.
        let code = [0x60, 0x5b, 0x00];
        with_state(&code, |state| {
            state.stack.push(U256::one()).unwrap();
            assert_eq!(jump(state).unwrap_err(), StatusCode::BadJumpDestination);
        });
    }

    #[test]
    fn test_jump_rejects_padding_target() {
        // The STOP padding after the code must not be jumpable even though
        // a 0x5b there would never exist; target == code_size is invalid.
        let code = [0x5b];
        with_state(&code, |state| {
            state.stack.push(U256::from(1)).unwrap();
            assert_eq!(jump(state).unwrap_err(), StatusCode::BadJumpDestination);
            state.stack.push(U256::zero()).unwrap();
            assert_eq!(jump(state).unwrap(), 0);
        });
    }

    #[test]
    fn test_jumpi_falls_through_on_zero() {
        let code = [0x5b, 0x00];
        with_state(&code, |state| {
            state.stack.push(U256::zero()).unwrap(); // condition
            state.stack.push(U256::from(99)).unwrap(); // bogus destination
            // With a zero condition even an invalid target is accepted.
            assert_eq!(jumpi(state, 5).unwrap(), 6);
        });
    }

    #[test]
    fn test_mstore8_writes_low_byte() {
        with_state(&[], |state| {
            state.stack.push(U256::from(0x1234_u64)).unwrap();
            state.stack.push(U256::from(3)).unwrap();
            mstore8(state).unwrap();
            assert_eq!(state.memory.len(), 32);
            assert_eq!(state.memory.slice(3, 1), &[0x34]);
        });
    }

    #[test]
    fn test_msize_is_word_aligned() {
        with_state(&[], |state| {
            state.stack.push(U256::one()).unwrap();
            state.stack.push(U256::from(100)).unwrap();
            mstore8(state).unwrap();
            msize(state).unwrap();
            assert_eq!(state.stack.pop().unwrap(), U256::from(128));
        });
    }

    #[test]
    fn test_mcopy_charges_words_and_copies() {
        with_state(&[], |state| {
            state.stack.push(U256::from(0x42)).unwrap();
            state.stack.push(U256::zero()).unwrap();
            mstore(state).unwrap();
            let gas_before = state.gas_left;
            // MCOPY dst=32 src=0 size=32 (dst popped first).
            state.stack.push(U256::from(32)).unwrap();
            state.stack.push(U256::zero()).unwrap();
            state.stack.push(U256::from(32)).unwrap();
            mcopy(state).unwrap();
            assert_eq!(state.memory.read_word(32), U256::from(0x42));
            // One word of expansion (3) plus one word of copy (3).
            assert_eq!(gas_before - state.gas_left, 6);
        });
    }

    #[test]
    fn test_exp_dynamic_cost() {
        with_state(&[], |state| {
            let gas_before = state.gas_left;
            state.stack.push(U256::from(0x100)).unwrap(); // exponent, 2 bytes
            state.stack.push(U256::from(2)).unwrap(); // base
            exp(state).unwrap();
            assert_eq!(gas_before - state.gas_left, 2 * 50);
            // 2^256 wraps to zero.
            assert_eq!(state.stack.pop().unwrap(), U256::zero());
        });
    }
}

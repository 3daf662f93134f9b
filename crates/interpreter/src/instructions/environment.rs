//! Opcodes reading the message, the transaction/block context, and account
//! state through the host.

use crate::error::{EvmResult, StatusCode};
use crate::gas::{num_words, COPY_WORD_COST, LOG_DATA_COST};
use crate::host::Host;
use crate::instructions::charge_account_access;
use crate::state::ExecutionState;
use evm_types::{Address, H256, U256, WordExt};

pub fn address<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let word = state.msg.recipient.to_word();
    state.stack.push(word)
}

pub fn origin<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let word = state.tx_context().origin.to_word();
    state.stack.push(word)
}

pub fn caller<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let word = state.msg.sender.to_word();
    state.stack.push(word)
}

pub fn callvalue<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let value = state.msg.value;
    state.stack.push(value)
}

pub fn calldataload<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let index = state.stack.pop()?;
    let input = &state.msg.input_data;

    let word = if index >= U256::from(input.len()) {
        U256::zero()
    } else {
        let begin = index.as_usize();
        let end = std::cmp::min(begin + 32, input.len());
        let mut buffer = [0u8; 32];
        buffer[..end - begin].copy_from_slice(&input[begin..end]);
        U256::from_big_endian(&buffer)
    };
    state.stack.push(word)
}

pub fn calldatasize<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let size = state.msg.input_data.len();
    state.stack.push(U256::from(size))
}

pub fn calldatacopy<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let msg = state.msg;
    copy_from_buffer(state, &msg.input_data)
}

pub fn codesize<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    state.stack.push(U256::from(state.code.len()))
}

pub fn codecopy<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let code = state.code;
    copy_from_buffer(state, code)
}

/// CALLDATACOPY/CODECOPY: copy with zero fill past the end of the source.
fn copy_from_buffer<H: Host>(state: &mut ExecutionState<H>, source: &[u8]) -> EvmResult<()> {
    let mem_offset = state.stack.pop()?;
    let src_offset = state.stack.pop()?;
    let size = state.stack.pop()?;

    let region = state.memory_region(mem_offset, size)?;
    state.consume_gas(COPY_WORD_COST * num_words(region.size))?;

    if region.size > 0 {
        let src = if src_offset > U256::from(source.len()) {
            source.len()
        } else {
            src_offset.as_usize()
        };
        let copy_size = std::cmp::min(region.size, source.len() - src);
        let dst = state.memory.slice_mut(region.offset, region.size);
        dst[..copy_size].copy_from_slice(&source[src..src + copy_size]);
        dst[copy_size..].fill(0);
    }
    Ok(())
}

pub fn gasprice<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let price = state.tx_context().gas_price;
    state.stack.push(price)
}

pub fn balance<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let addr = Address::from_word(state.stack.pop()?);
    charge_account_access(state, &addr)?;
    let balance = state.host.get_balance(&addr);
    state.stack.push(balance)
}

pub fn selfbalance<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let balance = state.host.get_balance(&state.msg.recipient);
    state.stack.push(balance)
}

pub fn extcodesize<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let addr = Address::from_word(state.stack.pop()?);
    charge_account_access(state, &addr)?;
    let size = state.host.get_code_size(&addr);
    state.stack.push(U256::from(size))
}

pub fn extcodehash<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let addr = Address::from_word(state.stack.pop()?);
    charge_account_access(state, &addr)?;
    let hash = state.host.get_code_hash(&addr);
    state.stack.push(U256::from_h256(&hash))
}

pub fn extcodecopy<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let addr = Address::from_word(state.stack.pop()?);
    let mem_offset = state.stack.pop()?;
    let src_offset = state.stack.pop()?;
    let size = state.stack.pop()?;

    let region = state.memory_region(mem_offset, size)?;
    state.consume_gas(COPY_WORD_COST * num_words(region.size))?;
    charge_account_access(state, &addr)?;

    if region.size > 0 {
        let src = if src_offset > U256::from(usize::MAX as u64) {
            usize::MAX
        } else {
            src_offset.as_usize()
        };
        let host = &*state.host;
        let dst = state.memory.slice_mut(region.offset, region.size);
        let copied = host.copy_code(&addr, src, dst);
        dst[copied..].fill(0);
    }
    Ok(())
}

pub fn returndatasize<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let size = state.return_data.len();
    state.stack.push(U256::from(size))
}

pub fn returndatacopy<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let mem_offset = state.stack.pop()?;
    let src_offset = state.stack.pop()?;
    let size = state.stack.pop()?;

    let region = state.memory_region(mem_offset, size)?;

    // Reading past the buffer is an error, not zero fill (EIP-211). The
    // first comparison is overflow-safe on the full 256-bit offset.
    if src_offset > U256::from(state.return_data.len()) {
        return Err(StatusCode::InvalidMemoryAccess);
    }
    let src = src_offset.as_usize();
    if src + region.size > state.return_data.len() {
        return Err(StatusCode::InvalidMemoryAccess);
    }

    state.consume_gas(COPY_WORD_COST * num_words(region.size))?;

    if region.size > 0 {
        let dst = state.memory.slice_mut(region.offset, region.size);
        dst.copy_from_slice(&state.return_data[src..src + region.size]);
    }
    Ok(())
}

// Block context.

pub fn blockhash<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let number = state.stack.pop()?;
    let upper = state.tx_context().block_number;
    let lower = std::cmp::max(upper - 256, 0);

    let hash = if number < U256::from(upper as u64) && number >= U256::from(lower as u64) {
        state.host.get_block_hash(number.low_u64() as i64)
    } else {
        H256::zero()
    };
    state.stack.push(U256::from_h256(&hash))
}

pub fn coinbase<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let word = state.tx_context().coinbase.to_word();
    state.stack.push(word)
}

pub fn timestamp<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let timestamp = state.tx_context().timestamp;
    state.stack.push(U256::from(timestamp as u64))
}

pub fn number<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let number = state.tx_context().block_number;
    state.stack.push(U256::from(number as u64))
}

/// DIFFICULTY before Paris, PREVRANDAO after; the host serves both through
/// the same context field.
pub fn prevrandao<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let value = state.tx_context().prev_randao;
    state.stack.push(value)
}

pub fn gaslimit<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let limit = state.tx_context().gas_limit;
    state.stack.push(U256::from(limit as u64))
}

pub fn chainid<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let id = state.tx_context().chain_id;
    state.stack.push(id)
}

pub fn basefee<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let fee = state.tx_context().base_fee;
    state.stack.push(fee)
}

/// BLOBHASH (EIP-4844): versioned hash of the indexed transaction blob.
pub fn blobhash<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let index = state.stack.pop()?;
    let hash = {
        let hashes = &state.tx_context().blob_hashes;
        if index < U256::from(hashes.len()) {
            hashes[index.as_usize()]
        } else {
            H256::zero()
        }
    };
    state.stack.push(U256::from_h256(&hash))
}

pub fn blobbasefee<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let fee = state.tx_context().blob_base_fee;
    state.stack.push(fee)
}

// Logs.

pub fn log<H: Host>(state: &mut ExecutionState<H>, num_topics: usize) -> EvmResult<()> {
    if state.in_static_mode() {
        return Err(StatusCode::StaticModeViolation);
    }

    let offset = state.stack.pop()?;
    let size = state.stack.pop()?;
    let region = state.memory_region(offset, size)?;
    state.consume_gas(LOG_DATA_COST * region.size as i64)?;

    let mut topics = [H256::zero(); 4];
    for topic in topics.iter_mut().take(num_topics) {
        *topic = state.stack.pop()?.to_h256();
    }

    let recipient = state.msg.recipient;
    state.host.emit_log(
        &recipient,
        state.memory.slice(region.offset, region.size),
        &topics[..num_topics],
    );
    Ok(())
}

//! Sub-call and contract-creation opcodes, and SELFDESTRUCT. Nested frames
//! are executed by the host; this module computes costs, builds the outgoing
//! message, and plumbs the result back into the caller's state.

use crate::error::{EvmResult, StatusCode};
use crate::gas::{
    num_words, ACCOUNT_CREATION_COST, CALL_STIPEND, CALL_VALUE_COST, COLD_ACCOUNT_ACCESS_COST,
    CREATE2_HASH_WORD_COST, INIT_CODE_WORD_COST, MAX_CALL_DEPTH, MAX_INIT_CODE_SIZE,
    SELFDESTRUCT_REFUND,
};
use crate::host::{AccessStatus, CallKind, Host, Message};
use crate::instructions::charge_account_access;
use crate::opcode;
use crate::revision::Revision;
use crate::state::ExecutionState;
use evm_types::{Address, H256, U256, WordExt};

/// CALL, CALLCODE, DELEGATECALL and STATICCALL. `OP` selects the variant at
/// compile time, the way the dispatch table separates them.
pub fn call<H: Host, const OP: u8>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let gas_limit = state.stack.pop()?;
    let dst = Address::from_word(state.stack.pop()?);
    let value = if OP == opcode::CALL || OP == opcode::CALLCODE {
        state.stack.pop()?
    } else {
        U256::zero()
    };
    let has_value = !value.is_zero();
    let input_offset = state.stack.pop()?;
    let input_size = state.stack.pop()?;
    let output_offset = state.stack.pop()?;
    let output_size = state.stack.pop()?;

    // Failure is the default result; the slot is rewritten on success.
    state.stack.push(U256::zero())?;
    state.return_data.clear();

    charge_account_access(state, &dst)?;

    let input = state.memory_region(input_offset, input_size)?;
    let output = state.memory_region(output_offset, output_size)?;

    let mut cost: i64 = if has_value { CALL_VALUE_COST } else { 0 };
    if OP == opcode::CALL {
        if has_value && state.in_static_mode() {
            // Value transfer cannot happen in a static frame; the caller
            // sees a failed call and continues.
            return Ok(());
        }
        if (has_value || state.rev < Revision::SpuriousDragon)
            && !state.host.account_exists(&dst)
        {
            cost += ACCOUNT_CREATION_COST;
        }
    }
    state.consume_gas(cost)?;

    // The callee receives the requested gas, capped by the 63/64 retention
    // rule from Tangerine Whistle on.
    let mut gas = if gas_limit < U256::from(i64::MAX as u64) {
        gas_limit.low_u64() as i64
    } else {
        i64::MAX
    };
    if state.rev >= Revision::TangerineWhistle {
        gas = std::cmp::min(gas, state.gas_left - state.gas_left / 64);
    } else if gas > state.gas_left {
        return Err(StatusCode::OutOfGas);
    }

    let mut msg = Message {
        kind: match OP {
            opcode::CALLCODE => CallKind::CallCode,
            opcode::DELEGATECALL => CallKind::DelegateCall,
            _ => CallKind::Call,
        },
        is_static: OP == opcode::STATICCALL || state.msg.is_static,
        depth: state.msg.depth + 1,
        gas,
        recipient: if OP == opcode::CALL || OP == opcode::STATICCALL {
            dst
        } else {
            state.msg.recipient
        },
        sender: if OP == opcode::DELEGATECALL {
            state.msg.sender
        } else {
            state.msg.recipient
        },
        input_data: state.memory.slice(input.offset, input.size).to_vec(),
        value: if OP == opcode::DELEGATECALL {
            state.msg.value
        } else {
            value
        },
        create2_salt: H256::zero(),
        code_address: dst,
    };

    if has_value {
        // The callee always has the stipend to run on; the caller is
        // credited so the transfer itself cannot drive it out of gas.
        msg.gas += CALL_STIPEND;
        state.gas_left += CALL_STIPEND;
    }

    if state.msg.depth >= MAX_CALL_DEPTH {
        return Ok(());
    }
    if has_value && state.host.get_balance(&state.msg.recipient) < value {
        return Ok(());
    }

    let result = state.host.call(&msg);
    state.return_data = result.output;

    if result.status == StatusCode::Success {
        *state.stack.top_mut()? = U256::one();
    }

    let copy_size = std::cmp::min(output.size, state.return_data.len());
    if copy_size > 0 {
        state
            .memory
            .slice_mut(output.offset, copy_size)
            .copy_from_slice(&state.return_data[..copy_size]);
    }

    state.gas_left -= msg.gas - result.gas_left;
    state.gas_refund += result.gas_refund;
    Ok(())
}

/// CREATE and CREATE2.
pub fn create<H: Host, const OP: u8>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    if state.in_static_mode() {
        return Err(StatusCode::StaticModeViolation);
    }

    let endowment = state.stack.pop()?;
    let init_offset = state.stack.pop()?;
    let init_size = state.stack.pop()?;
    let salt = if OP == opcode::CREATE2 {
        state.stack.pop()?.to_h256()
    } else {
        H256::zero()
    };

    state.stack.push(U256::zero())?;
    state.return_data.clear();

    let init = state.memory_region(init_offset, init_size)?;

    if state.rev >= Revision::Shanghai && init.size > MAX_INIT_CODE_SIZE {
        return Err(StatusCode::OutOfGas);
    }
    let word_cost = if OP == opcode::CREATE2 {
        CREATE2_HASH_WORD_COST
    } else {
        0
    } + if state.rev >= Revision::Shanghai {
        INIT_CODE_WORD_COST
    } else {
        0
    };
    state.consume_gas(word_cost * num_words(init.size))?;

    if state.msg.depth >= MAX_CALL_DEPTH {
        return Ok(());
    }
    if !endowment.is_zero() && state.host.get_balance(&state.msg.recipient) < endowment {
        return Ok(());
    }

    let mut gas = state.gas_left;
    if state.rev >= Revision::TangerineWhistle {
        gas -= gas / 64;
    }

    let msg = Message {
        kind: if OP == opcode::CREATE2 {
            CallKind::Create2
        } else {
            CallKind::Create
        },
        is_static: false,
        depth: state.msg.depth + 1,
        gas,
        recipient: Address::ZERO,
        sender: state.msg.recipient,
        input_data: state.memory.slice(init.offset, init.size).to_vec(),
        value: endowment,
        create2_salt: salt,
        code_address: Address::ZERO,
    };

    let result = state.host.call(&msg);
    state.gas_refund += result.gas_refund;
    state.return_data = result.output;

    if result.status == StatusCode::Success {
        let created = result.create_address.unwrap_or(Address::ZERO);
        *state.stack.top_mut()? = created.to_word();
    }

    state.gas_left -= msg.gas - result.gas_left;
    Ok(())
}

/// SELFDESTRUCT terminates the frame; the interpreter reports success and
/// the host performs the balance sweep and destruction bookkeeping.
pub fn selfdestruct<H: Host>(state: &mut ExecutionState<H>) -> StatusCode {
    match selfdestruct_impl(state) {
        Ok(()) => StatusCode::Success,
        Err(status) => status,
    }
}

fn selfdestruct_impl<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    if state.in_static_mode() {
        return Err(StatusCode::StaticModeViolation);
    }

    let beneficiary = Address::from_word(state.stack.pop()?);

    if state.rev >= Revision::Berlin
        && state.host.access_account(&beneficiary) == AccessStatus::Cold
    {
        state.consume_gas(COLD_ACCOUNT_ACCESS_COST)?;
    }

    if state.rev >= Revision::TangerineWhistle
        && (state.rev == Revision::TangerineWhistle
            || !state.host.get_balance(&state.msg.recipient).is_zero())
        && !state.host.account_exists(&beneficiary)
    {
        // Sweeping a balance into a fresh account pays for its creation.
        state.consume_gas(ACCOUNT_CREATION_COST)?;
    }

    let recipient = state.msg.recipient;
    if state.host.selfdestruct(&recipient, &beneficiary) && state.rev < Revision::London {
        state.gas_refund += SELFDESTRUCT_REFUND;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::mocked::{MockedAccount, MockedHost};
    use crate::opcode;

    fn make_host() -> MockedHost {
        let mut host = MockedHost::default();
        host.accounts
            .insert(Address::from_bytes([0xcc; 20]), MockedAccount::default());
        host
    }

    fn push_call_args<H: Host>(
        state: &mut ExecutionState<H>,
        gas: u64,
        dst: Address,
        value: u64,
    ) {
        // Pushed bottom-up: out_size, out_offset, in_size, in_offset,
        // value, dst, gas.
        state.stack.push(U256::zero()).unwrap();
        state.stack.push(U256::zero()).unwrap();
        state.stack.push(U256::zero()).unwrap();
        state.stack.push(U256::zero()).unwrap();
        state.stack.push(U256::from(value)).unwrap();
        state.stack.push(dst.to_word()).unwrap();
        state.stack.push(U256::from(gas)).unwrap();
    }

    #[test]
    fn test_depth_limit_is_light_failure() {
        let code: [u8; 0] = [];
        let analysis = analyze(&code);
        let msg = Message {
            gas: 100_000,
            depth: MAX_CALL_DEPTH,
            ..Message::default()
        };
        let mut host = make_host();
        let mut state =
            ExecutionState::new(&msg, Revision::LATEST, &mut host, &code, &analysis);

        push_call_args(&mut state, 0, Address::from_bytes([0xcc; 20]), 0);
        call::<_, { opcode::CALL }>(&mut state).unwrap();

        assert_eq!(state.stack.pop().unwrap(), U256::zero());
        assert!(state.host.recorded_calls.is_empty());
    }

    #[test]
    fn test_insufficient_balance_is_light_failure() {
        let code: [u8; 0] = [];
        let analysis = analyze(&code);
        let msg = Message {
            gas: 100_000,
            ..Message::default()
        };
        let mut host = make_host();
        let mut state =
            ExecutionState::new(&msg, Revision::LATEST, &mut host, &code, &analysis);

        push_call_args(&mut state, 0, Address::from_bytes([0xcc; 20]), 5);
        call::<_, { opcode::CALL }>(&mut state).unwrap();

        assert_eq!(state.stack.pop().unwrap(), U256::zero());
        assert!(state.host.recorded_calls.is_empty());
    }

    #[test]
    fn test_static_value_transfer_is_light_failure() {
        let code: [u8; 0] = [];
        let analysis = analyze(&code);
        let msg = Message {
            gas: 100_000,
            is_static: true,
            ..Message::default()
        };
        let mut host = make_host();
        let mut state =
            ExecutionState::new(&msg, Revision::LATEST, &mut host, &code, &analysis);

        push_call_args(&mut state, 0, Address::from_bytes([0xcc; 20]), 1);
        call::<_, { opcode::CALL }>(&mut state).unwrap();

        assert_eq!(state.stack.pop().unwrap(), U256::zero());
        assert!(state.host.recorded_calls.is_empty());
    }

    #[test]
    fn test_delegatecall_keeps_sender_and_value() {
        let code: [u8; 0] = [];
        let analysis = analyze(&code);
        let msg = Message {
            gas: 100_000,
            sender: Address::from_bytes([0x01; 20]),
            recipient: Address::from_bytes([0x02; 20]),
            value: U256::from(77),
            ..Message::default()
        };
        let mut host = make_host();
        let mut state =
            ExecutionState::new(&msg, Revision::LATEST, &mut host, &code, &analysis);

        let dst = Address::from_bytes([0xcc; 20]);
        // DELEGATECALL has no value operand.
        state.stack.push(U256::zero()).unwrap();
        state.stack.push(U256::zero()).unwrap();
        state.stack.push(U256::zero()).unwrap();
        state.stack.push(U256::zero()).unwrap();
        state.stack.push(dst.to_word()).unwrap();
        state.stack.push(U256::from(50_000)).unwrap();
        call::<_, { opcode::DELEGATECALL }>(&mut state).unwrap();

        let recorded = &state.host.recorded_calls[0];
        assert_eq!(recorded.kind, CallKind::DelegateCall);
        assert_eq!(recorded.sender, Address::from_bytes([0x01; 20]));
        assert_eq!(recorded.recipient, Address::from_bytes([0x02; 20]));
        assert_eq!(recorded.code_address, dst);
        assert_eq!(recorded.value, U256::from(77));
    }

    #[test]
    fn test_staticcall_sets_static_flag() {
        let code: [u8; 0] = [];
        let analysis = analyze(&code);
        let msg = Message {
            gas: 100_000,
            ..Message::default()
        };
        let mut host = make_host();
        let mut state =
            ExecutionState::new(&msg, Revision::LATEST, &mut host, &code, &analysis);

        let dst = Address::from_bytes([0xcc; 20]);
        state.stack.push(U256::zero()).unwrap();
        state.stack.push(U256::zero()).unwrap();
        state.stack.push(U256::zero()).unwrap();
        state.stack.push(U256::zero()).unwrap();
        state.stack.push(dst.to_word()).unwrap();
        state.stack.push(U256::from(50_000)).unwrap();
        call::<_, { opcode::STATICCALL }>(&mut state).unwrap();

        assert!(state.host.recorded_calls[0].is_static);
    }

    #[test]
    fn test_sixty_three_sixty_fourths() {
        let code: [u8; 0] = [];
        let analysis = analyze(&code);
        let msg = Message {
            gas: 100_000,
            ..Message::default()
        };
        let mut host = make_host();
        let mut state =
            ExecutionState::new(&msg, Revision::LATEST, &mut host, &code, &analysis);

        // Request far more gas than available.
        push_call_args(&mut state, u64::MAX, Address::from_bytes([0xcc; 20]), 0);
        call::<_, { opcode::CALL }>(&mut state).unwrap();

        let forwarded = state.host.recorded_calls[0].gas;
        // The first touch of the destination is cold (2500), then the cap
        // is gas_left - gas_left/64 of what remains.
        let after_access = 100_000 - 2500;
        assert_eq!(forwarded, after_access - after_access / 64);
    }

    #[test]
    fn test_create_pushes_address_on_success() {
        let code: [u8; 0] = [];
        let analysis = analyze(&code);
        let msg = Message {
            gas: 100_000,
            ..Message::default()
        };
        let created = Address::from_bytes([0xdd; 20]);
        let mut host = make_host();
        host.call_result.status = StatusCode::Success;
        host.call_result.create_address = Some(created);
        let mut state =
            ExecutionState::new(&msg, Revision::LATEST, &mut host, &code, &analysis);

        state.stack.push(U256::zero()).unwrap(); // init size
        state.stack.push(U256::zero()).unwrap(); // init offset
        state.stack.push(U256::zero()).unwrap(); // endowment
        create::<_, { opcode::CREATE }>(&mut state).unwrap();

        assert_eq!(state.stack.pop().unwrap(), created.to_word());
        assert_eq!(state.host.recorded_calls[0].kind, CallKind::Create);
    }

    #[test]
    fn test_create_in_static_frame_is_hard_failure() {
        let code: [u8; 0] = [];
        let analysis = analyze(&code);
        let msg = Message {
            gas: 100_000,
            is_static: true,
            ..Message::default()
        };
        let mut host = make_host();
        let mut state =
            ExecutionState::new(&msg, Revision::LATEST, &mut host, &code, &analysis);

        state.stack.push(U256::zero()).unwrap();
        state.stack.push(U256::zero()).unwrap();
        state.stack.push(U256::zero()).unwrap();
        assert_eq!(
            create::<_, { opcode::CREATE }>(&mut state),
            Err(StatusCode::StaticModeViolation)
        );
    }

    #[test]
    fn test_create_initcode_limit_shanghai() {
        let code: [u8; 0] = [];
        let analysis = analyze(&code);
        let msg = Message {
            gas: 10_000_000,
            ..Message::default()
        };
        let mut host = make_host();
        let mut state =
            ExecutionState::new(&msg, Revision::Shanghai, &mut host, &code, &analysis);

        state.stack.push(U256::from(MAX_INIT_CODE_SIZE + 1)).unwrap();
        state.stack.push(U256::zero()).unwrap();
        state.stack.push(U256::zero()).unwrap();
        assert_eq!(
            create::<_, { opcode::CREATE }>(&mut state),
            Err(StatusCode::OutOfGas)
        );
    }

    #[test]
    fn test_selfdestruct_refund_pre_london() {
        let code: [u8; 0] = [];
        let analysis = analyze(&code);
        let msg = Message {
            gas: 100_000,
            ..Message::default()
        };

        for (rev, expected_refund) in [(Revision::Berlin, 24000), (Revision::London, 0)] {
            let mut host = make_host();
            let mut state = ExecutionState::new(&msg, rev, &mut host, &code, &analysis);
            state
                .stack
                .push(Address::from_bytes([0xcc; 20]).to_word())
                .unwrap();
            assert_eq!(selfdestruct(&mut state), StatusCode::Success);
            assert_eq!(state.gas_refund, expected_refund);
            assert_eq!(state.host.selfdestructs.len(), 1);
        }
    }
}

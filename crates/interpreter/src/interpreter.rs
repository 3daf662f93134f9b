//! The dispatch loop. Per instruction it performs the pre-flight checks in a
//! fixed order (undefined, base gas, stack overflow, stack underflow), runs
//! the routine, and advances the program counter. The padded code guarantees
//! termination without per-iteration bounds checks: execution that runs off
//! the end lands on STOP.

use crate::error::StatusCode;
use crate::host::{ExecutionResult, Host};
use crate::instructions as instr;
use crate::opcode;
use crate::stack::STACK_LIMIT;
use crate::state::ExecutionState;
use crate::table::instruction_table;

/// Run a routine; on error, record the status and terminate the loop.
macro_rules! run_op {
    ($state:ident, $e:expr) => {
        if let Err(status) = $e {
            $state.status = status;
            break;
        }
    };
}

/// Run a control-flow routine returning the next program counter.
macro_rules! run_jump {
    ($state:ident, $pc:ident, $e:expr) => {
        match $e {
            Ok(next) => {
                $pc = next;
                continue;
            }
            Err(status) => {
                $state.status = status;
                break;
            }
        }
    };
}

pub fn run<H: Host>(state: &mut ExecutionState<H>) -> ExecutionResult {
    let analysis = state.analysis;
    let code = analysis.padded_code();
    let table = instruction_table(state.rev);

    let mut pc: usize = 0;
    loop {
        let op = code[pc];
        let info = &table[op as usize];

        if !info.is_defined() {
            state.status = StatusCode::UndefinedInstruction;
            break;
        }
        state.gas_left -= info.base_gas as i64;
        if state.gas_left < 0 {
            state.status = StatusCode::OutOfGas;
            break;
        }
        let height = state.stack.len();
        if height == STACK_LIMIT {
            if info.can_overflow {
                state.status = StatusCode::StackOverflow;
                break;
            }
        } else if height < info.stack_required as usize {
            state.status = StatusCode::StackUnderflow;
            break;
        }

        match op {
            opcode::STOP => {
                state.status = StatusCode::Success;
                break;
            }
            opcode::ADD => run_op!(state, instr::add(state)),
            opcode::MUL => run_op!(state, instr::mul(state)),
            opcode::SUB => run_op!(state, instr::sub(state)),
            opcode::DIV => run_op!(state, instr::div(state)),
            opcode::SDIV => run_op!(state, instr::sdiv(state)),
            opcode::MOD => run_op!(state, instr::modulo(state)),
            opcode::SMOD => run_op!(state, instr::smod(state)),
            opcode::ADDMOD => run_op!(state, instr::addmod(state)),
            opcode::MULMOD => run_op!(state, instr::mulmod(state)),
            opcode::EXP => run_op!(state, instr::exp(state)),
            opcode::SIGNEXTEND => run_op!(state, instr::signextend(state)),

            opcode::LT => run_op!(state, instr::lt(state)),
            opcode::GT => run_op!(state, instr::gt(state)),
            opcode::SLT => run_op!(state, instr::slt(state)),
            opcode::SGT => run_op!(state, instr::sgt(state)),
            opcode::EQ => run_op!(state, instr::eq(state)),
            opcode::ISZERO => run_op!(state, instr::iszero(state)),
            opcode::AND => run_op!(state, instr::and(state)),
            opcode::OR => run_op!(state, instr::or(state)),
            opcode::XOR => run_op!(state, instr::xor(state)),
            opcode::NOT => run_op!(state, instr::not(state)),
            opcode::BYTE => run_op!(state, instr::byte(state)),
            opcode::SHL => run_op!(state, instr::shl(state)),
            opcode::SHR => run_op!(state, instr::shr(state)),
            opcode::SAR => run_op!(state, instr::sar(state)),

            opcode::KECCAK256 => run_op!(state, instr::keccak256(state)),

            opcode::ADDRESS => run_op!(state, instr::environment::address(state)),
            opcode::BALANCE => run_op!(state, instr::environment::balance(state)),
            opcode::ORIGIN => run_op!(state, instr::environment::origin(state)),
            opcode::CALLER => run_op!(state, instr::environment::caller(state)),
            opcode::CALLVALUE => run_op!(state, instr::environment::callvalue(state)),
            opcode::CALLDATALOAD => run_op!(state, instr::environment::calldataload(state)),
            opcode::CALLDATASIZE => run_op!(state, instr::environment::calldatasize(state)),
            opcode::CALLDATACOPY => run_op!(state, instr::environment::calldatacopy(state)),
            opcode::CODESIZE => run_op!(state, instr::environment::codesize(state)),
            opcode::CODECOPY => run_op!(state, instr::environment::codecopy(state)),
            opcode::GASPRICE => run_op!(state, instr::environment::gasprice(state)),
            opcode::EXTCODESIZE => run_op!(state, instr::environment::extcodesize(state)),
            opcode::EXTCODECOPY => run_op!(state, instr::environment::extcodecopy(state)),
            opcode::RETURNDATASIZE => {
                run_op!(state, instr::environment::returndatasize(state))
            }
            opcode::RETURNDATACOPY => {
                run_op!(state, instr::environment::returndatacopy(state))
            }
            opcode::EXTCODEHASH => run_op!(state, instr::environment::extcodehash(state)),

            opcode::BLOCKHASH => run_op!(state, instr::environment::blockhash(state)),
            opcode::COINBASE => run_op!(state, instr::environment::coinbase(state)),
            opcode::TIMESTAMP => run_op!(state, instr::environment::timestamp(state)),
            opcode::NUMBER => run_op!(state, instr::environment::number(state)),
            opcode::PREVRANDAO => run_op!(state, instr::environment::prevrandao(state)),
            opcode::GASLIMIT => run_op!(state, instr::environment::gaslimit(state)),
            opcode::CHAINID => run_op!(state, instr::environment::chainid(state)),
            opcode::SELFBALANCE => run_op!(state, instr::environment::selfbalance(state)),
            opcode::BASEFEE => run_op!(state, instr::environment::basefee(state)),
            opcode::BLOBHASH => run_op!(state, instr::environment::blobhash(state)),
            opcode::BLOBBASEFEE => run_op!(state, instr::environment::blobbasefee(state)),

            opcode::POP => run_op!(state, instr::pop(state)),
            opcode::MLOAD => run_op!(state, instr::mload(state)),
            opcode::MSTORE => run_op!(state, instr::mstore(state)),
            opcode::MSTORE8 => run_op!(state, instr::mstore8(state)),
            opcode::SLOAD => run_op!(state, instr::storage::sload(state)),
            opcode::SSTORE => run_op!(state, instr::storage::sstore(state)),
            opcode::JUMP => run_jump!(state, pc, instr::jump(state)),
            opcode::JUMPI => run_jump!(state, pc, instr::jumpi(state, pc)),
            opcode::PC => run_op!(state, instr::pc(state, pc)),
            opcode::MSIZE => run_op!(state, instr::msize(state)),
            opcode::GAS => run_op!(state, instr::gas(state)),
            opcode::JUMPDEST => {}
            opcode::TLOAD => run_op!(state, instr::storage::tload(state)),
            opcode::TSTORE => run_op!(state, instr::storage::tstore(state)),
            opcode::MCOPY => run_op!(state, instr::mcopy(state)),
            opcode::PUSH0 => run_op!(state, instr::push0(state)),

            opcode::PUSH1..=opcode::PUSH32 => {
                let n = opcode::push_data_len(op);
                run_jump!(state, pc, instr::push(state, code, pc, n))
            }

            opcode::DUP1..=opcode::DUP16 => {
                run_op!(state, instr::dup(state, (op - opcode::DUP1) as usize + 1))
            }
            opcode::SWAP1..=opcode::SWAP16 => {
                run_op!(state, instr::swap(state, (op - opcode::SWAP1) as usize + 1))
            }
            opcode::LOG0..=opcode::LOG4 => {
                run_op!(
                    state,
                    instr::environment::log(state, (op - opcode::LOG0) as usize)
                )
            }

            opcode::CREATE => {
                run_op!(state, instr::calls::create::<H, { opcode::CREATE }>(state))
            }
            opcode::CALL => run_op!(state, instr::calls::call::<H, { opcode::CALL }>(state)),
            opcode::CALLCODE => {
                run_op!(state, instr::calls::call::<H, { opcode::CALLCODE }>(state))
            }
            opcode::RETURN => {
                state.status = match instr::capture_output(state) {
                    Ok(()) => StatusCode::Success,
                    Err(status) => status,
                };
                break;
            }
            opcode::DELEGATECALL => {
                run_op!(
                    state,
                    instr::calls::call::<H, { opcode::DELEGATECALL }>(state)
                )
            }
            opcode::CREATE2 => {
                run_op!(state, instr::calls::create::<H, { opcode::CREATE2 }>(state))
            }
            opcode::STATICCALL => {
                run_op!(
                    state,
                    instr::calls::call::<H, { opcode::STATICCALL }>(state)
                )
            }
            opcode::REVERT => {
                state.status = match instr::capture_output(state) {
                    Ok(()) => StatusCode::Revert,
                    Err(status) => status,
                };
                break;
            }
            opcode::INVALID => {
                state.status = StatusCode::InvalidInstruction;
                break;
            }
            opcode::SELFDESTRUCT => {
                state.status = instr::calls::selfdestruct(state);
                break;
            }

            // Unassigned bytes are rejected by the table above.
            _ => {
                state.status = StatusCode::InternalError;
                break;
            }
        }

        pc += 1;
    }

    assemble_result(state)
}

/// Convert terminal execution state into the outgoing result. `gas_left` is
/// zeroed unless the frame succeeded or reverted; the refund counter is
/// surfaced only on success.
fn assemble_result<H: Host>(state: &ExecutionState<H>) -> ExecutionResult {
    let gas_left = if state.status.keeps_gas() {
        state.gas_left
    } else {
        0
    };
    let output = if state.output_size != 0 {
        state
            .memory
            .slice(state.output_offset, state.output_size)
            .to_vec()
    } else {
        Vec::new()
    };
    ExecutionResult {
        status: state.status,
        gas_left,
        gas_refund: if state.status.is_success() {
            state.gas_refund
        } else {
            0
        },
        output,
        create_address: None,
    }
}

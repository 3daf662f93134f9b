//! SLOAD/SSTORE with EIP-2929 access lists and EIP-2200/EIP-3529 net gas
//! metering, plus transient storage (EIP-1153).

use crate::error::{EvmResult, StatusCode};
use crate::gas::{ADDITIONAL_COLD_SLOAD_COST, CALL_STIPEND, COLD_SLOAD_COST};
use crate::host::{AccessStatus, Host, StorageStatus};
use crate::revision::Revision;
use crate::state::ExecutionState;
use evm_types::WordExt;

struct StorageCostSpec {
    net_metering: bool,
    /// Warm access cost under net metering (the SLOAD cost of the revision).
    warm_access: i64,
    set: i64,
    reset: i64,
    clear_refund: i64,
}

fn storage_cost_spec(rev: Revision) -> StorageCostSpec {
    // EIP-1283 landed in Constantinople, was reverted in Petersburg, and
    // returned in Istanbul as EIP-2200.
    let net_metering = rev == Revision::Constantinople || rev >= Revision::Istanbul;
    let warm_access = if rev >= Revision::Berlin {
        100
    } else if rev >= Revision::Istanbul {
        800
    } else {
        200
    };
    // EIP-2929 folds the cold access charge out of the reset cost.
    let reset = if rev >= Revision::Berlin {
        5000 - COLD_SLOAD_COST
    } else {
        5000
    };
    let clear_refund = if rev >= Revision::London { 4800 } else { 15000 };
    StorageCostSpec {
        net_metering,
        warm_access,
        set: 20000,
        reset,
        clear_refund,
    }
}

/// Cost and refund of one SSTORE, by the host-reported write status.
fn sstore_cost_and_refund(rev: Revision, status: StorageStatus) -> (i64, i64) {
    let c = storage_cost_spec(rev);
    if c.net_metering {
        match status {
            StorageStatus::Assigned => (c.warm_access, 0),
            StorageStatus::Added => (c.set, 0),
            StorageStatus::Deleted => (c.reset, c.clear_refund),
            StorageStatus::Modified => (c.reset, 0),
            StorageStatus::DeletedAdded => (c.warm_access, -c.clear_refund),
            StorageStatus::ModifiedDeleted => (c.warm_access, c.clear_refund),
            StorageStatus::DeletedRestored => {
                (c.warm_access, c.reset - c.warm_access - c.clear_refund)
            }
            StorageStatus::AddedDeleted => (c.warm_access, c.set - c.warm_access),
            StorageStatus::ModifiedRestored => (c.warm_access, c.reset - c.warm_access),
        }
    } else {
        // Legacy metering only distinguishes set, reset, and clearing; the
        // current value alone decides.
        match status {
            StorageStatus::Added | StorageStatus::DeletedAdded | StorageStatus::DeletedRestored => {
                (c.set, 0)
            }
            StorageStatus::Deleted
            | StorageStatus::ModifiedDeleted
            | StorageStatus::AddedDeleted => (c.reset, c.clear_refund),
            StorageStatus::Assigned | StorageStatus::Modified | StorageStatus::ModifiedRestored => {
                (c.reset, 0)
            }
        }
    }
}

pub fn sload<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let key = state.stack.pop()?.to_h256();
    let recipient = state.msg.recipient;

    if state.rev >= Revision::Berlin
        && state.host.access_storage(&recipient, &key) == AccessStatus::Cold
    {
        state.consume_gas(ADDITIONAL_COLD_SLOAD_COST)?;
    }

    let value = state.host.get_storage(&recipient, &key);
    state.stack.push(evm_types::U256::from_h256(&value))
}

pub fn sstore<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    if state.in_static_mode() {
        return Err(StatusCode::StaticModeViolation);
    }

    // EIP-2200 reserve: refuse to run on at most the stipend, so a callee
    // living off a value-transfer stipend can never write storage.
    if state.rev >= Revision::Istanbul && state.gas_left <= CALL_STIPEND {
        return Err(StatusCode::OutOfGas);
    }

    let key = state.stack.pop()?.to_h256();
    let value = state.stack.pop()?.to_h256();
    let recipient = state.msg.recipient;

    let cold_cost = if state.rev >= Revision::Berlin
        && state.host.access_storage(&recipient, &key) == AccessStatus::Cold
    {
        COLD_SLOAD_COST
    } else {
        0
    };

    let status = state.host.set_storage(&recipient, &key, &value);
    let (cost, refund) = sstore_cost_and_refund(state.rev, status);
    state.consume_gas(cost + cold_cost)?;
    state.gas_refund += refund;
    Ok(())
}

pub fn tload<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    let key = state.stack.pop()?.to_h256();
    let value = state
        .host
        .get_transient_storage(&state.msg.recipient, &key);
    state.stack.push(evm_types::U256::from_h256(&value))
}

pub fn tstore<H: Host>(state: &mut ExecutionState<H>) -> EvmResult<()> {
    if state.in_static_mode() {
        return Err(StatusCode::StaticModeViolation);
    }
    let key = state.stack.pop()?.to_h256();
    let value = state.stack.pop()?.to_h256();
    let recipient = state.msg.recipient;
    state.host.set_transient_storage(&recipient, &key, &value);
    Ok(())
}

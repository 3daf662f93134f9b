//! An in-memory [`Host`] for tests and as a reference for host
//! implementations. Records every observable interaction and computes the
//! storage write status matrix from per-slot original values.

use crate::error::StatusCode;
use crate::host::{
    AccessStatus, ExecutionResult, Host, Message, StorageStatus, TxContext,
};
use evm_types::{Address, H256, U256};
use std::collections::{HashMap, HashSet};

/// One storage slot with the value it had at the start of the transaction.
#[derive(Debug, Clone, Default)]
pub struct StorageSlot {
    pub original: H256,
    pub current: H256,
}

impl StorageSlot {
    /// A clean slot whose original and current values agree.
    pub fn clean(value: H256) -> Self {
        Self {
            original: value,
            current: value,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockedAccount {
    pub balance: U256,
    pub code: Vec<u8>,
    pub code_hash: H256,
    pub storage: HashMap<H256, StorageSlot>,
    pub transient: HashMap<H256, H256>,
}

#[derive(Debug, Clone)]
pub struct LogRecord {
    pub creator: Address,
    pub data: Vec<u8>,
    pub topics: Vec<H256>,
}

#[derive(Debug, Clone)]
pub struct MockedHost {
    pub accounts: HashMap<Address, MockedAccount>,
    pub tx_context: TxContext,
    /// Served for every BLOCKHASH query inside the window.
    pub block_hash: H256,
    pub logs: Vec<LogRecord>,
    pub selfdestructs: Vec<(Address, Address)>,
    /// Messages passed to `call`, in program order.
    pub recorded_calls: Vec<Message>,
    /// Result returned (cloned) from every nested call.
    pub call_result: ExecutionResult,
    accessed_accounts: HashSet<Address>,
    accessed_storage: HashSet<(Address, H256)>,
}

impl Default for MockedHost {
    fn default() -> Self {
        Self {
            accounts: HashMap::new(),
            tx_context: TxContext::default(),
            block_hash: H256::zero(),
            logs: Vec::new(),
            selfdestructs: Vec::new(),
            recorded_calls: Vec::new(),
            call_result: ExecutionResult::new(StatusCode::Success),
            accessed_accounts: HashSet::new(),
            accessed_storage: HashSet::new(),
        }
    }
}

/// Classify a write against the slot's original, current, and new values.
fn storage_status(original: H256, current: H256, value: H256) -> StorageStatus {
    let zero = H256::zero();
    if current == value {
        return StorageStatus::Assigned;
    }
    if original == current {
        // Clean slot.
        if current == zero {
            StorageStatus::Added
        } else if value == zero {
            StorageStatus::Deleted
        } else {
            StorageStatus::Modified
        }
    } else {
        // Dirty slot.
        if current == zero {
            if value == original {
                StorageStatus::DeletedRestored
            } else {
                StorageStatus::DeletedAdded
            }
        } else if value == zero {
            if original == zero {
                StorageStatus::AddedDeleted
            } else {
                StorageStatus::ModifiedDeleted
            }
        } else if value == original {
            StorageStatus::ModifiedRestored
        } else {
            StorageStatus::Assigned
        }
    }
}

impl Host for MockedHost {
    fn account_exists(&self, address: &Address) -> bool {
        self.accounts.contains_key(address)
    }

    fn get_storage(&self, address: &Address, key: &H256) -> H256 {
        self.accounts
            .get(address)
            .and_then(|acc| acc.storage.get(key))
            .map(|slot| slot.current)
            .unwrap_or_default()
    }

    fn set_storage(&mut self, address: &Address, key: &H256, value: &H256) -> StorageStatus {
        let slot = self
            .accounts
            .entry(*address)
            .or_default()
            .storage
            .entry(*key)
            .or_default();
        let status = storage_status(slot.original, slot.current, *value);
        slot.current = *value;
        status
    }

    fn get_balance(&self, address: &Address) -> U256 {
        self.accounts
            .get(address)
            .map(|acc| acc.balance)
            .unwrap_or_default()
    }

    fn get_code_size(&self, address: &Address) -> usize {
        self.accounts
            .get(address)
            .map(|acc| acc.code.len())
            .unwrap_or_default()
    }

    fn get_code_hash(&self, address: &Address) -> H256 {
        self.accounts
            .get(address)
            .map(|acc| acc.code_hash)
            .unwrap_or_default()
    }

    fn copy_code(&self, address: &Address, code_offset: usize, buffer: &mut [u8]) -> usize {
        let Some(account) = self.accounts.get(address) else {
            return 0;
        };
        if code_offset >= account.code.len() {
            return 0;
        }
        let n = std::cmp::min(buffer.len(), account.code.len() - code_offset);
        buffer[..n].copy_from_slice(&account.code[code_offset..code_offset + n]);
        n
    }

    fn selfdestruct(&mut self, address: &Address, beneficiary: &Address) -> bool {
        let first = !self.selfdestructs.iter().any(|(a, _)| a == address);
        self.selfdestructs.push((*address, *beneficiary));
        first
    }

    fn call(&mut self, msg: &Message) -> ExecutionResult {
        self.recorded_calls.push(msg.clone());
        self.call_result.clone()
    }

    fn get_tx_context(&self) -> TxContext {
        self.tx_context.clone()
    }

    fn get_block_hash(&self, _number: i64) -> H256 {
        self.block_hash
    }

    fn emit_log(&mut self, address: &Address, data: &[u8], topics: &[H256]) {
        self.logs.push(LogRecord {
            creator: *address,
            data: data.to_vec(),
            topics: topics.to_vec(),
        });
    }

    fn access_account(&mut self, address: &Address) -> AccessStatus {
        if self.accessed_accounts.insert(*address) {
            AccessStatus::Cold
        } else {
            AccessStatus::Warm
        }
    }

    fn access_storage(&mut self, address: &Address, key: &H256) -> AccessStatus {
        if self.accessed_storage.insert((*address, *key)) {
            AccessStatus::Cold
        } else {
            AccessStatus::Warm
        }
    }

    fn get_transient_storage(&self, address: &Address, key: &H256) -> H256 {
        self.accounts
            .get(address)
            .and_then(|acc| acc.transient.get(key))
            .copied()
            .unwrap_or_default()
    }

    fn set_transient_storage(&mut self, address: &Address, key: &H256, value: &H256) {
        self.accounts
            .entry(*address)
            .or_default()
            .transient
            .insert(*key, *value);
    }
}

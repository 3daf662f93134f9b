use crate::error::StatusCode;
use evm_types::{Address, H256, U256};

/// The kind of call-like instruction that produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Call,
    DelegateCall,
    CallCode,
    Create,
    Create2,
}

/// The message describing one execution frame.
#[derive(Debug, Clone)]
pub struct Message {
    pub kind: CallKind,
    /// Static frames may not modify state.
    pub is_static: bool,
    pub depth: i32,
    pub gas: i64,
    /// The account whose storage, balance and address the code operates on.
    pub recipient: Address,
    pub sender: Address,
    pub input_data: Vec<u8>,
    pub value: U256,
    pub create2_salt: H256,
    /// The account the executed code was loaded from. Differs from
    /// `recipient` for DELEGATECALL and CALLCODE frames.
    pub code_address: Address,
}

impl Default for Message {
    fn default() -> Self {
        Self {
            kind: CallKind::Call,
            is_static: false,
            depth: 0,
            gas: i64::MAX,
            recipient: Address::ZERO,
            sender: Address::ZERO,
            input_data: Vec::new(),
            value: U256::zero(),
            create2_salt: H256::zero(),
            code_address: Address::ZERO,
        }
    }
}

/// Transaction and block context served by the host.
#[derive(Debug, Clone, Default)]
pub struct TxContext {
    pub gas_price: U256,
    pub origin: Address,
    pub coinbase: Address,
    pub block_number: i64,
    pub timestamp: i64,
    pub gas_limit: i64,
    /// PREVRANDAO after Paris; the block difficulty before.
    pub prev_randao: U256,
    pub chain_id: U256,
    pub base_fee: U256,
    pub blob_base_fee: U256,
    pub blob_hashes: Vec<H256>,
}

/// Result of a per-invocation access-list lookup (EIP-2929). The first touch
/// of an address or storage slot is cold; the host marks it warm as a side
/// effect of the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessStatus {
    Cold,
    Warm,
}

/// Effect of a storage write, classified against the slot's original value
/// (at the start of the transaction), current value, and new value. Drives
/// the net gas metering and refund schedule of SSTORE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageStatus {
    /// The slot value is unchanged, or a dirty slot was set to yet another
    /// non-original value. Cheapest case.
    Assigned,
    /// Clean zero slot set to a nonzero value.
    Added,
    /// Clean nonzero slot set to zero.
    Deleted,
    /// Clean nonzero slot set to a different nonzero value.
    Modified,
    /// Dirty zero slot (originally nonzero) set to a new nonzero value.
    DeletedAdded,
    /// Dirty nonzero slot (originally nonzero) set to zero.
    ModifiedDeleted,
    /// Dirty zero slot restored to its original nonzero value.
    DeletedRestored,
    /// Dirty nonzero slot (originally zero) set back to zero.
    AddedDeleted,
    /// Dirty nonzero slot restored to its original nonzero value.
    ModifiedRestored,
}

/// Outcome of one execution frame.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub status: StatusCode,
    /// Remaining gas; zero unless the status is success or revert.
    pub gas_left: i64,
    /// Accumulated refund; surfaced only on success.
    pub gas_refund: i64,
    pub output: Vec<u8>,
    /// Address of the deployed contract, for successful CREATE frames.
    pub create_address: Option<Address>,
}

impl ExecutionResult {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            gas_left: 0,
            gas_refund: 0,
            output: Vec::new(),
            create_address: None,
        }
    }
}

/// Capabilities the interpreter requires from its environment: world state,
/// block data, and nested execution. The interpreter borrows a host for the
/// duration of one frame and never stores it beyond that.
pub trait Host {
    fn account_exists(&self, address: &Address) -> bool;

    fn get_storage(&self, address: &Address, key: &H256) -> H256;

    /// Write a storage slot, reporting how the write relates to the slot's
    /// original and current values.
    fn set_storage(&mut self, address: &Address, key: &H256, value: &H256) -> StorageStatus;

    fn get_balance(&self, address: &Address) -> U256;

    fn get_code_size(&self, address: &Address) -> usize;

    fn get_code_hash(&self, address: &Address) -> H256;

    /// Copy code of an account starting at `code_offset` into `buffer`,
    /// returning the number of bytes copied.
    fn copy_code(&self, address: &Address, code_offset: usize, buffer: &mut [u8]) -> usize;

    /// Register a selfdestruct. Returns true the first time this address is
    /// registered in the current transaction.
    fn selfdestruct(&mut self, address: &Address, beneficiary: &Address) -> bool;

    /// Execute a nested call or create frame to completion.
    fn call(&mut self, msg: &Message) -> ExecutionResult;

    fn get_tx_context(&self) -> TxContext;

    fn get_block_hash(&self, number: i64) -> H256;

    fn emit_log(&mut self, address: &Address, data: &[u8], topics: &[H256]);

    /// Access-list lookup for an account; marks it warm.
    fn access_account(&mut self, address: &Address) -> AccessStatus;

    /// Access-list lookup for a storage slot; marks it warm.
    fn access_storage(&mut self, address: &Address, key: &H256) -> AccessStatus;

    fn get_transient_storage(&self, address: &Address, key: &H256) -> H256;

    fn set_transient_storage(&mut self, address: &Address, key: &H256, value: &H256);
}

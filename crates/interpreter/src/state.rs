use crate::analysis::CodeAnalysis;
use crate::error::{EvmResult, StatusCode};
use crate::gas::{memory_cost, num_words};
use crate::host::{Host, Message, TxContext};
use crate::memory::Memory;
use crate::revision::Revision;
use crate::stack::Stack;
use evm_types::U256;

/// A validated, paid-for span of memory.
#[derive(Debug, Clone, Copy)]
pub struct MemoryRegion {
    pub offset: usize,
    pub size: usize,
}

/// The mutable context of one frame. Owns its stack, memory and return-data
/// buffer; borrows the message, the code, its analysis, and the host for the
/// duration of the invocation.
pub struct ExecutionState<'a, H: Host> {
    pub gas_left: i64,
    pub gas_refund: i64,
    pub stack: Stack,
    pub memory: Memory,
    /// Output of the most recent sub-call; cleared at the start of each one.
    pub return_data: Vec<u8>,
    pub msg: &'a Message,
    /// The original, unpadded code (CODESIZE/CODECOPY operate on this).
    pub code: &'a [u8],
    pub analysis: &'a CodeAnalysis,
    pub rev: Revision,
    pub host: &'a mut H,
    pub status: StatusCode,
    pub output_offset: usize,
    pub output_size: usize,
    tx_context: Option<TxContext>,
}

impl<'a, H: Host> ExecutionState<'a, H> {
    pub fn new(
        msg: &'a Message,
        rev: Revision,
        host: &'a mut H,
        code: &'a [u8],
        analysis: &'a CodeAnalysis,
    ) -> Self {
        Self {
            gas_left: msg.gas,
            gas_refund: 0,
            stack: Stack::new(),
            memory: Memory::new(),
            return_data: Vec::new(),
            msg,
            code,
            analysis,
            rev,
            host,
            status: StatusCode::Success,
            output_offset: 0,
            output_size: 0,
            tx_context: None,
        }
    }

    pub fn in_static_mode(&self) -> bool {
        self.msg.is_static
    }

    /// The transaction context, fetched from the host once per invocation.
    pub fn tx_context(&mut self) -> &TxContext {
        let host = &mut *self.host;
        self.tx_context.get_or_insert_with(|| host.get_tx_context())
    }

    /// Charge `amount` against the meter: subtract first, test second.
    pub fn consume_gas(&mut self, amount: i64) -> EvmResult<()> {
        self.gas_left -= amount;
        if self.gas_left < 0 {
            return Err(StatusCode::OutOfGas);
        }
        Ok(())
    }

    /// Validate an `(offset, size)` pair, charge the memory expansion delta,
    /// and grow the buffer to cover it. A zero `size` performs no expansion
    /// and no charge regardless of `offset`.
    pub fn memory_region(&mut self, offset: U256, size: U256) -> EvmResult<MemoryRegion> {
        if size.is_zero() {
            return Ok(MemoryRegion { offset: 0, size: 0 });
        }

        let limit = U256::from(u32::MAX);
        if offset > limit || size > limit {
            return Err(StatusCode::OutOfGas);
        }
        let offset = offset.as_usize();
        let size = size.as_usize();

        let end = offset + size;
        if end > self.memory.len() {
            let current_words = num_words(self.memory.len());
            let new_words = num_words(end);
            self.consume_gas(memory_cost(new_words) - memory_cost(current_words))?;
            self.memory.grow(new_words as usize * 32);
        }

        Ok(MemoryRegion { offset, size })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::mocked::MockedHost;

    fn with_state<F: FnOnce(&mut ExecutionState<'_, MockedHost>)>(gas: i64, f: F) {
        let msg = Message {
            gas,
            ..Message::default()
        };
        let analysis = analyze(&[]);
        let mut host = MockedHost::default();
        let mut state = ExecutionState::new(&msg, Revision::LATEST, &mut host, &[], &analysis);
        f(&mut state);
    }

    #[test]
    fn test_consume_gas_subtract_then_test() {
        with_state(10, |state| {
            assert!(state.consume_gas(10).is_ok());
            assert_eq!(state.gas_left, 0);
            assert_eq!(state.consume_gas(1), Err(StatusCode::OutOfGas));
            assert!(state.gas_left < 0);
        });
    }

    #[test]
    fn test_memory_region_word_aligned() {
        with_state(1000, |state| {
            let region = state
                .memory_region(U256::from(10), U256::from(5))
                .unwrap();
            assert_eq!(region.offset, 10);
            assert_eq!(region.size, 5);
            assert_eq!(state.memory.len(), 32);
            // One word costs 3.
            assert_eq!(state.gas_left, 997);
        });
    }

    #[test]
    fn test_memory_region_zero_size_is_free() {
        with_state(100, |state| {
            let region = state.memory_region(U256::MAX, U256::zero()).unwrap();
            assert_eq!(region.size, 0);
            assert_eq!(state.memory.len(), 0);
            assert_eq!(state.gas_left, 100);
        });
    }

    #[test]
    fn test_memory_region_charges_only_growth() {
        with_state(1000, |state| {
            state.memory_region(U256::zero(), U256::from(64)).unwrap();
            let after_first = state.gas_left;
            assert_eq!(after_first, 1000 - 6);
            // Accessing the already-paid range is free.
            state.memory_region(U256::from(32), U256::from(32)).unwrap();
            assert_eq!(state.gas_left, after_first);
        });
    }

    #[test]
    fn test_memory_region_huge_offset_fails() {
        with_state(1_000_000, |state| {
            let r = state.memory_region(U256::from(u64::MAX), U256::one());
            assert_eq!(r.unwrap_err(), StatusCode::OutOfGas);
        });
    }
}

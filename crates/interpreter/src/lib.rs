//! A baseline EVM bytecode interpreter.
//!
//! Given code, a message, a protocol revision and a [`Host`], `execute` runs
//! the code to completion and returns the terminal status, remaining gas and
//! output bytes. World state, block data and nested frames live behind the
//! host trait; the interpreter is a pure state machine over its own stack,
//! memory, program counter and gas meter.

pub mod analysis;
pub mod arith;
pub mod error;
pub mod gas;
pub mod host;
pub mod instructions;
pub mod memory;
pub mod mocked;
pub mod opcode;
pub mod revision;
pub mod stack;
pub mod state;
pub mod table;
pub mod tracer;

mod interpreter;


pub use analysis::{analyze, CodeAnalysis};
pub use error::{EvmResult, StatusCode};
pub use host::{
    AccessStatus, CallKind, ExecutionResult, Host, Message, StorageStatus, TxContext,
};
pub use revision::Revision;
pub use tracer::Tracer;

use state::ExecutionState;
use tracing::debug;

/// The virtual machine: carries the optional tracer across invocations. The
/// tracer is notified exactly twice per invocation, outside the dispatch
/// loop, so execution itself carries no tracing branches.
#[derive(Default)]
pub struct Vm {
    tracer: Option<Box<dyn Tracer>>,
}

impl Vm {
    pub fn new() -> Self {
        Self { tracer: None }
    }

    pub fn with_tracer(tracer: Box<dyn Tracer>) -> Self {
        Self {
            tracer: Some(tracer),
        }
    }

    /// Execute `code` under `msg` against `host`.
    pub fn execute<H: Host>(
        &mut self,
        host: &mut H,
        rev: Revision,
        msg: &Message,
        code: &[u8],
    ) -> ExecutionResult {
        debug!(
            revision = %rev,
            depth = msg.depth,
            gas = msg.gas,
            code_size = code.len(),
            "execution start"
        );

        if let Some(tracer) = &mut self.tracer {
            tracer.on_execution_start(rev, msg, code);
        }

        let analysis = analyze(code);
        let mut state = ExecutionState::new(msg, rev, host, code, &analysis);
        let result = interpreter::run(&mut state);

        debug!(status = %result.status, gas_left = result.gas_left, "execution end");

        if let Some(tracer) = &mut self.tracer {
            tracer.on_execution_end(&result);
        }
        result
    }
}

/// One-shot execution without a tracer.
pub fn execute<H: Host>(
    host: &mut H,
    rev: Revision,
    msg: &Message,
    code: &[u8],
) -> ExecutionResult {
    Vm::new().execute(host, rev, msg, code)
}

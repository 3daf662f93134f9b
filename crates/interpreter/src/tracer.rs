use crate::host::{ExecutionResult, Message};
use crate::revision::Revision;

/// Advisory observation hook around one invocation. There are exactly two
/// notification points; a tracer cannot observe or mutate state mid-run.
pub trait Tracer {
    fn on_execution_start(&mut self, rev: Revision, msg: &Message, code: &[u8]);

    fn on_execution_end(&mut self, result: &ExecutionResult);
}

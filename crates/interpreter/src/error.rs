use thiserror::Error;

pub type EvmResult<T> = Result<T, StatusCode>;

/// Terminal status of an execution frame. Every failure is a typed status
/// flowing through normal return paths; there is no exception mechanism.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    #[error("success")]
    Success,

    #[error("generic failure")]
    Failure,

    #[error("execution reverted")]
    Revert,

    #[error("out of gas")]
    OutOfGas,

    #[error("invalid instruction")]
    InvalidInstruction,

    #[error("undefined instruction")]
    UndefinedInstruction,

    #[error("stack overflow")]
    StackOverflow,

    #[error("stack underflow")]
    StackUnderflow,

    #[error("bad jump destination")]
    BadJumpDestination,

    #[error("invalid memory access")]
    InvalidMemoryAccess,

    #[error("call depth exceeded")]
    CallDepthExceeded,

    #[error("static mode violation")]
    StaticModeViolation,

    #[error("precompile failure")]
    PrecompileFailure,

    #[error("contract validation failure")]
    ContractValidationFailure,

    #[error("argument out of range")]
    ArgumentOutOfRange,

    #[error("insufficient balance")]
    InsufficientBalance,

    #[error("internal error")]
    InternalError,
}

impl StatusCode {
    pub fn is_success(self) -> bool {
        self == StatusCode::Success
    }

    /// Whether the remaining gas survives into the result. Only success and
    /// revert preserve it; every other failure consumes all remaining gas.
    pub fn keeps_gas(self) -> bool {
        matches!(self, StatusCode::Success | StatusCode::Revert)
    }
}

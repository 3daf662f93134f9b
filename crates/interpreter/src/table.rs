//! Per-revision instruction table: base gas cost, required stack height, and
//! whether the opcode can grow the stack past its limit. The dispatch loop's
//! pre-flight check reads exactly one entry per executed instruction.

use crate::opcode::*;
use crate::revision::Revision;

/// Sentinel base cost marking an opcode as undefined in a revision.
pub const UNDEFINED: i16 = -1;

#[derive(Debug, Clone, Copy)]
pub struct OpInfo {
    /// Base gas cost, or [`UNDEFINED`].
    pub base_gas: i16,
    /// Number of stack operands the opcode consumes.
    pub stack_required: u8,
    /// Whether the opcode's net stack effect is positive.
    pub can_overflow: bool,
}

impl OpInfo {
    pub const fn is_defined(&self) -> bool {
        self.base_gas >= 0
    }
}

/// The instruction table for one revision.
pub fn instruction_table(rev: Revision) -> &'static [OpInfo; 256] {
    &TABLES[rev.index()]
}

static TABLES: [[OpInfo; 256]; Revision::COUNT] = build_tables();

const fn build_tables() -> [[OpInfo; 256]; Revision::COUNT] {
    let mut tables = [[OpInfo {
        base_gas: UNDEFINED,
        stack_required: 0,
        can_overflow: false,
    }; 256]; Revision::COUNT];

    let mut r = 0;
    while r < Revision::COUNT {
        let rev = Revision::from_index(r);
        let mut op = 0;
        while op < 256 {
            let byte = op as u8;
            tables[r][op] = OpInfo {
                base_gas: base_gas(rev, byte),
                stack_required: stack_required(byte),
                can_overflow: stack_change(byte) > 0,
            };
            op += 1;
        }
        r += 1;
    }
    tables
}

/// `cost` if the opcode exists from `min` on, [`UNDEFINED`] before.
const fn from_rev(rev: Revision, min: Revision, cost: i16) -> i16 {
    if rev.at_least(min) {
        cost
    } else {
        UNDEFINED
    }
}

const fn base_gas(rev: Revision, op: u8) -> i16 {
    match op {
        STOP => 0,
        ADD | SUB => 3,
        MUL | DIV | SDIV | MOD | SMOD | SIGNEXTEND => 5,
        ADDMOD | MULMOD => 8,
        EXP => 10,

        LT | GT | SLT | SGT | EQ | ISZERO | AND | OR | XOR | NOT | BYTE => 3,
        SHL | SHR | SAR => from_rev(rev, Revision::Constantinople, 3),

        KECCAK256 => 30,

        ADDRESS | ORIGIN | CALLER | CALLVALUE | CALLDATASIZE | CODESIZE | GASPRICE => 2,
        CALLDATALOAD | CALLDATACOPY | CODECOPY => 3,
        BALANCE => {
            if rev.at_least(Revision::Berlin) {
                100
            } else if rev.at_least(Revision::Istanbul) {
                700
            } else if rev.at_least(Revision::TangerineWhistle) {
                400
            } else {
                20
            }
        }
        EXTCODESIZE | EXTCODECOPY => {
            if rev.at_least(Revision::Berlin) {
                100
            } else if rev.at_least(Revision::TangerineWhistle) {
                700
            } else {
                20
            }
        }
        EXTCODEHASH => {
            if rev.at_least(Revision::Berlin) {
                100
            } else if rev.at_least(Revision::Istanbul) {
                700
            } else {
                from_rev(rev, Revision::Constantinople, 400)
            }
        }
        RETURNDATASIZE => from_rev(rev, Revision::Byzantium, 2),
        RETURNDATACOPY => from_rev(rev, Revision::Byzantium, 3),

        BLOCKHASH => 20,
        COINBASE | TIMESTAMP | NUMBER | PREVRANDAO | GASLIMIT => 2,
        CHAINID => from_rev(rev, Revision::Istanbul, 2),
        SELFBALANCE => from_rev(rev, Revision::Istanbul, 5),
        BASEFEE => from_rev(rev, Revision::London, 2),
        BLOBHASH => from_rev(rev, Revision::Cancun, 3),
        BLOBBASEFEE => from_rev(rev, Revision::Cancun, 2),

        POP => 2,
        MLOAD | MSTORE | MSTORE8 => 3,
        SLOAD => {
            if rev.at_least(Revision::Berlin) {
                100
            } else if rev.at_least(Revision::Istanbul) {
                800
            } else if rev.at_least(Revision::TangerineWhistle) {
                200
            } else {
                50
            }
        }
        // SSTORE cost is entirely status-dependent.
        SSTORE => 0,
        JUMP => 8,
        JUMPI => 10,
        PC | MSIZE | GAS => 2,
        JUMPDEST => 1,
        TLOAD | TSTORE => from_rev(rev, Revision::Cancun, 100),
        MCOPY => from_rev(rev, Revision::Cancun, 3),
        PUSH0 => from_rev(rev, Revision::Shanghai, 2),

        PUSH1..=PUSH32 => 3,
        DUP1..=DUP16 => 3,
        SWAP1..=SWAP16 => 3,

        // 375 base plus 375 per topic; the per-byte data cost is dynamic.
        LOG0 => 375,
        0xa1 => 750,
        0xa2 => 1125,
        0xa3 => 1500,
        LOG4 => 1875,

        CREATE => 32000,
        CALL | CALLCODE => {
            if rev.at_least(Revision::Berlin) {
                100
            } else if rev.at_least(Revision::TangerineWhistle) {
                700
            } else {
                40
            }
        }
        RETURN => 0,
        DELEGATECALL => {
            if rev.at_least(Revision::Berlin) {
                100
            } else if rev.at_least(Revision::TangerineWhistle) {
                700
            } else {
                from_rev(rev, Revision::Homestead, 40)
            }
        }
        CREATE2 => from_rev(rev, Revision::Constantinople, 32000),
        STATICCALL => {
            if rev.at_least(Revision::Berlin) {
                100
            } else {
                from_rev(rev, Revision::Byzantium, 700)
            }
        }
        REVERT => from_rev(rev, Revision::Byzantium, 0),
        INVALID => 0,
        SELFDESTRUCT => {
            if rev.at_least(Revision::TangerineWhistle) {
                5000
            } else {
                0
            }
        }

        _ => UNDEFINED,
    }
}

const fn stack_required(op: u8) -> u8 {
    match op {
        ADD | SUB | MUL | DIV | SDIV | MOD | SMOD | EXP | SIGNEXTEND => 2,
        ADDMOD | MULMOD => 3,
        LT | GT | SLT | SGT | EQ | AND | OR | XOR | BYTE | SHL | SHR | SAR => 2,
        ISZERO | NOT => 1,
        KECCAK256 => 2,
        BALANCE | EXTCODESIZE | EXTCODEHASH | CALLDATALOAD | BLOCKHASH | BLOBHASH => 1,
        CALLDATACOPY | CODECOPY | RETURNDATACOPY | MCOPY => 3,
        EXTCODECOPY => 4,
        POP | MLOAD | SLOAD | TLOAD | JUMP | SELFDESTRUCT => 1,
        MSTORE | MSTORE8 | SSTORE | TSTORE | JUMPI | RETURN | REVERT => 2,
        DUP1..=DUP16 => op - DUP1 + 1,
        SWAP1..=SWAP16 => op - SWAP1 + 2,
        LOG0..=LOG4 => op - LOG0 + 2,
        CREATE => 3,
        CREATE2 => 4,
        CALL | CALLCODE => 7,
        DELEGATECALL | STATICCALL => 6,
        _ => 0,
    }
}

/// Net stack height change; only its sign matters for overflow detection.
const fn stack_change(op: u8) -> i8 {
    match op {
        ADD | SUB | MUL | DIV | SDIV | MOD | SMOD | EXP | SIGNEXTEND => -1,
        ADDMOD | MULMOD => -2,
        LT | GT | SLT | SGT | EQ | AND | OR | XOR | BYTE | SHL | SHR | SAR => -1,
        ISZERO | NOT => 0,
        KECCAK256 => -1,
        ADDRESS | ORIGIN | CALLER | CALLVALUE | CALLDATASIZE | CODESIZE | GASPRICE
        | RETURNDATASIZE | COINBASE | TIMESTAMP | NUMBER | PREVRANDAO | GASLIMIT | CHAINID
        | SELFBALANCE | BASEFEE | BLOBBASEFEE => 1,
        BALANCE | EXTCODESIZE | EXTCODEHASH | CALLDATALOAD | BLOCKHASH | BLOBHASH => 0,
        CALLDATACOPY | CODECOPY | RETURNDATACOPY | MCOPY => -3,
        EXTCODECOPY => -4,
        POP => -1,
        MLOAD | SLOAD | TLOAD => 0,
        MSTORE | MSTORE8 | SSTORE | TSTORE => -2,
        JUMP => -1,
        JUMPI => -2,
        PC | MSIZE | GAS => 1,
        JUMPDEST => 0,
        PUSH0..=PUSH32 => 1,
        DUP1..=DUP16 => 1,
        SWAP1..=SWAP16 => 0,
        LOG0..=LOG4 => -((op - LOG0) as i8 + 2),
        CREATE => -2,
        CREATE2 => -3,
        CALL | CALLCODE => -6,
        DELEGATECALL | STATICCALL => -5,
        RETURN | REVERT => -2,
        SELFDESTRUCT => -1,
        _ => 0,
    }
}

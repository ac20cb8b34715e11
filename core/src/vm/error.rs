//! Runtime faults of the stack machine.

use core::fmt;

/// A fault raised while executing a bytecode image.
///
/// Faults abort the run; when the machine was executing a compile-time
/// call, the driver reports them against the originating call site.
#[derive(Debug)]
pub enum VmError {
    /// The byte at the instruction boundary is not a known opcode.
    UnknownOpcode { opcode: u8, offset: usize },
    /// The program counter left the code image.
    PcOutOfBounds { pc: usize },
    /// An immediate would be read past the end of the image.
    TruncatedImmediate { offset: usize },
    /// A push or `PUSHN` would grow the stack past its fixed size.
    StackOverflow { sp: usize },
    /// A pop or `POPN` would shrink the stack below its base.
    StackUnderflow,
    /// A load or store addressed memory outside the stack.
    MemoryOutOfBounds { address: i64 },
    /// `DIV` with a zero divisor.
    DivisionByZero { offset: usize },
    /// The configured instruction quota was exhausted before `EXIT`.
    QuotaExceeded { executed: u64 },
    /// `PRINT` could not write to the output sink.
    Output(std::io::Error),
}

impl fmt::Display for VmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VmError::UnknownOpcode { opcode, offset } => {
                write!(f, "unknown opcode 0x{opcode:02x} at offset {offset}")
            }
            VmError::PcOutOfBounds { pc } => {
                write!(f, "program counter {pc} is outside the code image")
            }
            VmError::TruncatedImmediate { offset } => {
                write!(f, "truncated immediate at offset {offset}")
            }
            VmError::StackOverflow { sp } => write!(f, "stack overflow (sp = {sp})"),
            VmError::StackUnderflow => write!(f, "stack underflow"),
            VmError::MemoryOutOfBounds { address } => {
                write!(f, "memory access at byte offset {address} is outside the stack")
            }
            VmError::DivisionByZero { offset } => {
                write!(f, "division by zero at offset {offset}")
            }
            VmError::QuotaExceeded { executed } => {
                write!(f, "instruction quota exceeded after {executed} instructions")
            }
            VmError::Output(err) => write!(f, "failed to write output: {err}"),
        }
    }
}

impl std::error::Error for VmError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VmError::Output(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for VmError {
    fn from(err: std::io::Error) -> Self {
        VmError::Output(err)
    }
}

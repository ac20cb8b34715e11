//! The bytecode virtual machine.
//!
//! A word-addressed stack machine: the code image is a flat byte stream
//! ([`Bytecode`]), and [`Vm`] executes it against a byte-addressable stack
//! with a base-pointer call discipline.

mod code;
mod error;
mod instruction_set;
mod runtime;

#[cfg(test)]
mod runtime_test;

pub use code::{Bytecode, CodeOverflow, CODE_LIMIT};
pub use error::VmError;
pub use instruction_set::{Op, Operand, Quarter, Word, QUARTER_SIZE, WORD_SIZE};
pub use runtime::{Vm, STACK_SIZE};

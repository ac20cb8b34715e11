//! Core library for the Varde language: a small statically typed
//! imperative language whose distinguishing feature is compile-time AST
//! evaluation. `@`-marked call sites are executed during compilation by
//! the embedded bytecode VM and replaced with their results before final
//! code generation.
//!
//! The pipeline, leaves first: [`vm`] (instruction set, image,
//! interpreter), [`parser`], [`types`], [`analyzer`] (the typing passes),
//! [`compiler`] (frame planning and AST lowering), and [`comptime`] (the
//! fixed-point driver tying them together).

pub mod analyzer;
pub mod compiler;
pub mod comptime;
pub mod errors;
pub mod parser;
pub mod types;
pub mod vm;

pub use errors::Error;

use bumpalo::Bump;

/// Compile a source text to a ready-to-run bytecode image: parse, drive
/// compile-time evaluation to a fixed point, lower.
pub fn compile<'a>(arena: &'a Bump, source: &'a str) -> Result<vm::Bytecode, Error> {
    let root = parser::parse(arena, source)?;
    comptime::resolve_and_lower(arena, root)
}

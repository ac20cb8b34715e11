//! The bytecode code generator.
//!
//! Lowers a typechecked AST into a flat bytecode image for the stack
//! machine: [`BytecodeCompiler::lower_program`] for whole programs,
//! [`BytecodeCompiler::lower_call_site`] for single compile-time call
//! sites, and the frame planner that fixes the bp-relative layout of every
//! function.

mod bytecode;
pub mod error;
pub mod frame;


pub use bytecode::BytecodeCompiler;
pub use error::CompileError;
pub use frame::FrameLayout;

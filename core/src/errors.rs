//! Crate-boundary error type.
//!
//! The passes underneath collect their own error kinds (parse errors and
//! type errors come in batches; lowering and VM faults are single); this
//! enum is what `compile` and the CLI surface.

use snafu::Snafu;

use crate::analyzer::TypeError;
use crate::compiler::CompileError;
use crate::parser::ParseError;
use crate::vm::VmError;

fn join<E: core::fmt::Display>(errors: &[E]) -> String {
    let rendered: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    rendered.join("\n")
}

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("{}", join(errors)))]
    Parse { errors: Vec<ParseError> },

    #[snafu(display("{}", join(errors)))]
    Typing { errors: Vec<TypeError> },

    #[snafu(context(false))]
    #[snafu(display("{source}"))]
    Compile { source: CompileError },

    /// A fault while evaluating a compile-time call, reported against the
    /// originating call site.
    #[snafu(display("compile-time evaluation failed at line {line}: {source}"))]
    ComptimeEval { line: i64, source: VmError },

    /// An iteration of the driver resolved nothing while unresolved calls
    /// remain; the `@` sites depend on each other.
    #[snafu(display("compile-time evaluation did not converge: cyclic '@' call dependencies"))]
    ComptimeCycle,

    #[snafu(context(false))]
    #[snafu(display("{source}"))]
    Vm { source: VmError },
}

impl From<Vec<ParseError>> for Error {
    fn from(errors: Vec<ParseError>) -> Self {
        Error::Parse { errors }
    }
}

impl From<Vec<TypeError>> for Error {
    fn from(errors: Vec<TypeError>) -> Self {
        Error::Typing { errors }
    }
}

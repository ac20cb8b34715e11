//! The compile-time evaluation driver.
//!
//! Drives the AST to a fixed point in which no unresolved `@` call
//! remains: each driver iteration re-runs the typing passes, lowers every
//! unresolved compile-time call site to its own bytecode image, executes
//! it in a fresh quota-bounded VM, and substitutes the exit word back into
//! the tree as an integer literal. Once steady, the whole program is
//! lowered.
//!
//! Sites are evaluated in the order the analyzer collected them
//! (arguments before the calls containing them), so syntactically nested
//! `@` sites resolve leaves-first. A site whose lowering still runs into
//! an unresolved compile-time call (possible when a `@` site hides inside
//! the body of a function another site calls) is deferred to the next
//! iteration. An iteration that defers every remaining site is a cycle.

use bumpalo::Bump;

use crate::analyzer::{analyze, Analysis};
use crate::compiler::{BytecodeCompiler, CompileError};
use crate::errors::Error;
use crate::parser::ast::{Expr, ExprKind, Root};
use crate::vm::{Bytecode, Vm};


/// Instruction quota for a single compile-time call; exceeding it aborts
/// compilation instead of hanging on non-terminating comptime code.
pub const COMPTIME_QUOTA: u64 = 1 << 24;

/// Resolve every compile-time call, then lower the full program.
pub fn resolve_and_lower<'a>(arena: &'a Bump, root: &'a Root<'a>) -> Result<Bytecode, Error> {
    let analysis = drive_to_fixed_point(arena, root)?;
    Ok(BytecodeCompiler::lower_program(&analysis.symbols, root)?)
}

/// Run the typing passes and compile-time evaluation until the AST is
/// steady, returning the final analysis.
pub fn drive_to_fixed_point<'a>(
    arena: &'a Bump,
    root: &'a Root<'a>,
) -> Result<Analysis<'a>, Error> {
    let mut iteration = 0u32;
    loop {
        let analysis = analyze(arena, root)?;
        if analysis.comptime_calls.is_empty() {
            tracing::debug!(iteration, "compile-time evaluation reached a fixed point");
            return Ok(analysis);
        }

        iteration += 1;
        tracing::debug!(
            iteration,
            pending = analysis.comptime_calls.len(),
            "resolving compile-time calls"
        );

        let mut resolved_any = false;
        for &site in &analysis.comptime_calls {
            match evaluate_site(arena, &analysis, root, site) {
                Ok(()) => resolved_any = true,
                // The site lowers against another still-unresolved site;
                // retry next iteration, after that one is substituted.
                Err(Error::Compile {
                    source: CompileError::UnresolvedComptime { .. },
                }) => continue,
                Err(other) => return Err(other),
            }
        }
        if !resolved_any {
            return Err(Error::ComptimeCycle);
        }
    }
}

/// Lower one call site, run it, and substitute the result literal.
fn evaluate_site<'a>(
    arena: &'a Bump,
    analysis: &Analysis<'a>,
    root: &'a Root<'a>,
    site: &'a Expr<'a>,
) -> Result<(), Error> {
    let bytecode = BytecodeCompiler::lower_call_site(&analysis.symbols, root, site)?;

    // Output produced at compile time (a `print` in evaluated code) goes
    // to the compiler's stderr, not the compiled program's stdout.
    let mut stderr = std::io::stderr();
    let value = Vm::new(bytecode, &mut stderr)
        .with_quota(COMPTIME_QUOTA)
        .run()
        .map_err(|source| Error::ComptimeEval {
            line: site.line,
            source,
        })?;

    let ExprKind::Call(call) = &site.kind else {
        return Err(CompileError::internal("comptime site is not a call").into());
    };
    let literal = &*arena.alloc(Expr::new(site.line, ExprKind::Num(value)));
    call.resolved.set(Some(literal));

    tracing::debug!(line = site.line, value, "resolved compile-time call");
    Ok(())
}

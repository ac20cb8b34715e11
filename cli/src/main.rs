//! The `varde` command-line compiler.

use std::path::PathBuf;
use std::process::ExitCode;

use bumpalo::Bump;
use clap::Parser;
use miette::{miette, IntoDiagnostic, Result};
use tracing_subscriber::EnvFilter;

use varde_core::vm::Vm;

/// Compiler for the Varde language.
#[derive(Parser, Debug)]
#[command(name = "varde")]
#[command(about = "Compile and run Varde programs", long_about = None)]
struct Args {
    /// Source file to compile.
    file: PathBuf,

    /// Log filter (off, error, warn, info, debug, trace).
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Stop after parsing and print the AST.
    #[arg(long)]
    parse_only: bool,

    /// Print the bytecode listing.
    #[arg(long)]
    emit_bytecode: bool,

    /// Execute the produced bytecode (the default when no other mode is
    /// chosen).
    #[arg(long)]
    run: bool,

    /// Print the listing, then dump the machine state after every executed
    /// instruction.
    #[arg(long)]
    debug_bytecode: bool,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let filter = EnvFilter::try_new(&args.log_level)
        .map_err(|e| miette!("invalid --log-level '{}': {e}", args.log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let source = std::fs::read_to_string(&args.file).into_diagnostic()?;
    let arena = Bump::new();
    let source = arena.alloc_str(&source);

    if args.parse_only {
        match varde_core::parser::parse(&arena, source) {
            Ok(root) => {
                println!("{root:#?}");
                return Ok(ExitCode::SUCCESS);
            }
            Err(errors) => {
                for error in &errors {
                    eprintln!("{error}");
                }
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    let bytecode = match varde_core::compile(&arena, source) {
        Ok(bytecode) => bytecode,
        Err(error) => {
            eprintln!("{error}");
            return Ok(ExitCode::FAILURE);
        }
    };

    if args.emit_bytecode || args.debug_bytecode {
        print!("{}", bytecode.disassemble(source));
    }

    let should_run = args.run || args.debug_bytecode || !args.emit_bytecode;
    if should_run {
        let mut stdout = std::io::stdout();
        let result = Vm::new(bytecode, &mut stdout)
            .with_trace(args.debug_bytecode)
            .run()
            .map_err(|e| miette!("runtime fault: {e}"))?;
        tracing::debug!(result, "program finished");
    }

    Ok(ExitCode::SUCCESS)
}

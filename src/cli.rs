//! CLI layer: argument parsing, the verify pipeline, and exit codes.
//!
//! Everything the tool promises on standard output — the single `[ ERROR ]`
//! line, the warning about extra arguments, and the PASSED/FAILED summary —
//! is printed here. Logging goes to standard error so stdout stays exactly
//! the contractual output.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::{check, parse};

/// Static compliance verifier for Qubic smart contract source files
#[derive(Parser, Debug)]
#[command(name = "contractverify", version, about, after_help = "\
Exit code 0 when the contract passes the compliance check, 1 otherwise\n\
(missing argument, unparseable file, or a forbidden construct).")]
pub(crate) struct Cli {
    /// Path to the contract source file to verify
    pub filepath: PathBuf,

    /// Ignored; kept so stray arguments warn instead of failing
    #[arg(trailing_var_arg = true, hide = true)]
    pub extra: Vec<String>,
}

// ─── Main entry point ───────────────────────────────────────────────

pub fn run() -> ExitCode {
    init_tracing();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // clap exits 2 by default; the contract is 1 for usage errors
            // and 0 for --help/--version
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    if !cli.extra.is_empty() {
        println!("[ WARNING ] Too many command line arguments provided, excessive arguments will be ignored.");
    }

    let ast = match parse::parse_file(&cli.filepath) {
        Ok(ast) => ast,
        Err(e) => {
            println!("[ ERROR ] {e}");
            return ExitCode::from(1);
        }
    };

    let state_struct_name = check::find_state_struct_name(&ast);
    debug!(state_struct = %state_struct_name, "running compliance check");

    match check::check_compliance(&ast, &state_struct_name) {
        Ok(()) => {
            println!("Contract compliance check PASSED");
            ExitCode::SUCCESS
        }
        Err(violation) => {
            println!("{violation}");
            println!("Contract compliance check FAILED");
            ExitCode::from(1)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

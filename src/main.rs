//! Static compliance verifier for Qubic smart contract source files.
//!
//! Binary crate entry point. All CLI logic is in the `cli` module.

use std::process::ExitCode;

fn main() -> ExitCode {
    contractverify::cli::run()
}

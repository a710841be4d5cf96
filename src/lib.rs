//! # contractverify — Qubic contract compliance verifier
//!
//! Static verifier for smart-contract source files written in the restricted
//! C++ dialect executed by the Qubic runtime. The file is parsed into a
//! closed tagged AST and traversed once; the check passes only if every
//! construct lies within the permitted subset, and the first forbidden
//! construct aborts the traversal with a single diagnostic.
//!
//! ## Library usage
//!
//! This crate is primarily a CLI tool, but the front-end and rule engine are
//! exposed as a library for testing and integration:
//!
//! ```
//! use contractverify::{check, parse};
//!
//! let ast = parse::parse_source("struct TESTCON : public ContractBase {};").unwrap();
//! let state = check::find_state_struct_name(&ast);
//! assert_eq!(state, "TESTCON");
//! assert!(check::check_compliance(&ast, &state).is_ok());
//! ```

pub mod ast;
pub mod check;
pub mod cli;
pub mod error;
pub mod parse;
pub mod scope;

pub use error::{VerifyError, Violation};

// ─── Static allow-lists ──────────────────────────────────────────────

/// Platform macro names. Statement-level calls to these tokenize as macro
/// invocations and are accepted without inspecting their arguments.
pub const KNOWN_MACRO_NAMES: &[&str] = &[
    "INITIALIZE",
    "INITIALIZE_WITH_LOCALS",
    "BEGIN_EPOCH",
    "BEGIN_EPOCH_WITH_LOCALS",
    "END_EPOCH",
    "END_EPOCH_WITH_LOCALS",
    "BEGIN_TICK",
    "BEGIN_TICK_WITH_LOCALS",
    "END_TICK",
    "END_TICK_WITH_LOCALS",
    "PRE_ACQUIRE_SHARES",
    "PRE_ACQUIRE_SHARES_WITH_LOCALS",
    "PRE_RELEASE_SHARES",
    "PRE_RELEASE_SHARES_WITH_LOCALS",
    "POST_ACQUIRE_SHARES",
    "POST_ACQUIRE_SHARES_WITH_LOCALS",
    "POST_RELEASE_SHARES",
    "POST_RELEASE_SHARES_WITH_LOCALS",
    "POST_INCOMING_TRANSFER",
    "POST_INCOMING_TRANSFER_WITH_LOCALS",
    "EXPAND",
    "LOG_DEBUG",
    "LOG_ERROR",
    "LOG_INFO",
    "LOG_WARNING",
    "PRIVATE_FUNCTION",
    "PRIVATE_FUNCTION_WITH_LOCALS",
    "PRIVATE_PROCEDURE",
    "PRIVATE_PROCEDURE_WITH_LOCALS",
    "PUBLIC_FUNCTION",
    "PUBLIC_FUNCTION_WITH_LOCALS",
    "PUBLIC_PROCEDURE",
    "PUBLIC_PROCEDURE_WITH_LOCALS",
    "REGISTER_USER_FUNCTIONS_AND_PROCEDURES",
    "REGISTER_USER_FUNCTION",
    "REGISTER_USER_PROCEDURE",
    "CALL",
    "CALL_OTHER_CONTRACT_FUNCTION",
    "INVOKE_OTHER_CONTRACT_PROCEDURE",
    "QUERY_ORACLE",
    "SELF",
    "SELF_INDEX",
];

/// Scope prefixes that are always legal to the left of `::`, independent of
/// what the contract file itself declares.
pub const ALLOWED_SCOPE_PREFIXES: &[&str] = &[
    // QPI and names defined in qpi.h
    "QPI",
    "ProposalTypes",
    "TransferType",
    "AssetIssuanceSelect",
    "AssetOwnershipSelect",
    "AssetPossessionSelect",
    // other contract names
    "QUOTTERY",
    "QX",
    "TESTEXA",
    "TESTEXB",
];

/// True iff `name` is one of the known platform macros.
pub fn is_known_macro(name: &str) -> bool {
    KNOWN_MACRO_NAMES.contains(&name)
}

//! Front-end: parses contract source with the tree-sitter C++ grammar and
//! lowers the untyped tree into the crate's tagged AST.
//!
//! Lowering is where the closed world starts: every tree-sitter node kind
//! the lowering does not recognize becomes [`Entity::Blob`], which the rule
//! engine rejects. Known platform macro invocations are classified here so
//! the rule engine can accept them without looking at their arguments.

mod lower;

#[cfg(test)]
mod parse_tests;

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::ast::Entity;
use crate::error::VerifyError;

/// Parses a whole source string into the file compound.
///
/// Returns `None` only when tree-sitter produces no tree at all; broken
/// regions inside an otherwise parsed file lower to `Blob` entities instead.
pub fn parse_source(source: &str) -> Option<Entity> {
    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(&tree_sitter_cpp::LANGUAGE.into())
        .expect("Error loading C++ grammar");

    let tree = parser.parse(source, None)?;
    Some(lower::lower_file(tree.root_node(), source.as_bytes()))
}

/// Reads and parses a contract file.
pub fn parse_file(path: &Path) -> Result<Entity, VerifyError> {
    let source = fs::read_to_string(path).map_err(|source| VerifyError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(path = %path.display(), bytes = source.len(), "parsing contract file");

    parse_source(&source).ok_or_else(|| VerifyError::Parse {
        path: path.to_path_buf(),
    })
}

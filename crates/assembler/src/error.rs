//! Error types for the stackvm assembler.

use thiserror::Error;

/// Errors produced while flattening a symbolic program.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AsmError {
    /// A jump names a label that is never defined.
    #[error("jump at op {at} to undefined label '{label}'")]
    UndefinedLabel { at: usize, label: String },

    /// A label is defined twice.
    #[error("label '{label}' defined again at op {at}")]
    DuplicateLabel { at: usize, label: String },

    /// A variable reference survived local resolution.
    #[error("unresolved variable reference '{key}' at op {at}")]
    UnresolvedReference { at: usize, key: String },
}

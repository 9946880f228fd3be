//! Errors shared by the value layer.

use thiserror::Error;

use crate::value::{Value, ValueKind};

/// A value did not have the kind an operation required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("expected {expected} value, found {found}")]
    WrongKind {
        expected: ValueKind,
        found: ValueKind,
    },
}

impl ValueError {
    pub(crate) fn wrong_kind(expected: ValueKind, found: Value) -> Self {
        ValueError::WrongKind {
            expected,
            found: found.kind(),
        }
    }
}

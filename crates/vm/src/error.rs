//! Runtime errors for the stack machine.
//!
//! Every error carries the instruction index (`at`) that raised it. The
//! machine is left as it was before the failing instruction started: its
//! operands are back on the stack and the IP still points at it.

use stackvm_common::{ValueError, ValueKind};
use thiserror::Error;

/// Errors that abort execution.
///
/// Running out of budget is not an error; see
/// [`Termination::BudgetExceeded`](crate::Termination::BudgetExceeded).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// INTERRUPT with a code other than the print interrupt.
    #[error("unsupported interrupt code {code} at instruction {at}")]
    UnsupportedInterrupt { at: usize, code: i64 },

    /// Pop on an empty stack.
    #[error("stack underflow at instruction {at}")]
    StackUnderflow { at: usize },

    /// Stack exceeded the maximum depth of 4096 slots.
    #[error("stack overflow at instruction {at}")]
    StackOverflow { at: usize },

    /// An operand had the wrong kind, e.g. jumping to an integer.
    #[error("type mismatch at instruction {at}: expected {expected}, found {found}")]
    TypeMismatch {
        at: usize,
        expected: ValueKind,
        found: ValueKind,
    },

    /// Integer division by zero.
    #[error("division by zero at instruction {at}")]
    DivisionByZero { at: usize },

    /// Checked integer or address arithmetic left its range.
    #[error("arithmetic overflow at instruction {at}")]
    ArithmeticOverflow { at: usize },

    /// PEEK or POKE addressed a slot beyond the top of the stack.
    #[error("frame slot {slot} out of bounds (depth {depth}) at instruction {at}")]
    FrameOutOfBounds { at: usize, slot: usize, depth: usize },

    /// PEEK or POKE with a negative frame offset.
    #[error("negative frame offset {offset} at instruction {at}")]
    NegativeOffset { at: usize, offset: i64 },
}

impl RuntimeError {
    pub(crate) fn type_mismatch(at: usize, err: ValueError) -> Self {
        match err {
            ValueError::WrongKind { expected, found } => RuntimeError::TypeMismatch {
                at,
                expected,
                found,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_unsupported_interrupt() {
        let e = RuntimeError::UnsupportedInterrupt { at: 7, code: 9 };
        assert_eq!(e.to_string(), "unsupported interrupt code 9 at instruction 7");
    }

    #[test]
    fn error_display_type_mismatch() {
        let e = RuntimeError::TypeMismatch {
            at: 3,
            expected: ValueKind::Ip,
            found: ValueKind::Int,
        };
        assert_eq!(
            e.to_string(),
            "type mismatch at instruction 3: expected ip, found int"
        );
    }

    #[test]
    fn error_display_frame_out_of_bounds() {
        let e = RuntimeError::FrameOutOfBounds {
            at: 12,
            slot: 5,
            depth: 4,
        };
        assert_eq!(
            e.to_string(),
            "frame slot 5 out of bounds (depth 4) at instruction 12"
        );
    }

    #[test]
    fn error_display_negative_offset() {
        let e = RuntimeError::NegativeOffset { at: 2, offset: -1 };
        assert_eq!(e.to_string(), "negative frame offset -1 at instruction 2");
    }

    #[test]
    fn type_mismatch_from_value_error() {
        let err = ValueError::WrongKind {
            expected: ValueKind::Frame,
            found: ValueKind::Ip,
        };
        assert_eq!(
            RuntimeError::type_mismatch(4, err),
            RuntimeError::TypeMismatch {
                at: 4,
                expected: ValueKind::Frame,
                found: ValueKind::Ip,
            }
        );
    }
}

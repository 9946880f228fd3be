//! Shared types for the stackvm toolchain.
//!
//! - [`Value`], [`Ip`], [`FrameBase`]: operand-stack cells and the tagged
//!   address types that live alongside data
//! - [`Instruction`]: the concrete instruction set, with declared stack effects
//! - [`SymOp`] / [`SymbolicProgram`]: instructions plus pre-assembly pseudo-ops
//! - [`Program`]: a flat, addressable instruction array
//!
//! # Dependencies
//!
//! This crate uses `thiserror` and has no other dependencies.

pub mod error;
pub mod instruction;
pub mod program;
pub mod symbolic;
pub mod value;

pub use error::ValueError;
pub use instruction::{Instruction, PRINT_INTERRUPT};
pub use program::Program;
pub use symbolic::{SymOp, SymbolicProgram, JUMP_EXPANSION};
pub use value::{FrameBase, Ip, Value, ValueKind};

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<i64>().prop_map(Value::Int),
            (0usize..10_000).prop_map(|n| Value::Ip(Ip(n))),
            (0usize..10_000).prop_map(|n| Value::Frame(FrameBase(n))),
        ]
    }

    fn arb_instruction() -> impl Strategy<Value = Instruction> {
        prop_oneof![
            prop::sample::select(&instruction::NULLARY[..]),
            arb_value().prop_map(Instruction::Push),
        ]
    }

    proptest! {
        /// Wrapping an instruction never changes its declared effect or slot count.
        #[test]
        fn wrapped_instruction_keeps_effect(instr in arb_instruction()) {
            let op = SymOp::from(instr);
            prop_assert_eq!(op.stack_effect(), instr.stack_effect());
            prop_assert_eq!(op.slots(), Some(1));
        }

        /// Values convert back to exactly the kind they were built from.
        #[test]
        fn value_kind_conversions(value in arb_value()) {
            prop_assert_eq!(i64::try_from(value).is_ok(), value.kind() == ValueKind::Int);
            prop_assert_eq!(Ip::try_from(value).is_ok(), value.kind() == ValueKind::Ip);
            prop_assert_eq!(FrameBase::try_from(value).is_ok(), value.kind() == ValueKind::Frame);
        }

        /// Every instruction's effect lies within what the machine can pop.
        #[test]
        fn effects_are_bounded(instr in arb_instruction()) {
            prop_assert!((-1..=2).contains(&instr.stack_effect()));
        }
    }
}

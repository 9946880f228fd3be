//! stackvm assembler: symbolic program → flat program.
//!
//! Assembly is two passes over the op list. The first assigns every label
//! the address of the next concrete instruction; the second emits
//! instructions, expanding each symbolic jump into `PUSH IP(target)`
//! followed by `JUMP` or `JUMP_COND`. Pseudo-ops that occupy no slots
//! (comments, locals, resolution markers) vanish.
//!
//! # Usage
//!
//! ```
//! use stackvm_assembler::assemble;
//! use stackvm_common::{Instruction, Ip, SymOp, SymbolicProgram, Value};
//!
//! let symbolic = SymbolicProgram::new(vec![
//!     SymOp::Jump("end".to_string()),
//!     SymOp::Op(Instruction::Nop),
//!     SymOp::Label("end".to_string()),
//!     SymOp::Op(Instruction::Halt),
//! ]);
//! let program = assemble(&symbolic).unwrap();
//! assert_eq!(program.instructions[0], Instruction::Push(Value::Ip(Ip(3))));
//! assert_eq!(program.instructions[1], Instruction::Jump);
//! ```

pub mod error;

mod disassembler;

pub use error::AsmError;

use std::collections::HashMap;

use stackvm_common::{Instruction, Ip, Program, SymOp, SymbolicProgram, Value};

/// Flatten a symbolic program, resolving every label to an address.
///
/// Returns the first error encountered. Output is fully deterministic: the
/// same input always yields the same program.
pub fn assemble(symbolic: &SymbolicProgram) -> Result<Program, AsmError> {
    let labels = label_addresses(symbolic)?;
    let mut instructions = Vec::with_capacity(symbolic.len());

    for (at, op) in symbolic.ops.iter().enumerate() {
        match op {
            SymOp::Op(instr) => instructions.push(*instr),
            SymOp::Jump(label) => {
                instructions.push(jump_target(&labels, label, at)?);
                instructions.push(Instruction::Jump);
            }
            SymOp::JumpCond(label) => {
                instructions.push(jump_target(&labels, label, at)?);
                instructions.push(Instruction::JumpCond);
            }
            _ => {}
        }
    }

    Ok(Program::new(instructions))
}

/// Render an assembled program as a numbered listing.
pub fn disassemble(program: &Program) -> String {
    disassembler::disassemble(program)
}

/// First pass: map each label to the address of the slot that follows it.
fn label_addresses(symbolic: &SymbolicProgram) -> Result<HashMap<&str, usize>, AsmError> {
    let mut labels = HashMap::new();
    let mut address = 0usize;

    for (at, op) in symbolic.ops.iter().enumerate() {
        if let SymOp::Label(name) = op {
            if labels.insert(name.as_str(), address).is_some() {
                return Err(AsmError::DuplicateLabel {
                    at,
                    label: name.clone(),
                });
            }
        }
        address += op.slots().ok_or_else(|| unresolved(op, at))?;
    }

    Ok(labels)
}

fn jump_target(
    labels: &HashMap<&str, usize>,
    label: &str,
    at: usize,
) -> Result<Instruction, AsmError> {
    let address = labels
        .get(label)
        .copied()
        .ok_or_else(|| AsmError::UndefinedLabel {
            at,
            label: label.to_string(),
        })?;
    Ok(Instruction::Push(Value::Ip(Ip(address))))
}

fn unresolved(op: &SymOp, at: usize) -> AsmError {
    let key = match op {
        SymOp::PushRef(key) => key.clone(),
        other => other.to_string(),
    };
    AsmError::UnresolvedReference { at, key }
}

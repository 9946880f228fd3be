//! Merging per-function blocks behind a synthesized start routine.

use stackvm_common::{Instruction, Ip, SymOp, SymbolicProgram, Value};

use crate::symbols::SymbolTable;

/// Label of the start routine. Not a valid identifier, so it cannot clash
/// with a function name.
pub const START_LABEL: &str = "<start>";

/// Address the entry function returns to: the start routine's jump
/// instruction. `POP_IP` resumes one past it, at the frame cleanup.
pub const START_RETURN_ADDRESS: Ip = Ip(5);

/// Build the start routine.
///
/// Sets up a frame whose base sits just above a saved zero base, pushes a
/// return address targeting its own tail, and jumps to the entry function.
/// On return it drops the saved base from under the result and halts.
pub fn start_routine(entry: &str) -> Vec<SymOp> {
    vec![
        SymOp::Info("start".to_string()),
        SymOp::Label(START_LABEL.to_string()),
        SymOp::Op(Instruction::PushFrame),
        SymOp::Op(Instruction::StageFrame),
        SymOp::Op(Instruction::CommitFrame),
        SymOp::Op(Instruction::Push(Value::Ip(START_RETURN_ADDRESS))),
        // Occupies slots 4 and 5.
        SymOp::Jump(entry.to_string()),
        SymOp::Op(Instruction::Swap),
        SymOp::Op(Instruction::Pop),
        SymOp::Op(Instruction::Halt),
    ]
}

/// Concatenate the start routine and every function block, in discovery
/// order. `blocks` must be parallel to `symbols.functions()`.
pub fn link(symbols: &SymbolTable<'_>, blocks: Vec<Vec<SymOp>>) -> SymbolicProgram {
    let mut ops = start_routine(&symbols.entry().name);

    for (function, block) in symbols.functions().zip(blocks) {
        ops.push(SymOp::Info(format!("function {}", function.name)));
        ops.push(SymOp::Label(function.name.clone()));
        ops.extend(block);
    }

    SymbolicProgram::new(ops)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn return_address_points_at_the_jump() {
        // Count slots up to and including the jump expansion.
        let ops = start_routine("main");
        let mut slot = 0;
        let mut jump_slot = None;
        for op in &ops {
            if let SymOp::Jump(_) = op {
                jump_slot = Some(slot + 1);
            }
            slot += op.slots().unwrap();
        }
        assert_eq!(jump_slot, Some(START_RETURN_ADDRESS.0));
    }

    #[test]
    fn start_routine_is_balanced_around_the_entry_call() {
        // Before the call: saved base + return address. After: the result
        // replaces the address, then the saved base is dropped.
        let ops = start_routine("main");
        let effect: i64 = ops.iter().map(SymOp::stack_effect).sum();
        assert_eq!(effect, -1);
    }

    #[test]
    fn start_routine_ends_in_halt() {
        let ops = start_routine("main");
        assert_eq!(ops.last(), Some(&SymOp::Op(Instruction::Halt)));
        assert!(ops.contains(&SymOp::Jump("main".into())));
    }
}

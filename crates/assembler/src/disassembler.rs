//! Disassembler: flat program → numbered listing.
//!
//! One instruction per line, `NNNN MNEMONIC [operand]`. Jump targets appear
//! as the `PUSH IP(n)` immediately before each `JUMP`/`JUMP_COND`; those
//! lines get a trailing `; -> n` marker so control flow reads at a glance.

use stackvm_common::{Instruction, Program, Value};

/// Render a program as a numbered listing.
pub fn disassemble(program: &Program) -> String {
    let instrs = &program.instructions;
    let mut out = String::new();

    for (idx, instr) in instrs.iter().enumerate() {
        out.push_str(&format!("{idx:04} {instr}"));

        let next_is_jump = matches!(
            instrs.get(idx + 1),
            Some(Instruction::Jump | Instruction::JumpCond)
        );
        if let (Instruction::Push(Value::Ip(target)), true) = (instr, next_is_jump) {
            out.push_str(&format!("  ; -> {:04}", target.0));
        }
        out.push('\n');
    }

    out
}

//! The concrete instruction set of the stack machine.
//!
//! Every instruction declares its net operand-stack effect as a count of
//! consumed values: positive when it pops more than it pushes, negative
//! when it pushes more than it pops. Code generation and resolution sum
//! these declarations to check stack balance without executing anything.

use std::fmt;

use crate::value::Value;

/// Interrupt code that pops one value and emits it to the output sink.
pub const PRINT_INTERRUPT: i64 = 1;

/// A single executable instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instruction {
    // Stack
    /// Push a constant.
    Push(Value),
    /// Push `Int(0)`.
    PushZero,
    /// Discard the top of stack.
    Pop,
    /// Duplicate the top of stack.
    Dup,
    /// Exchange the two topmost values.
    Swap,
    /// Pop an offset, push the frame slot at `frame_base + offset`.
    Peek,
    /// Pop an offset, pop a value, store the value at `frame_base + offset`.
    Poke,

    // Arithmetic: the left operand is on top, the right operand below it.
    Add,
    Sub,
    Mul,
    Div,
    Xor,
    And,
    /// Negate the top of stack.
    Neg,

    // Comparison: pop two, set the condition flag to `top OP below`.
    CmpEq,
    CmpNe,
    CmpGe,
    CmpLe,
    CmpGt,
    CmpLt,

    // Control
    /// Pop an address and jump to it.
    Jump,
    /// Pop an address and jump to it if the condition flag is set.
    JumpCond,
    /// Push the address of this instruction.
    PushIp,
    /// Pop an address, continue at the instruction after it.
    PopIp,
    /// Stop the machine.
    Halt,
    /// Pop an interrupt code and service it.
    Interrupt,
    /// Do nothing.
    Nop,

    // Frame
    /// Stage the current stack depth as the next frame base.
    StageFrame,
    /// Make the staged frame base the active one.
    CommitFrame,
    /// Push the active frame base.
    PushFrame,
    /// Pop a frame base into the staged register and commit it.
    PopFrame,
}

/// Every operand-free instruction, in definition order.
pub const NULLARY: [Instruction; 30] = [
    Instruction::PushZero,
    Instruction::Pop,
    Instruction::Dup,
    Instruction::Swap,
    Instruction::Peek,
    Instruction::Poke,
    Instruction::Add,
    Instruction::Sub,
    Instruction::Mul,
    Instruction::Div,
    Instruction::Xor,
    Instruction::And,
    Instruction::Neg,
    Instruction::CmpEq,
    Instruction::CmpNe,
    Instruction::CmpGe,
    Instruction::CmpLe,
    Instruction::CmpGt,
    Instruction::CmpLt,
    Instruction::Jump,
    Instruction::JumpCond,
    Instruction::PushIp,
    Instruction::PopIp,
    Instruction::Halt,
    Instruction::Interrupt,
    Instruction::Nop,
    Instruction::StageFrame,
    Instruction::CommitFrame,
    Instruction::PushFrame,
    Instruction::PopFrame,
];

impl Instruction {
    /// Net number of values consumed from the operand stack.
    ///
    /// Negative means the instruction leaves more values than it found.
    /// `INTERRUPT` is declared for the print interrupt (code and value).
    pub fn stack_effect(&self) -> i64 {
        match self {
            Instruction::Push(_)
            | Instruction::PushZero
            | Instruction::Dup
            | Instruction::PushIp
            | Instruction::PushFrame => -1,

            Instruction::Swap
            | Instruction::Peek
            | Instruction::Neg
            | Instruction::Halt
            | Instruction::Nop
            | Instruction::StageFrame
            | Instruction::CommitFrame => 0,

            Instruction::Pop
            | Instruction::Add
            | Instruction::Sub
            | Instruction::Mul
            | Instruction::Div
            | Instruction::Xor
            | Instruction::And
            | Instruction::Jump
            | Instruction::JumpCond
            | Instruction::PopIp
            | Instruction::PopFrame => 1,

            Instruction::Poke
            | Instruction::CmpEq
            | Instruction::CmpNe
            | Instruction::CmpGe
            | Instruction::CmpLe
            | Instruction::CmpGt
            | Instruction::CmpLt
            | Instruction::Interrupt => 2,
        }
    }

    /// Assembly mnemonic.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Instruction::Push(_) => "PUSH",
            Instruction::PushZero => "PUSH_ZERO",
            Instruction::Pop => "POP",
            Instruction::Dup => "DUP",
            Instruction::Swap => "SWAP",
            Instruction::Peek => "PEEK",
            Instruction::Poke => "POKE",
            Instruction::Add => "ADD",
            Instruction::Sub => "SUB",
            Instruction::Mul => "MUL",
            Instruction::Div => "DIV",
            Instruction::Xor => "XOR",
            Instruction::And => "AND",
            Instruction::Neg => "NEG",
            Instruction::CmpEq => "CMP_EQ",
            Instruction::CmpNe => "CMP_NE",
            Instruction::CmpGe => "CMP_GE",
            Instruction::CmpLe => "CMP_LE",
            Instruction::CmpGt => "CMP_GT",
            Instruction::CmpLt => "CMP_LT",
            Instruction::Jump => "JUMP",
            Instruction::JumpCond => "JUMP_COND",
            Instruction::PushIp => "PUSH_IP",
            Instruction::PopIp => "POP_IP",
            Instruction::Halt => "HALT",
            Instruction::Interrupt => "INTERRUPT",
            Instruction::Nop => "NOP",
            Instruction::StageFrame => "STAGE_FRAME",
            Instruction::CommitFrame => "COMMIT_FRAME",
            Instruction::PushFrame => "PUSH_FRAME",
            Instruction::PopFrame => "POP_FRAME",
        }
    }

    /// True for the comparison instructions that write the condition flag.
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            Instruction::CmpEq
                | Instruction::CmpNe
                | Instruction::CmpGe
                | Instruction::CmpLe
                | Instruction::CmpGt
                | Instruction::CmpLt
        )
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Push(value) => write!(f, "PUSH {value}"),
            other => f.write_str(other.mnemonic()),
        }
    }
}

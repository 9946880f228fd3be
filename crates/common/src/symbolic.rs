//! Symbolic operations: instructions plus the pseudo-ops that exist only
//! between code generation and assembly.
//!
//! The local resolver removes variable references and their markers; the
//! assembler removes labels, jumps to labels, and the informational and
//! balance markers. Nothing symbolic survives into a flat [`Program`].
//!
//! [`Program`]: crate::Program

use std::fmt;

use crate::instruction::Instruction;

/// Instruction slots an unresolved jump expands to: `PUSH target` + jump.
pub const JUMP_EXPANSION: usize = 2;

/// One operation in a symbolic stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SymOp {
    /// An already-concrete instruction.
    Op(Instruction),
    /// Free-form note for listings. Occupies no slot.
    Info(String),
    /// Marks the address of the next emitted instruction.
    Label(String),
    /// Unconditional jump to a label.
    Jump(String),
    /// Jump to a label if the condition flag is set.
    JumpCond(String),
    /// Names the local slot initialized by the following instruction.
    VariableLabel(String),
    /// Push of a variable's frame offset, keyed for the resolver.
    PushRef(String),
    /// Binds the `PushRef` key of a poke to its variable.
    ResolvePoke { key: String, variable: String },
    /// Binds the `PushRef` key of a peek to its variable.
    ResolvePeek { key: String, variable: String },
    /// Accounts for a value the return sequence discards below the result.
    PopArg(String),
    /// Accounts for the return value leaving the statement.
    PushArg(String),
}

impl SymOp {
    /// Declared net stack effect, in the same convention as
    /// [`Instruction::stack_effect`].
    pub fn stack_effect(&self) -> i64 {
        match self {
            SymOp::Op(instr) => instr.stack_effect(),
            SymOp::PushRef(_) | SymOp::PopArg(_) => -1,
            SymOp::PushArg(_) => 1,
            SymOp::Info(_)
            | SymOp::Label(_)
            | SymOp::Jump(_)
            | SymOp::JumpCond(_)
            | SymOp::VariableLabel(_)
            | SymOp::ResolvePoke { .. }
            | SymOp::ResolvePeek { .. } => 0,
        }
    }

    /// Number of flat instruction slots this op assembles to, or `None`
    /// for a `PushRef` that should have been resolved already.
    pub fn slots(&self) -> Option<usize> {
        match self {
            SymOp::Op(_) => Some(1),
            SymOp::Jump(_) | SymOp::JumpCond(_) => Some(JUMP_EXPANSION),
            SymOp::Info(_)
            | SymOp::Label(_)
            | SymOp::VariableLabel(_)
            | SymOp::ResolvePoke { .. }
            | SymOp::ResolvePeek { .. }
            | SymOp::PopArg(_)
            | SymOp::PushArg(_) => Some(0),
            SymOp::PushRef(_) => None,
        }
    }
}

impl From<Instruction> for SymOp {
    fn from(instr: Instruction) -> Self {
        SymOp::Op(instr)
    }
}

impl fmt::Display for SymOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymOp::Op(instr) => write!(f, "    {instr}"),
            SymOp::Info(text) => write!(f, "; {text}"),
            SymOp::Label(name) => write!(f, "{name}:"),
            SymOp::Jump(name) => write!(f, "    JUMP @{name}"),
            SymOp::JumpCond(name) => write!(f, "    JUMP_COND @{name}"),
            SymOp::VariableLabel(name) => write!(f, "    ; local {name}"),
            SymOp::PushRef(key) => write!(f, "    PUSH &{key}"),
            SymOp::ResolvePoke { key, variable } => {
                write!(f, "    ; poke {key} -> {variable}")
            }
            SymOp::ResolvePeek { key, variable } => {
                write!(f, "    ; peek {key} -> {variable}")
            }
            SymOp::PopArg(name) => write!(f, "    ; drop {name}"),
            SymOp::PushArg(name) => write!(f, "    ; keep {name}"),
        }
    }
}

/// The merged symbolic program: start routine followed by one block per
/// function.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SymbolicProgram {
    pub ops: Vec<SymOp>,
}

impl SymbolicProgram {
    pub fn new(ops: Vec<SymOp>) -> Self {
        Self { ops }
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl fmt::Display for SymbolicProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for op in &self.ops {
            writeln!(f, "{op}")?;
        }
        Ok(())
    }
}

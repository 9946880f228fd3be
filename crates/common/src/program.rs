//! Flat, fully assembled programs.

use std::fmt;

use crate::instruction::Instruction;
use crate::value::Ip;

/// An assembled program: one concrete instruction per address.
///
/// Immutable once assembled; any number of machines may execute the same
/// program.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Program {
    pub instructions: Vec<Instruction>,
}

impl Program {
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    /// The instruction at `ip`, or `None` past the end.
    pub fn fetch(&self, ip: Ip) -> Option<&Instruction> {
        self.instructions.get(ip.0)
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, instr) in self.instructions.iter().enumerate() {
            writeln!(f, "{idx:04} {instr}")?;
        }
        Ok(())
    }
}

//! Per-step execution trace.

use std::fmt;

use stackvm_common::{FrameBase, Instruction, Ip, Value};

/// Snapshot taken just before an instruction executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceRecord {
    pub ip: Ip,
    pub instruction: Instruction,
    pub frame_base: FrameBase,
    pub stack: Vec<Value>,
}

impl fmt::Display for TraceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "INS: {:04} {}", self.ip.0, self.instruction)?;
        writeln!(f, "STB: {}", self.frame_base)?;
        write!(f, "STF:")?;
        for value in &self.stack {
            write!(f, " {value}")?;
        }
        Ok(())
    }
}

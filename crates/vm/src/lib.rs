//! stackvm virtual machine: executes assembled flat programs.
//!
//! The machine has:
//! - An operand stack shared by data, saved frame bases and return addresses
//! - A frame-base register plus a staged frame base, committed separately
//! - A condition flag written by comparisons and read by `JUMP_COND`
//! - An instruction budget that cuts off runaway programs
//!
//! # Usage
//!
//! ```
//! use stackvm_common::{Instruction, Program, Value};
//! use stackvm_vm::{run, RunConfig, Termination};
//!
//! let program = Program::new(vec![
//!     Instruction::Push(Value::Int(42)),
//!     Instruction::Push(Value::Int(1)),
//!     Instruction::Interrupt,
//!     Instruction::Halt,
//! ]);
//!
//! let report = run(&program, &RunConfig::default()).unwrap();
//! assert_eq!(report.termination, Termination::Halted);
//! assert_eq!(report.output, vec![Value::Int(42)]);
//! ```

pub mod error;
pub mod execute;
pub mod machine;
pub mod sink;
pub mod trace;

pub use error::RuntimeError;
pub use machine::{Machine, RunConfig, Status, Termination, DEFAULT_BUDGET, MAX_STACK_DEPTH};
pub use sink::OutputSink;
pub use trace::TraceRecord;

use stackvm_common::{Program, Value};

/// Everything observable about a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub termination: Termination,
    /// Values emitted by the print interrupt, in order.
    pub output: Vec<Value>,
    /// The operand stack when the machine stopped.
    pub stack: Vec<Value>,
    pub executed: usize,
}

/// Execute a program to completion.
///
/// # Errors
///
/// Returns [`RuntimeError`] if an instruction faults (type mismatch,
/// division by zero, unsupported interrupt, etc.). Exhausting the budget is
/// reported as [`Termination::BudgetExceeded`], not as an error.
pub fn run(program: &Program, config: &RunConfig) -> Result<RunReport, RuntimeError> {
    let mut machine = Machine::new(program, config);
    let termination = machine.run_to_completion()?;
    let executed = machine.executed();
    let (output, stack) = machine.into_parts();
    Ok(RunReport {
        termination,
        output,
        stack,
        executed,
    })
}

//! Machine state: operand stack, registers, budget, output sink.

use crate::error::RuntimeError;
use crate::sink::OutputSink;
use stackvm_common::{FrameBase, Instruction, Ip, Program, Value};

/// Maximum operand stack depth.
pub const MAX_STACK_DEPTH: usize = 4096;

/// Default instruction budget.
pub const DEFAULT_BUDGET: usize = 1000;

/// Per-run configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunConfig {
    /// Maximum number of instructions executed before the run is cut off.
    pub budget: usize,
}

impl RunConfig {
    pub fn with_budget(budget: usize) -> Self {
        Self { budget }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            budget: DEFAULT_BUDGET,
        }
    }
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Termination {
    /// HALT executed.
    Halted,
    /// The instruction pointer left the program.
    RanOffEnd,
    /// The instruction budget was used up before the program finished.
    BudgetExceeded,
}

impl Termination {
    /// True for the two normal ways a program finishes.
    pub fn is_clean(self) -> bool {
        !matches!(self, Termination::BudgetExceeded)
    }
}

/// Outcome of a single [`Machine::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Running,
    Stopped(Termination),
}

/// The stack machine.
///
/// Owns all mutable execution state for one run. The program itself is
/// borrowed and never modified.
pub struct Machine<'a, S: OutputSink = Vec<Value>> {
    /// The program being executed.
    pub(crate) program: &'a Program,
    /// Operand stack; frame slots are addressed relative to `frame_base`.
    pub(crate) stack: Vec<Value>,
    /// Base of the active frame.
    pub(crate) frame_base: FrameBase,
    /// Base prepared by STAGE_FRAME, activated by COMMIT_FRAME.
    pub(crate) staged_base: FrameBase,
    /// Instruction pointer.
    pub(crate) ip: Ip,
    /// Condition flag, written by comparisons, read by JUMP_COND.
    pub(crate) cond: bool,
    /// Set once the run has stopped.
    pub(crate) termination: Option<Termination>,
    /// Instructions executed so far.
    pub(crate) executed: usize,
    pub(crate) budget: usize,
    pub(crate) sink: S,
    /// Values popped by the instruction in progress, top first.
    pub(crate) popped: Vec<Value>,
}

impl<'a> Machine<'a> {
    /// Create a machine that collects printed values in a `Vec`.
    pub fn new(program: &'a Program, config: &RunConfig) -> Self {
        Self::with_sink(program, config, Vec::new())
    }
}

impl<'a, S: OutputSink> Machine<'a, S> {
    /// Create a machine that sends printed values to `sink`.
    pub fn with_sink(program: &'a Program, config: &RunConfig, sink: S) -> Self {
        Self {
            program,
            stack: Vec::new(),
            frame_base: FrameBase::default(),
            staged_base: FrameBase::default(),
            ip: Ip(0),
            cond: false,
            termination: None,
            executed: 0,
            budget: config.budget,
            sink,
            popped: Vec::new(),
        }
    }

    pub fn stack(&self) -> &[Value] {
        &self.stack
    }

    pub fn frame_base(&self) -> FrameBase {
        self.frame_base
    }

    pub fn staged_frame_base(&self) -> FrameBase {
        self.staged_base
    }

    pub fn ip(&self) -> Ip {
        self.ip
    }

    pub fn cond(&self) -> bool {
        self.cond
    }

    pub fn executed(&self) -> usize {
        self.executed
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    /// `Some` once the run has stopped.
    pub fn termination(&self) -> Option<Termination> {
        self.termination
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Consume the machine, returning the output sink and the final stack.
    pub fn into_parts(self) -> (S, Vec<Value>) {
        (self.sink, self.stack)
    }

    /// The instruction at the current IP, or `None` past the end.
    pub(crate) fn fetch(&self) -> Option<Instruction> {
        self.program.fetch(self.ip).copied()
    }

    /// Push a value onto the stack, checking for overflow.
    pub(crate) fn push(&mut self, value: Value) -> Result<(), RuntimeError> {
        if self.stack.len() >= MAX_STACK_DEPTH {
            return Err(RuntimeError::StackOverflow { at: self.ip.0 });
        }
        self.stack.push(value);
        Ok(())
    }

    /// Pop a value from the stack.
    pub(crate) fn pop(&mut self) -> Result<Value, RuntimeError> {
        let value = self
            .stack
            .pop()
            .ok_or(RuntimeError::StackUnderflow { at: self.ip.0 })?;
        self.popped.push(value);
        Ok(value)
    }

    /// Undo the stack changes of a failed instruction. `depth` is the stack
    /// length before it started.
    pub(crate) fn roll_back(&mut self, depth: usize) {
        self.stack.truncate(depth - self.popped.len());
        self.stack.extend(self.popped.drain(..).rev());
    }

    pub(crate) fn pop_int(&mut self) -> Result<i64, RuntimeError> {
        let value = self.pop()?;
        i64::try_from(value).map_err(|e| RuntimeError::type_mismatch(self.ip.0, e))
    }

    pub(crate) fn pop_ip(&mut self) -> Result<Ip, RuntimeError> {
        let value = self.pop()?;
        Ip::try_from(value).map_err(|e| RuntimeError::type_mismatch(self.ip.0, e))
    }

    pub(crate) fn pop_frame(&mut self) -> Result<FrameBase, RuntimeError> {
        let value = self.pop()?;
        FrameBase::try_from(value).map_err(|e| RuntimeError::type_mismatch(self.ip.0, e))
    }

    /// Absolute stack index of frame slot `offset`.
    pub(crate) fn frame_slot(&self, offset: i64) -> Result<usize, RuntimeError> {
        let at = self.ip.0;
        let rel =
            usize::try_from(offset).map_err(|_| RuntimeError::NegativeOffset { at, offset })?;
        let slot = self
            .frame_base
            .0
            .checked_add(rel)
            .ok_or(RuntimeError::ArithmeticOverflow { at })?;
        if slot >= self.stack.len() {
            return Err(RuntimeError::FrameOutOfBounds {
                at,
                slot,
                depth: self.stack.len(),
            });
        }
        Ok(slot)
    }
}

//! Step function and instruction dispatch.
//!
//! Binary operations pop the top operand first: `SUB` computes
//! `top - below`, comparisons set the flag to `top OP below`. The code
//! generator pushes the right operand first, so `top` is the left operand.

use crate::error::RuntimeError;
use crate::machine::{Machine, Status, Termination};
use crate::sink::OutputSink;
use crate::trace::TraceRecord;
use stackvm_common::{FrameBase, Instruction, Ip, Value, ValueKind, PRINT_INTERRUPT};

/// Where control goes after an instruction.
enum Flow {
    /// Advance by one.
    Next,
    /// Continue at exactly this address.
    Goto(Ip),
    /// Continue one past this address.
    Resume(Ip),
    Halt,
}

impl<'a, S: OutputSink> Machine<'a, S> {
    /// Execute one instruction.
    ///
    /// Once stopped, further calls keep returning the same termination. On
    /// error, the stack is restored and the instruction pointer still
    /// addresses the failing instruction.
    pub fn step(&mut self) -> Result<Status, RuntimeError> {
        if let Some(termination) = self.termination {
            return Ok(Status::Stopped(termination));
        }
        if self.executed >= self.budget {
            return Ok(self.stop(Termination::BudgetExceeded));
        }
        let Some(instr) = self.fetch() else {
            return Ok(self.stop(Termination::RanOffEnd));
        };

        let depth = self.stack.len();
        self.popped.clear();
        let next = match self
            .execute_one(instr)
            .and_then(|flow| self.next_ip(flow))
        {
            Ok(next) => next,
            Err(err) => {
                self.roll_back(depth);
                return Err(err);
            }
        };
        self.executed += 1;

        match next {
            Some(ip) => {
                self.ip = ip;
                Ok(Status::Running)
            }
            None => Ok(self.stop(Termination::Halted)),
        }
    }

    /// Where control goes after `flow`; `None` once halted.
    fn next_ip(&self, flow: Flow) -> Result<Option<Ip>, RuntimeError> {
        let next = match flow {
            Flow::Next => self.ip.offset(1),
            Flow::Goto(target) => Some(target),
            Flow::Resume(target) => target.offset(1),
            Flow::Halt => return Ok(None),
        };
        next.map(Some)
            .ok_or(RuntimeError::ArithmeticOverflow { at: self.ip.0 })
    }

    /// Step until the machine stops.
    pub fn run_to_completion(&mut self) -> Result<Termination, RuntimeError> {
        self.run_with(|_| {})
    }

    /// Step until the machine stops, handing `observer` a snapshot before
    /// every instruction that executes.
    pub fn run_with<F>(&mut self, mut observer: F) -> Result<Termination, RuntimeError>
    where
        F: FnMut(&TraceRecord),
    {
        loop {
            if let Some(record) = self.next_trace() {
                observer(&record);
            }
            if let Status::Stopped(termination) = self.step()? {
                return Ok(termination);
            }
        }
    }

    /// Snapshot of the instruction about to execute, if any will.
    pub fn next_trace(&self) -> Option<TraceRecord> {
        if self.termination.is_some() || self.executed >= self.budget {
            return None;
        }
        let instruction = self.fetch()?;
        Some(TraceRecord {
            ip: self.ip,
            instruction,
            frame_base: self.frame_base,
            stack: self.stack.clone(),
        })
    }

    fn stop(&mut self, termination: Termination) -> Status {
        self.termination = Some(termination);
        Status::Stopped(termination)
    }

    fn execute_one(&mut self, instr: Instruction) -> Result<Flow, RuntimeError> {
        match instr {
            // Stack
            Instruction::Push(value) => self.push(value)?,
            Instruction::PushZero => self.push(Value::Int(0))?,
            Instruction::Pop => {
                self.pop()?;
            }
            Instruction::Dup => {
                let top = *self
                    .stack
                    .last()
                    .ok_or(RuntimeError::StackUnderflow { at: self.ip.0 })?;
                self.push(top)?;
            }
            Instruction::Swap => {
                let a = self.pop()?;
                let b = self.pop()?;
                self.push(a)?;
                self.push(b)?;
            }
            Instruction::Peek => {
                let offset = self.pop_int()?;
                let slot = self.frame_slot(offset)?;
                let value = self.stack[slot];
                self.push(value)?;
            }
            Instruction::Poke => {
                let offset = self.pop_int()?;
                let value = self.pop()?;
                let slot = self.frame_slot(offset)?;
                self.stack[slot] = value;
            }

            // Arithmetic
            Instruction::Add => self.exec_add()?,
            Instruction::Sub => self.exec_binary(i64::checked_sub)?,
            Instruction::Mul => self.exec_binary(i64::checked_mul)?,
            Instruction::Div => self.exec_div()?,
            Instruction::Xor => self.exec_binary(|a, b| Some(a ^ b))?,
            Instruction::And => self.exec_binary(|a, b| Some(a & b))?,
            Instruction::Neg => {
                let a = self.pop_int()?;
                let result = a
                    .checked_neg()
                    .ok_or(RuntimeError::ArithmeticOverflow { at: self.ip.0 })?;
                self.push(Value::Int(result))?;
            }

            // Comparison
            Instruction::CmpEq => self.exec_equality(|a, b| a == b)?,
            Instruction::CmpNe => self.exec_equality(|a, b| a != b)?,
            Instruction::CmpGe => self.exec_ordering(|a, b| a >= b)?,
            Instruction::CmpLe => self.exec_ordering(|a, b| a <= b)?,
            Instruction::CmpGt => self.exec_ordering(|a, b| a > b)?,
            Instruction::CmpLt => self.exec_ordering(|a, b| a < b)?,

            // Control
            Instruction::Jump => return Ok(Flow::Goto(self.pop_ip()?)),
            Instruction::JumpCond => {
                let target = self.pop_ip()?;
                if self.cond {
                    return Ok(Flow::Goto(target));
                }
            }
            Instruction::PushIp => self.push(Value::Ip(self.ip))?,
            Instruction::PopIp => return Ok(Flow::Resume(self.pop_ip()?)),
            Instruction::Halt => return Ok(Flow::Halt),
            Instruction::Interrupt => self.exec_interrupt()?,
            Instruction::Nop => {}

            // Frame
            Instruction::StageFrame => self.staged_base = FrameBase(self.stack.len()),
            Instruction::CommitFrame => self.frame_base = self.staged_base,
            Instruction::PushFrame => self.push(Value::Frame(self.frame_base))?,
            Instruction::PopFrame => {
                let base = self.pop_frame()?;
                self.staged_base = base;
                self.frame_base = base;
            }
        }
        Ok(Flow::Next)
    }

    /// ADD accepts an address plus an integer in either order and yields an
    /// address.
    fn exec_add(&mut self) -> Result<(), RuntimeError> {
        let at = self.ip.0;
        let a = self.pop()?;
        let b = self.pop()?;
        let result = match (a, b) {
            (Value::Int(a), Value::Int(b)) => a.checked_add(b).map(Value::Int),
            (Value::Ip(ip), Value::Int(n)) | (Value::Int(n), Value::Ip(ip)) => {
                ip.offset(n).map(Value::Ip)
            }
            (Value::Int(_), other) | (other, _) => {
                return Err(RuntimeError::TypeMismatch {
                    at,
                    expected: ValueKind::Int,
                    found: other.kind(),
                })
            }
        };
        let result = result.ok_or(RuntimeError::ArithmeticOverflow { at })?;
        self.push(result)
    }

    fn exec_binary(&mut self, op: impl Fn(i64, i64) -> Option<i64>) -> Result<(), RuntimeError> {
        let a = self.pop_int()?;
        let b = self.pop_int()?;
        let result = op(a, b).ok_or(RuntimeError::ArithmeticOverflow { at: self.ip.0 })?;
        self.push(Value::Int(result))
    }

    fn exec_div(&mut self) -> Result<(), RuntimeError> {
        let at = self.ip.0;
        let a = self.pop_int()?;
        let b = self.pop_int()?;
        if b == 0 {
            return Err(RuntimeError::DivisionByZero { at });
        }
        let result = a
            .checked_div(b)
            .ok_or(RuntimeError::ArithmeticOverflow { at })?;
        self.push(Value::Int(result))
    }

    fn exec_equality(&mut self, op: impl Fn(&Value, &Value) -> bool) -> Result<(), RuntimeError> {
        let a = self.pop()?;
        let b = self.pop()?;
        self.cond = op(&a, &b);
        Ok(())
    }

    fn exec_ordering(&mut self, op: impl Fn(i64, i64) -> bool) -> Result<(), RuntimeError> {
        let a = self.pop_int()?;
        let b = self.pop_int()?;
        self.cond = op(a, b);
        Ok(())
    }

    fn exec_interrupt(&mut self) -> Result<(), RuntimeError> {
        let code = self.pop_int()?;
        if code != PRINT_INTERRUPT {
            return Err(RuntimeError::UnsupportedInterrupt { at: self.ip.0, code });
        }
        let value = self.pop()?;
        self.sink.emit(value);
        Ok(())
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::machine::RunConfig;
    use proptest::prelude::*;
    use stackvm_common::Program;

    fn eval(op: Instruction, left: i64, right: i64) -> Result<Vec<Value>, RuntimeError> {
        let program = Program::new(vec![
            Instruction::Push(Value::Int(right)),
            Instruction::Push(Value::Int(left)),
            op,
        ]);
        let mut m = Machine::new(&program, &RunConfig::default());
        m.run_to_completion()?;
        Ok(m.stack().to_vec())
    }

    proptest! {
        #[test]
        fn arithmetic_matches_checked_i64(left in any::<i64>(), right in any::<i64>()) {
            let cases: [(Instruction, Option<i64>); 4] = [
                (Instruction::Add, left.checked_add(right)),
                (Instruction::Sub, left.checked_sub(right)),
                (Instruction::Mul, left.checked_mul(right)),
                (Instruction::Xor, Some(left ^ right)),
            ];
            for (op, expected) in cases {
                match expected {
                    Some(n) => prop_assert_eq!(eval(op, left, right), Ok(vec![Value::Int(n)])),
                    None => prop_assert_eq!(
                        eval(op, left, right),
                        Err(RuntimeError::ArithmeticOverflow { at: 2 })
                    ),
                }
            }
        }

        #[test]
        fn division_truncates(left in any::<i64>(), right in any::<i64>().prop_filter("nonzero", |r| *r != 0)) {
            let result = eval(Instruction::Div, left, right);
            match left.checked_div(right) {
                Some(n) => prop_assert_eq!(result, Ok(vec![Value::Int(n)])),
                None => prop_assert_eq!(result, Err(RuntimeError::ArithmeticOverflow { at: 2 })),
            }
        }

        #[test]
        fn comparisons_leave_stack_empty(left in -1000i64..1000, right in -1000i64..1000) {
            for op in [Instruction::CmpLt, Instruction::CmpGe, Instruction::CmpEq] {
                prop_assert_eq!(eval(op, left, right), Ok(vec![]));
            }
        }
    }
}

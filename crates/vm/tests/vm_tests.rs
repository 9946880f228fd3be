//! Integration tests for the stackvm machine.
//!
//! Programs here are written out by hand in their assembled form, including
//! the start routine and calling convention the compiler emits.

use stackvm_common::{FrameBase, Instruction, Ip, Program, Value};
use stackvm_vm::{
    run, Machine, OutputSink, RunConfig, RuntimeError, Status, Termination, MAX_STACK_DEPTH,
};

// ============================================================
// Helper functions
// ============================================================

fn int(n: i64) -> Instruction {
    Instruction::Push(Value::Int(n))
}

fn ip(n: usize) -> Instruction {
    Instruction::Push(Value::Ip(Ip(n)))
}

/// Start routine followed by an entry function that returns `k`.
fn return_constant(k: i64) -> Program {
    Program::new(vec![
        Instruction::PushFrame,   // 0
        Instruction::StageFrame,  // 1
        Instruction::CommitFrame, // 2
        ip(5),                    // 3 return address: the JUMP below
        ip(9),                    // 4
        Instruction::Jump,        // 5
        Instruction::Swap,        // 6
        Instruction::Pop,         // 7
        Instruction::Halt,        // 8
        int(k),                   // 9 entry: return k
        Instruction::Swap,        // 10
        Instruction::PopIp,       // 11
    ])
}

/// Entry calls `add(2, 3)` and prints the result.
fn call_add() -> Program {
    Program::new(vec![
        // start
        Instruction::PushFrame,   // 0
        Instruction::StageFrame,  // 1
        Instruction::CommitFrame, // 2
        ip(5),                    // 3
        ip(9),                    // 4
        Instruction::Jump,        // 5
        Instruction::Swap,        // 6
        Instruction::Pop,         // 7
        Instruction::Halt,        // 8
        // main: print(add(2, 3)); return 0
        Instruction::PushFrame,   // 9
        Instruction::StageFrame,  // 10
        int(2),                   // 11
        int(3),                   // 12
        Instruction::CommitFrame, // 13
        Instruction::PushIp,      // 14
        int(4),                   // 15
        Instruction::Add,         // 16
        ip(32),                   // 17
        Instruction::Jump,        // 18
        Instruction::Swap,        // 19 drop b
        Instruction::Pop,         // 20
        Instruction::Swap,        // 21 drop a
        Instruction::Pop,         // 22
        Instruction::Swap,        // 23 restore frame
        Instruction::PopFrame,    // 24
        int(1),                   // 25
        Instruction::Interrupt,   // 26
        Instruction::PushZero,    // 27
        Instruction::Pop,         // 28
        Instruction::PushZero,    // 29 return 0
        Instruction::Swap,        // 30
        Instruction::PopIp,       // 31
        // add(a, b): return a + b
        int(1),                   // 32 b
        Instruction::Peek,        // 33
        int(0),                   // 34 a
        Instruction::Peek,        // 35
        Instruction::Add,         // 36
        Instruction::Swap,        // 37
        Instruction::PopIp,       // 38
    ])
}

// ============================================================
// Start routine and calling convention
// ============================================================

#[test]
fn return_constant_halts_with_value() {
    let report = run(&return_constant(3), &RunConfig::default()).unwrap();
    assert_eq!(report.termination, Termination::Halted);
    assert_eq!(report.stack, vec![Value::Int(3)]);
    assert_eq!(report.executed, 12);
    assert!(report.output.is_empty());
}

#[test]
fn exact_budget_is_enough() {
    let report = run(&return_constant(3), &RunConfig::with_budget(12)).unwrap();
    assert_eq!(report.termination, Termination::Halted);
}

#[test]
fn one_step_short_is_budget_exceeded() {
    let report = run(&return_constant(3), &RunConfig::with_budget(11)).unwrap();
    assert_eq!(report.termination, Termination::BudgetExceeded);
    assert!(!report.termination.is_clean());
    assert_eq!(report.executed, 11);
}

#[test]
fn zero_budget_executes_nothing() {
    let report = run(&return_constant(3), &RunConfig::with_budget(0)).unwrap();
    assert_eq!(report.termination, Termination::BudgetExceeded);
    assert_eq!(report.executed, 0);
    assert!(report.stack.is_empty());
}

#[test]
fn call_leaves_only_return_value() {
    let report = run(&call_add(), &RunConfig::default()).unwrap();
    assert_eq!(report.termination, Termination::Halted);
    assert_eq!(report.output, vec![Value::Int(5)]);
    assert_eq!(report.stack, vec![Value::Int(0)]);
}

#[test]
fn callee_frame_base_points_at_first_argument() {
    let program = call_add();
    let mut m = Machine::new(&program, &RunConfig::default());
    while m.ip() != Ip(32) {
        assert_eq!(m.step(), Ok(Status::Running));
    }
    // [SP(0), IP(5), SP(1), 2, 3, IP(18)]
    assert_eq!(m.frame_base(), FrameBase(3));
    assert_eq!(m.stack()[3], Value::Int(2));
    assert_eq!(m.stack()[5], Value::Ip(Ip(18)));
}

#[test]
fn frame_restored_after_call() {
    let program = call_add();
    let mut m = Machine::new(&program, &RunConfig::default());
    while m.ip() != Ip(25) {
        m.step().unwrap();
    }
    assert_eq!(m.frame_base(), FrameBase(1));
    assert_eq!(
        m.stack(),
        &[Value::Frame(FrameBase(0)), Value::Ip(Ip(5)), Value::Int(5)]
    );
}

// ============================================================
// Termination
// ============================================================

#[test]
fn running_off_the_end_is_clean() {
    let report = run(&Program::new(vec![int(1), int(2)]), &RunConfig::default()).unwrap();
    assert_eq!(report.termination, Termination::RanOffEnd);
    assert!(report.termination.is_clean());
    assert_eq!(report.stack, vec![Value::Int(1), Value::Int(2)]);
}

#[test]
fn infinite_loop_hits_budget() {
    let program = Program::new(vec![Instruction::Nop, ip(0), Instruction::Jump]);
    let report = run(&program, &RunConfig::with_budget(300)).unwrap();
    assert_eq!(report.termination, Termination::BudgetExceeded);
    assert_eq!(report.executed, 300);
}

#[test]
fn unbounded_push_overflows() {
    let program = Program::new(vec![Instruction::PushZero, ip(0), Instruction::Jump]);
    let mut m = Machine::new(&program, &RunConfig::with_budget(usize::MAX));
    let err = m.run_to_completion().unwrap_err();
    assert_eq!(err, RuntimeError::StackOverflow { at: 1 });
    assert_eq!(m.stack().len(), MAX_STACK_DEPTH);
}

// ============================================================
// Output and trace
// ============================================================

#[derive(Default)]
struct Lines(Vec<String>);

impl OutputSink for Lines {
    fn emit(&mut self, value: Value) {
        self.0.push(value.to_string());
    }
}

#[test]
fn custom_sink_receives_prints() {
    let program = Program::new(vec![
        int(7),
        int(1),
        Instruction::Interrupt,
        Instruction::PushIp,
        int(1),
        Instruction::Interrupt,
    ]);
    let mut m = Machine::with_sink(&program, &RunConfig::default(), Lines::default());
    m.run_to_completion().unwrap();
    assert_eq!(m.sink().0, vec!["7".to_string(), "IP(3)".to_string()]);
}

#[test]
fn borrowed_sink() {
    let program = Program::new(vec![int(9), int(1), Instruction::Interrupt]);
    let mut out: Vec<Value> = Vec::new();
    let mut m = Machine::with_sink(&program, &RunConfig::default(), &mut out);
    m.run_to_completion().unwrap();
    drop(m);
    assert_eq!(out, vec![Value::Int(9)]);
}

#[test]
fn trace_of_return_constant() {
    let program = return_constant(3);
    let mut m = Machine::new(&program, &RunConfig::default());
    let mut records = Vec::new();
    m.run_with(|r| records.push(r.clone())).unwrap();
    assert_eq!(records.len(), 12);
    assert_eq!(
        records[4].to_string(),
        "INS: 0004 PUSH IP(9)\nSTB: SP(1)\nSTF: SP(0) IP(5)"
    );
    assert_eq!(records[11].instruction, Instruction::Halt);
}

#[test]
fn trace_stops_at_budget() {
    let program = return_constant(3);
    let mut m = Machine::new(&program, &RunConfig::with_budget(5));
    let mut count = 0;
    let termination = m.run_with(|_| count += 1).unwrap();
    assert_eq!(termination, Termination::BudgetExceeded);
    assert_eq!(count, 5);
}

#[test]
fn program_is_reusable() {
    let program = return_constant(8);
    let a = run(&program, &RunConfig::default()).unwrap();
    let b = run(&program, &RunConfig::default()).unwrap();
    assert_eq!(a, b);
}

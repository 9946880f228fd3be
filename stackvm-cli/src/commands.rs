//! CLI command implementations.

use std::fs;

use stackvm_common::{Program, SymbolicProgram, Value};
use stackvm_compiler::ast::Module;
use stackvm_vm::{Machine, OutputSink, RunConfig, Termination};

/// Exit code for compile and assembly failures.
const EXIT_COMPILE: i32 = 2;
const EXIT_RUNTIME: i32 = 3;
const EXIT_BUDGET: i32 = 4;

/// Compile a JSON program and print its listing.
pub fn compile(args: &[String]) -> Result<(), i32> {
    if args.is_empty() {
        eprintln!("error: compile requires an input file");
        eprintln!("Usage: stackvm compile <prog.json> [--symbolic]");
        return Err(1);
    }

    let input = &args[0];
    let mut symbolic_only = false;
    for flag in &args[1..] {
        match flag.as_str() {
            "--symbolic" => symbolic_only = true,
            other => return Err(unknown_flag(other)),
        }
    }

    let symbolic = compile_file(input)?;
    if symbolic_only {
        print!("{symbolic}");
        return Ok(());
    }

    let program = assemble(&symbolic)?;
    print!("{}", stackvm_assembler::disassemble(&program));
    Ok(())
}

/// Compile and execute a JSON program, printing each output value.
pub fn run(args: &[String]) -> Result<(), i32> {
    if args.is_empty() {
        eprintln!("error: run requires an input file");
        eprintln!("Usage: stackvm run <prog.json> [--budget N] [--trace]");
        return Err(1);
    }

    let input = &args[0];
    let mut config = RunConfig::default();
    let mut trace = false;

    let mut rest = args[1..].iter();
    while let Some(flag) = rest.next() {
        match flag.as_str() {
            "--trace" => trace = true,
            "--budget" => {
                let value = rest.next().ok_or_else(|| {
                    eprintln!("error: --budget requires a value");
                    1
                })?;
                config.budget = value.parse().map_err(|_| {
                    eprintln!("error: invalid budget '{value}'");
                    1
                })?;
            }
            other => return Err(unknown_flag(other)),
        }
    }

    let program = assemble(&compile_file(input)?)?;
    let mut machine = Machine::with_sink(&program, &config, Stdout);

    let result = if trace {
        machine.run_with(|record| eprintln!("{record}\n"))
    } else {
        machine.run_to_completion()
    };

    match result {
        Ok(Termination::Halted | Termination::RanOffEnd) => Ok(()),
        Ok(Termination::BudgetExceeded) => {
            eprintln!(
                "error: instruction budget of {} exhausted",
                machine.budget()
            );
            Err(EXIT_BUDGET)
        }
        Err(e) => {
            eprintln!("runtime error: {e}");
            Err(EXIT_RUNTIME)
        }
    }
}

/// Prints each emitted value on its own line as it arrives.
struct Stdout;

impl OutputSink for Stdout {
    fn emit(&mut self, value: Value) {
        println!("{value}");
    }
}

fn compile_file(path: &str) -> Result<SymbolicProgram, i32> {
    let module = read_module(path)?;
    stackvm_compiler::compile(&module).map_err(|e| {
        eprintln!("error: {e}");
        EXIT_COMPILE
    })
}

fn assemble(symbolic: &SymbolicProgram) -> Result<Program, i32> {
    stackvm_assembler::assemble(symbolic).map_err(|e| {
        eprintln!("error: {e}");
        EXIT_COMPILE
    })
}

fn read_module(path: &str) -> Result<Module, i32> {
    let text = fs::read_to_string(path).map_err(|e| {
        eprintln!("error: cannot read '{path}': {e}");
        1
    })?;
    serde_json::from_str(&text).map_err(|e| {
        eprintln!("error: malformed program '{path}': {e}");
        1
    })
}

fn unknown_flag(flag: &str) -> i32 {
    eprintln!("error: unknown argument '{flag}'");
    1
}

//! stackvm CLI: compile and run JSON program trees.
//!
//! Exit codes:
//! - 0: Success
//! - 1: Input error (unreadable file, malformed JSON, bad arguments)
//! - 2: Compile or assembly error
//! - 3: Runtime error
//! - 4: Instruction budget exhausted

mod commands;

use std::process;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let result = match args[1].as_str() {
        "compile" => commands::compile(&args[2..]),
        "run" => commands::run(&args[2..]),
        "--help" | "-h" | "help" => {
            print_usage();
            process::exit(0);
        }
        other => {
            eprintln!("error: unknown command '{other}'");
            eprintln!();
            print_usage();
            process::exit(1);
        }
    };

    if let Err(code) = result {
        process::exit(code);
    }
}

fn print_usage() {
    eprintln!("Usage: stackvm <command> [args]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  compile <prog.json> [--symbolic]            Print the assembled listing");
    eprintln!("  run <prog.json> [--budget N] [--trace]      Compile and execute");
}

//! stackvm compiler: function bodies to a merged symbolic program.
//!
//! The pipeline runs strictly forward:
//!
//! 1. **Symbol discovery**: parameters (plus the hidden return slot) and
//!    assigned locals per function ([`symbols`])
//! 2. **Offset tables**: `params ++ locals` slot numbering ([`symbols`])
//! 3. **Code generation**: symbolic operations per statement, each checked
//!    for stack balance ([`codegen`])
//! 4. **Local resolution**: variable references to frame offsets ([`resolve`])
//! 5. **Linking**: start routine plus one block per function ([`link`])
//!
//! The result still contains labels and jumps to labels; the assembler
//! turns it into a flat program.
//!
//! # Usage
//!
//! ```
//! use stackvm_compiler::ast::{Expr, FunctionDef, Module, Stmt};
//! use stackvm_compiler::compile;
//!
//! let module = Module::new(vec![
//!     FunctionDef::new("main", &[], vec![Stmt::ret(Expr::constant(3))])
//!         .decorated("entrypoint"),
//! ]);
//! let program = compile(&module).unwrap();
//! assert!(!program.is_empty());
//! ```

pub mod ast;
pub mod codegen;
pub mod error;
pub mod link;
pub mod resolve;
pub mod symbols;

pub use error::CompileError;

use stackvm_common::SymbolicProgram;

use ast::Module;
use symbols::SymbolTable;

/// Compile a module into a symbolic program ready for assembly.
///
/// # Errors
///
/// Returns the first [`CompileError`] found; there is no partial output.
pub fn compile(module: &Module) -> Result<SymbolicProgram, CompileError> {
    let symbols = SymbolTable::discover(module)?;

    let blocks = symbols
        .units()
        .map(|(function, offsets)| codegen::translate_function(&symbols, function, offsets))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(link::link(&symbols, blocks))
}

//! Compile-time errors.
//!
//! Every compile error aborts the whole compilation. Each variant names the
//! function it was found in so diagnostics point at the right block.

use thiserror::Error;

/// Errors produced while turning a module into a symbolic program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// A node kind or shape outside the supported subset.
    #[error("unsupported construct in {function}: {construct}")]
    UnsupportedConstruct { function: String, construct: String },

    /// A variable or function name with no definition.
    #[error("undefined symbol '{name}' in {function}")]
    UndefinedSymbol { function: String, name: String },

    /// A variable reference whose key the resolver never captured.
    #[error("unresolved reference '{key}' in {function}")]
    UnresolvedReference { function: String, key: String },

    /// A call passes the wrong number of arguments.
    #[error("{callee} expects {expected} argument(s), {function} passes {found}")]
    ArityMismatch {
        function: String,
        callee: String,
        expected: usize,
        found: usize,
    },

    /// Generated code does not leave the stack balanced. Always a compiler bug.
    #[error("stack imbalance {depth} after statement {index} ({statement}) in {function}")]
    InvariantViolation {
        function: String,
        index: usize,
        statement: String,
        depth: i64,
    },

    /// A name bound both as a parameter and as a local, or bound twice.
    #[error("ambiguous binding '{name}' in {function}")]
    AmbiguousBinding { function: String, name: String },

    /// Two functions share a name.
    #[error("function '{name}' defined more than once")]
    DuplicateFunction { name: String },

    /// No function carries the entry decorator.
    #[error("no function is decorated with @{decorator}")]
    MissingEntryPoint { decorator: &'static str },

    /// More than one function carries the entry decorator.
    #[error("both {first} and {second} are decorated with @{decorator}")]
    MultipleEntryPoints {
        first: String,
        second: String,
        decorator: &'static str,
    },
}

impl CompileError {
    pub(crate) fn unsupported(function: &str, construct: impl Into<String>) -> Self {
        CompileError::UnsupportedConstruct {
            function: function.to_string(),
            construct: construct.into(),
        }
    }

    pub(crate) fn undefined(function: &str, name: &str) -> Self {
        CompileError::UndefinedSymbol {
            function: function.to_string(),
            name: name.to_string(),
        }
    }
}

//! Symbol discovery and per-function offset tables.
//!
//! One walk over the module records, for every function, its parameters
//! (plus the hidden return-address slot) and the sorted set of names it
//! assigns. Offsets are then `index in parameters ++ locals`, so slot 0 is
//! the first parameter and the return address sits just below the locals.

use std::collections::{BTreeSet, HashMap};

use crate::ast::{Expr, Module, Stmt};
use crate::error::CompileError;
use crate::link::START_LABEL;

/// Decorator that marks the program's single entry function.
pub const ENTRY_DECORATOR: &str = "entrypoint";

/// Name of the hidden trailing parameter holding the return address.
pub const RETURN_SLOT: &str = "_ip";

/// Scope name used in diagnostics for top-level statements.
pub const MODULE_SCOPE: &str = "<module>";

/// What discovery learned about one function. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionInfo<'m> {
    pub name: String,
    /// Declared parameters followed by [`RETURN_SLOT`].
    pub params: Vec<String>,
    /// Every single-target assignment name in the body, sorted.
    pub locals: Vec<String>,
    pub body: &'m [Stmt],
    pub decorators: Vec<String>,
}

impl FunctionInfo<'_> {
    /// Number of arguments a caller must pass.
    pub fn arity(&self) -> usize {
        self.params.len() - 1
    }

    pub fn is_entry(&self) -> bool {
        self.decorators.iter().any(|d| d == ENTRY_DECORATOR)
    }
}

/// Frame-relative slot offsets for one function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetTable {
    order: Vec<String>,
    slots: HashMap<String, usize>,
}

impl OffsetTable {
    /// Assign offsets in `params ++ locals` order.
    ///
    /// A name that appears twice (a reassigned parameter, a repeated
    /// parameter, or a parameter spelled like the return slot) is an
    /// [`CompileError::AmbiguousBinding`].
    pub fn build(info: &FunctionInfo<'_>) -> Result<Self, CompileError> {
        let mut order = Vec::with_capacity(info.params.len() + info.locals.len());
        let mut slots = HashMap::new();

        for name in info.params.iter().chain(&info.locals) {
            if slots.insert(name.clone(), order.len()).is_some() {
                return Err(CompileError::AmbiguousBinding {
                    function: info.name.clone(),
                    name: name.clone(),
                });
            }
            order.push(name.clone());
        }

        Ok(Self { order, slots })
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.slots.get(name).copied()
    }

    /// Names in slot order.
    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// All functions of a module, in discovery order, with their offset tables.
#[derive(Debug, Clone)]
pub struct SymbolTable<'m> {
    functions: Vec<FunctionInfo<'m>>,
    offsets: Vec<OffsetTable>,
    by_name: HashMap<String, usize>,
    entry: usize,
}

impl<'m> SymbolTable<'m> {
    /// Walk the module once and build every function's info and offsets.
    pub fn discover(module: &'m Module) -> Result<Self, CompileError> {
        let mut functions = Vec::new();
        let mut by_name = HashMap::new();

        for stmt in &module.body {
            let Stmt::FunctionDef(def) = stmt else {
                return Err(CompileError::unsupported(MODULE_SCOPE, stmt.describe()));
            };

            if let Some(unknown) = def.decorator_list.iter().find(|d| *d != ENTRY_DECORATOR) {
                return Err(CompileError::unsupported(
                    &def.name,
                    format!("decorator @{unknown}"),
                ));
            }

            let mut locals = BTreeSet::new();
            collect_assignments(&def.name, &def.body, &mut locals)?;

            let mut params = def.args.clone();
            params.push(RETURN_SLOT.to_string());

            if by_name.insert(def.name.clone(), functions.len()).is_some() {
                return Err(CompileError::DuplicateFunction {
                    name: def.name.clone(),
                });
            }

            functions.push(FunctionInfo {
                name: def.name.clone(),
                params,
                locals: locals.into_iter().collect(),
                body: &def.body,
                decorators: def.decorator_list.clone(),
            });
        }

        let entry = find_entry(&functions)?;
        let offsets = functions
            .iter()
            .map(OffsetTable::build)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            functions,
            offsets,
            by_name,
            entry,
        })
    }

    pub fn function(&self, name: &str) -> Option<&FunctionInfo<'m>> {
        self.by_name.get(name).map(|&idx| &self.functions[idx])
    }

    /// Functions in discovery order.
    pub fn functions(&self) -> impl Iterator<Item = &FunctionInfo<'m>> {
        self.functions.iter()
    }

    /// Functions in discovery order, each with its own offset table.
    pub fn units(&self) -> impl Iterator<Item = (&FunctionInfo<'m>, &OffsetTable)> {
        self.functions.iter().zip(&self.offsets)
    }

    pub fn entry(&self) -> &FunctionInfo<'m> {
        &self.functions[self.entry]
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

fn find_entry(functions: &[FunctionInfo<'_>]) -> Result<usize, CompileError> {
    let mut entries = functions.iter().enumerate().filter(|(_, f)| f.is_entry());

    let Some((idx, entry)) = entries.next() else {
        return Err(CompileError::MissingEntryPoint {
            decorator: ENTRY_DECORATOR,
        });
    };
    if let Some((_, second)) = entries.next() {
        return Err(CompileError::MultipleEntryPoints {
            first: entry.name.clone(),
            second: second.name.clone(),
            decorator: ENTRY_DECORATOR,
        });
    }

    // The start routine calls the entry function with no arguments.
    if entry.arity() != 0 {
        return Err(CompileError::ArityMismatch {
            function: START_LABEL.to_string(),
            callee: entry.name.clone(),
            expected: entry.arity(),
            found: 0,
        });
    }

    Ok(idx)
}

fn collect_assignments(
    function: &str,
    body: &[Stmt],
    locals: &mut BTreeSet<String>,
) -> Result<(), CompileError> {
    for stmt in body {
        match stmt {
            Stmt::Assign { targets, .. } => {
                let [target] = targets.as_slice() else {
                    return Err(CompileError::unsupported(
                        function,
                        format!("assignment to {} targets", targets.len()),
                    ));
                };
                let Expr::Name { id } = target else {
                    return Err(CompileError::unsupported(
                        function,
                        format!("assignment to {}", target.describe()),
                    ));
                };
                locals.insert(id.clone());
            }
            Stmt::If { body, orelse, .. } | Stmt::While { body, orelse, .. } => {
                collect_assignments(function, body, locals)?;
                collect_assignments(function, orelse, locals)?;
            }
            Stmt::FunctionDef(def) => {
                return Err(CompileError::unsupported(
                    function,
                    format!("nested def {}", def.name),
                ));
            }
            Stmt::Return { .. } | Stmt::Expr { .. } => {}
        }
    }
    Ok(())
}

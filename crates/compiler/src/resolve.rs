//! Local resolution: symbolic variable references to frame offsets.
//!
//! Runs over one statement at a time. The first pass sums declared stack
//! effects and captures an offset for every resolution marker; the second
//! drops the markers and rewrites each `PushRef` into a `PUSH offset`.

use std::collections::HashMap;

use stackvm_common::{Instruction, SymOp, Value};

use crate::ast::Stmt;
use crate::error::CompileError;
use crate::symbols::{FunctionInfo, OffsetTable};

/// Resolve the variable references of one translated statement.
///
/// `index` and `stmt` only feed diagnostics.
pub fn resolve_statement(
    function: &FunctionInfo<'_>,
    offsets: &OffsetTable,
    ops: Vec<SymOp>,
    index: usize,
    stmt: &Stmt,
) -> Result<Vec<SymOp>, CompileError> {
    let mut depth: i64 = 0;
    let mut captured: HashMap<&str, usize> = HashMap::new();

    for op in &ops {
        depth += op.stack_effect();

        let (SymOp::ResolvePoke { key, variable } | SymOp::ResolvePeek { key, variable }) = op
        else {
            continue;
        };
        let offset = offsets
            .get(variable)
            .ok_or_else(|| CompileError::undefined(&function.name, variable))?;
        if captured.insert(key.as_str(), offset).is_some() {
            // Keys come from a per-function counter; a repeat means the
            // generator and resolver disagree.
            return Err(CompileError::InvariantViolation {
                function: function.name.clone(),
                index,
                statement: format!("{} (reference key {key} bound twice)", stmt.describe()),
                depth,
            });
        }
    }

    if depth != 0 {
        return Err(CompileError::InvariantViolation {
            function: function.name.clone(),
            index,
            statement: stmt.describe(),
            depth,
        });
    }

    let mut resolved = Vec::with_capacity(ops.len());
    for op in &ops {
        match op {
            SymOp::ResolvePoke { .. } | SymOp::ResolvePeek { .. } => {}
            SymOp::PushRef(key) => {
                let offset = captured.get(key.as_str()).ok_or_else(|| {
                    CompileError::UnresolvedReference {
                        function: function.name.clone(),
                        key: key.clone(),
                    }
                })?;
                resolved.push(SymOp::Op(Instruction::Push(Value::Int(*offset as i64))));
            }
            other => resolved.push(other.clone()),
        }
    }

    Ok(resolved)
}

//! Syntax-directed translation of function bodies into symbolic operations.
//!
//! Stack contracts per construct (declared effect, negative = pushes):
//!
//! | construct            | effect |
//! |----------------------|--------|
//! | constant, name, call | -1     |
//! | binary/unary op      | -1     |
//! | assignment           | 0      |
//! | if, while, expr stmt | 0      |
//! | return               | 0, via balance markers |
//!
//! A call leaves the callee's return value in place of the saved frame
//! base, the arguments and the return address. Frame layout seen by the
//! callee, relative to its frame base:
//!
//! ```text
//! [saved base] | arg_1 .. arg_N  return_address  local_1 .. local_M
//!              ^ frame base
//! ```

use stackvm_common::{Instruction, SymOp, Value, JUMP_EXPANSION, PRINT_INTERRUPT};

use crate::ast::{BinOperator, CmpOperator, Expr, Stmt, UnaryOperator};
use crate::error::CompileError;
use crate::resolve::resolve_statement;
use crate::symbols::{FunctionInfo, OffsetTable, SymbolTable, RETURN_SLOT};

/// Name of the built-in that compiles to the print interrupt.
pub const PRINT_BUILTIN: &str = "print";

/// Distance from a call's `PUSH_IP` to its jump instruction: `PUSH 4`,
/// `ADD`, then the two-slot jump expansion. `POP_IP` resumes one past it.
pub const CALL_RETURN_OFFSET: i64 = 2 + JUMP_EXPANSION as i64;

/// Translate and resolve one function: local slot initialization followed
/// by every statement, each checked for stack balance.
pub fn translate_function(
    symbols: &SymbolTable<'_>,
    function: &FunctionInfo<'_>,
    offsets: &OffsetTable,
) -> Result<Vec<SymOp>, CompileError> {
    let mut out = Vec::new();
    for local in &function.locals {
        out.push(SymOp::VariableLabel(local.clone()));
        out.push(SymOp::Op(Instruction::PushZero));
    }

    // Control must never fall off the end of a block into the next function.
    let implicit_return = match function.body.last() {
        Some(Stmt::Return { .. }) => None,
        _ => Some(Stmt::Return { value: None }),
    };

    let mut translator = FunctionTranslator::new(symbols, function);
    for (index, stmt) in function.body.iter().chain(&implicit_return).enumerate() {
        let ops = translator.statement(stmt)?;

        let depth: i64 = ops.iter().map(SymOp::stack_effect).sum();
        if depth != 0 {
            return Err(CompileError::InvariantViolation {
                function: function.name.clone(),
                index,
                statement: stmt.describe(),
                depth,
            });
        }

        out.extend(resolve_statement(function, offsets, ops, index, stmt)?);
    }

    Ok(out)
}

/// Per-function translation context. The id counter spans the whole
/// function, so generated labels and reference keys never repeat within
/// it, and the function-name prefix keeps them apart across functions.
pub struct FunctionTranslator<'a, 'm> {
    symbols: &'a SymbolTable<'m>,
    function: &'a FunctionInfo<'m>,
    next_id: usize,
    ops: Vec<SymOp>,
}

impl<'a, 'm> FunctionTranslator<'a, 'm> {
    pub fn new(symbols: &'a SymbolTable<'m>, function: &'a FunctionInfo<'m>) -> Self {
        Self {
            symbols,
            function,
            next_id: 0,
            ops: Vec::new(),
        }
    }

    /// Translate one statement and hand back its operations.
    pub fn statement(&mut self, stmt: &Stmt) -> Result<Vec<SymOp>, CompileError> {
        self.stmt(stmt)?;
        Ok(std::mem::take(&mut self.ops))
    }

    fn fresh(&mut self, tag: &str) -> String {
        self.next_id += 1;
        format!("{}.{}-{}", self.function.name, tag, self.next_id)
    }

    fn emit(&mut self, instr: Instruction) {
        self.ops.push(SymOp::Op(instr));
    }

    fn unsupported(&self, construct: impl Into<String>) -> CompileError {
        CompileError::unsupported(&self.function.name, construct)
    }

    fn stmt(&mut self, stmt: &Stmt) -> Result<(), CompileError> {
        match stmt {
            Stmt::Assign { targets, value } => {
                let [Expr::Name { id }] = targets.as_slice() else {
                    return Err(self.unsupported(stmt.describe()));
                };
                self.expr(value)?;
                let key = self.fresh(id);
                self.ops.push(SymOp::PushRef(key.clone()));
                self.emit(Instruction::Poke);
                self.ops.push(SymOp::ResolvePoke {
                    key,
                    variable: id.clone(),
                });
            }

            Stmt::Return { value } => self.ret(value.as_ref())?,

            Stmt::If { test, body, orelse } => {
                if !orelse.is_empty() {
                    return Err(self.unsupported("else branch"));
                }
                let skip = self.fresh("if");
                self.branch_unless(test, &skip)?;
                for inner in body {
                    self.stmt(inner)?;
                }
                self.ops.push(SymOp::Label(skip));
                self.emit(Instruction::Nop);
            }

            Stmt::While { test, body, orelse } => {
                if !orelse.is_empty() {
                    return Err(self.unsupported("while-else branch"));
                }
                let cond = self.fresh("while-cond");
                let end = self.fresh("while-end");
                self.ops.push(SymOp::Label(cond.clone()));
                self.branch_unless(test, &end)?;
                for inner in body {
                    self.stmt(inner)?;
                }
                self.ops.push(SymOp::Jump(cond));
                self.ops.push(SymOp::Label(end));
                self.emit(Instruction::Nop);
            }

            Stmt::Expr { value } => {
                self.expr(value)?;
                self.emit(Instruction::Pop);
            }

            Stmt::FunctionDef(def) => {
                return Err(self.unsupported(format!("nested def {}", def.name)));
            }
        }
        Ok(())
    }

    /// Leave exactly the return value above the caller's frame and jump to
    /// the saved return address. Markers record the values discarded below
    /// the result so the statement still sums to zero.
    fn ret(&mut self, value: Option<&Expr>) -> Result<(), CompileError> {
        self.ops.push(SymOp::PushArg("ret".to_string()));
        match value {
            Some(value) => self.expr(value)?,
            None => self.emit(Instruction::PushZero),
        }

        let function = self.function;
        for local in &function.locals {
            self.ops.push(SymOp::PopArg(local.clone()));
            self.emit(Instruction::Swap);
            self.emit(Instruction::Pop);
        }

        self.ops.push(SymOp::PopArg(RETURN_SLOT.to_string()));
        self.emit(Instruction::Swap);
        self.emit(Instruction::PopIp);
        Ok(())
    }

    /// Jump to `skip` when `test` is false (zero).
    fn branch_unless(&mut self, test: &Expr, skip: &str) -> Result<(), CompileError> {
        if let Expr::Compare { .. } = test {
            let op = self.comparison(test)?;
            self.emit(negate(op));
        } else {
            self.expr(test)?;
            self.emit(Instruction::Push(Value::Int(0)));
            self.emit(Instruction::CmpEq);
        }
        self.ops.push(SymOp::JumpCond(skip.to_string()));
        Ok(())
    }

    /// Push both operands of a single comparison (left on top) and return
    /// the comparison to apply.
    fn comparison(&mut self, expr: &Expr) -> Result<CmpOperator, CompileError> {
        let Expr::Compare {
            left,
            ops,
            comparators,
        } = expr
        else {
            return Err(self.unsupported(expr.describe()));
        };
        let ([op], [right]) = (ops.as_slice(), comparators.as_slice()) else {
            return Err(self.unsupported("chained comparison"));
        };
        self.expr(right)?;
        self.expr(left)?;
        Ok(*op)
    }

    fn expr(&mut self, expr: &Expr) -> Result<(), CompileError> {
        match expr {
            Expr::Constant { value } => self.emit(Instruction::Push(Value::Int(*value))),

            Expr::Name { id } => {
                let key = self.fresh(id);
                self.ops.push(SymOp::PushRef(key.clone()));
                self.emit(Instruction::Peek);
                self.ops.push(SymOp::ResolvePeek {
                    key,
                    variable: id.clone(),
                });
            }

            Expr::BinOp { left, op, right } => {
                let instr = match op {
                    BinOperator::Add => Instruction::Add,
                    BinOperator::Sub => Instruction::Sub,
                    BinOperator::Mul => Instruction::Mul,
                    BinOperator::Div => Instruction::Div,
                    BinOperator::BitXor => Instruction::Xor,
                    BinOperator::BitAnd => Instruction::And,
                    BinOperator::Mod | BinOperator::Pow => {
                        return Err(self.unsupported(expr.describe()))
                    }
                };
                // Right first, so the left operand ends up on top.
                self.expr(right)?;
                self.expr(left)?;
                self.emit(instr);
            }

            Expr::UnaryOp { op, operand } => match op {
                UnaryOperator::Neg => {
                    self.expr(operand)?;
                    self.emit(Instruction::Neg);
                }
                UnaryOperator::Not => return Err(self.unsupported(expr.describe())),
            },

            Expr::Compare { .. } => {
                // Materialize the flag as 1 or 0.
                let op = self.comparison(expr)?;
                self.emit(cmp_instruction(op));
                let done = self.fresh("cmp");
                self.emit(Instruction::Push(Value::Int(1)));
                self.ops.push(SymOp::JumpCond(done.clone()));
                self.emit(Instruction::Pop);
                self.emit(Instruction::PushZero);
                self.ops.push(SymOp::Label(done));
            }

            Expr::Call { func, args } => self.call(func, args)?,
        }
        Ok(())
    }

    fn call(&mut self, func: &Expr, args: &[Expr]) -> Result<(), CompileError> {
        let Expr::Name { id: callee } = func else {
            return Err(self.unsupported(format!("call of {}", func.describe())));
        };

        let Some(target) = self.symbols.function(callee) else {
            if callee == PRINT_BUILTIN {
                return self.print(args);
            }
            return Err(CompileError::undefined(&self.function.name, callee));
        };

        if args.len() != target.arity() {
            return Err(CompileError::ArityMismatch {
                function: self.function.name.clone(),
                callee: callee.clone(),
                expected: target.arity(),
                found: args.len(),
            });
        }

        // The staged base is a single register: a call evaluated while
        // another call's base is staged would overwrite it on return.
        if let Some(inner) = args.iter().find_map(|arg| self.user_call_in(arg)) {
            return Err(self.unsupported(format!(
                "call to {inner} nested in the arguments of {callee}"
            )));
        }

        self.emit(Instruction::PushFrame);
        self.emit(Instruction::StageFrame);
        // Arguments still address the caller's frame.
        for arg in args {
            self.expr(arg)?;
        }
        self.emit(Instruction::CommitFrame);

        self.emit(Instruction::PushIp);
        self.emit(Instruction::Push(Value::Int(CALL_RETURN_OFFSET)));
        self.emit(Instruction::Add);
        self.ops.push(SymOp::Jump(callee.clone()));

        // Drop each argument from under the return value.
        for _ in args {
            self.emit(Instruction::Swap);
            self.emit(Instruction::Pop);
        }
        self.emit(Instruction::Swap);
        self.emit(Instruction::PopFrame);
        Ok(())
    }

    fn print(&mut self, args: &[Expr]) -> Result<(), CompileError> {
        let [value] = args else {
            return Err(CompileError::ArityMismatch {
                function: self.function.name.clone(),
                callee: PRINT_BUILTIN.to_string(),
                expected: 1,
                found: args.len(),
            });
        };
        self.expr(value)?;
        self.emit(Instruction::Push(Value::Int(PRINT_INTERRUPT)));
        self.emit(Instruction::Interrupt);
        self.emit(Instruction::PushZero);
        Ok(())
    }

    /// Name of the first user-function call inside `expr`, if any.
    fn user_call_in(&self, expr: &Expr) -> Option<String> {
        match expr {
            Expr::Name { .. } | Expr::Constant { .. } => None,
            Expr::BinOp { left, right, .. } => {
                self.user_call_in(left).or_else(|| self.user_call_in(right))
            }
            Expr::UnaryOp { operand, .. } => self.user_call_in(operand),
            Expr::Compare {
                left, comparators, ..
            } => self
                .user_call_in(left)
                .or_else(|| comparators.iter().find_map(|c| self.user_call_in(c))),
            Expr::Call { func, args } => match func.as_ref() {
                Expr::Name { id }
                    if id == PRINT_BUILTIN && self.symbols.function(id).is_none() =>
                {
                    args.iter().find_map(|a| self.user_call_in(a))
                }
                Expr::Name { id } => Some(id.clone()),
                other => Some(other.describe()),
            },
        }
    }
}

fn cmp_instruction(op: CmpOperator) -> Instruction {
    match op {
        CmpOperator::Eq => Instruction::CmpEq,
        CmpOperator::Ne => Instruction::CmpNe,
        CmpOperator::Lt => Instruction::CmpLt,
        CmpOperator::Le => Instruction::CmpLe,
        CmpOperator::Gt => Instruction::CmpGt,
        CmpOperator::Ge => Instruction::CmpGe,
    }
}

/// The comparison that holds exactly when `op` does not.
fn negate(op: CmpOperator) -> Instruction {
    match op {
        CmpOperator::Eq => Instruction::CmpNe,
        CmpOperator::Ne => Instruction::CmpEq,
        CmpOperator::Lt => Instruction::CmpGe,
        CmpOperator::Le => Instruction::CmpGt,
        CmpOperator::Gt => Instruction::CmpLe,
        CmpOperator::Ge => Instruction::CmpLt,
    }
}

//! The parsed-program tree consumed by the compiler.
//!
//! Parsing is done by an external frontend. The tree is serde-friendly so a
//! frontend can hand it over as JSON; node kinds are tagged with `"kind"`.

use serde::{Deserialize, Serialize};

/// A whole program: a sequence of top-level statements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub body: Vec<Stmt>,
}

/// A function definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,
    #[serde(default)]
    pub args: Vec<String>,
    pub body: Vec<Stmt>,
    #[serde(default)]
    pub decorator_list: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Stmt {
    FunctionDef(FunctionDef),
    Assign {
        targets: Vec<Expr>,
        value: Expr,
    },
    Return {
        #[serde(default)]
        value: Option<Expr>,
    },
    If {
        test: Expr,
        body: Vec<Stmt>,
        #[serde(default)]
        orelse: Vec<Stmt>,
    },
    While {
        test: Expr,
        body: Vec<Stmt>,
        #[serde(default)]
        orelse: Vec<Stmt>,
    },
    /// An expression evaluated for its side effects.
    Expr {
        value: Expr,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Expr {
    Name {
        id: String,
    },
    Constant {
        value: i64,
    },
    BinOp {
        left: Box<Expr>,
        op: BinOperator,
        right: Box<Expr>,
    },
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expr>,
    },
    Compare {
        left: Box<Expr>,
        ops: Vec<CmpOperator>,
        comparators: Vec<Expr>,
    },
    Call {
        func: Box<Expr>,
        #[serde(default)]
        args: Vec<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOperator {
    Add,
    Sub,
    Mul,
    Div,
    BitXor,
    BitAnd,
    /// Parsed but not compiled.
    Mod,
    /// Parsed but not compiled.
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOperator {
    Neg,
    /// Parsed but not compiled.
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmpOperator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

// Builders, mostly for tests and embedders constructing trees by hand.

impl Expr {
    pub fn name(id: &str) -> Self {
        Expr::Name { id: id.to_string() }
    }

    pub fn constant(value: i64) -> Self {
        Expr::Constant { value }
    }

    pub fn binop(left: Expr, op: BinOperator, right: Expr) -> Self {
        Expr::BinOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn neg(operand: Expr) -> Self {
        Expr::UnaryOp {
            op: UnaryOperator::Neg,
            operand: Box::new(operand),
        }
    }

    pub fn compare(left: Expr, op: CmpOperator, right: Expr) -> Self {
        Expr::Compare {
            left: Box::new(left),
            ops: vec![op],
            comparators: vec![right],
        }
    }

    pub fn call(func: &str, args: Vec<Expr>) -> Self {
        Expr::Call {
            func: Box::new(Expr::name(func)),
            args,
        }
    }

    /// Short description used in diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Expr::Name { id } => format!("name '{id}'"),
            Expr::Constant { value } => format!("constant {value}"),
            Expr::BinOp { op, .. } => format!("binary operator {op:?}"),
            Expr::UnaryOp { op, .. } => format!("unary operator {op:?}"),
            Expr::Compare { ops, .. } => format!("comparison {ops:?}"),
            Expr::Call { .. } => "call".to_string(),
        }
    }
}

impl Stmt {
    pub fn assign(target: &str, value: Expr) -> Self {
        Stmt::Assign {
            targets: vec![Expr::name(target)],
            value,
        }
    }

    pub fn ret(value: Expr) -> Self {
        Stmt::Return { value: Some(value) }
    }

    pub fn expr(value: Expr) -> Self {
        Stmt::Expr { value }
    }

    pub fn print(value: Expr) -> Self {
        Stmt::Expr {
            value: Expr::call("print", vec![value]),
        }
    }

    pub fn if_(test: Expr, body: Vec<Stmt>) -> Self {
        Stmt::If {
            test,
            body,
            orelse: Vec::new(),
        }
    }

    pub fn while_(test: Expr, body: Vec<Stmt>) -> Self {
        Stmt::While {
            test,
            body,
            orelse: Vec::new(),
        }
    }

    /// Short description used in diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Stmt::FunctionDef(def) => format!("def {}", def.name),
            Stmt::Assign { .. } => "assignment".to_string(),
            Stmt::Return { .. } => "return".to_string(),
            Stmt::If { .. } => "if".to_string(),
            Stmt::While { .. } => "while".to_string(),
            Stmt::Expr { value } => format!("expression ({})", value.describe()),
        }
    }
}

impl FunctionDef {
    pub fn new(name: &str, args: &[&str], body: Vec<Stmt>) -> Self {
        Self {
            name: name.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            body,
            decorator_list: Vec::new(),
        }
    }

    /// Builder: add a decorator.
    pub fn decorated(mut self, decorator: &str) -> Self {
        self.decorator_list.push(decorator.to_string());
        self
    }
}

impl Module {
    pub fn new(functions: Vec<FunctionDef>) -> Self {
        Self {
            body: functions.into_iter().map(Stmt::FunctionDef).collect(),
        }
    }
}

use serde::{Deserialize, Serialize};

/// A complete `F(t)` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    pub statements: Vec<Statement>,
}

/// A statement inside the function body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Statement {
    /// `let name = expr`, `const name = expr`, `var name = expr`
    Declare {
        kind: DeclKind,
        name: String,
        value: Expr,
        span_start: usize,
        span_end: usize,
    },
    /// `name = expr`, `name += expr`, ...
    Assign {
        target: String,
        op: AssignOp,
        value: Expr,
        span_start: usize,
        span_end: usize,
    },
    /// `return expr` or a bare `return`.
    Return {
        value: Option<Expr>,
        span_start: usize,
        span_end: usize,
    },
    /// `if (cond) stmt else stmt`
    If {
        condition: Expr,
        then_branch: Box<Statement>,
        else_branch: Option<Box<Statement>>,
        span_start: usize,
        span_end: usize,
    },
    /// `{ stmt* }`
    Block {
        body: Vec<Statement>,
        span_start: usize,
        span_end: usize,
    },
    /// `throw "message"` or `throw expr`
    Throw {
        value: ThrowValue,
        span_start: usize,
        span_end: usize,
    },
    /// A bare expression; the trailing one becomes the implicit return value.
    Expression {
        expr: Expr,
        span_start: usize,
        span_end: usize,
    },
    /// `// text`
    Comment(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DeclKind {
    Let,
    Const,
    Var,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AssignOp {
    Set,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ThrowValue {
    Text(String),
    Value(Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Eq,
    NotEq,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LogicalOp {
    And,
    Or,
}

/// A numeric expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Expr {
    Number(f64),
    Bool(bool),
    Identifier {
        name: String,
        span_start: usize,
        span_end: usize,
    },
    /// Dotted path such as `Math.PI`.
    Member {
        path: String,
        span_start: usize,
        span_end: usize,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Short-circuiting `&&` / `||`.
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `cond ? a : b`
    Conditional {
        condition: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    /// `Math.sin(x)` or `sin(x)`; `function` is the dotted callee path.
    Call {
        function: String,
        args: Vec<Expr>,
        span_start: usize,
        span_end: usize,
    },
}

// ── Span accessors ──────────────────────────────────────────

impl Statement {
    /// Returns the source byte range `(span_start, span_end)` for this statement.
    /// Comments have no span information and return `(usize::MAX, usize::MAX)`.
    pub fn span(&self) -> (usize, usize) {
        match self {
            Statement::Declare { span_start, span_end, .. }
            | Statement::Assign { span_start, span_end, .. }
            | Statement::Return { span_start, span_end, .. }
            | Statement::If { span_start, span_end, .. }
            | Statement::Block { span_start, span_end, .. }
            | Statement::Throw { span_start, span_end, .. }
            | Statement::Expression { span_start, span_end, .. } => (*span_start, *span_end),
            Statement::Comment(_) => (usize::MAX, usize::MAX),
        }
    }

    pub fn is_comment(&self) -> bool {
        matches!(self, Statement::Comment(_))
    }
}

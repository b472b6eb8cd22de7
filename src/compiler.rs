use std::collections::HashMap;

use crate::ast::*;
use crate::builtins::{self, Builtin};
use crate::error::{CompileError, EvalErrorKind, EvaluationError};
use crate::token::Span;

/// Name of the single input variable (time in seconds).
pub const TIME_VARIABLE: &str = "t";

// ── Compiled Form ───────────────────────────────────────────

/// A resolved expression: identifiers are frame slots, library names are
/// function pointers. Evaluation cannot fail.
#[derive(Debug, Clone)]
enum Node {
    Const(f64),
    Slot(usize),
    Unary(UnaryOp, Box<Node>),
    Binary(BinaryOp, Box<Node>, Box<Node>),
    Logical(LogicalOp, Box<Node>, Box<Node>),
    Conditional(Box<Node>, Box<Node>, Box<Node>),
    Call1(fn(f64) -> f64, Box<Node>),
    Call2(fn(f64, f64) -> f64, Box<Node>, Box<Node>),
    CallN(fn(&[f64]) -> f64, Vec<Node>),
}

#[derive(Debug, Clone)]
enum Op {
    Store { slot: usize, value: Node },
    /// An expression statement whose value is discarded.
    Eval(Node),
    Return(Option<Node>),
    If {
        condition: Node,
        then_ops: Vec<Op>,
        else_ops: Vec<Op>,
    },
    Throw(Thrown),
}

#[derive(Debug, Clone)]
enum Thrown {
    Text(String),
    Value(Node),
}

enum Flow {
    Continue,
    Return(Option<f64>),
}

/// A compiled `F(t)`: a pure function of time in seconds.
///
/// Every call starts from a fresh variable frame, so the only input is `t`.
#[derive(Debug, Clone)]
pub struct SampleFunction {
    ops: Vec<Op>,
    slots: usize,
}

impl SampleFunction {
    /// Evaluate `F(t)`.
    pub fn call(&self, t: f64) -> Result<f64, EvaluationError> {
        let mut frame = Vec::with_capacity(self.slots);
        self.call_with_frame(t, &mut frame)
    }

    /// Evaluate `F(t)` reusing `frame` as scratch space, avoiding an
    /// allocation per sample in tight loops.
    pub fn call_with_frame(&self, t: f64, frame: &mut Vec<f64>) -> Result<f64, EvaluationError> {
        frame.clear();
        frame.resize(self.slots, f64::NAN);
        frame[0] = t;

        let kind = match exec(&self.ops, frame) {
            Ok(Flow::Return(Some(v))) if v.is_nan() => EvalErrorKind::NotANumber,
            Ok(Flow::Return(Some(v))) => return Ok(v),
            Ok(Flow::Return(None)) | Ok(Flow::Continue) => EvalErrorKind::NoReturn,
            Err(kind) => kind,
        };
        Err(EvaluationError { t, kind })
    }

    /// Number of variable slots, including `t`.
    pub fn slot_count(&self) -> usize {
        self.slots
    }
}

// ── Interpreter ─────────────────────────────────────────────

fn truthy(v: f64) -> bool {
    v != 0.0 && !v.is_nan()
}

fn bool_value(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

fn exec(ops: &[Op], frame: &mut [f64]) -> Result<Flow, EvalErrorKind> {
    for op in ops {
        match op {
            Op::Store { slot, value } => {
                let v = eval(value, frame);
                frame[*slot] = v;
            }
            Op::Eval(node) => {
                eval(node, frame);
            }
            Op::Return(node) => return Ok(Flow::Return(node.as_ref().map(|n| eval(n, frame)))),
            Op::If { condition, then_ops, else_ops } => {
                let branch = if truthy(eval(condition, frame)) { then_ops } else { else_ops };
                if let Flow::Return(v) = exec(branch, frame)? {
                    return Ok(Flow::Return(v));
                }
            }
            Op::Throw(Thrown::Text(msg)) => return Err(EvalErrorKind::Thrown(msg.clone())),
            Op::Throw(Thrown::Value(node)) => {
                return Err(EvalErrorKind::Thrown(format!("{}", eval(node, frame))));
            }
        }
    }
    Ok(Flow::Continue)
}

fn eval(node: &Node, frame: &[f64]) -> f64 {
    match node {
        Node::Const(v) => *v,
        Node::Slot(i) => frame[*i],
        Node::Unary(op, operand) => apply_unary(*op, eval(operand, frame)),
        Node::Binary(op, l, r) => apply_binary(*op, eval(l, frame), eval(r, frame)),
        Node::Logical(LogicalOp::And, l, r) => {
            let left = eval(l, frame);
            if truthy(left) { eval(r, frame) } else { left }
        }
        Node::Logical(LogicalOp::Or, l, r) => {
            let left = eval(l, frame);
            if truthy(left) { left } else { eval(r, frame) }
        }
        Node::Conditional(c, a, b) => {
            if truthy(eval(c, frame)) {
                eval(a, frame)
            } else {
                eval(b, frame)
            }
        }
        Node::Call1(f, a) => f(eval(a, frame)),
        Node::Call2(f, a, b) => f(eval(a, frame), eval(b, frame)),
        Node::CallN(f, args) => {
            let values: Vec<f64> = args.iter().map(|a| eval(a, frame)).collect();
            f(&values)
        }
    }
}

fn apply_unary(op: UnaryOp, v: f64) -> f64 {
    match op {
        UnaryOp::Neg => -v,
        UnaryOp::Plus => v,
        UnaryOp::Not => bool_value(!truthy(v)),
    }
}

fn apply_binary(op: BinaryOp, a: f64, b: f64) -> f64 {
    match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        BinaryOp::Rem => a % b,
        BinaryOp::Pow => a.powf(b),
        BinaryOp::Lt => bool_value(a < b),
        BinaryOp::LtEq => bool_value(a <= b),
        BinaryOp::Gt => bool_value(a > b),
        BinaryOp::GtEq => bool_value(a >= b),
        BinaryOp::Eq => bool_value(a == b),
        BinaryOp::NotEq => bool_value(a != b),
    }
}

fn assign_to_binary(op: AssignOp) -> Option<BinaryOp> {
    match op {
        AssignOp::Set => None,
        AssignOp::Add => Some(BinaryOp::Add),
        AssignOp::Sub => Some(BinaryOp::Sub),
        AssignOp::Mul => Some(BinaryOp::Mul),
        AssignOp::Div => Some(BinaryOp::Div),
        AssignOp::Rem => Some(BinaryOp::Rem),
    }
}

// ── Compiler ────────────────────────────────────────────────

struct Binding {
    slot: usize,
    kind: DeclKind,
}

/// Variables share one function-wide namespace, like `var`.
struct CompileCtx {
    bindings: HashMap<String, Binding>,
    slots: usize,
    /// `return` and `throw` statements; a body needs at least one.
    exits: usize,
}

impl CompileCtx {
    fn new() -> Self {
        let mut bindings = HashMap::new();
        bindings.insert(TIME_VARIABLE.to_string(), Binding { slot: 0, kind: DeclKind::Let });
        CompileCtx { bindings, slots: 1, exits: 0 }
    }
}

/// Compile expression source text into a [`SampleFunction`].
pub fn compile(source: &str) -> Result<SampleFunction, CompileError> {
    let program = crate::parse(source)?;
    let function = compile_program(&program)?;
    tracing::debug!(
        statements = program.statements.len(),
        slots = function.slots,
        "compiled expression"
    );
    Ok(function)
}

/// Compile an already-parsed program.
///
/// When the last non-comment statement is a bare expression it becomes the
/// return value, so `Math.sin(t)` and `return Math.sin(t);` are equivalent.
pub fn compile_program(program: &Program) -> Result<SampleFunction, CompileError> {
    let mut ctx = CompileCtx::new();
    let implicit_return = program
        .statements
        .iter()
        .rposition(|s| !s.is_comment())
        .filter(|&i| matches!(program.statements[i], Statement::Expression { .. }));

    let mut ops = Vec::with_capacity(program.statements.len());
    for (i, stmt) in program.statements.iter().enumerate() {
        match stmt {
            Statement::Expression { expr, .. } if Some(i) == implicit_return => {
                ops.push(Op::Return(Some(compile_expr(&ctx, expr)?)));
                ctx.exits += 1;
            }
            _ => compile_statement(&mut ctx, stmt, &mut ops)?,
        }
    }

    if ctx.exits == 0 {
        return Err(CompileError::NoReturnValue);
    }
    Ok(SampleFunction { ops, slots: ctx.slots })
}

fn compile_block(ctx: &mut CompileCtx, stmts: &[Statement]) -> Result<Vec<Op>, CompileError> {
    let mut ops = Vec::new();
    for stmt in stmts {
        compile_statement(ctx, stmt, &mut ops)?;
    }
    Ok(ops)
}

fn compile_statement(ctx: &mut CompileCtx, stmt: &Statement, ops: &mut Vec<Op>) -> Result<(), CompileError> {
    match stmt {
        Statement::Comment(_) => {}
        Statement::Declare { kind, name, value, span_start, span_end } => {
            // The initializer cannot see the variable it declares.
            let value = compile_expr(ctx, value)?;
            let span = Span::new(*span_start, *span_end);
            let slot = declare(ctx, *kind, name, span)?;
            ops.push(Op::Store { slot, value });
        }
        Statement::Assign { target, op, value, span_start, span_end } => {
            let span = Span::new(*span_start, *span_end);
            let binding = match ctx.bindings.get(target) {
                Some(b) => b,
                None if builtins::lookup(target).is_some() => {
                    return Err(CompileError::AssignToConstant { name: target.clone(), span });
                }
                None => return Err(CompileError::UnknownIdentifier { name: target.clone(), span }),
            };
            if binding.kind == DeclKind::Const {
                return Err(CompileError::AssignToConstant { name: target.clone(), span });
            }
            let slot = binding.slot;
            let rhs = compile_expr(ctx, value)?;
            let value = match assign_to_binary(*op) {
                Some(bin) => fold(Node::Binary(bin, Box::new(Node::Slot(slot)), Box::new(rhs))),
                None => rhs,
            };
            ops.push(Op::Store { slot, value });
        }
        Statement::Return { value, .. } => {
            let node = value.as_ref().map(|v| compile_expr(ctx, v)).transpose()?;
            ctx.exits += 1;
            ops.push(Op::Return(node));
        }
        Statement::If { condition, then_branch, else_branch, .. } => {
            let condition = compile_expr(ctx, condition)?;
            let then_ops = compile_block(ctx, std::slice::from_ref(then_branch.as_ref()))?;
            let else_ops = match else_branch {
                Some(stmt) => compile_block(ctx, std::slice::from_ref(stmt.as_ref()))?,
                None => Vec::new(),
            };
            ops.push(Op::If { condition, then_ops, else_ops });
        }
        Statement::Block { body, .. } => {
            ops.extend(compile_block(ctx, body)?);
        }
        Statement::Throw { value, .. } => {
            let thrown = match value {
                ThrowValue::Text(text) => Thrown::Text(text.clone()),
                ThrowValue::Value(expr) => Thrown::Value(compile_expr(ctx, expr)?),
            };
            ctx.exits += 1;
            ops.push(Op::Throw(thrown));
        }
        Statement::Expression { expr, .. } => {
            ops.push(Op::Eval(compile_expr(ctx, expr)?));
        }
    }
    Ok(())
}

fn declare(ctx: &mut CompileCtx, kind: DeclKind, name: &str, span: Span) -> Result<usize, CompileError> {
    if let Some(existing) = ctx.bindings.get(name) {
        // Only `var` may be redeclared, and only over another `var`.
        if kind == DeclKind::Var && existing.kind == DeclKind::Var {
            return Ok(existing.slot);
        }
        return Err(CompileError::Redeclared { name: name.to_string(), span });
    }
    let slot = ctx.slots;
    ctx.slots += 1;
    ctx.bindings.insert(name.to_string(), Binding { slot, kind });
    Ok(slot)
}

fn compile_expr(ctx: &CompileCtx, expr: &Expr) -> Result<Node, CompileError> {
    let node = match expr {
        Expr::Number(n) => Node::Const(*n),
        Expr::Bool(b) => Node::Const(bool_value(*b)),
        Expr::Identifier { name, span_start, span_end } | Expr::Member { path: name, span_start, span_end } => {
            resolve_value(ctx, name, Span::new(*span_start, *span_end))?
        }
        Expr::Unary { op, operand } => Node::Unary(*op, Box::new(compile_expr(ctx, operand)?)),
        Expr::Binary { op, left, right } => Node::Binary(
            *op,
            Box::new(compile_expr(ctx, left)?),
            Box::new(compile_expr(ctx, right)?),
        ),
        Expr::Logical { op, left, right } => Node::Logical(
            *op,
            Box::new(compile_expr(ctx, left)?),
            Box::new(compile_expr(ctx, right)?),
        ),
        Expr::Conditional { condition, then_expr, else_expr } => Node::Conditional(
            Box::new(compile_expr(ctx, condition)?),
            Box::new(compile_expr(ctx, then_expr)?),
            Box::new(compile_expr(ctx, else_expr)?),
        ),
        Expr::Call { function, args, span_start, span_end } => {
            compile_call(ctx, function, args, Span::new(*span_start, *span_end))?
        }
    };
    Ok(fold(node))
}

fn resolve_value(ctx: &CompileCtx, name: &str, span: Span) -> Result<Node, CompileError> {
    if let Some(binding) = ctx.bindings.get(name) {
        return Ok(Node::Slot(binding.slot));
    }
    match builtins::lookup(name) {
        Some(Builtin::Constant(v)) => Ok(Node::Const(v)),
        Some(_) => Err(CompileError::FunctionAsValue { name: name.to_string(), span }),
        None => Err(CompileError::UnknownIdentifier { name: name.to_string(), span }),
    }
}

fn compile_call(ctx: &CompileCtx, function: &str, args: &[Expr], span: Span) -> Result<Node, CompileError> {
    // A local variable shadows a library function of the same name.
    let builtin = match builtins::lookup(function) {
        Some(Builtin::Constant(_)) | None => {
            return Err(CompileError::UnknownFunction { name: function.to_string(), span });
        }
        Some(_) if ctx.bindings.contains_key(function) => {
            return Err(CompileError::UnknownFunction { name: function.to_string(), span });
        }
        Some(b) => b,
    };
    if !builtin.accepts(args.len()) {
        return Err(CompileError::WrongArity {
            name: function.to_string(),
            expected: builtin.arity().to_string(),
            found: args.len(),
            span,
        });
    }

    let mut nodes = args
        .iter()
        .map(|a| compile_expr(ctx, a))
        .collect::<Result<Vec<_>, _>>()?;
    let node = match builtin {
        Builtin::Unary(f) => Node::Call1(f, Box::new(nodes.remove(0))),
        Builtin::Binary(f) => {
            let b = nodes.remove(1);
            let a = nodes.remove(0);
            Node::Call2(f, Box::new(a), Box::new(b))
        }
        Builtin::Variadic(f) => Node::CallN(f, nodes),
        Builtin::Constant(v) => Node::Const(v),
    };
    Ok(node)
}

/// Collapse nodes whose operands are all constants.
fn fold(node: Node) -> Node {
    let folded = match &node {
        Node::Unary(op, a) => match **a {
            Node::Const(v) => Some(apply_unary(*op, v)),
            _ => None,
        },
        Node::Binary(op, a, b) => match (&**a, &**b) {
            (Node::Const(x), Node::Const(y)) => Some(apply_binary(*op, *x, *y)),
            _ => None,
        },
        Node::Call1(f, a) => match **a {
            Node::Const(v) => Some(f(v)),
            _ => None,
        },
        Node::Call2(f, a, b) => match (&**a, &**b) {
            (Node::Const(x), Node::Const(y)) => Some(f(*x, *y)),
            _ => None,
        },
        _ => None,
    };
    folded.map_or(node, Node::Const)
}

// ABOUTME: Tree-walking evaluator executing the parsed AST

use crate::ast::{BinaryOp, Block, Expr, Stmt, UnaryOp};
use crate::builtins::register_builtins;
use crate::env::Environment;
use crate::error::KuzurError;
use crate::parser;
use crate::value::{Function, Value};
use std::cmp::Ordering;
use std::rc::Rc;

/// Outcome of executing a statement. Loops react to `Break`/`Continue`,
/// function application reacts to `Return`; every other construct passes the
/// signal upward. A signal reaching a frame that cannot handle it is a
/// runtime error.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

pub struct Interpreter {
    pub globals: Rc<Environment>,
}

impl Interpreter {
    /// Fresh interpreter with the built-ins installed in its global scope.
    pub fn new() -> Self {
        let globals = Environment::new();
        register_builtins(globals.clone());
        Interpreter { globals }
    }

    /// Lex, parse, and execute a whole program. The top-level block runs
    /// directly in the global scope.
    pub fn run(&self, source: &str) -> Result<(), KuzurError> {
        let program = parser::parse(source)?;
        match self.exec_block(&program, self.globals.clone())? {
            Flow::Normal => Ok(()),
            Flow::Return(_) => Err(KuzurError::runtime("'return' outside function")),
            Flow::Break => Err(KuzurError::runtime("'break' outside loop")),
            Flow::Continue => Err(KuzurError::runtime("'continue' outside loop")),
        }
    }

    /// Execute one input line for the REPL, yielding the value of a trailing
    /// expression statement so the prompt can echo it.
    pub fn eval_line(&self, source: &str) -> Result<Option<Value>, KuzurError> {
        let program = parser::parse(source)?;
        let mut last = None;
        for stmt in &program.statements {
            last = None;
            match stmt {
                Stmt::Expr(expr) => {
                    last = Some(self.eval_expr(expr, self.globals.clone())?);
                }
                other => match self.exec_stmt(other, self.globals.clone())? {
                    Flow::Normal => {}
                    Flow::Return(_) => {
                        return Err(KuzurError::runtime("'return' outside function"))
                    }
                    Flow::Break => return Err(KuzurError::runtime("'break' outside loop")),
                    Flow::Continue => return Err(KuzurError::runtime("'continue' outside loop")),
                },
            }
        }
        Ok(last)
    }

    /// Run a block's statements in the given environment. Creating the child
    /// scope (or not) is the caller's decision: bodies of function calls run
    /// directly in their parameter scope, the top-level program runs in
    /// globals, and everything else passes a fresh child.
    fn exec_block(&self, block: &Block, env: Rc<Environment>) -> Result<Flow, KuzurError> {
        for stmt in &block.statements {
            match self.exec_stmt(stmt, env.clone())? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&self, stmt: &Stmt, env: Rc<Environment>) -> Result<Flow, KuzurError> {
        match stmt {
            Stmt::Expr(expr) => {
                self.eval_expr(expr, env)?;
                Ok(Flow::Normal)
            }
            Stmt::Assign { name, expr } => {
                let value = self.eval_expr(expr, env.clone())?;
                env.set(name, value);
                Ok(Flow::Normal)
            }
            Stmt::Block(block) => self.exec_block(block, Environment::with_parent(env)),
            Stmt::If {
                branches,
                else_block,
            } => {
                for (cond, block) in branches {
                    if self.eval_expr(cond, env.clone())?.truthy() {
                        return self.exec_block(block, Environment::with_parent(env));
                    }
                }
                if let Some(block) = else_block {
                    return self.exec_block(block, Environment::with_parent(env));
                }
                Ok(Flow::Normal)
            }
            Stmt::While { cond, body } => {
                while self.eval_expr(cond, env.clone())?.truthy() {
                    match self.exec_block(body, Environment::with_parent(env.clone()))? {
                        Flow::Break => break,
                        Flow::Continue | Flow::Normal => {}
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::For {
                var,
                start,
                end,
                body,
            } => {
                // Start and end are evaluated once. The loop variable binds
                // through `set`, so it follows the assignment-walks-parents
                // rule like any other assignment.
                let start = self.eval_expr(start, env.clone())?;
                let end = self.eval_expr(end, env.clone())?;
                env.set(var, start);
                loop {
                    let current = self.loop_var(var, &env)?;
                    if !eval_binary(current, BinaryOp::Le, end.clone())?.truthy() {
                        break;
                    }
                    match self.exec_block(body, Environment::with_parent(env.clone()))? {
                        Flow::Break => break,
                        Flow::Continue | Flow::Normal => {}
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                    let current = self.loop_var(var, &env)?;
                    let next = match current.as_number() {
                        Some(n) => Value::number(n + 1.0),
                        None => {
                            return Err(KuzurError::type_error(format!(
                                "for loop variable '{}' must stay a number, got {}",
                                var,
                                current.type_name()
                            )))
                        }
                    };
                    env.set(var, next);
                }
                Ok(Flow::Normal)
            }
            Stmt::DoWhile { body, cond } => {
                loop {
                    match self.exec_block(body, Environment::with_parent(env.clone()))? {
                        Flow::Break => break,
                        Flow::Continue | Flow::Normal => {}
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                    if !self.eval_expr(cond, env.clone())?.truthy() {
                        break;
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::FuncDef { name, params, body } => {
                let function = Function {
                    name: name.clone(),
                    params: params.clone(),
                    body: body.clone(),
                    closure: env.clone(),
                };
                env.define(name.clone(), Value::Function(Rc::new(function)));
                Ok(Flow::Normal)
            }
            Stmt::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.eval_expr(expr, env)?,
                    None => Value::Null,
                };
                Ok(Flow::Return(value))
            }
            Stmt::Break => Ok(Flow::Break),
            Stmt::Continue => Ok(Flow::Continue),
        }
    }

    fn loop_var(&self, var: &str, env: &Rc<Environment>) -> Result<Value, KuzurError> {
        env.get(var).ok_or_else(|| KuzurError::Name(var.to_string()))
    }

    pub fn eval_expr(&self, expr: &Expr, env: Rc<Environment>) -> Result<Value, KuzurError> {
        match expr {
            Expr::Number(n) => Ok(Value::number(*n)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Var(name) => env
                .get(name)
                .ok_or_else(|| KuzurError::Name(name.clone())),
            Expr::Unary { op, operand } => {
                let value = self.eval_expr(operand, env)?;
                eval_unary(*op, value)
            }
            Expr::Binary { left, op, right } => {
                let lhs = self.eval_expr(left, env.clone())?;
                let rhs = self.eval_expr(right, env)?;
                eval_binary(lhs, *op, rhs)
            }
            Expr::Call { callee, args } => {
                let callee = self.eval_expr(callee, env.clone())?;
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval_expr(arg, env.clone())?);
                }
                self.apply(callee, &values)
            }
        }
    }

    /// Apply a callable to already-evaluated arguments. A user function runs
    /// its body in a fresh child of its captured closure, never of the
    /// caller's environment.
    pub fn apply(&self, callee: Value, args: &[Value]) -> Result<Value, KuzurError> {
        match callee {
            Value::Function(func) => {
                if args.len() != func.params.len() {
                    return Err(KuzurError::arity(
                        &func.name,
                        func.params.len().to_string(),
                        args.len(),
                    ));
                }

                let local = Environment::with_parent(func.closure.clone());
                for (param, arg) in func.params.iter().zip(args) {
                    local.define(param.clone(), arg.clone());
                }

                match self.exec_block(&func.body, local)? {
                    Flow::Return(value) => Ok(value),
                    Flow::Normal => Ok(Value::Null),
                    Flow::Break => Err(KuzurError::runtime("'break' outside loop")),
                    Flow::Continue => Err(KuzurError::runtime("'continue' outside loop")),
                }
            }
            Value::BuiltIn(f) => f(args),
            other => Err(KuzurError::type_error(format!(
                "{} is not callable",
                other.type_name()
            ))),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn eval_unary(op: UnaryOp, value: Value) -> Result<Value, KuzurError> {
    match op {
        UnaryOp::Plus => match value {
            Value::Int(_) | Value::Float(_) => Ok(value),
            other => Err(unary_type_error(op, &other)),
        },
        UnaryOp::Neg => match value {
            Value::Int(i) => Ok(Value::Int(-i)),
            Value::Float(n) => Ok(Value::number(-n)),
            other => Err(unary_type_error(op, &other)),
        },
        UnaryOp::Not => Ok(Value::Bool(!value.truthy())),
    }
}

fn unary_type_error(op: UnaryOp, value: &Value) -> KuzurError {
    KuzurError::type_error(format!(
        "unary '{}' requires a number, got {}",
        op.symbol(),
        value.type_name()
    ))
}

/// Both operands reach here already evaluated, so `&&` and `||` do not
/// short-circuit.
fn eval_binary(left: Value, op: BinaryOp, right: Value) -> Result<Value, KuzurError> {
    match op {
        BinaryOp::Add => {
            // String concatenation wins whenever either side is a string
            if matches!(left, Value::Str(_)) || matches!(right, Value::Str(_)) {
                return Ok(Value::Str(format!("{}{}", left, right)));
            }
            numeric(left, op, right)
        }
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => numeric(left, op, right),
        BinaryOp::Eq => Ok(Value::Bool(left == right)),
        BinaryOp::Ne => Ok(Value::Bool(left != right)),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => ordering(left, op, right),
        BinaryOp::And => Ok(Value::Bool(left.truthy() && right.truthy())),
        BinaryOp::Or => Ok(Value::Bool(left.truthy() || right.truthy())),
    }
}

fn numeric(left: Value, op: BinaryOp, right: Value) -> Result<Value, KuzurError> {
    // Integer pairs stay in integer arithmetic, except `/` which is real
    // division. Division or modulo by an integer zero raises; float operands
    // follow IEEE and produce inf/nan instead.
    if let (Value::Int(a), Value::Int(b)) = (&left, &right) {
        let (a, b) = (*a, *b);
        return match op {
            BinaryOp::Add => Ok(Value::Int(a + b)),
            BinaryOp::Sub => Ok(Value::Int(a - b)),
            BinaryOp::Mul => Ok(Value::Int(a * b)),
            BinaryOp::Div => {
                if b == 0 {
                    Err(KuzurError::arithmetic("division by zero"))
                } else {
                    Ok(Value::number(a as f64 / b as f64))
                }
            }
            BinaryOp::Mod => {
                if b == 0 {
                    Err(KuzurError::arithmetic("modulo by zero"))
                } else {
                    Ok(Value::Int(a % b))
                }
            }
            _ => Err(internal_operator_error(op)),
        };
    }

    let (a, b) = match (left.as_number(), right.as_number()) {
        (Some(a), Some(b)) => (a, b),
        _ => {
            return Err(KuzurError::type_error(format!(
                "unsupported operands for '{}': {} and {}",
                op.symbol(),
                left.type_name(),
                right.type_name()
            )))
        }
    };

    match op {
        BinaryOp::Add => Ok(Value::number(a + b)),
        BinaryOp::Sub => Ok(Value::number(a - b)),
        BinaryOp::Mul => Ok(Value::number(a * b)),
        BinaryOp::Div => Ok(Value::number(a / b)),
        BinaryOp::Mod => Ok(Value::number(a % b)),
        _ => Err(internal_operator_error(op)),
    }
}

/// Ordering comparisons are defined on number pairs and string pairs only.
fn ordering(left: Value, op: BinaryOp, right: Value) -> Result<Value, KuzurError> {
    if let (Value::Str(a), Value::Str(b)) = (&left, &right) {
        return compare(op, a.partial_cmp(b));
    }
    if let (Some(a), Some(b)) = (left.as_number(), right.as_number()) {
        return compare(op, a.partial_cmp(&b));
    }
    Err(KuzurError::type_error(format!(
        "'{}' is not supported between {} and {}",
        op.symbol(),
        left.type_name(),
        right.type_name()
    )))
}

fn compare(op: BinaryOp, ord: Option<Ordering>) -> Result<Value, KuzurError> {
    // No ordering means a NaN operand; IEEE makes every comparison false
    let Some(ord) = ord else {
        return Ok(Value::Bool(false));
    };
    let result = match op {
        BinaryOp::Lt => ord == Ordering::Less,
        BinaryOp::Le => ord != Ordering::Greater,
        BinaryOp::Gt => ord == Ordering::Greater,
        BinaryOp::Ge => ord != Ordering::Less,
        _ => return Err(internal_operator_error(op)),
    };
    Ok(Value::Bool(result))
}

fn internal_operator_error(op: BinaryOp) -> KuzurError {
    KuzurError::runtime(format!("internal error: operator '{}'", op.symbol()))
}

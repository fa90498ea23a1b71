//! Sandboxed expression evaluator
//!
//! Expressions and stop conditions are written in a tiny JavaScript-like
//! language. The interpreter is owned by this crate: a logos lexer, a
//! recursive-descent parser and a tree-walking machine. Nothing in the
//! language can reach the host; the only effects are on its own variables.
//!
//! Every run is bounded twice: by fuel (one unit per evaluated node) and by a
//! wall-clock deadline. Either running out aborts with an error, so a snippet
//! like `while (true) {}` terminates. Nesting depth and string length are
//! capped as well, so hostile input ends in an error instead of exhausting the
//! stack or memory.
//!
//! # Evaluation strategies
//!
//! [`Sandbox::evaluate`] accepts the loose snippets people type into a single
//! line and tries, in order, until one yields a defined value:
//!
//! 1. `(snippet)` as a single expression
//! 2. statements, then the value of the `result` variable
//! 3. a lone `if (..) a else b` whose branches are expressions, as a ternary
//! 4. statements as a function body, then its `return` value

pub mod ast;
pub mod lexer;
mod machine;
pub mod parser;
pub mod value;

pub use machine::{MAX_CALL_DEPTH, MAX_EVAL_DEPTH, MAX_STRING_BYTES};
pub use value::{format_js_number, Value};

use crate::error::{EvalError, EvalResult};
use ast::{Expr, FunctionBody, Stmt};
use machine::Machine;
use std::rc::Rc;
use std::time::Duration;
use value::Closure;

/// Fuel granted to a single run.
pub const DEFAULT_FUEL: u64 = 1_000_000;

/// Limits applied to every evaluation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budget {
    pub timeout: Duration,
    pub fuel: u64,
}

impl Budget {
    pub fn from_millis(millis: u64) -> Self {
        Self {
            timeout: Duration::from_millis(millis),
            fuel: DEFAULT_FUEL,
        }
    }
}

impl Default for Budget {
    fn default() -> Self {
        Self::from_millis(1000)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    Expression,
    ResultVariable,
    IfElseTernary,
    FunctionBody,
}

impl Strategy {
    const ORDER: [Strategy; 4] = [
        Strategy::Expression,
        Strategy::ResultVariable,
        Strategy::IfElseTernary,
        Strategy::FunctionBody,
    ];
}

#[derive(Debug, Clone, Default)]
pub struct Sandbox {
    budget: Budget,
}

impl Sandbox {
    pub fn new(budget: Budget) -> Self {
        Self { budget }
    }

    pub fn budget(&self) -> Budget {
        self.budget
    }

    /// Evaluate a snippet with the four strategies.
    ///
    /// Syntax errors move on to the next strategy. Running out of budget
    /// aborts at once. Other runtime faults are reported only when no
    /// strategy produced a value; if nothing did, the result is
    /// [`Value::Undefined`].
    pub fn evaluate(&self, source: &str) -> EvalResult<Value> {
        let mut fault = None;
        for strategy in Strategy::ORDER {
            match self.attempt(strategy, source) {
                Ok(value) if !value.is_undefined() => {
                    tracing::trace!(?strategy, "snippet evaluated");
                    return Ok(value);
                }
                Ok(_) | Err(EvalError::Syntax(_)) => {}
                Err(err) if err.is_budget() => return Err(err),
                Err(err) => {
                    fault.get_or_insert(err);
                }
            }
        }
        match fault {
            Some(err) => Err(err),
            None => Ok(Value::Undefined),
        }
    }

    fn attempt(&self, strategy: Strategy, source: &str) -> EvalResult<Value> {
        let mut machine = Machine::new(self.budget);
        match strategy {
            Strategy::Expression => {
                let expr = parser::parse_expression(&format!("({source})"))?;
                machine.eval(&expr)
            }
            Strategy::ResultVariable => {
                let program = parser::parse_program(source)?;
                machine.run(&program)?;
                Ok(machine.global("result"))
            }
            Strategy::IfElseTernary => match ternary_from_if(parser::parse_program(source)?) {
                Some(expr) => machine.eval(&expr),
                None => Ok(Value::Undefined),
            },
            Strategy::FunctionBody => {
                let program = parser::parse_program(source)?;
                machine.run_body(&program)
            }
        }
    }

    /// Compile a function literal (`function (i) {..}`, `(i, s) => ..` or a
    /// named `function f(..) {..}` declaration) into a reusable callable.
    pub fn compile_function(&self, source: &str) -> EvalResult<Callable> {
        let value = match parser::parse_expression(&format!("({source})")) {
            Ok(expr) => Machine::new(self.budget).eval(&expr)?,
            Err(_) => declared_function(self.budget, source)?,
        };
        match value {
            Value::Function(closure) => Ok(Callable { closure }),
            other => Err(EvalError::Runtime(format!(
                "expected a function, found {}",
                other.type_name()
            ))),
        }
    }
}

/// The single function a program declares, if that is all it does.
fn declared_function(budget: Budget, source: &str) -> EvalResult<Value> {
    let program = parser::parse_program(source)?;
    let [Stmt::Declare(bindings)] = program.as_slice() else {
        return Err(EvalError::Syntax("source is not a function".into()));
    };
    let [(name, Some(Expr::Function(_)))] = bindings.as_slice() else {
        return Err(EvalError::Syntax("source is not a function".into()));
    };
    let mut machine = Machine::new(budget);
    machine.run(&program)?;
    Ok(machine.global(name))
}

/// `if (t) a else b` with single-expression branches becomes `t ? a : b`.
fn ternary_from_if(program: Vec<Stmt>) -> Option<Expr> {
    let mut statements = program.into_iter().filter(|s| *s != Stmt::Empty);
    let Some(Stmt::If {
        test,
        then,
        otherwise,
    }) = statements.next()
    else {
        return None;
    };
    if statements.next().is_some() {
        return None;
    }
    let then = branch_expression(*then)?;
    let otherwise = match otherwise {
        Some(stmt) => branch_expression(*stmt)?,
        None => Expr::Undefined,
    };
    Some(Expr::Conditional {
        test: Box::new(test),
        then: Box::new(then),
        otherwise: Box::new(otherwise),
    })
}

fn branch_expression(stmt: Stmt) -> Option<Expr> {
    match stmt {
        Stmt::Expr(expr) => Some(expr),
        Stmt::Block(mut statements) if statements.len() == 1 => {
            branch_expression(statements.remove(0))
        }
        Stmt::If { .. } => ternary_from_if(vec![stmt]),
        _ => None,
    }
}

/// A compiled function that can be called repeatedly with fresh budgets.
#[derive(Debug, Clone)]
pub struct Callable {
    closure: Rc<Closure>,
}

impl Callable {
    pub fn arity(&self) -> usize {
        self.closure.def.params.len()
    }

    pub fn call(&self, sandbox: &Sandbox, args: &[Value]) -> EvalResult<Value> {
        let mut machine = Machine::new(sandbox.budget);
        machine.call(&Value::Function(Rc::clone(&self.closure)), args.to_vec())
    }

    /// Whether the body is a bare expression (arrow form).
    pub fn is_expression_bodied(&self) -> bool {
        matches!(self.closure.def.body, FunctionBody::Expr(_))
    }
}

//! Tree-walking evaluator
//!
//! Every expression and statement costs one unit of fuel; the wall clock is
//! checked every [`CLOCK_INTERVAL`] units. Frames hold variables: lookups see
//! the current frame and then the global frame, so top-level functions can
//! call themselves and each other.
//!
//! Besides fuel and the clock, evaluation depth is capped at
//! [`MAX_EVAL_DEPTH`] nested expressions and statements, and strings at
//! [`MAX_STRING_BYTES`].

use super::ast::{BinaryOp, Expr, FunctionBody, FunctionDef, LogicalOp, Stmt, UnaryOp};
use super::value::{Closure, Value};
use super::Budget;
use crate::error::{EvalError, EvalResult};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Instant;

/// Deepest allowed chain of nested calls.
pub const MAX_CALL_DEPTH: usize = 64;

/// Deepest allowed nesting of expressions and statements, across calls.
pub const MAX_EVAL_DEPTH: usize = 512;

/// Longest string a snippet may build.
pub const MAX_STRING_BYTES: usize = 1 << 20;

const CLOCK_INTERVAL: u64 = 256;

type Frame = HashMap<String, Value>;

enum Flow {
    Normal,
    Return(Value),
}

pub(crate) struct Machine {
    budget: Budget,
    started: Instant,
    spent: u64,
    depth: usize,
    frames: Vec<Frame>,
}

impl Machine {
    pub(crate) fn new(budget: Budget) -> Self {
        Self {
            budget,
            started: Instant::now(),
            spent: 0,
            depth: 0,
            frames: vec![Frame::new()],
        }
    }

    /// Global variable, used to read `result` after running statements.
    pub(crate) fn global(&self, name: &str) -> Value {
        self.frames
            .first()
            .and_then(|frame| frame.get(name))
            .cloned()
            .unwrap_or(Value::Undefined)
    }

    fn tick(&mut self) -> EvalResult<()> {
        self.spent += 1;
        if self.spent > self.budget.fuel {
            return Err(EvalError::FuelExhausted {
                steps: self.budget.fuel,
            });
        }
        if self.spent % CLOCK_INTERVAL == 0 && self.started.elapsed() > self.budget.timeout {
            return Err(EvalError::Timeout {
                budget_ms: self.budget.timeout.as_millis() as u64,
            });
        }
        Ok(())
    }

    /// Run statements in the global frame.
    pub(crate) fn run(&mut self, statements: &[Stmt]) -> EvalResult<()> {
        self.exec_all(statements)?;
        Ok(())
    }

    /// Run statements as a function body and return what it returns.
    pub(crate) fn run_body(&mut self, statements: &[Stmt]) -> EvalResult<Value> {
        match self.exec_all(statements)? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Undefined),
        }
    }

    fn exec_all(&mut self, statements: &[Stmt]) -> EvalResult<Flow> {
        for stmt in statements {
            if let Flow::Return(value) = self.exec(stmt)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    fn enter(&mut self) -> EvalResult<()> {
        if self.depth >= MAX_EVAL_DEPTH {
            return Err(EvalError::RecursionLimit(MAX_EVAL_DEPTH));
        }
        self.depth += 1;
        Ok(())
    }

    fn exec(&mut self, stmt: &Stmt) -> EvalResult<Flow> {
        self.tick()?;
        self.enter()?;
        let flow = self.exec_inner(stmt);
        self.depth -= 1;
        flow
    }

    fn exec_inner(&mut self, stmt: &Stmt) -> EvalResult<Flow> {
        match stmt {
            Stmt::Expr(expr) => {
                self.eval(expr)?;
            }
            Stmt::Declare(bindings) => {
                for (name, init) in bindings {
                    let value = match init {
                        Some(expr) => self.eval(expr)?,
                        None => Value::Undefined,
                    };
                    self.current_frame().insert(name.clone(), value);
                }
            }
            Stmt::If {
                test,
                then,
                otherwise,
            } => {
                if self.eval(test)?.truthy() {
                    return self.exec(then);
                } else if let Some(otherwise) = otherwise {
                    return self.exec(otherwise);
                }
            }
            Stmt::While { test, body } => {
                while self.eval(test)?.truthy() {
                    if let Flow::Return(value) = self.exec(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
            }
            Stmt::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval(expr)?,
                    None => Value::Undefined,
                };
                return Ok(Flow::Return(value));
            }
            Stmt::Block(statements) => return self.exec_all(statements),
            Stmt::Empty => {}
        }
        Ok(Flow::Normal)
    }

    fn current_frame(&mut self) -> &mut Frame {
        if self.frames.is_empty() {
            self.frames.push(Frame::new());
        }
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    fn lookup(&self, name: &str) -> Option<&Value> {
        let current = self.frames.last().and_then(|frame| frame.get(name));
        current.or_else(|| self.frames.first().and_then(|frame| frame.get(name)))
    }

    /// Assign to an existing variable, or create it in the current frame.
    fn store(&mut self, name: &str, value: Value) {
        let last = self.frames.len().saturating_sub(1);
        let target = if self.frames.get(last).is_some_and(|f| f.contains_key(name)) {
            last
        } else if self.frames.first().is_some_and(|f| f.contains_key(name)) {
            0
        } else {
            last
        };
        if let Some(frame) = self.frames.get_mut(target) {
            frame.insert(name.to_string(), value);
        }
    }

    pub(crate) fn eval(&mut self, expr: &Expr) -> EvalResult<Value> {
        self.tick()?;
        self.enter()?;
        let value = self.eval_inner(expr);
        self.depth -= 1;
        value
    }

    fn eval_inner(&mut self, expr: &Expr) -> EvalResult<Value> {
        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Null => Ok(Value::Null),
            Expr::Undefined => Ok(Value::Undefined),
            Expr::Ident(name) => self.read(name),
            Expr::Unary(UnaryOp::Typeof, operand) => {
                let value = match operand.as_ref() {
                    Expr::Ident(name) => self.lookup(name).cloned().unwrap_or(Value::Undefined),
                    other => self.eval(other)?,
                };
                Ok(Value::Str(value.type_name().to_string()))
            }
            Expr::Unary(op, operand) => {
                let value = self.eval(operand)?;
                Ok(match op {
                    UnaryOp::Neg => Value::Number(-value.to_number()),
                    UnaryOp::Plus => Value::Number(value.to_number()),
                    UnaryOp::Not => Value::Bool(!value.truthy()),
                    UnaryOp::Typeof => Value::Str(value.type_name().to_string()),
                })
            }
            Expr::Binary(op, left, right) => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                binary(*op, &left, &right)
            }
            Expr::Logical(op, left, right) => {
                let left = self.eval(left)?;
                let short_circuit = match op {
                    LogicalOp::And => !left.truthy(),
                    LogicalOp::Or => left.truthy(),
                    LogicalOp::Nullish => !left.is_nullish(),
                };
                if short_circuit {
                    Ok(left)
                } else {
                    self.eval(right)
                }
            }
            Expr::Conditional {
                test,
                then,
                otherwise,
            } => {
                if self.eval(test)?.truthy() {
                    self.eval(then)
                } else {
                    self.eval(otherwise)
                }
            }
            Expr::Assign { name, op, value } => {
                let value = self.eval(value)?;
                let value = match op {
                    Some(op) => binary(*op, &self.read(name)?, &value)?,
                    None => value,
                };
                self.store(name, value.clone());
                Ok(value)
            }
            Expr::Update {
                name,
                delta,
                prefix,
            } => {
                let old = self.read(name)?.to_number();
                let new = old + delta;
                self.store(name, Value::Number(new));
                Ok(Value::Number(if *prefix { new } else { old }))
            }
            Expr::Member(object, property) => self.member(object, property),
            Expr::Call(callee, args) => self.call_expr(callee, args),
            Expr::Function(def) => Ok(Value::Function(Rc::new(Closure {
                def: Rc::clone(def),
                captured: self.capture(),
            }))),
        }
    }

    fn read(&self, name: &str) -> EvalResult<Value> {
        if let Some(value) = self.lookup(name) {
            return Ok(value.clone());
        }
        match name {
            "Infinity" => Ok(Value::Number(f64::INFINITY)),
            "NaN" => Ok(Value::Number(f64::NAN)),
            _ => Err(EvalError::Runtime(format!("{name} is not defined"))),
        }
    }

    /// Snapshot of the current frame; globals stay reachable through lookup.
    fn capture(&self) -> Frame {
        if self.frames.len() > 1 {
            self.frames.last().cloned().unwrap_or_default()
        } else {
            Frame::new()
        }
    }

    fn member(&mut self, object: &Expr, property: &str) -> EvalResult<Value> {
        if matches!(object, Expr::Ident(name) if name == "Math" && self.lookup(name).is_none()) {
            return match property {
                "PI" => Ok(Value::Number(std::f64::consts::PI)),
                "E" => Ok(Value::Number(std::f64::consts::E)),
                _ => Err(EvalError::Runtime(format!(
                    "Math.{property} is not a value"
                ))),
            };
        }
        let target = self.eval(object)?;
        match (&target, property) {
            (Value::Str(s), "length") => Ok(Value::Number(s.chars().count() as f64)),
            (value, _) if value.is_nullish() => Err(EvalError::Runtime(format!(
                "cannot read '{property}' of {value}"
            ))),
            _ => Ok(Value::Undefined),
        }
    }

    fn call_expr(&mut self, callee: &Expr, args: &[Expr]) -> EvalResult<Value> {
        match callee {
            Expr::Member(object, name)
                if matches!(object.as_ref(), Expr::Ident(obj) if obj == "Math" && self.lookup(obj).is_none()) =>
            {
                let args = self.eval_args(args)?;
                builtin(name, &args)
                    .ok_or_else(|| EvalError::Runtime(format!("Math.{name} is not a function")))?
            }
            Expr::Member(object, name) => {
                let target = self.eval(object)?;
                let args = self.eval_args(args)?;
                method(&target, name, &args)
            }
            Expr::Ident(name) if self.lookup(name).is_none() => {
                let args = self.eval_args(args)?;
                builtin(name, &args)
                    .ok_or_else(|| EvalError::Runtime(format!("{name} is not defined")))?
            }
            other => {
                let function = self.eval(other)?;
                let args = self.eval_args(args)?;
                self.call(&function, args)
            }
        }
    }

    fn eval_args(&mut self, args: &[Expr]) -> EvalResult<Vec<Value>> {
        args.iter().map(|arg| self.eval(arg)).collect()
    }

    /// Call a function value with already evaluated arguments.
    pub(crate) fn call(&mut self, function: &Value, args: Vec<Value>) -> EvalResult<Value> {
        let Value::Function(closure) = function else {
            return Err(EvalError::Runtime(format!(
                "{} is not a function",
                function.type_name()
            )));
        };
        if self.frames.len() > MAX_CALL_DEPTH {
            return Err(EvalError::RecursionLimit(MAX_CALL_DEPTH));
        }

        let FunctionDef { params, body } = closure.def.as_ref();
        let mut frame = closure.captured.clone();
        let mut args = args.into_iter();
        for param in params {
            frame.insert(param.clone(), args.next().unwrap_or(Value::Undefined));
        }

        self.frames.push(frame);
        let result = match body {
            FunctionBody::Expr(expr) => self.eval(expr),
            FunctionBody::Block(statements) => self.run_body(statements),
        };
        self.frames.pop();
        result
    }
}

fn checked_str(text: String) -> EvalResult<Value> {
    if text.len() > MAX_STRING_BYTES {
        return Err(EvalError::Runtime(format!(
            "string of {} bytes exceeds {MAX_STRING_BYTES}",
            text.len()
        )));
    }
    Ok(Value::Str(text))
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> EvalResult<Value> {
    Ok(match op {
        BinaryOp::Add => match (left, right) {
            (Value::Str(_), _) | (_, Value::Str(_)) => return checked_str(format!("{left}{right}")),
            _ => Value::Number(left.to_number() + right.to_number()),
        },
        BinaryOp::Sub => Value::Number(left.to_number() - right.to_number()),
        BinaryOp::Mul => Value::Number(left.to_number() * right.to_number()),
        BinaryOp::Div => Value::Number(left.to_number() / right.to_number()),
        BinaryOp::Rem => Value::Number(left.to_number() % right.to_number()),
        BinaryOp::Pow => Value::Number(left.to_number().powf(right.to_number())),
        BinaryOp::Eq => Value::Bool(left.loose_eq(right)),
        BinaryOp::NotEq => Value::Bool(!left.loose_eq(right)),
        BinaryOp::StrictEq => Value::Bool(left.strict_eq(right)),
        BinaryOp::StrictNotEq => Value::Bool(!left.strict_eq(right)),
        BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
            Value::Bool(compare(op, left, right))
        }
    })
}

fn compare(op: BinaryOp, left: &Value, right: &Value) -> bool {
    let ordering = match (left, right) {
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        _ => left.to_number().partial_cmp(&right.to_number()),
    };
    let Some(ordering) = ordering else {
        return false;
    };
    match op {
        BinaryOp::Lt => ordering.is_lt(),
        BinaryOp::LtEq => ordering.is_le(),
        BinaryOp::Gt => ordering.is_gt(),
        _ => ordering.is_ge(),
    }
}

fn number_arg(args: &[Value], index: usize) -> f64 {
    args.get(index).map_or(f64::NAN, Value::to_number)
}

/// Free-standing builtins, also reachable as `Math.<name>`.
fn builtin(name: &str, args: &[Value]) -> Option<EvalResult<Value>> {
    let x = number_arg(args, 0);
    let value = match name {
        "abs" => x.abs(),
        "floor" => x.floor(),
        "ceil" => x.ceil(),
        "round" => (x + 0.5).floor(),
        "trunc" => x.trunc(),
        "sqrt" => x.sqrt(),
        "sign" => {
            if x == 0.0 || x.is_nan() {
                x
            } else {
                x.signum()
            }
        }
        "pow" => x.powf(number_arg(args, 1)),
        "min" => args
            .iter()
            .map(Value::to_number)
            .fold(f64::INFINITY, |acc, n| if n.is_nan() || acc.is_nan() { f64::NAN } else { acc.min(n) }),
        "max" => args
            .iter()
            .map(Value::to_number)
            .fold(f64::NEG_INFINITY, |acc, n| if n.is_nan() || acc.is_nan() { f64::NAN } else { acc.max(n) }),
        "isNaN" => return Some(Ok(Value::Bool(x.is_nan()))),
        "isFinite" => return Some(Ok(Value::Bool(x.is_finite()))),
        "Number" => x,
        "parseFloat" => parse_float_prefix(&args.first().map(|v| v.to_string()).unwrap_or_default()),
        "parseInt" => {
            let text = args.first().map(|v| v.to_string()).unwrap_or_default();
            let radix = args.get(1).map_or(10.0, Value::to_number);
            parse_int_prefix(&text, radix as u32)
        }
        "String" => {
            let text = args.first().map(|v| v.to_string()).unwrap_or_default();
            return Some(Ok(Value::Str(text)));
        }
        _ => return None,
    };
    Some(Ok(Value::Number(value)))
}

fn parse_float_prefix(text: &str) -> f64 {
    let text = text.trim_start();
    (1..=text.len())
        .rev()
        .filter(|end| text.is_char_boundary(*end))
        .find_map(|end| text[..end].parse::<f64>().ok())
        .unwrap_or(f64::NAN)
}

fn parse_int_prefix(text: &str, radix: u32) -> f64 {
    let radix = if (2..=36).contains(&radix) { radix } else { 10 };
    let text = text.trim_start();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let digits: String = digits.chars().take_while(|c| c.is_digit(radix)).collect();
    match i64::from_str_radix(&digits, radix) {
        Ok(n) if negative => -(n as f64),
        Ok(n) => n as f64,
        Err(_) => f64::NAN,
    }
}

fn method(target: &Value, name: &str, args: &[Value]) -> EvalResult<Value> {
    match (target, name) {
        (Value::Str(s), "toUpperCase") => checked_str(s.to_uppercase()),
        (Value::Str(s), "toLowerCase") => checked_str(s.to_lowercase()),
        (Value::Str(s), "trim") => Ok(Value::Str(s.trim().to_string())),
        (Value::Number(n), "toFixed") => {
            let digits = number_arg(args, 0);
            let digits = if digits.is_nan() { 0 } else { digits.clamp(0.0, 100.0) as usize };
            Ok(Value::Str(format!("{n:.digits$}")))
        }
        (value, "toString") => Ok(Value::Str(value.to_string())),
        (value, _) => Err(EvalError::Runtime(format!(
            "{}.{name} is not a function",
            value.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::parser::{parse_expression, parse_program};
    use std::time::Duration;

    fn eval(source: &str) -> EvalResult<Value> {
        let expr = parse_expression(source)?;
        Machine::new(Budget::default()).eval(&expr)
    }

    #[test]
    fn arithmetic_and_strings() {
        assert_eq!(eval("1 + 5").unwrap(), Value::Number(6.0));
        assert_eq!(eval("'a' + 1").unwrap(), Value::Str("a1".into()));
        assert_eq!(eval("7 % 3").unwrap(), Value::Number(1.0));
        assert_eq!(eval("-7 % 3").unwrap(), Value::Number(-1.0));
        assert_eq!(eval("'abc'.length").unwrap(), Value::Number(3.0));
    }

    #[test]
    fn builtins_and_math() {
        assert_eq!(eval("max(1, 4, 2)").unwrap(), Value::Number(4.0));
        assert_eq!(eval("Math.floor(2.7)").unwrap(), Value::Number(2.0));
        assert_eq!(eval("Math.round(-2.5)").unwrap(), Value::Number(-2.0));
        assert_eq!(eval("Math.PI > 3").unwrap(), Value::Bool(true));
        assert_eq!(eval("(2.5).toFixed(2)").unwrap(), Value::Str("2.50".into()));
    }

    #[test]
    fn closures_and_recursion() {
        let program = parse_program(
            "function fact(n) { return n <= 1 ? 1 : n * fact(n - 1) }\n\
             let add = a => b => a + b\n\
             result = fact(5) + add(1)(2)",
        )
        .unwrap();
        let mut machine = Machine::new(Budget::default());
        machine.run(&program).unwrap();
        assert_eq!(machine.global("result"), Value::Number(123.0));
    }

    #[test]
    fn unknown_names_are_runtime_errors() {
        assert!(matches!(eval("nope + 1"), Err(EvalError::Runtime(_))));
    }

    #[test]
    fn runaway_recursion_is_capped() {
        let program = parse_program("function f(n) { return f(n + 1) }\nf(0)").unwrap();
        let err = Machine::new(Budget::default()).run(&program).unwrap_err();
        assert_eq!(err, EvalError::RecursionLimit(MAX_CALL_DEPTH));
    }

    #[test]
    fn infinite_loop_hits_the_clock() {
        let program = parse_program("while (true) {}").unwrap();
        let budget = Budget {
            timeout: Duration::from_millis(20),
            fuel: u64::MAX,
        };
        let err = Machine::new(budget).run(&program).unwrap_err();
        assert!(matches!(err, EvalError::Timeout { budget_ms: 20 }));
    }

    #[test]
    fn infinite_loop_runs_out_of_fuel() {
        let program = parse_program("let i = 0; while (true) { i++ }").unwrap();
        let budget = Budget {
            timeout: Duration::from_secs(60),
            fuel: 10_000,
        };
        let err = Machine::new(budget).run(&program).unwrap_err();
        assert_eq!(err, EvalError::FuelExhausted { steps: 10_000 });
    }

    #[test]
    fn doubling_strings_stop_at_the_cap() {
        let program = parse_program("let s = 'xxxxxxxx'; while (true) { s = s + s }").unwrap();
        let err = Machine::new(Budget::default()).run(&program).unwrap_err();
        assert!(matches!(err, EvalError::Runtime(message) if message.contains("exceeds")));
    }

    #[test]
    fn compound_concatenation_is_capped_too() {
        let program = parse_program("let s = 'ab'; while (true) { s += s }").unwrap();
        let err = Machine::new(Budget::default()).run(&program).unwrap_err();
        assert!(matches!(err, EvalError::Runtime(_)));
    }

    #[test]
    fn deep_call_chains_hit_the_depth_cap() {
        // each call sits under sixty negations, so depth runs out before the call cap
        let negations = "- ".repeat(60);
        let program = parse_program(&format!(
            "function f(n) {{ return {negations}f(n + 1) }}\nf(0)"
        ))
        .unwrap();
        let err = Machine::new(Budget::default()).run(&program).unwrap_err();
        assert_eq!(err, EvalError::RecursionLimit(MAX_EVAL_DEPTH));
    }
}

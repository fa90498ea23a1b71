//! Sequence generators
//!
//! One generator per sequence kind. A factory parses everything that does not
//! depend on the index once (start value, alphabet, list, compiled function);
//! [`SequenceGenerator::generate`] then produces the text and stop decision for
//! a single index.
//!
//! All generators share [`ExpressionHooks`], which owns the replacement values
//! and runs the expression and stop-expression modifiers. The per-index order
//! is fixed:
//!
//! 1. [`ExpressionHooks::begin`] - index, original text, previous value
//! 2. compute the kind's value
//! 3. [`ExpressionHooks::evaluate`] - current value, expression result
//! 4. [`ExpressionHooks::settle`] - value after the expression
//! 5. format, then [`ExpressionHooks::should_stop`]

pub mod alpha;
pub mod date;
pub mod decimal;
pub mod function;
pub mod own_list;
pub mod predefined;
pub mod text;

use crate::context::GenerationContext;
use crate::format::{format_number, pad_string};
use crate::modifiers::Modifiers;
use crate::sandbox::{format_js_number, Sandbox, Value};
use crate::substitute::substitute;
use crate::values::ReplacementValues;

/// Output for one index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emission {
    pub text: String,
    pub stop: bool,
}

impl Emission {
    pub fn new(text: String, stop: bool) -> Self {
        Self { text, stop }
    }

    /// Nothing to insert, stop now.
    pub fn stopped() -> Self {
        Self {
            text: String::new(),
            stop: true,
        }
    }
}

pub trait SequenceGenerator {
    fn generate(&mut self, index: u64, ctx: &GenerationContext) -> Emission;
}

/// Replacement values plus the expression and stop-expression modifiers.
#[derive(Debug)]
pub struct ExpressionHooks {
    expression: String,
    stop_expression: String,
    sandbox: Sandbox,
    values: ReplacementValues,
}

impl ExpressionHooks {
    pub fn new(modifiers: &Modifiers, start: Value, ctx: &GenerationContext) -> Self {
        Self {
            expression: modifiers.expression.trim().to_string(),
            stop_expression: modifiers.stop_expression.trim().to_string(),
            sandbox: ctx.sandbox(),
            values: ReplacementValues::new(
                start,
                Value::Number(modifiers.step),
                ctx.selection_count(),
            ),
        }
    }

    pub fn begin(&mut self, index: u64, ctx: &GenerationContext) {
        self.values.advance(index, ctx.selection(selection_slot(index)));
    }

    pub fn has_expression(&self) -> bool {
        !self.expression.is_empty()
    }

    pub fn values(&self) -> &ReplacementValues {
        &self.values
    }

    /// Expose `value` as `_` before the kind's own evaluation.
    pub fn set_current(&mut self, value: Value) {
        self.values.set_current(value);
    }

    pub fn sandbox(&self) -> &Sandbox {
        &self.sandbox
    }

    /// Record the computed value and run the expression modifier, if any.
    ///
    /// A failing expression is a warning; the caller keeps its own value.
    pub fn evaluate(&mut self, current: Value, ctx: &GenerationContext) -> Option<Value> {
        self.values.set_current(current);
        if self.expression.is_empty() {
            return None;
        }
        let source = substitute(&self.expression, &self.values);
        match self.sandbox.evaluate(&source) {
            Ok(value) => {
                ctx.diagnostics()
                    .debug(format!("expression '{source}' gave {value}"));
                Some(value)
            }
            Err(err) => {
                ctx.diagnostics()
                    .warn(format!("expression '{source}' failed: {err}"));
                None
            }
        }
    }

    /// Store the value that is finally emitted for this index.
    pub fn settle(&mut self, value: Value) {
        self.values.set_after_expression(value);
    }

    /// Truthy stop expression, or past the last selection when there is none.
    /// A failing stop expression does not stop.
    pub fn should_stop(&self, index: u64, ctx: &GenerationContext) -> bool {
        if self.stop_expression.is_empty() {
            return index >= ctx.selection_count() as u64;
        }
        let source = substitute(&self.stop_expression, &self.values);
        match self.sandbox.evaluate(&source) {
            Ok(value) => value.truthy(),
            Err(err) => {
                ctx.diagnostics()
                    .warn(format!("stop expression '{source}' failed: {err}"));
                false
            }
        }
    }
}

fn selection_slot(index: u64) -> usize {
    usize::try_from(index).unwrap_or(usize::MAX)
}

/// Format modifier, else the settings default, ignoring empty specs.
pub(crate) fn pick_format(modifier: Option<&str>, default: &str) -> Option<String> {
    modifier
        .filter(|f| !f.is_empty())
        .or_else(|| Some(default).filter(|f| !f.is_empty()))
        .map(str::to_string)
}

/// Text for a value of unknown type: numbers through the number format,
/// everything else through the string format.
pub(crate) fn render_value(
    value: &Value,
    number_format: Option<&str>,
    string_format: Option<&str>,
) -> String {
    match value {
        Value::Number(n) => match number_format {
            Some(spec) => format_number(*n, spec),
            None => format_js_number(*n),
        },
        other => {
            let text = other.to_output();
            match string_format {
                Some(spec) => pad_string(&text, spec),
                None => text,
            }
        }
    }
}

/// Emission for a kind that cannot produce anything.
#[derive(Debug, Default)]
pub struct InvalidGenerator;

impl SequenceGenerator for InvalidGenerator {
    fn generate(&mut self, _index: u64, _ctx: &GenerationContext) -> Emission {
        Emission::stopped()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    fn ctx(selections: usize) -> GenerationContext {
        GenerationContext::new(vec![String::new(); selections], Settings::default())
    }

    #[test]
    fn default_stop_is_past_the_selections() {
        let ctx = ctx(2);
        let hooks = ExpressionHooks::new(&Modifiers::from_settings(ctx.settings()), Value::Undefined, &ctx);
        assert!(!hooks.should_stop(1, &ctx));
        assert!(hooks.should_stop(2, &ctx));
    }

    #[test]
    fn stop_expression_sees_the_index() {
        let ctx = ctx(1);
        let modifiers = Modifiers {
            stop_expression: "i > 2".into(),
            ..Modifiers::from_settings(ctx.settings())
        };
        let mut hooks = ExpressionHooks::new(&modifiers, Value::Undefined, &ctx);
        hooks.begin(2, &ctx);
        assert!(!hooks.should_stop(2, &ctx));
        hooks.begin(3, &ctx);
        assert!(hooks.should_stop(3, &ctx));
    }

    #[test]
    fn failing_expression_keeps_the_value_and_warns() {
        let ctx = ctx(1);
        let modifiers = Modifiers {
            expression: "nope()".into(),
            ..Modifiers::from_settings(ctx.settings())
        };
        let mut hooks = ExpressionHooks::new(&modifiers, Value::Undefined, &ctx);
        hooks.begin(0, &ctx);
        assert_eq!(hooks.evaluate(Value::Number(1.0), &ctx), None);
        assert_eq!(ctx.diagnostics().warnings().len(), 1);
    }

    #[test]
    fn expression_uses_the_current_value() {
        let ctx = ctx(1);
        let modifiers = Modifiers {
            expression: "_ * 10".into(),
            ..Modifiers::from_settings(ctx.settings())
        };
        let mut hooks = ExpressionHooks::new(&modifiers, Value::Undefined, &ctx);
        hooks.begin(0, &ctx);
        assert_eq!(
            hooks.evaluate(Value::Number(4.0), &ctx),
            Some(Value::Number(40.0))
        );
    }

    #[test]
    fn format_choice() {
        assert_eq!(pick_format(Some("05d"), "x"), Some("05d".to_string()));
        assert_eq!(pick_format(None, "x"), Some("x".to_string()));
        assert_eq!(pick_format(Some(""), ""), None);
    }
}

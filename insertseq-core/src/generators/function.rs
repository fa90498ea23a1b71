//! Sequences from user functions (`myfunctions`)
//!
//! The selected function is compiled once and called for every index as
//! `f(index, startAt, step, frequency, repetition, startover)`. Unbounded
//! repetition and startover are passed as `Infinity`. Index folding is left to
//! the function.

use super::{pick_format, render_value, Emission, ExpressionHooks, SequenceGenerator};
use crate::context::GenerationContext;
use crate::grammar::FunctionStart;
use crate::modifiers::Modifiers;
use crate::sandbox::{Callable, Value};

#[derive(Debug)]
pub struct FunctionGenerator {
    callable: Option<Callable>,
    start_at: Value,
    step: f64,
    frequency: u64,
    repetition: Option<u64>,
    startover: Option<u64>,
    number_format: Option<String>,
    string_format: Option<String>,
    hooks: ExpressionHooks,
}

impl FunctionGenerator {
    pub fn new(start: &FunctionStart, modifiers: &Modifiers, ctx: &GenerationContext) -> Self {
        let settings = ctx.settings();
        let number = start.number.unwrap_or(settings.default_function_nr);
        let start_at = match start.start_at {
            Some(n) => Value::Number(n),
            None => {
                let text = Value::Str(settings.start.clone());
                text.numeric().map_or(text, Value::Number)
            }
        };

        let callable = match number
            .checked_sub(1)
            .and_then(|slot| settings.myfunctions.get(slot))
        {
            Some(source) => match ctx.sandbox().compile_function(source.code()) {
                Ok(callable) => Some(callable),
                Err(err) => {
                    ctx.diagnostics()
                        .warn(format!("function {number} does not compile: {err}"));
                    None
                }
            },
            None => {
                ctx.diagnostics()
                    .warn(format!("no function number {number} is configured"));
                None
            }
        };

        let format = modifiers.format.as_deref();
        Self {
            hooks: ExpressionHooks::new(modifiers, start_at.clone(), ctx),
            callable,
            start_at,
            step: modifiers.step,
            frequency: modifiers.frequency,
            repetition: modifiers.repetition,
            startover: modifiers.startover,
            number_format: pick_format(format, &settings.number_format),
            string_format: pick_format(format, &settings.string_format),
        }
    }

    fn arguments(&self, index: u64) -> [Value; 6] {
        let bound = |n: Option<u64>| Value::Number(n.map_or(f64::INFINITY, |n| n as f64));
        [
            Value::Number(index as f64),
            self.start_at.clone(),
            Value::Number(self.step),
            Value::Number(self.frequency as f64),
            bound(self.repetition),
            bound(self.startover),
        ]
    }
}

impl SequenceGenerator for FunctionGenerator {
    fn generate(&mut self, index: u64, ctx: &GenerationContext) -> Emission {
        let Some(callable) = &self.callable else {
            return Emission::stopped();
        };
        self.hooks.begin(index, ctx);
        let computed = match callable.call(self.hooks.sandbox(), &self.arguments(index)) {
            Ok(value) => value,
            Err(err) => {
                ctx.diagnostics()
                    .warn(format!("function call for index {index} failed: {err}"));
                Value::Undefined
            }
        };
        let value = match self.hooks.evaluate(computed.clone(), ctx) {
            Some(result) if !result.is_undefined() => result,
            _ => computed,
        };
        self.hooks.settle(value.clone());
        let text = render_value(
            &value,
            self.number_format.as_deref(),
            self.string_format.as_deref(),
        );
        Emission::new(text, self.hooks.should_stop(index, ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{classify, StartToken};
    use crate::settings::{FunctionSource, Settings};

    fn settings() -> Settings {
        Settings {
            myfunctions: vec![
                FunctionSource::Raw("(i, start, step) => start + i * step".into()),
                FunctionSource::Wrapped {
                    code: "function (i) { return i % 2 === 0 ? 'even' : 'odd' }".into(),
                },
                FunctionSource::Raw("(i, c, s, f, r, o) => r".into()),
                FunctionSource::Raw("this is not code".into()),
            ],
            ..Settings::default()
        }
    }

    fn run_with(input: &str, settings: Settings, count: u64) -> Vec<Emission> {
        let ctx = GenerationContext::new(vec![String::new(); count as usize], settings);
        let classified = classify(input, ctx.segments(), &ctx.settings().start);
        let StartToken::Function(start) = classified.start else {
            panic!("expected a function start for {input}");
        };
        let modifiers = crate::modifiers::extract(&classified.remainder, &ctx);
        let mut generator = FunctionGenerator::new(&start, &modifiers, &ctx);
        (0..count).map(|i| generator.generate(i, &ctx)).collect()
    }

    fn texts(input: &str, count: u64) -> Vec<String> {
        run_with(input, settings(), count)
            .into_iter()
            .map(|e| e.text)
            .collect()
    }

    #[test]
    fn default_function_and_start() {
        assert_eq!(texts("=", 3), vec!["1", "2", "3"]);
    }

    #[test]
    fn explicit_start_and_step() {
        assert_eq!(texts("=1,10 steps:5", 3), vec!["10", "15", "20"]);
    }

    #[test]
    fn string_results() {
        assert_eq!(texts("=2", 3), vec!["even", "odd", "even"]);
        assert_eq!(texts("=2 ~*>5", 1), vec!["*even"]);
    }

    #[test]
    fn number_format_applies_to_numbers() {
        assert_eq!(texts("=1 ~03d", 2), vec!["001", "002"]);
    }

    #[test]
    fn unbounded_arguments_are_infinity() {
        assert_eq!(texts("=3", 1), vec!["Infinity"]);
        assert_eq!(texts("=3 #4", 1), vec!["4"]);
    }

    #[test]
    fn broken_or_missing_functions_stop() {
        assert_eq!(run_with("=4", settings(), 1)[0], Emission::stopped());
        assert_eq!(run_with("=9", settings(), 1)[0], Emission::stopped());
    }

    #[test]
    fn default_function_number_setting() {
        let settings = Settings {
            default_function_nr: 2,
            ..settings()
        };
        let texts: Vec<String> = run_with("function:", settings, 1)
            .into_iter()
            .map(|e| e.text)
            .collect();
        assert_eq!(texts, vec!["even"]);
    }
}

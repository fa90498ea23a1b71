//! Pass-through and bare-expression sequences

use super::{pick_format, render_value, Emission, ExpressionHooks, SequenceGenerator};
use crate::context::GenerationContext;
use crate::format::pad_string;
use crate::modifiers::Modifiers;
use crate::sandbox::Value;
use crate::substitute::substitute;

/// Emits the selected text itself.
#[derive(Debug)]
pub struct TextSelectedGenerator {
    format: Option<String>,
    hooks: ExpressionHooks,
}

impl TextSelectedGenerator {
    pub fn new(modifiers: &Modifiers, ctx: &GenerationContext) -> Self {
        Self {
            hooks: ExpressionHooks::new(modifiers, Value::Str(ctx.selection(0).to_string()), ctx),
            format: pick_format(modifiers.format.as_deref(), &ctx.settings().string_format),
        }
    }
}

impl SequenceGenerator for TextSelectedGenerator {
    fn generate(&mut self, index: u64, ctx: &GenerationContext) -> Emission {
        self.hooks.begin(index, ctx);
        let original = self.hooks.values().original_text.clone();
        let value = match self.hooks.evaluate(Value::Str(original.clone()), ctx) {
            Some(result) if !result.is_undefined() => result.to_output(),
            _ => original,
        };
        self.hooks.settle(Value::Str(value.clone()));
        let text = match &self.format {
            Some(spec) => pad_string(&value, spec),
            None => value,
        };
        Emission::new(text, self.hooks.should_stop(index, ctx))
    }
}

/// Evaluates the start expression for every index.
///
/// An empty or undefined result falls back to the original text, and to the
/// 1-based position when the selection is empty as well.
#[derive(Debug)]
pub struct ExpressionGenerator {
    source: String,
    number_format: Option<String>,
    string_format: Option<String>,
    hooks: ExpressionHooks,
}

impl ExpressionGenerator {
    pub fn new(source: String, modifiers: &Modifiers, ctx: &GenerationContext) -> Self {
        let settings = ctx.settings();
        let start = Value::Str(settings.start.clone());
        let start = start.numeric().map_or(start, Value::Number);
        let format = modifiers.format.as_deref();
        Self {
            hooks: ExpressionHooks::new(modifiers, start, ctx),
            source,
            number_format: pick_format(format, &settings.number_format),
            string_format: pick_format(format, &settings.string_format),
        }
    }

    fn compute(&mut self, index: u64, ctx: &GenerationContext) -> Value {
        let original = self.hooks.values().original_text.clone();
        self.hooks.set_current(Value::Str(original.clone()));
        let source = substitute(&self.source, self.hooks.values());
        let result = match self.hooks.sandbox().evaluate(&source) {
            Ok(value) => value,
            Err(err) => {
                ctx.diagnostics()
                    .warn(format!("expression '{source}' failed: {err}"));
                Value::Undefined
            }
        };
        if !result.is_undefined() && !result.is_empty() {
            result
        } else if !original.is_empty() {
            Value::Str(original)
        } else {
            Value::Number(index as f64 + 1.0)
        }
    }
}

impl SequenceGenerator for ExpressionGenerator {
    fn generate(&mut self, index: u64, ctx: &GenerationContext) -> Emission {
        self.hooks.begin(index, ctx);
        let computed = self.compute(index, ctx);
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
    use crate::modifiers::extract;
    use crate::settings::Settings;

    fn selections(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|s| s.to_string()).collect()
    }

    fn run(input: &str, texts: &[&str]) -> Vec<Emission> {
        let ctx = GenerationContext::new(selections(texts), Settings::default());
        let classified = classify(input, ctx.segments(), &ctx.settings().start);
        let modifiers = extract(&classified.remainder, &ctx);
        let mut generator: Box<dyn SequenceGenerator> = match classified.start {
            StartToken::Expression(source) => {
                Box::new(ExpressionGenerator::new(source, &modifiers, &ctx))
            }
            StartToken::TextSelected => Box::new(TextSelectedGenerator::new(&modifiers, &ctx)),
            other => panic!("unexpected start {other:?}"),
        };
        (0..=texts.len() as u64)
            .map(|i| generator.generate(i, &ctx))
            .collect()
    }

    fn texts(input: &str, selections: &[&str]) -> Vec<String> {
        run(input, selections)
            .into_iter()
            .take_while(|e| !e.stop)
            .map(|e| e.text)
            .collect()
    }

    #[test]
    fn selected_text_passes_through() {
        assert_eq!(texts("!", &["one", "two"]), vec!["one", "two"]);
    }

    #[test]
    fn selected_text_with_format_and_expression() {
        assert_eq!(texts("! ~_>4", &["ab", "c"]), vec!["__ab", "___c"]);
        assert_eq!(texts("! ::'o + i'", &["x", "y"]), vec!["x0", "y1"]);
    }

    #[test]
    fn stops_after_the_last_selection() {
        let emissions = run("!", &["a"]);
        assert!(!emissions[0].stop);
        assert!(emissions[1].stop);
    }

    #[test]
    fn expression_sees_the_placeholders() {
        assert_eq!(texts("|(i*2)", &["", "", ""]), vec!["0", "2", "4"]);
        assert_eq!(texts("|i*2", &["", "", ""]), vec!["0", "2", "4"]);
        assert_eq!(texts("|'o * 3'", &["2", "5"]), vec!["6", "15"]);
    }

    #[test]
    fn empty_result_falls_back_to_the_original_then_the_position() {
        assert_eq!(texts("|'\"\"'", &["keep", ""]), vec!["keep", "2"]);
        assert_eq!(texts("|missing", &["", ""]), vec!["1", "2"]);
    }

    #[test]
    fn expression_results_are_formatted_by_type() {
        assert_eq!(texts("|i+1 ~03d", &["", ""]), vec!["001", "002"]);
        assert_eq!(texts("|'\"ab\"' ~.<4", &[""]), vec!["ab.."]);
    }
}

//! Inline list sequences (`[a, b, c]`)

use super::{pick_format, Emission, ExpressionHooks, SequenceGenerator};
use crate::context::GenerationContext;
use crate::folding::Folding;
use crate::format::pad_string;
use crate::grammar::OwnListStart;
use crate::modifiers::Modifiers;
use crate::sandbox::Value;

/// Item of `items` at `offset + logical`, wrapping in both directions.
pub(crate) fn cycle<'a>(items: &'a [String], offset: i64, logical: f64) -> Option<&'a str> {
    if items.is_empty() {
        return None;
    }
    let len = items.len() as i64;
    let position = (offset + logical.round() as i64).rem_euclid(len);
    items.get(position as usize).map(String::as_str)
}

#[derive(Debug)]
pub struct OwnListGenerator {
    items: Vec<String>,
    offset: i64,
    folding: Folding,
    format: Option<String>,
    hooks: ExpressionHooks,
}

impl OwnListGenerator {
    pub fn new(start: OwnListStart, modifiers: &Modifiers, ctx: &GenerationContext) -> Self {
        let offset = start.start.saturating_sub(1) as i64;
        let first = cycle(&start.items, offset, 0.0).unwrap_or_default();
        Self {
            hooks: ExpressionHooks::new(modifiers, Value::Str(first.to_string()), ctx),
            items: start.items,
            offset,
            folding: modifiers.folding(),
            format: pick_format(modifiers.format.as_deref(), &ctx.settings().string_format),
        }
    }
}

impl SequenceGenerator for OwnListGenerator {
    fn generate(&mut self, index: u64, ctx: &GenerationContext) -> Emission {
        let Some(item) = cycle(&self.items, self.offset, self.folding.logical_index(index)) else {
            return Emission::stopped();
        };
        let item = item.to_string();
        self.hooks.begin(index, ctx);
        let value = match self.hooks.evaluate(Value::Str(item.clone()), ctx) {
            Some(result) if !result.is_undefined() => result.to_output(),
            _ => item,
        };
        self.hooks.settle(Value::Str(value.clone()));
        let text = match &self.format {
            Some(spec) => pad_string(&value, spec),
            None => value,
        };
        Emission::new(text, self.hooks.should_stop(index, ctx))
    }
}

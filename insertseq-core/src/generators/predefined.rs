//! Sequences from the configured lists (`mysequences`)
//!
//! A list is chosen by number or by searching every list for the start text.
//! Search options: `i` ignores case, `f` needs the whole item to match, `s`
//! matches the start of an item; otherwise any substring matches. The first
//! list with a match wins and the matching item is where the sequence starts.

use super::own_list::cycle;
use super::{pick_format, Emission, ExpressionHooks, SequenceGenerator};
use crate::context::GenerationContext;
use crate::folding::Folding;
use crate::format::pad_string;
use crate::grammar::ListSelector;
use crate::modifiers::Modifiers;
use crate::sandbox::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchOptions {
    pub ignore_case: bool,
    pub full_match: bool,
    pub prefix_match: bool,
}

impl SearchOptions {
    pub fn from_modifiers(modifiers: &Modifiers) -> Self {
        Self {
            ignore_case: modifiers.has_option('i'),
            full_match: modifiers.has_option('f'),
            prefix_match: modifiers.has_option('s'),
        }
    }

    pub fn matches(&self, item: &str, needle: &str) -> bool {
        let (item, needle) = if self.ignore_case {
            (item.to_lowercase(), needle.to_lowercase())
        } else {
            (item.to_string(), needle.to_string())
        };
        if self.full_match {
            item == needle
        } else if self.prefix_match {
            item.starts_with(&needle)
        } else {
            item.contains(&needle)
        }
    }
}

/// The chosen list and the position to start from.
pub fn select_list(
    lists: &[Vec<String>],
    selector: &ListSelector,
    options: SearchOptions,
) -> Option<(Vec<String>, usize)> {
    match selector {
        ListSelector::Number(n) => {
            let list = lists.get(n.checked_sub(1)?)?;
            Some((list.clone(), 0))
        }
        ListSelector::Search(needle) => lists.iter().find_map(|list| {
            list.iter()
                .position(|item| options.matches(item, needle))
                .map(|position| (list.clone(), position))
        }),
    }
}

#[derive(Debug)]
pub struct PredefinedGenerator {
    items: Vec<String>,
    offset: i64,
    folding: Folding,
    format: Option<String>,
    hooks: ExpressionHooks,
}

impl PredefinedGenerator {
    pub fn new(selector: &ListSelector, modifiers: &Modifiers, ctx: &GenerationContext) -> Self {
        let options = SearchOptions::from_modifiers(modifiers);
        let (items, offset) = match select_list(&ctx.settings().mysequences, selector, options) {
            Some((items, offset)) => (items, offset as i64),
            None => {
                ctx.diagnostics()
                    .warn(format!("no configured list matches {selector:?}"));
                (Vec::new(), 0)
            }
        };
        let first = cycle(&items, offset, 0.0).unwrap_or_default().to_string();
        Self {
            hooks: ExpressionHooks::new(modifiers, Value::Str(first), ctx),
            items,
            offset,
            folding: modifiers.folding(),
            format: pick_format(modifiers.format.as_deref(), &ctx.settings().string_format),
        }
    }
}

impl SequenceGenerator for PredefinedGenerator {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{classify, StartToken};
    use crate::modifiers::extract;
    use crate::settings::Settings;

    fn lists() -> Vec<Vec<String>> {
        vec![
            vec!["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"],
            vec!["January", "February", "March", "April"],
        ]
        .into_iter()
        .map(|list| list.into_iter().map(String::from).collect())
        .collect()
    }

    fn run(input: &str, count: u64) -> Vec<String> {
        let settings = Settings {
            mysequences: lists(),
            ..Settings::default()
        };
        let ctx = GenerationContext::new(vec![String::new(); count as usize], settings);
        let classified = classify(input, ctx.segments(), &ctx.settings().start);
        let StartToken::Predefined(start) = classified.start else {
            panic!("expected a predefined list for {input}");
        };
        let modifiers = extract(&classified.remainder, &ctx);
        let mut generator = PredefinedGenerator::new(&start.selector, &modifiers, &ctx);
        (0..count)
            .map(|i| generator.generate(i, &ctx))
            .take_while(|e| !e.stop)
            .map(|e| e.text)
            .collect()
    }

    #[test]
    fn by_number() {
        assert_eq!(run(";2", 2), vec!["January", "February"]);
    }

    #[test]
    fn search_starts_at_the_match() {
        assert_eq!(run(";Sat", 3), vec!["Sat", "Sun", "Mon"]);
    }

    #[test]
    fn substring_search_is_the_default() {
        assert_eq!(run(";ebr", 1), vec!["February"]);
    }

    #[test]
    fn ignore_case_matches_any_case() {
        assert_eq!(run(";fri ?i", 2), vec!["Fri", "Sat"]);
        assert!(run(";fri", 2).is_empty());
    }

    #[test]
    fn full_match_needs_equality() {
        assert!(run(";Jan ?f", 1).is_empty());
        assert_eq!(run(";January ?f", 1), vec!["January"]);
    }

    #[test]
    fn prefix_match() {
        assert_eq!(run(";Ma ?s", 1), vec!["March"]);
        assert!(run(";arch ?s", 1).is_empty());
    }

    #[test]
    fn unknown_number_stops() {
        assert!(run(";9", 2).is_empty());
    }
}

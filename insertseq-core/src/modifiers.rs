//! Modifier extraction
//!
//! Everything after the start token is a run of modifiers: a key from the
//! `modifier` segment followed by a value that runs to the next boundary. The
//! first character of a value never ends it, so `~#<5` keeps its `#`. Values
//! containing boundary characters can be quoted; one layer of quotes is
//! removed. Text outside any key may hold a bare signed number, which is the
//! step.
//!
//! Every modifier falls back to its settings default when it is absent or its
//! value does not parse; the latter is recorded as a debug diagnostic.

use crate::context::GenerationContext;
use crate::folding::Folding;
use crate::grammar::mask_literals;
use crate::settings::{DateUnit, Settings};

#[derive(Debug, Clone, PartialEq)]
pub struct Modifiers {
    pub step: f64,
    /// Calendar unit given with the step (`steps:2w`)
    pub date_unit: Option<DateUnit>,
    pub frequency: u64,
    pub repetition: Option<u64>,
    pub startover: Option<u64>,
    pub format: Option<String>,
    pub expression: String,
    pub stop_expression: String,
    pub options: String,
}

impl Modifiers {
    /// Settings defaults, no expressions.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            step: settings.step,
            date_unit: None,
            frequency: settings.frequency.max(1),
            repetition: settings.repetition.filter(|r| *r > 0),
            startover: settings.startover.filter(|s| *s > 0),
            format: None,
            expression: String::new(),
            stop_expression: String::new(),
            options: String::new(),
        }
    }

    pub fn folding(&self) -> Folding {
        Folding {
            step: self.step,
            frequency: self.frequency,
            repetition: self.repetition,
            startover: self.startover,
        }
    }

    /// Whether option letter `flag` was given (case-insensitive).
    pub fn has_option(&self, flag: char) -> bool {
        self.options
            .chars()
            .any(|c| c.eq_ignore_ascii_case(&flag))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key {
    Step,
    Format,
    Frequency,
    Startover,
    Repetition,
    Expression,
    Stop,
    Options,
}

const KEY_GROUPS: &[(&str, Key)] = &[
    ("step", Key::Step),
    ("format", Key::Format),
    ("frequency", Key::Frequency),
    ("startover", Key::Startover),
    ("repetition", Key::Repetition),
    ("expression", Key::Expression),
    ("stop", Key::Stop),
    ("options", Key::Options),
];

/// Pull modifiers out of the text following the start token.
pub fn extract(remainder: &str, ctx: &GenerationContext) -> Modifiers {
    let segments = ctx.segments();
    let diagnostics = ctx.diagnostics();
    let mut modifiers = Modifiers::from_settings(ctx.settings());

    let masked = mask_literals(remainder);
    let key_regex = segments.regex("modifier");
    let mut seen: Vec<Key> = Vec::new();
    let mut bare = String::new();
    let mut pos = 0;

    while pos < masked.len() {
        let Some(caps) = key_regex.captures_at(&masked, pos) else {
            bare.push_str(&remainder[pos..]);
            break;
        };
        let Some(whole) = caps.get(0) else {
            break;
        };
        bare.push_str(&remainder[pos..whole.start()]);
        bare.push(' ');

        let value_from = whole.end();
        let value_to = match remainder[value_from..].chars().next() {
            Some(first) if !first.is_whitespace() => {
                segments.boundary_after(&masked, value_from + first.len_utf8())
            }
            _ => value_from,
        };
        let value = unquote(remainder[value_from..value_to].trim());
        pos = value_to.max(whole.end()).max(pos + 1);

        let Some(key) = KEY_GROUPS
            .iter()
            .find(|(group, _)| caps.name(group).is_some())
            .map(|(_, key)| *key)
        else {
            continue;
        };
        if seen.contains(&key) {
            diagnostics.debug(format!("repeated modifier '{}' ignored", whole.as_str()));
            continue;
        }
        seen.push(key);
        apply(&mut modifiers, key, value, ctx);
    }

    if !seen.contains(&Key::Step) {
        if let Some(token) = bare.split_whitespace().next() {
            apply(&mut modifiers, Key::Step, token, ctx);
        }
    }

    diagnostics.debug(format!("modifiers: {modifiers:?}"));
    modifiers
}

fn apply(modifiers: &mut Modifiers, key: Key, value: &str, ctx: &GenerationContext) {
    let segments = ctx.segments();
    let diagnostics = ctx.diagnostics();
    match key {
        Key::Step => match segments.regex("step_value").captures(value) {
            Some(caps) => {
                if let Some(step) = caps.name("amount").and_then(|m| m.as_str().parse().ok()) {
                    modifiers.step = step;
                }
                modifiers.date_unit = caps.name("unit").and_then(|m| DateUnit::from_suffix(m.as_str()));
            }
            None => diagnostics.debug(format!("step '{value}' is not a number, using default")),
        },
        Key::Frequency => match parse_count(value, ctx) {
            Some(n) => modifiers.frequency = n,
            None => diagnostics.debug(format!("frequency '{value}' ignored")),
        },
        Key::Repetition => match parse_count(value, ctx) {
            Some(n) => modifiers.repetition = Some(n),
            None => diagnostics.debug(format!("repetition '{value}' ignored")),
        },
        Key::Startover => match parse_count(value, ctx) {
            Some(n) => modifiers.startover = Some(n),
            None => diagnostics.debug(format!("startover '{value}' ignored")),
        },
        Key::Format => {
            if !value.is_empty() {
                modifiers.format = Some(value.to_string());
            }
        }
        Key::Expression => modifiers.expression = value.to_string(),
        Key::Stop => modifiers.stop_expression = value.to_string(),
        Key::Options => modifiers.options = value.to_string(),
    }
}

/// A positive integer count.
fn parse_count(value: &str, ctx: &GenerationContext) -> Option<u64> {
    if !ctx.segments().regex("count_value").is_match(value) {
        return None;
    }
    value.parse::<u64>().ok().filter(|n| *n > 0)
}

/// Remove one layer of enclosing quotes.
fn unquote(value: &str) -> &str {
    for quote in ['"', '\'', '`'] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(remainder: &str) -> Modifiers {
        let ctx = GenerationContext::new(Vec::new(), Settings::default());
        extract(remainder, &ctx)
    }

    #[test]
    fn defaults_come_from_settings() {
        let settings = Settings {
            step: 3.0,
            frequency: 2,
            ..Settings::default()
        };
        let ctx = GenerationContext::new(Vec::new(), settings);
        let modifiers = extract("", &ctx);
        assert_eq!(modifiers.step, 3.0);
        assert_eq!(modifiers.frequency, 2);
        assert_eq!(modifiers.repetition, None);
    }

    #[test]
    fn keys_and_symbols() {
        let modifiers = run(" steps:2 *3 #4 ##8 ~05d ?if");
        assert_eq!(modifiers.step, 2.0);
        assert_eq!(modifiers.frequency, 3);
        assert_eq!(modifiers.repetition, Some(4));
        assert_eq!(modifiers.startover, Some(8));
        assert_eq!(modifiers.format.as_deref(), Some("05d"));
        assert!(modifiers.has_option('I'));
        assert!(modifiers.has_option('f'));
    }

    #[test]
    fn modifiers_attach_without_whitespace() {
        let modifiers = run("steps:2*3#4");
        assert_eq!(modifiers.step, 2.0);
        assert_eq!(modifiers.frequency, 3);
        assert_eq!(modifiers.repetition, Some(4));
    }

    #[test]
    fn bare_number_is_the_step() {
        assert_eq!(run(" -2 #3").step, -2.0);
        assert_eq!(run(" 2.5").step, 2.5);
    }

    #[test]
    fn first_occurrence_wins() {
        assert_eq!(run(" *2 *5").frequency, 2);
    }

    #[test]
    fn quoted_values_keep_boundaries() {
        let modifiers = run(r#" ::"i * 2" @(i > 5) ~'#<5'"#);
        assert_eq!(modifiers.expression, "i * 2");
        assert_eq!(modifiers.stop_expression, "(i > 5)");
        assert_eq!(modifiers.format.as_deref(), Some("#<5"));
    }

    #[test]
    fn format_may_start_with_a_key_character() {
        assert_eq!(run("~#<5").format.as_deref(), Some("#<5"));
    }

    #[test]
    fn date_unit_suffix() {
        let modifiers = run(" steps:2w");
        assert_eq!(modifiers.step, 2.0);
        assert_eq!(modifiers.date_unit, Some(DateUnit::Week));
    }

    #[test]
    fn invalid_values_fall_back() {
        let modifiers = run(" *0 #x steps:abc");
        assert_eq!(modifiers.frequency, 1);
        assert_eq!(modifiers.repetition, None);
        assert_eq!(modifiers.step, 1.0);
    }
}

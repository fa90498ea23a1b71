//! Placeholder substitution in expression source
//!
//! The letters `_ o c p a s n i` standing alone (whole word, either case) are
//! replaced by literals for the current [`ReplacementValues`] before a snippet
//! is evaluated. Text inside string literals and property names after `.` are
//! left alone.

use crate::sandbox::{format_js_number, Value};
use crate::values::{Placeholder, ReplacementValues};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b[_ocpasni]\b").unwrap());

/// Replace every placeholder in `source` with a literal of its value.
pub fn substitute(source: &str, values: &ReplacementValues) -> String {
    let mut out = String::with_capacity(source.len());
    for (chunk, is_literal) in split_string_literals(source) {
        if is_literal {
            out.push_str(chunk);
            continue;
        }
        let replaced = PLACEHOLDER.replace_all(chunk, |caps: &Captures<'_>| {
            let found = &caps[0];
            let (before, after) = match caps.get(0) {
                Some(m) => (&chunk[..m.start()], &chunk[m.end()..]),
                None => ("", ""),
            };
            if before.ends_with('.') {
                return found.to_string();
            }
            let Some(placeholder) = found.chars().next().and_then(Placeholder::from_char) else {
                return found.to_string();
            };
            literal(&values.lookup(placeholder), after.starts_with('.'))
        });
        out.push_str(&replaced);
    }
    out
}

/// Source text of a value: bare numbers, quoted strings for everything else.
fn literal(value: &Value, member_follows: bool) -> String {
    let number = match value {
        Value::Number(n) => Some(*n),
        other => other.numeric(),
    };
    match number {
        Some(n) if n.is_nan() => "NaN".to_string(),
        Some(n) => {
            let text = format_js_number(n);
            if n < 0.0 || member_follows {
                format!("({text})")
            } else {
                text
            }
        }
        None => quote(&value.to_output()),
    }
}

fn quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for c in text.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}

/// Split source into (text, is_string_literal) chunks.
fn split_string_literals(source: &str) -> Vec<(&str, bool)> {
    let mut chunks = Vec::new();
    let mut chunk_start = 0;
    let mut open: Option<(char, usize)> = None;
    let mut escaped = false;

    for (at, c) in source.char_indices() {
        match open {
            Some((quote, start)) => {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == quote {
                    chunks.push((&source[start..at + c.len_utf8()], true));
                    chunk_start = at + c.len_utf8();
                    open = None;
                }
            }
            None if matches!(c, '"' | '\'' | '`') => {
                if chunk_start < at {
                    chunks.push((&source[chunk_start..at], false));
                }
                open = Some((c, at));
            }
            None => {}
        }
    }

    match open {
        Some((_, start)) => chunks.push((&source[start..], true)),
        None if chunk_start < source.len() => chunks.push((&source[chunk_start..], false)),
        None => {}
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values() -> ReplacementValues {
        let mut values = ReplacementValues::new(Value::Number(1.0), Value::Number(2.0), 4);
        values.advance(3, "he said \"hi\"");
        values.set_current(Value::Number(-7.0));
        values
    }

    #[test]
    fn numbers_are_bare_and_negatives_parenthesised() {
        assert_eq!(substitute("i * s + _", &values()), "3 * 2 + (-7)");
        assert_eq!(substitute("N - C", &values()), "4 - 1");
    }

    #[test]
    fn text_is_quoted_and_escaped() {
        assert_eq!(substitute("o", &values()), r#""he said \"hi\"""#);
    }

    #[test]
    fn numeric_text_is_bare() {
        let mut values = values();
        values.advance(0, "42");
        assert_eq!(substitute("o + 1", &values), "42 + 1");
    }

    #[test]
    fn undefined_is_an_empty_string() {
        assert_eq!(substitute("p", &values()), r#""""#);
    }

    #[test]
    fn string_literals_and_words_are_untouched() {
        assert_eq!(
            substitute("'i' + \"s\" + index + i", &values()),
            "'i' + \"s\" + index + 3"
        );
    }

    #[test]
    fn member_access_is_safe() {
        assert_eq!(substitute("i.toFixed(1)", &values()), "(3).toFixed(1)");
        assert_eq!(substitute("Math.E + x.a", &values()), "Math.E + x.a");
    }
}

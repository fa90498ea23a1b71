//! Segment Definitions and Compiler
//!
//! Segments are named regex fragments. A fragment may reference another with
//! `{{name}}`; references are resolved depth-first with memoisation, so every
//! segment is built only after the segments it depends on. A reference that
//! cannot be resolved (unknown name, or a cycle back to a segment still being
//! built) becomes [`SENTINEL`], a class that matches nothing. A broken grammar
//! therefore degrades to "never matches" instead of failing the invocation.
//!
//! Whitespace inside fragments is insignificant and stripped after resolution;
//! fragments use `\s` where real whitespace must match.
//!
//! # Segment groups
//!
//! 1. Modifier keys - the tokens that introduce a modifier (`steps:`, `~`, `#`, ...)
//! 2. `boundary` - whitespace, the custom delimiter, or any modifier key;
//!    `expr_boundary` drops the modifier keys for expression bodies
//! 3. Kind prefixes - tried in order by the classifier (`%`, `[`, `;`, `|`, `=`)
//! 4. Kind bodies - anchored patterns with named captures for each start token
//! 5. Modifier values - validation patterns for modifier arguments

use crate::context::Diagnostics;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// A character class that can never match.
pub const SENTINEL: &str = r"[^\s\S]";

static SENTINEL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(SENTINEL).unwrap());

static REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").unwrap());

/// Name of the fragment replaced by the custom delimiter override.
pub const CUSTOM_DELIMITER: &str = "custom_delimiter";

/// Segment definitions as (name, pattern) pairs.
///
/// Order does not matter for resolution; the classifier keeps its own ordered
/// list of prefix rules.
pub(crate) const SEGMENT_DEFINITIONS: &[(&str, &str)] = &[
    // Shared fragments
    ("sign", r"[+-]"),
    ("number", r"{{sign}}? \d+ (?: \. \d+ )?"),
    // Modifier keys
    ("step_key", r"steps?:"),
    ("format_key", r"format: | ~"),
    ("frequency_key", r"freq(?:uency)?: | \*"),
    ("startover_key", r"start(?:again|over): | ##"),
    ("repetition_key", r"rep(?:eat|etition)?: | #"),
    ("expression_key", r"expr(?:ession)?: | ::"),
    ("stop_key", r"stop(?:expr(?:ession)?|if)?: | @"),
    ("options_key", r"opt(?:ion(?:s)?)?: | \?"),
    (
        "modifier_start",
        r"{{step_key}} | {{format_key}} | {{frequency_key}} | {{startover_key}}
          | {{repetition_key}} | {{expression_key}} | {{stop_key}} | {{options_key}}",
    ),
    // `##` is listed before `#` so the longer key wins
    (
        "modifier",
        r"(?P<step> {{step_key}} )
          | (?P<format> {{format_key}} )
          | (?P<frequency> {{frequency_key}} )
          | (?P<startover> {{startover_key}} )
          | (?P<repetition> {{repetition_key}} )
          | (?P<expression> {{expression_key}} )
          | (?P<stop> {{stop_key}} )
          | (?P<options> {{options_key}} )",
    ),
    (CUSTOM_DELIMITER, SENTINEL),
    ("boundary", r"\s | {{custom_delimiter}} | {{modifier_start}}"),
    // operators such as `*` and `?` belong to a bare expression body
    ("expr_boundary", r"\s | {{custom_delimiter}}"),
    // Kind prefixes
    ("date_prefix", r"^ (?: % | date: )"),
    ("own_prefix", r"^ (?: own(?:seq(?:uence)?)?: | \[ )"),
    ("predef_prefix", r"^ (?: ; | predef(?:ined)?(?:seq(?:uence)?)?: )"),
    ("expr_prefix", r"^ (?: \| | expr(?:ession)?: )"),
    ("func_prefix", r"^ (?: = | func(?:tion)?: )"),
    // Kind bodies
    (
        "decimal_body",
        r"^ (?P<sign> {{sign}} )?
            (?: (?P<radix> 0[xXoObB] ) (?P<radix_digits> [0-9a-fA-F]+ )
              | (?P<int> \d+ ) (?: \. (?P<frac> \d+ ) )? )
            (?: (?P<random> [rR] ) (?P<random_sign> {{sign}} )?
                (?P<magnitude> \d+ (?: \. (?P<random_frac> \d+ ) )? )? )?
          $",
    ),
    ("alpha_body", r"^ (?P<word> \p{L}+ ) $"),
    (
        "date_body",
        r"^ (?: (?P<year> \d{4} | \d{2} )
                (?: [-./] (?P<month> \d{1,2} )
                    (?: [-./] (?P<day> \d{1,2} ) )? )? )?
          $",
    ),
    (
        "own_body",
        r"^ (?: (?P<list> \[ .* \] ) (?P<start> \d+ )? | (?P<bare> [^\[\]]+ ) ) $",
    ),
    (
        "predef_body",
        r#"^ (?: (?P<number> \d+ ) | "(?P<dquoted> [^"]* )" | '(?P<squoted> [^']* )' | (?P<text> .+ ) ) $"#,
    ),
    (
        "func_body",
        r"^ (?P<number> \d+ )? (?: , (?P<start_at> {{number}} ) )? $",
    ),
    (
        "expr_body",
        r#"^ (?: "(?P<dquoted> .* )" | '(?P<squoted> .* )' | (?P<bare> .+ ) ) $"#,
    ),
    // Modifier values
    (
        "step_value",
        r"^ (?P<amount> {{number}} ) (?P<unit> [dwmyDWMY] )? $",
    ),
    ("count_value", r"^ \d+ $"),
    ("bare_step", r"^ {{number}} $"),
];

/// Compiled, immutable segment table.
#[derive(Debug, Clone)]
pub struct SegmentTable {
    patterns: HashMap<&'static str, String>,
    regexes: HashMap<&'static str, Regex>,
}

impl SegmentTable {
    /// Compile the standard segments, optionally overriding the custom
    /// delimiter fragment with an escaped literal.
    pub fn compile(custom_delimiter: Option<&str>, diagnostics: &Diagnostics) -> Self {
        let delimiter = custom_delimiter
            .filter(|d| !d.is_empty())
            .map(regex::escape);
        let definitions: Vec<(&'static str, String)> = SEGMENT_DEFINITIONS
            .iter()
            .map(|(name, pattern)| match (*name, &delimiter) {
                (CUSTOM_DELIMITER, Some(escaped)) => (*name, escaped.clone()),
                _ => (*name, pattern.to_string()),
            })
            .collect();

        let patterns = resolve_definitions(&definitions);
        let mut regexes = HashMap::with_capacity(patterns.len());
        for (name, pattern) in &patterns {
            let regex = match Regex::new(pattern) {
                Ok(regex) => regex,
                Err(err) => {
                    diagnostics.warn(format!("segment '{name}' does not compile: {err}"));
                    SENTINEL_REGEX.clone()
                }
            };
            regexes.insert(*name, regex);
        }

        Self { patterns, regexes }
    }

    /// Resolved pattern text for a segment.
    pub fn pattern(&self, name: &str) -> Option<&str> {
        self.patterns.get(name).map(String::as_str)
    }

    /// Compiled regex for a segment; unknown names get the sentinel.
    pub fn regex(&self, name: &str) -> &Regex {
        self.regexes.get(name).unwrap_or(&*SENTINEL_REGEX)
    }

    /// Byte offset of the first boundary at or after `from` in `masked`.
    pub fn boundary_after(&self, masked: &str, from: usize) -> usize {
        self.first_match_after("boundary", masked, from)
    }

    /// Like [`boundary_after`](Self::boundary_after), but only whitespace and
    /// the custom delimiter end the body.
    pub fn expression_boundary_after(&self, masked: &str, from: usize) -> usize {
        self.first_match_after("expr_boundary", masked, from)
    }

    fn first_match_after(&self, segment: &str, masked: &str, from: usize) -> usize {
        if from >= masked.len() {
            return masked.len();
        }
        self.regex(segment)
            .find_at(masked, from)
            .map(|m| m.start())
            .unwrap_or(masked.len())
    }
}

/// Resolve every `{{name}}` reference and strip whitespace.
pub(crate) fn resolve_definitions(
    definitions: &[(&'static str, String)],
) -> HashMap<&'static str, String> {
    let sources: HashMap<&str, &str> = definitions
        .iter()
        .map(|(name, pattern)| (*name, pattern.as_str()))
        .collect();
    let mut resolved: HashMap<String, String> = HashMap::new();
    let mut visiting: Vec<String> = Vec::new();

    definitions
        .iter()
        .map(|(name, _)| {
            let text = resolve(name, &sources, &mut resolved, &mut visiting)
                .unwrap_or_else(|| SENTINEL.to_string());
            (*name, strip_whitespace(&text))
        })
        .collect()
}

fn resolve(
    name: &str,
    sources: &HashMap<&str, &str>,
    resolved: &mut HashMap<String, String>,
    visiting: &mut Vec<String>,
) -> Option<String> {
    if let Some(done) = resolved.get(name) {
        return Some(done.clone());
    }
    if visiting.iter().any(|v| v == name) {
        return None;
    }
    let source = sources.get(name)?;

    visiting.push(name.to_string());
    let mut text = String::with_capacity(source.len());
    let mut last = 0;
    for caps in REFERENCE.captures_iter(source) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        text.push_str(&source[last..whole.start()]);
        let inner = resolve(&caps[1], sources, resolved, visiting)
            .unwrap_or_else(|| SENTINEL.to_string());
        text.push_str("(?:");
        text.push_str(&inner);
        text.push(')');
        last = whole.end();
    }
    text.push_str(&source[last..]);
    visiting.pop();

    resolved.insert(name.to_string(), text.clone());
    Some(text)
}

fn strip_whitespace(pattern: &str) -> String {
    pattern.chars().filter(|c| !c.is_whitespace()).collect()
}

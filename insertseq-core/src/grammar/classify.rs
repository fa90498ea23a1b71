//! Input classification
//!
//! Prefix rules are tried in declaration order against the masked input:
//!
//! 1. date - `%` or `date:`
//! 2. own list - `[` or `own:` / `ownseq:` / `ownsequence:`
//! 3. predefined list - `;` or `predef:` / `predefined:` / `predefseq:` ...
//! 4. expression - `|` or `expr:` / `expression:`
//! 5. function - `=` or `func:` / `function:`
//!
//! Without a prefix the start token (everything up to the first boundary) is
//! a decimal literal, a bare word (alpha), empty (decimal with the configured
//! start) or anything else (text selected). When a prefix matched but the body
//! does not fit the kind's grammar the result is [`StartToken::Invalid`].
//!
//! A prefixed body ends at the first boundary, except an expression body,
//! which ends only at whitespace or the custom delimiter so that `|i*2` keeps
//! its operator.

use super::list::{parse_bare_list, parse_list_literal};
use super::mask::mask_literals;
use super::segments::SegmentTable;
use regex::Captures;

/// Number base of a decimal sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Radix {
    Binary,
    Octal,
    Decimal,
    Hex,
}

impl Radix {
    pub fn base(self) -> u32 {
        match self {
            Radix::Binary => 2,
            Radix::Octal => 8,
            Radix::Decimal => 10,
            Radix::Hex => 16,
        }
    }

    /// Literal prefix used when the radix prefix option is on.
    pub fn prefix(self) -> &'static str {
        match self {
            Radix::Binary => "0b",
            Radix::Octal => "0o",
            Radix::Decimal => "",
            Radix::Hex => "0x",
        }
    }

    fn from_prefix(prefix: &str) -> Self {
        match prefix.chars().nth(1) {
            Some('x' | 'X') => Radix::Hex,
            Some('o' | 'O') => Radix::Octal,
            Some('b' | 'B') => Radix::Binary,
            _ => Radix::Decimal,
        }
    }
}

/// The closed set of sequence kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceKind {
    Decimal(Radix),
    Alpha,
    Date,
    Expression,
    OwnList,
    PredefinedList,
    Function,
    TextSelected,
    Invalid,
}

/// Random draw directive on a decimal start (`5r10`, `0r-2.50`).
#[derive(Debug, Clone, PartialEq)]
pub struct RandomSpec {
    pub negative: bool,
    pub magnitude: f64,
    /// Decimal places of the magnitude literal
    pub precision: usize,
}

/// Default spread of a random directive without magnitude.
pub const DEFAULT_RANDOM_MAGNITUDE: f64 = 100.0;

#[derive(Debug, Clone, PartialEq)]
pub struct DecimalStart {
    pub radix: Radix,
    pub value: f64,
    /// Fraction digits written in the start literal, if it had a fraction
    pub precision: Option<usize>,
    /// Digit width requested by leading zeros (`007` pads to 3)
    pub lead_width: Option<usize>,
    /// Radix digits were written in upper case
    pub uppercase: bool,
    pub random: Option<RandomSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlphaStart {
    pub word: String,
}

/// Raw date components; missing parts are filled in by the generator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DateStart {
    /// Year digits as written (two or four)
    pub year: Option<String>,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnListStart {
    pub items: Vec<String>,
    /// 1-based start position
    pub start: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListSelector {
    /// 1-based list number
    Number(usize),
    Search(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredefinedStart {
    pub selector: ListSelector,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionStart {
    /// 1-based function number
    pub number: Option<usize>,
    pub start_at: Option<f64>,
}

/// Typed parse result of the start token.
#[derive(Debug, Clone, PartialEq)]
pub enum StartToken {
    Decimal(DecimalStart),
    Alpha(AlphaStart),
    Date(DateStart),
    Expression(String),
    OwnList(OwnListStart),
    Predefined(PredefinedStart),
    Function(FunctionStart),
    TextSelected,
    Invalid(String),
}

impl StartToken {
    pub fn kind(&self) -> SequenceKind {
        match self {
            StartToken::Decimal(start) => SequenceKind::Decimal(start.radix),
            StartToken::Alpha(_) => SequenceKind::Alpha,
            StartToken::Date(_) => SequenceKind::Date,
            StartToken::Expression(_) => SequenceKind::Expression,
            StartToken::OwnList(_) => SequenceKind::OwnList,
            StartToken::Predefined(_) => SequenceKind::PredefinedList,
            StartToken::Function(_) => SequenceKind::Function,
            StartToken::TextSelected => SequenceKind::TextSelected,
            StartToken::Invalid(_) => SequenceKind::Invalid,
        }
    }
}

/// Classification result: the start token and the text holding the modifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct Classified {
    pub start: StartToken,
    pub remainder: String,
}

impl Classified {
    pub fn kind(&self) -> SequenceKind {
        self.start.kind()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Date,
    OwnList,
    Predefined,
    Expression,
    Function,
}

/// Prefix rules in the order they are tried.
const PREFIX_RULES: &[(Family, &str)] = &[
    (Family::Date, "date_prefix"),
    (Family::OwnList, "own_prefix"),
    (Family::Predefined, "predef_prefix"),
    (Family::Expression, "expr_prefix"),
    (Family::Function, "func_prefix"),
];

/// Classify an input line and parse its start token.
///
/// `default_start` is the configured start value used when the line has no
/// start token at all.
pub fn classify(input: &str, segments: &SegmentTable, default_start: &str) -> Classified {
    let line = input.trim();
    let masked = mask_literals(line);

    for (family, prefix) in PREFIX_RULES {
        let Some(found) = segments.regex(prefix).find(&masked) else {
            continue;
        };
        // `[` opens the list itself, every other prefix is dropped
        let body_from = if *family == Family::OwnList && found.as_str() == "[" {
            0
        } else {
            found.end()
        };
        let body_to = match family {
            Family::Expression => segments.expression_boundary_after(&masked, body_from),
            _ => segments.boundary_after(&masked, body_from),
        };
        let body = &line[body_from..body_to];
        return Classified {
            start: parse_prefixed(*family, body, segments),
            remainder: line[body_to..].to_string(),
        };
    }

    let body_to = segments.boundary_after(&masked, 0);
    let body = &line[..body_to];
    let start = if body.is_empty() {
        parse_decimal(default_start.trim(), segments).unwrap_or_else(|| {
            StartToken::Decimal(DecimalStart {
                radix: Radix::Decimal,
                value: 1.0,
                precision: None,
                lead_width: None,
                uppercase: false,
                random: None,
            })
        })
    } else if let Some(decimal) = parse_decimal(body, segments) {
        decimal
    } else if let Some(caps) = segments.regex("alpha_body").captures(body) {
        StartToken::Alpha(AlphaStart {
            word: caps["word"].to_string(),
        })
    } else {
        StartToken::TextSelected
    };

    Classified {
        start,
        remainder: line[body_to..].to_string(),
    }
}

fn parse_prefixed(family: Family, body: &str, segments: &SegmentTable) -> StartToken {
    match family {
        Family::Date => parse_date(body, segments),
        Family::OwnList => parse_own_list(body, segments),
        Family::Predefined => parse_predefined(body, segments),
        Family::Expression => parse_expression(body, segments),
        Family::Function => parse_function(body, segments),
    }
}

fn parse_decimal(body: &str, segments: &SegmentTable) -> Option<StartToken> {
    let caps = segments.regex("decimal_body").captures(body)?;
    let negative = caps.name("sign").is_some_and(|m| m.as_str() == "-");

    let (radix, magnitude, precision, digits) = match (caps.name("radix"), caps.name("int")) {
        (Some(prefix), _) => {
            let radix = Radix::from_prefix(prefix.as_str());
            let digits = caps.name("radix_digits")?.as_str();
            let parsed = u64::from_str_radix(digits, radix.base()).ok()?;
            (radix, parsed as f64, None, digits)
        }
        (None, Some(int)) => {
            let frac = caps.name("frac").map(|m| m.as_str());
            let literal = match frac {
                Some(frac) => format!("{}.{}", int.as_str(), frac),
                None => int.as_str().to_string(),
            };
            let parsed = literal.parse::<f64>().ok()?;
            (Radix::Decimal, parsed, frac.map(str::len), int.as_str())
        }
        _ => return None,
    };

    let lead_width = (digits.len() > 1 && digits.starts_with('0')).then_some(digits.len());
    let uppercase = radix != Radix::Decimal && digits.chars().any(|c| c.is_ascii_uppercase());
    let random = caps.name("random").map(|_| random_spec(&caps));

    Some(StartToken::Decimal(DecimalStart {
        radix,
        value: if negative { -magnitude } else { magnitude },
        precision,
        lead_width,
        uppercase,
        random,
    }))
}

fn random_spec(caps: &Captures<'_>) -> RandomSpec {
    let magnitude = caps
        .name("magnitude")
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(DEFAULT_RANDOM_MAGNITUDE);
    RandomSpec {
        negative: caps.name("random_sign").is_some_and(|m| m.as_str() == "-"),
        magnitude,
        precision: caps.name("random_frac").map_or(0, |m| m.as_str().len()),
    }
}

fn parse_date(body: &str, segments: &SegmentTable) -> StartToken {
    let Some(caps) = segments.regex("date_body").captures(body) else {
        return StartToken::Invalid(format!("'{body}' is not a date"));
    };
    StartToken::Date(DateStart {
        year: caps.name("year").map(|m| m.as_str().to_string()),
        month: caps.name("month").and_then(|m| m.as_str().parse().ok()),
        day: caps.name("day").and_then(|m| m.as_str().parse().ok()),
    })
}

fn parse_own_list(body: &str, segments: &SegmentTable) -> StartToken {
    let Some(caps) = segments.regex("own_body").captures(body) else {
        return StartToken::Invalid(format!("'{body}' is not a list"));
    };
    let items = match (caps.name("list"), caps.name("bare")) {
        (Some(list), _) => parse_list_literal(list.as_str()),
        (None, Some(bare)) => parse_bare_list(bare.as_str()),
        _ => Vec::new(),
    };
    let start = caps
        .name("start")
        .and_then(|m| m.as_str().parse::<usize>().ok())
        .unwrap_or(1)
        .max(1);
    StartToken::OwnList(OwnListStart { items, start })
}

fn parse_predefined(body: &str, segments: &SegmentTable) -> StartToken {
    let Some(caps) = segments.regex("predef_body").captures(body) else {
        return StartToken::Invalid("predefined list needs a number or search text".into());
    };
    let selector = if let Some(number) = caps.name("number") {
        match number.as_str().parse::<usize>() {
            Ok(n) => ListSelector::Number(n),
            Err(_) => return StartToken::Invalid(format!("list number '{}'", number.as_str())),
        }
    } else {
        let text = ["dquoted", "squoted", "text"]
            .iter()
            .find_map(|name| caps.name(name))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        ListSelector::Search(text)
    };
    StartToken::Predefined(PredefinedStart { selector })
}

fn parse_expression(body: &str, segments: &SegmentTable) -> StartToken {
    let Some(caps) = segments.regex("expr_body").captures(body) else {
        return StartToken::Invalid("expression is empty".into());
    };
    let source = ["dquoted", "squoted", "bare"]
        .iter()
        .find_map(|name| caps.name(name))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();
    StartToken::Expression(source)
}

fn parse_function(body: &str, segments: &SegmentTable) -> StartToken {
    let Some(caps) = segments.regex("func_body").captures(body) else {
        return StartToken::Invalid(format!("'{body}' does not select a function"));
    };
    StartToken::Function(FunctionStart {
        number: caps.name("number").and_then(|m| m.as_str().parse().ok()),
        start_at: caps.name("start_at").and_then(|m| m.as_str().parse().ok()),
    })
}

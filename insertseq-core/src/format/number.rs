//! Numeric format specs
//!
//! `[[fill]align][sign][#][0][width][,|_][.precision][type]`
//!
//! - align: `<` left, `>` right (default), `^` center, `=` pad after the sign
//! - sign: `+` always, `-` negatives only (default), ` ` space for positives
//! - `#`: radix prefix for `b`, `o`, `x`, `X`; keep trailing zeros for `g`
//! - `0`: zero-fill after the sign (same as fill `0` with align `=`)
//! - `,` or `_`: group integer digits (hex/binary/octal group by four)
//! - type: `b c d o x X e E f F g G %`; none prints the shortest form, or
//!   fixed point when a precision is given

use crate::sandbox::format_js_number;
use once_cell::sync::Lazy;
use regex::Regex;

static NUMBER_SPEC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:(?P<fill>.)?(?P<align>[<>=^]))?(?P<sign>[-+ ])?(?P<alternate>\#)?(?P<zero>0)?(?P<width>\d+)?(?P<grouping>[,_])?(?:\.(?P<precision>\d+))?(?P<kind>[bcdoxXeEfFgG%])?$",
    )
    .unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberFormat {
    pub fill: char,
    pub align: char,
    pub sign: char,
    pub alternate: bool,
    pub width: usize,
    pub grouping: Option<char>,
    pub precision: Option<usize>,
    pub kind: Option<char>,
}

impl NumberFormat {
    pub fn parse(spec: &str) -> Option<Self> {
        if spec.is_empty() {
            return None;
        }
        let caps = NUMBER_SPEC.captures(spec)?;
        let char_of = |name: &str| caps.name(name).and_then(|m| m.as_str().chars().next());
        let zero = caps.name("zero").is_some();
        let explicit_align = char_of("align");

        Some(Self {
            fill: char_of("fill").unwrap_or(if zero && explicit_align.is_none() { '0' } else { ' ' }),
            align: explicit_align.unwrap_or(if zero { '=' } else { '>' }),
            sign: char_of("sign").unwrap_or('-'),
            alternate: caps.name("alternate").is_some(),
            width: caps
                .name("width")
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0),
            grouping: char_of("grouping"),
            precision: caps.name("precision").and_then(|m| m.as_str().parse().ok()),
            kind: char_of("kind"),
        })
    }

    pub fn apply(&self, value: f64) -> String {
        if !value.is_finite() {
            return self.pad(String::new(), format_js_number(value));
        }
        let negative = value < 0.0 || (value == 0.0 && value.is_sign_negative() && self.kind.is_some());
        let magnitude = value.abs();

        let body = match self.kind {
            Some('b') => self.radix(magnitude, 2, "0b", false),
            Some('o') => self.radix(magnitude, 8, "0o", false),
            Some('x') => self.radix(magnitude, 16, "0x", false),
            Some('X') => self.radix(magnitude, 16, "0X", true),
            Some('c') => {
                return char::from_u32(value.round() as u32)
                    .map(|c| self.pad(String::new(), c.to_string()))
                    .unwrap_or_else(|| format_js_number(value));
            }
            Some('d') => self.group(&format!("{:.0}", magnitude.round())),
            Some('e') => exponent(magnitude, self.precision.unwrap_or(6), false),
            Some('E') => exponent(magnitude, self.precision.unwrap_or(6), true),
            Some('f' | 'F') => self.fixed(magnitude, self.precision.unwrap_or(6)),
            Some('g') => self.general(magnitude, false),
            Some('G') => self.general(magnitude, true),
            Some('%') => format!("{}%", self.fixed(magnitude * 100.0, self.precision.unwrap_or(6))),
            _ => match self.precision {
                Some(precision) => self.fixed(magnitude, precision),
                None => self.plain(magnitude),
            },
        };

        let sign = match (negative, self.sign) {
            (true, _) => "-",
            (false, '+') => "+",
            (false, ' ') => " ",
            _ => "",
        };
        self.pad(sign.to_string(), body)
    }

    fn radix(&self, magnitude: f64, base: u32, prefix: &str, upper: bool) -> String {
        let digits = to_radix(magnitude.round() as u64, base, upper);
        let digits = match self.grouping {
            Some(separator) => group_digits(&digits, separator, 4),
            None => digits,
        };
        if self.alternate {
            format!("{prefix}{digits}")
        } else {
            digits
        }
    }

    fn fixed(&self, magnitude: f64, precision: usize) -> String {
        self.group(&format!("{magnitude:.precision$}"))
    }

    fn plain(&self, magnitude: f64) -> String {
        let text = format_js_number(magnitude);
        if text.contains('e') {
            text
        } else {
            self.group(&text)
        }
    }

    fn general(&self, magnitude: f64, upper: bool) -> String {
        let precision = self.precision.unwrap_or(6).max(1);
        if magnitude == 0.0 {
            return "0".to_string();
        }
        let exp = magnitude.log10().floor() as i32;
        if exp >= -4 && exp < precision as i32 {
            let decimals = (precision as i32 - 1 - exp).max(0) as usize;
            let text = self.fixed(magnitude, decimals);
            if self.alternate {
                text
            } else {
                strip_fraction_zeros(&text)
            }
        } else {
            let text = exponent(magnitude, precision - 1, upper);
            if self.alternate {
                return text;
            }
            match text.split_once(['e', 'E']) {
                Some((mantissa, exp)) => {
                    let marker = if upper { 'E' } else { 'e' };
                    format!("{}{marker}{exp}", strip_fraction_zeros(mantissa))
                }
                None => text,
            }
        }
    }

    fn group(&self, digits: &str) -> String {
        let Some(separator) = self.grouping else {
            return digits.to_string();
        };
        let (int, frac) = match digits.split_once('.') {
            Some((int, frac)) => (int, Some(frac)),
            None => (digits, None),
        };
        let grouped = group_digits(int, separator, 3);
        match frac {
            Some(frac) => format!("{grouped}.{frac}"),
            None => grouped,
        }
    }

    fn pad(&self, sign: String, body: String) -> String {
        let len = sign.chars().count() + body.chars().count();
        let padding = self.width.saturating_sub(len);
        let fill = |n: usize| std::iter::repeat(self.fill).take(n).collect::<String>();
        match self.align {
            '<' => format!("{sign}{body}{}", fill(padding)),
            '^' => format!("{}{sign}{body}{}", fill(padding / 2), fill(padding - padding / 2)),
            '=' => format!("{sign}{}{body}", fill(padding)),
            _ => format!("{}{sign}{body}", fill(padding)),
        }
    }
}

/// Format `value` with `spec`; an unparseable spec prints the plain value.
pub fn format_number(value: f64, spec: &str) -> String {
    match NumberFormat::parse(spec) {
        Some(format) => format.apply(value),
        None => format_js_number(value),
    }
}

fn to_radix(mut n: u64, base: u32, upper: bool) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        let digit = (n % u64::from(base)) as u32;
        let c = char::from_digit(digit, base).unwrap_or('0');
        digits.push(if upper { c.to_ascii_uppercase() } else { c });
        n /= u64::from(base);
    }
    digits.iter().rev().collect()
}

fn group_digits(digits: &str, separator: char, size: usize) -> String {
    let chars: Vec<char> = digits.chars().collect();
    let mut out = String::with_capacity(chars.len() + chars.len() / size);
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % size == 0 {
            out.push(separator);
        }
        out.push(*c);
    }
    out
}

/// Scientific notation with a signed, at least two digit exponent.
fn exponent(magnitude: f64, precision: usize, upper: bool) -> String {
    let text = format!("{magnitude:.precision$e}");
    let (mantissa, exp) = text.split_once('e').unwrap_or((text.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    let sign = if exp < 0 { '-' } else { '+' };
    let marker = if upper { 'E' } else { 'e' };
    format!("{mantissa}{marker}{sign}{:02}", exp.abs())
}

fn strip_fraction_zeros(text: &str) -> String {
    if !text.contains('.') {
        return text.to_string();
    }
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(42.0, "05d", "00042")]
    #[case(-42.0, "05d", "-0042")]
    #[case(3.14159, ".2f", "3.14")]
    #[case(3.0, ".2", "3.00")]
    #[case(255.0, "x", "ff")]
    #[case(255.0, "#X", "0XFF")]
    #[case(5.0, "#b", "0b101")]
    #[case(8.0, "o", "10")]
    #[case(1234567.0, ",d", "1,234,567")]
    #[case(1234.5, "_.1f", "1_234.5")]
    #[case(7.0, "+d", "+7")]
    #[case(7.0, " d", " 7")]
    #[case(7.0, "*^5", "**7**")]
    #[case(7.0, "<3", "7  ")]
    #[case(-7.0, "=5", "-   7")]
    #[case(0.25, ".1%", "25.0%")]
    #[case(1234.5, ".2e", "1.23e+03")]
    #[case(0.00012, "E", "1.200000E-04")]
    #[case(1234.5, "g", "1234.5")]
    #[case(0.0000123, "g", "1.23e-05")]
    #[case(65.0, "c", "A")]
    #[case(2.5, "", "2.5")]
    fn formats(#[case] value: f64, #[case] spec: &str, #[case] expected: &str) {
        assert_eq!(format_number(value, spec), expected);
    }

    #[rstest]
    #[case("abc")]
    #[case(".f2")]
    #[case("10q")]
    fn unparseable_spec_prints_plain_value(#[case] spec: &str) {
        assert_eq!(format_number(12.5, spec), "12.5");
    }
}

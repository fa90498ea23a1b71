//! String padding
//!
//! `[[fill]align]width[w][lr]`: align `<` pads on the right, `>` on the left
//! (default), `=` centers. `w` keeps only the last character of the value
//! once the padding has been computed from the full value. For centered
//! values with odd padding, `l` (default) puts the extra fill on the right
//! and `r` on the left.

use once_cell::sync::Lazy;
use regex::Regex;

static STRING_SPEC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(?P<fill>.)?(?P<align>[<>=]))?(?P<width>\d+)(?P<truncate>w)?(?P<bias>[lr])?$")
        .unwrap()
});

/// Pad `value` according to `spec`; an unparseable spec returns it unchanged.
pub fn pad_string(value: &str, spec: &str) -> String {
    let Some(caps) = STRING_SPEC.captures(spec) else {
        return value.to_string();
    };
    let fill = caps
        .name("fill")
        .and_then(|m| m.as_str().chars().next())
        .unwrap_or(' ');
    let align = caps
        .name("align")
        .and_then(|m| m.as_str().chars().next())
        .unwrap_or('>');
    let Ok(width) = caps["width"].parse::<usize>() else {
        return value.to_string();
    };
    let extra_left = caps.name("bias").is_some_and(|m| m.as_str() == "r");

    let padding = width.saturating_sub(value.chars().count());
    let body = if caps.name("truncate").is_some() {
        value.chars().last().map(String::from).unwrap_or_default()
    } else {
        value.to_string()
    };

    let (left, right) = match align {
        '<' => (0, padding),
        '=' if extra_left => (padding - padding / 2, padding / 2),
        '=' => (padding / 2, padding - padding / 2),
        _ => (padding, 0),
    };
    let mut out = String::with_capacity(body.len() + padding * fill.len_utf8());
    out.extend(std::iter::repeat(fill).take(left));
    out.push_str(&body);
    out.extend(std::iter::repeat(fill).take(right));
    out
}

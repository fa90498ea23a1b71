//! Date token templates
//!
//! Tokens: `yyyy yy MMMM MMM MM M dd d HH H mm m ss s`. The year, day, hour
//! and second tokens are also accepted in the other case (`YYYY`, `DD`, `hh`,
//! `SS`); month (`M`) and minute (`m`) are case-sensitive. At each position
//! the longest token wins; anything else is copied through.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};

/// Template tokens, longest first.
const TOKENS: &[(&str, Token)] = &[
    ("yyyy", Token::Year4),
    ("YYYY", Token::Year4),
    ("MMMM", Token::MonthName),
    ("MMM", Token::MonthShort),
    ("yy", Token::Year2),
    ("YY", Token::Year2),
    ("MM", Token::Month2),
    ("dd", Token::Day2),
    ("DD", Token::Day2),
    ("HH", Token::Hour2),
    ("hh", Token::Hour2),
    ("mm", Token::Minute2),
    ("ss", Token::Second2),
    ("SS", Token::Second2),
    ("M", Token::Month),
    ("d", Token::Day),
    ("D", Token::Day),
    ("H", Token::Hour),
    ("h", Token::Hour),
    ("m", Token::Minute),
    ("s", Token::Second),
    ("S", Token::Second),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Year4,
    Year2,
    MonthName,
    MonthShort,
    Month2,
    Month,
    Day2,
    Day,
    Hour2,
    Hour,
    Minute2,
    Minute,
    Second2,
    Second,
}

const MONTHS_EN: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];
const MONTHS_DE: [&str; 12] = [
    "Januar", "Februar", "März", "April", "Mai", "Juni", "Juli", "August", "September",
    "Oktober", "November", "Dezember",
];
const MONTHS_FR: [&str; 12] = [
    "janvier", "février", "mars", "avril", "mai", "juin", "juillet", "août", "septembre",
    "octobre", "novembre", "décembre",
];
const MONTHS_ES: [&str; 12] = [
    "enero", "febrero", "marzo", "abril", "mayo", "junio", "julio", "agosto", "septiembre",
    "octubre", "noviembre", "diciembre",
];

/// Full month names for a language tag; unknown languages get English.
pub fn month_names(language: &str) -> &'static [&'static str; 12] {
    let primary = language
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    match primary.as_str() {
        "de" => &MONTHS_DE,
        "fr" => &MONTHS_FR,
        "es" => &MONTHS_ES,
        _ => &MONTHS_EN,
    }
}

fn month_name(language: &str, month: u32) -> &'static str {
    let index = month.clamp(1, 12) as usize - 1;
    month_names(language)[index]
}

/// Render `date` with a token template.
pub fn format_date(date: &NaiveDateTime, template: &str, language: &str) -> String {
    let mut out = String::with_capacity(template.len() + 8);
    let mut rest = template;
    while !rest.is_empty() {
        if let Some((literal, token)) = TOKENS.iter().find(|(lit, _)| rest.starts_with(lit)) {
            out.push_str(&render(date, *token, language));
            rest = &rest[literal.len()..];
            continue;
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            out.push(c);
        }
        rest = chars.as_str();
    }
    out
}

fn render(date: &NaiveDateTime, token: Token, language: &str) -> String {
    match token {
        Token::Year4 => format!("{:04}", date.year()),
        Token::Year2 => format!("{:02}", date.year().rem_euclid(100)),
        Token::MonthName => month_name(language, date.month()).to_string(),
        Token::MonthShort => month_name(language, date.month()).chars().take(3).collect(),
        Token::Month2 => format!("{:02}", date.month()),
        Token::Month => date.month().to_string(),
        Token::Day2 => format!("{:02}", date.day()),
        Token::Day => date.day().to_string(),
        Token::Hour2 => format!("{:02}", date.hour()),
        Token::Hour => date.hour().to_string(),
        Token::Minute2 => format!("{:02}", date.minute()),
        Token::Minute => date.minute().to_string(),
        Token::Second2 => format!("{:02}", date.second()),
        Token::Second => date.second().to_string(),
    }
}

/// Read a date written as `yyyy-mm-dd`, `yyyy/mm/dd`, `dd.mm.yyyy`,
/// `yyyy-mm-ddTHH:MM:SS` or RFC 3339.
pub fn parse_date_text(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(text) {
        return Some(date.naive_local());
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(date) = NaiveDateTime::parse_from_str(text, pattern) {
            return Some(date);
        }
    }
    ["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y"]
        .iter()
        .find_map(|pattern| NaiveDate::parse_from_str(text, pattern).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Parse `text` and render it with `template` (English month names). Text
/// that is not a date is returned unchanged.
pub fn format_date_str(text: &str, template: &str) -> String {
    match parse_date_text(text) {
        Some(date) => format_date(&date, template, "en"),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(h, min, s))
            .unwrap()
    }

    #[test]
    fn mixed_case_tokens() {
        assert_eq!(format_date_str("2025-11-03", "DD.M.YY"), "03.11.25");
    }

    #[rstest]
    #[case("yyyy-MM-dd", "2024-02-09")]
    #[case("d.M.yy", "9.2.24")]
    #[case("HH:mm:ss", "07:05:03")]
    #[case("H:m:s", "7:5:3")]
    #[case("MMMM d, yyyy", "February 9, 2024")]
    #[case("MMM", "Feb")]
    #[case("[week] dd", "[week] 09")]
    fn templates(#[case] template: &str, #[case] expected: &str) {
        let date = at(2024, 2, 9, 7, 5, 3);
        assert_eq!(format_date(&date, template, "en"), expected);
    }

    #[rstest]
    #[case("de", "März")]
    #[case("fr", "mars")]
    #[case("es-MX", "marzo")]
    #[case("xx", "March")]
    fn month_names_follow_language(#[case] language: &str, #[case] expected: &str) {
        let date = at(2024, 3, 1, 0, 0, 0);
        assert_eq!(format_date(&date, "MMMM", language), expected);
    }

    #[rstest]
    #[case("2025-11-03")]
    #[case("2025/11/03")]
    #[case("03.11.2025")]
    #[case("2025-11-03T00:00:00")]
    #[case("2025-11-03T00:00:00+02:00")]
    fn accepted_inputs(#[case] text: &str) {
        assert_eq!(parse_date_text(text), Some(at(2025, 11, 3, 0, 0, 0)));
    }

    #[test]
    fn non_dates_pass_through() {
        assert_eq!(format_date_str("soon", "yyyy"), "soon");
    }
}

//! End-to-end tests through the public API
//!
//! Each case prepares a sequence for a number of empty selections and collects
//! every value up to the first stop flag.

use insertseq_core::{
    GenerationContext, Radix, Sequence, SequenceKind, Settings,
};
use rstest::rstest;

fn collect_with(input: &str, selections: Vec<String>, settings: Settings) -> Vec<String> {
    let ctx = GenerationContext::new(selections, settings);
    let mut sequence = Sequence::prepare(input, &ctx).unwrap();
    sequence.collect(1000)
}

fn collect(input: &str, count: usize) -> Vec<String> {
    collect_with(input, vec![String::new(); count], Settings::default())
}

#[rstest]
#[case("1", 3, &["1", "2", "3"])]
#[case("", 2, &["1", "2"])]
#[case("-2 3", 3, &["-2", "1", "4"])]
#[case("0x0a", 3, &["0a", "0b", "0c"])]
#[case("0b1", 3, &["1", "10", "11"])]
#[case("007", 2, &["007", "008"])]
#[case("1.50 0.25", 3, &["1.50", "1.75", "2.00"])]
#[case("1 ~03d", 3, &["001", "002", "003"])]
#[case("1000 ~,", 2, &["1,000", "1,001"])]
#[case("1 *2", 5, &["1", "1", "2", "2", "3"])]
#[case("1 #3", 5, &["1", "2", "3", "1", "2"])]
#[case("1 ##2", 4, &["1", "2", "1", "2"])]
#[case("5 ::'_ * 2'", 3, &["10", "12", "14"])]
#[case("a", 3, &["a", "b", "c"])]
#[case("Y", 3, &["Y", "Z", "AA"])]
#[case("[x, y]", 3, &["x", "y", "x"])]
#[case("[x, y, z]3 -1", 3, &["z", "y", "x"])]
#[case("%2025-11-03 ~'DD.M.YY'", 2, &["03.11.25", "04.11.25"])]
#[case("|'(i + 1) * 10'", 3, &["10", "20", "30"])]
#[case("|i*2", 3, &["0", "2", "4"])]
#[case("|i%2?'odd':'even'", 3, &["even", "odd", "even"])]
fn sequences(#[case] input: &str, #[case] count: usize, #[case] expected: &[&str]) {
    assert_eq!(collect(input, count), expected);
}

#[rstest]
#[case("12", SequenceKind::Decimal(Radix::Decimal))]
#[case("0o7", SequenceKind::Decimal(Radix::Octal))]
#[case("abc", SequenceKind::Alpha)]
#[case("%", SequenceKind::Date)]
#[case("[a]", SequenceKind::OwnList)]
#[case(";1", SequenceKind::PredefinedList)]
#[case("=", SequenceKind::Function)]
#[case("|i", SequenceKind::Expression)]
#[case("a1", SequenceKind::TextSelected)]
#[case("date:x", SequenceKind::Invalid)]
fn kinds(#[case] input: &str, #[case] expected: SequenceKind) {
    let ctx = GenerationContext::new(vec![String::new()], Settings::default());
    assert_eq!(Sequence::prepare(input, &ctx).unwrap().kind(), expected);
}

#[test]
fn stop_expression_outlives_the_selections() {
    insta::assert_snapshot!(collect("1 steps:3 @'a > 10'", 1).join("\n"), @r"
    1
    4
    7
    10
    ");
}

#[test]
fn previous_value_feeds_the_next_expression() {
    insta::assert_snapshot!(collect("1 ::'p ? p * 2 : 1'", 5).join(" "), @"1 2 4 8 16");
}

#[test]
fn empty_own_list_stops_immediately() {
    let ctx = GenerationContext::new(vec![String::new(); 3], Settings::default());
    let mut sequence = Sequence::prepare("[]", &ctx).unwrap();
    let first = sequence.emit(0);
    assert!(first.stop);
    assert_eq!(first.text, "");
}

#[test]
fn predefined_lists_from_settings() {
    let settings = Settings {
        mysequences: vec![vec!["alpha".into(), "beta".into(), "gamma".into()]],
        ..Settings::default()
    };
    let values = collect_with(";BET ?i", vec![String::new(); 3], settings);
    assert_eq!(values, vec!["beta", "gamma", "alpha"]);
}

#[test]
fn selections_feed_the_original_placeholder() {
    let selections = vec!["3".to_string(), "4".to_string()];
    let values = collect_with("|'o * o'", selections, Settings::default());
    assert_eq!(values, vec!["9", "16"]);
}

#[test]
fn custom_delimiter_ends_the_start_token() {
    let ctx = GenerationContext::with_delimiter(
        vec![String::new(); 4],
        Settings::default(),
        Some(",".into()),
    );
    let mut sequence = Sequence::prepare("5,#2", &ctx).unwrap();
    assert_eq!(sequence.collect(10), vec!["5", "6", "5", "6"]);

    let plain = GenerationContext::new(vec![String::new()], Settings::default());
    assert_eq!(
        Sequence::prepare("5,#2", &plain).unwrap().kind(),
        SequenceKind::TextSelected
    );
}

#[test]
fn failing_expression_keeps_the_value_and_warns() {
    let ctx = GenerationContext::new(vec![String::new(); 2], Settings::default());
    let mut sequence = Sequence::prepare("1 ::'nothing + 1'", &ctx).unwrap();
    assert_eq!(sequence.collect(10), vec!["1", "2"]);
    let warnings = ctx.diagnostics().warnings();
    assert!(!warnings.is_empty());
    assert!(warnings.iter().all(|w| w.contains("nothing")));
}

#[test]
fn settings_defaults_apply_without_modifiers() {
    let settings = Settings {
        start: "10".into(),
        step: 5.0,
        number_format: "+d".into(),
        ..Settings::default()
    };
    let values = collect_with("", vec![String::new(); 3], settings);
    assert_eq!(values, vec!["+10", "+15", "+20"]);
}

#[test]
fn deeply_nested_expression_keeps_the_value() {
    let input = format!("1 ::'{}_{}'", "(".repeat(3000), ")".repeat(3000));
    assert_eq!(collect(&input, 2), vec!["1", "2"]);
}

#[test]
fn runaway_string_expression_keeps_the_value() {
    let input = "1 ::'let t = \"xx\"; while (true) { t = t + t }'";
    assert_eq!(collect(input, 2), vec!["1", "2"]);
}

//! Inline list literal parsing
//!
//! Grammar: `<list> = "[" <item> ((";" | ",") <item>)* "]"`
//! Where: `<item> = <quoted> | <bare>`, quoted items keep inner separators and
//! surrounding whitespace is ignored. Empty items are dropped.

use chumsky::prelude::*;

/// Parse a bracketed list literal into its trimmed, non-empty items.
///
/// Input that does not follow the grammar (unbalanced quotes, stray text after
/// a quoted item) falls back to a plain split on separators.
pub fn parse_list_literal(source: &str) -> Vec<String> {
    let items = match list_parser().parse(source) {
        Ok(items) => items,
        Err(_) => fallback_split(source),
    };
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Split unbracketed `a;b,c` text the same way bracketed lists are split.
pub fn parse_bare_list(source: &str) -> Vec<String> {
    fallback_split(source)
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

fn list_parser() -> impl Parser<char, Vec<String>, Error = Simple<char>> {
    let quoted = |quote: char| {
        just(quote)
            .ignore_then(filter(move |c: &char| *c != quote).repeated())
            .then_ignore(just(quote))
            .collect::<String>()
            .padded()
    };

    let bare = filter(|c: &char| !matches!(c, ',' | ';' | ']'))
        .repeated()
        .collect::<String>();

    let item = quoted('"').or(quoted('\'')).or(bare);

    item.separated_by(one_of(",;"))
        .delimited_by(just('['), just(']'))
        .then_ignore(end())
}

fn fallback_split(source: &str) -> Vec<String> {
    let inner = source.trim();
    let inner = inner.strip_prefix('[').unwrap_or(inner);
    let inner = inner.strip_suffix(']').unwrap_or(inner);
    inner
        .split([',', ';'])
        .map(|item| {
            let item = item.trim();
            let unquoted = item
                .strip_prefix('"')
                .and_then(|i| i.strip_suffix('"'))
                .or_else(|| item.strip_prefix('\'').and_then(|i| i.strip_suffix('\'')));
            unquoted.unwrap_or(item).to_string()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_commas_and_semicolons() {
        assert_eq!(parse_list_literal("[a, b;c]"), vec!["a", "b", "c"]);
    }

    #[test]
    fn quoted_items_keep_separators() {
        assert_eq!(
            parse_list_literal(r#"["a, b"; 'c;d' ; e]"#),
            vec!["a, b", "c;d", "e"]
        );
    }

    #[test]
    fn empty_entries_are_dropped() {
        assert_eq!(parse_list_literal("[a,, ;b]"), vec!["a", "b"]);
        assert!(parse_list_literal("[]").is_empty());
        assert!(parse_list_literal("[ ]").is_empty());
    }

    #[test]
    fn malformed_input_falls_back_to_split() {
        assert_eq!(parse_list_literal(r#"["a" x, b]"#), vec![r#""a" x"#, "b"]);
    }

    #[test]
    fn bare_lists_split_the_same_way() {
        assert_eq!(parse_bare_list("north;south,east"), vec!["north", "south", "east"]);
    }
}

//! Literal masking
//!
//! Replaces everything between a pair of quotes or brackets with filler of the
//! same byte length. The outermost delimiters stay visible, so `[a b]` still
//! starts with `[`, while the space inside no longer counts as a boundary.
//! Byte offsets in the masked text map one-to-one onto the original.

/// Filler written over masked bytes.
pub const FILLER: char = '\u{1}';

/// Mask the contents of `"..."`, `'...'`, `` `...` ``, `(...)`, `[...]` and
/// `{...}`. Nested delimiters are masked with the rest of the contents; an
/// unterminated literal masks to the end of the input.
pub fn mask_literals(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut closers: Vec<char> = Vec::new();
    let mut escaped = false;

    for ch in input.chars() {
        let Some(&expected) = closers.last() else {
            if let Some(closer) = closer_for(ch) {
                closers.push(closer);
            }
            out.push(ch);
            continue;
        };

        let in_quote = is_quote(expected);
        if in_quote && escaped {
            escaped = false;
        } else if in_quote && ch == '\\' {
            escaped = true;
        } else if ch == expected {
            closers.pop();
            if closers.is_empty() {
                out.push(ch);
                continue;
            }
        } else if !in_quote {
            if let Some(closer) = closer_for(ch) {
                closers.push(closer);
            }
        }

        for _ in 0..ch.len_utf8() {
            out.push(FILLER);
        }
    }

    out
}

fn closer_for(ch: char) -> Option<char> {
    match ch {
        '"' | '\'' | '`' => Some(ch),
        '(' => Some(')'),
        '[' => Some(']'),
        '{' => Some('}'),
        _ => None,
    }
}

fn is_quote(ch: char) -> bool {
    matches!(ch, '"' | '\'' | '`')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visible(masked: &str) -> String {
        masked.replace(FILLER, "_")
    }

    #[test]
    fn plain_text_is_untouched() {
        assert_eq!(mask_literals("5 steps:2"), "5 steps:2");
    }

    #[test]
    fn quoted_contents_are_masked() {
        assert_eq!(visible(&mask_literals(r#"::"i * 2" #3"#)), r#"::"_____" #3"#);
    }

    #[test]
    fn brackets_nest() {
        assert_eq!(visible(&mask_literals("[a, (b c)] x")), "[________] x");
    }

    #[test]
    fn escaped_quote_does_not_close() {
        assert_eq!(visible(&mask_literals(r#""a\"b" c"#)), r#""____" c"#);
    }

    #[test]
    fn byte_length_is_preserved() {
        let input = "[äöü] ~\"ß\"";
        assert_eq!(mask_literals(input).len(), input.len());
    }

    #[test]
    fn unterminated_literal_masks_to_end() {
        assert_eq!(visible(&mask_literals("'abc def")), "'_______");
    }
}

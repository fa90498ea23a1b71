//! Alphabetic sequences
//!
//! Words are numbers in bijective base N over the configured alphabet:
//! `a`=1 ... `z`=26, `aa`=27, ordered by length, then lexicographically. Zero
//! is the empty word.
//!
//! Words are kept as digit vectors and moved by plain base-N addition, so
//! start words of any length keep their exact position.

use super::{pick_format, Emission, ExpressionHooks, SequenceGenerator};
use crate::context::GenerationContext;
use crate::error::GenerateError;
use crate::folding::Folding;
use crate::format::pad_string;
use crate::modifiers::Modifiers;
use crate::sandbox::Value;
use crate::settings::Capitalization;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Alphabet {
    chars: Vec<char>,
    positions: HashMap<char, usize>,
}

impl Alphabet {
    pub fn new(source: &str) -> Result<Self, GenerateError> {
        let chars: Vec<char> = source.chars().collect();
        if chars.is_empty() {
            return Err(GenerateError::EmptyAlphabet);
        }
        let mut positions = HashMap::with_capacity(chars.len());
        for (position, c) in chars.iter().enumerate() {
            if positions.insert(*c, position).is_some() {
                return Err(GenerateError::DuplicateAlphabetCharacter(*c));
            }
        }
        Ok(Self { chars, positions })
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Position of `c`, trying the other letter case when it is not listed.
    fn position(&self, c: char) -> Option<usize> {
        self.positions
            .get(&c)
            .or_else(|| c.to_lowercase().next().and_then(|l| self.positions.get(&l)))
            .or_else(|| c.to_uppercase().next().and_then(|u| self.positions.get(&u)))
            .copied()
    }

    /// Whether every character of `word` is in the alphabet (either case).
    pub fn spells(&self, word: &str) -> bool {
        word.chars().all(|c| self.position(c).is_some())
    }

    /// Bijective digits of `word` (`1..=N`, most significant first); `None`
    /// when a character is not in the alphabet.
    pub fn digits(&self, word: &str) -> Option<Vec<usize>> {
        word.chars().map(|c| self.position(c).map(|p| p + 1)).collect()
    }

    /// Word spelled by bijective digits.
    pub fn spell(&self, digits: &[usize]) -> String {
        digits.iter().map(|d| self.chars[d - 1]).collect()
    }

    /// Word for `n`; zero is the empty word.
    pub fn decode(&self, n: u128) -> String {
        self.shift(&[], n as i128)
            .map(|digits| self.spell(&digits))
            .unwrap_or_default()
    }

    /// Digits of the word `delta` places after `digits`; `None` below zero.
    pub fn shift(&self, digits: &[usize], delta: i128) -> Option<Vec<usize>> {
        let base = self.chars.len();
        if base == 1 {
            let len = i128::try_from(digits.len()).ok()? + delta;
            let len = usize::try_from(len).ok().filter(|len| *len <= MAX_UNARY_LEN)?;
            return Some(vec![1; len]);
        }
        let plain = to_plain(digits, base);
        let amount = plain_digits(delta.unsigned_abs(), base);
        let moved = if delta < 0 {
            plain_sub(plain, &amount, base)?
        } else {
            plain_add(plain, &amount, base)
        };
        Some(to_bijective(moved, base))
    }
}

/// Longest word a one-letter alphabet spells.
const MAX_UNARY_LEN: usize = 1 << 16;

/// Bijective digits (most significant first) to base-N digits (least
/// significant first).
fn to_plain(digits: &[usize], base: usize) -> Vec<usize> {
    let mut plain = Vec::with_capacity(digits.len() + 1);
    let mut carry = 0;
    for digit in digits.iter().rev() {
        let value = digit + carry;
        plain.push(value % base);
        carry = value / base;
    }
    if carry > 0 {
        plain.push(carry);
    }
    plain
}

fn plain_digits(mut n: u128, base: usize) -> Vec<usize> {
    let mut digits = Vec::new();
    while n > 0 {
        digits.push((n % base as u128) as usize);
        n /= base as u128;
    }
    digits
}

fn plain_add(mut left: Vec<usize>, right: &[usize], base: usize) -> Vec<usize> {
    let mut carry = 0;
    let mut position = 0;
    while position < right.len() || carry > 0 {
        if position == left.len() {
            left.push(0);
        }
        let sum = left[position] + right.get(position).copied().unwrap_or(0) + carry;
        left[position] = sum % base;
        carry = sum / base;
        position += 1;
    }
    left
}

fn plain_sub(mut left: Vec<usize>, right: &[usize], base: usize) -> Option<Vec<usize>> {
    let mut borrow = 0;
    let mut position = 0;
    while position < right.len() || borrow > 0 {
        let current = *left.get(position)?;
        let take = right.get(position).copied().unwrap_or(0) + borrow;
        if current >= take {
            left[position] = current - take;
            borrow = 0;
        } else {
            left[position] = current + base - take;
            borrow = 1;
        }
        position += 1;
    }
    Some(left)
}

/// Base-N digits (least significant first) to bijective digits (most
/// significant first); zero gives no digits.
fn to_bijective(mut plain: Vec<usize>, base: usize) -> Vec<usize> {
    let mut word = Vec::new();
    let mut low = 0;
    loop {
        while plain.len() > low && plain.last() == Some(&0) {
            plain.pop();
        }
        if plain.len() <= low {
            break;
        }
        // n -= 1, then the low digit plus one is the next letter and n /= N
        let mut position = low;
        while plain[position] == 0 {
            plain[position] = base - 1;
            position += 1;
        }
        plain[position] -= 1;
        word.push(plain[low] + 1);
        low += 1;
    }
    word.reverse();
    word
}

/// Apply a capitalization policy; `template` is the start word.
pub fn capitalize(word: &str, policy: Capitalization, template: &str) -> String {
    match policy {
        Capitalization::Upper => word.to_uppercase(),
        Capitalization::Lower => word.to_lowercase(),
        Capitalization::Pascal => {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        }
        Capitalization::Preserve => preserve_case(word, template),
    }
}

/// Copy letter case from the template, aligned on the right. Positions left
/// of the template copy the case of its first character.
fn preserve_case(word: &str, template: &str) -> String {
    let template: Vec<char> = template.chars().collect();
    let Some(&first) = template.first() else {
        return word.to_string();
    };
    let chars: Vec<char> = word.chars().collect();
    let len = chars.len();
    let mut out = String::with_capacity(word.len());
    for (position, c) in chars.into_iter().enumerate() {
        let from_right = len - 1 - position;
        let model = if from_right < template.len() {
            template[template.len() - 1 - from_right]
        } else {
            first
        };
        if model.is_uppercase() {
            out.extend(c.to_uppercase());
        } else if model.is_lowercase() {
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[derive(Debug)]
pub struct AlphaGenerator {
    alphabet: Alphabet,
    word: String,
    origin: Vec<usize>,
    folding: Folding,
    capitalization: Capitalization,
    format: Option<String>,
    hooks: ExpressionHooks,
}

impl AlphaGenerator {
    pub fn new(
        alphabet: Alphabet,
        word: String,
        modifiers: &Modifiers,
        ctx: &GenerationContext,
    ) -> Self {
        let settings = ctx.settings();
        let origin = alphabet.digits(&word).unwrap_or_default();
        Self {
            hooks: ExpressionHooks::new(modifiers, Value::Str(word.clone()), ctx),
            alphabet,
            word,
            origin,
            folding: modifiers.folding(),
            capitalization: settings.alpha_capital,
            format: pick_format(modifiers.format.as_deref(), &settings.string_format),
        }
    }

    fn word_at(&self, index: u64) -> String {
        let delta = self.folding.logical_index(index).round() as i128;
        self.alphabet
            .shift(&self.origin, delta)
            .map(|digits| self.alphabet.spell(&digits))
            .unwrap_or_default()
    }
}

impl SequenceGenerator for AlphaGenerator {
    fn generate(&mut self, index: u64, ctx: &GenerationContext) -> Emission {
        self.hooks.begin(index, ctx);
        let decoded = self.word_at(index);
        let word = match self.hooks.evaluate(Value::Str(decoded.clone()), ctx) {
            Some(Value::Str(text)) => text,
            _ => decoded,
        };
        let word = capitalize(&word, self.capitalization, &self.word);
        self.hooks.settle(Value::Str(word.clone()));
        let text = match &self.format {
            Some(spec) => pad_string(&word, spec),
            None => word,
        };
        Emission::new(text, self.hooks.should_stop(index, ctx))
    }
}

//! Per-index replacement values
//!
//! The record behind the single-letter placeholders usable inside expressions.
//! It is the only state a generator carries from one index to the next.

use crate::sandbox::Value;

/// Placeholder letters, matched case-insensitively as whole words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// `_` value computed for this index before the expression
    Current,
    /// `o` original text of the selection
    Original,
    /// `c` start value
    Start,
    /// `p` previous value after its expression
    Previous,
    /// `a` value after the expression (inside stop expressions)
    AfterExpression,
    /// `s` step
    Step,
    /// `n` number of selections
    Selections,
    /// `i` emission index
    Index,
}

impl Placeholder {
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            '_' => Some(Placeholder::Current),
            'o' => Some(Placeholder::Original),
            'c' => Some(Placeholder::Start),
            'p' => Some(Placeholder::Previous),
            'a' => Some(Placeholder::AfterExpression),
            's' => Some(Placeholder::Step),
            'n' => Some(Placeholder::Selections),
            'i' => Some(Placeholder::Index),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReplacementValues {
    pub current_value: Value,
    pub value_after_expression: Value,
    pub previous_value: Value,
    pub original_text: String,
    pub start: Value,
    pub step: Value,
    pub number_of_selections: usize,
    pub current_index: u64,
}

impl ReplacementValues {
    pub fn new(start: Value, step: Value, number_of_selections: usize) -> Self {
        Self {
            current_value: Value::Undefined,
            value_after_expression: Value::Undefined,
            previous_value: Value::Undefined,
            original_text: String::new(),
            start,
            step,
            number_of_selections,
            current_index: 0,
        }
    }

    /// Begin a new index: record it and its original text, and shift the
    /// last after-expression value into `previous`.
    pub fn advance(&mut self, index: u64, original: &str) {
        self.current_index = index;
        self.original_text = original.to_string();
        self.previous_value =
            std::mem::replace(&mut self.value_after_expression, Value::Undefined);
        self.current_value = Value::Undefined;
    }

    pub fn set_current(&mut self, value: Value) {
        self.current_value = value;
    }

    pub fn set_after_expression(&mut self, value: Value) {
        self.value_after_expression = value;
    }

    pub fn lookup(&self, placeholder: Placeholder) -> Value {
        match placeholder {
            Placeholder::Current => self.current_value.clone(),
            Placeholder::Original => Value::Str(self.original_text.clone()),
            Placeholder::Start => self.start.clone(),
            Placeholder::Previous => self.previous_value.clone(),
            Placeholder::AfterExpression => self.value_after_expression.clone(),
            Placeholder::Step => self.step.clone(),
            Placeholder::Selections => Value::Number(self.number_of_selections as f64),
            Placeholder::Index => Value::Number(self.current_index as f64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_moves_after_value_to_previous() {
        let mut values = ReplacementValues::new(Value::Number(1.0), Value::Number(1.0), 3);
        values.advance(0, "x");
        values.set_current(Value::Number(1.0));
        values.set_after_expression(Value::Number(10.0));

        values.advance(1, "y");
        assert_eq!(values.lookup(Placeholder::Previous), Value::Number(10.0));
        assert_eq!(values.lookup(Placeholder::Current), Value::Undefined);
        assert_eq!(values.lookup(Placeholder::Original), Value::Str("y".into()));
        assert_eq!(values.lookup(Placeholder::Index), Value::Number(1.0));
        assert_eq!(values.lookup(Placeholder::Selections), Value::Number(3.0));
    }

    #[test]
    fn placeholder_letters_ignore_case() {
        assert_eq!(Placeholder::from_char('I'), Some(Placeholder::Index));
        assert_eq!(Placeholder::from_char('_'), Some(Placeholder::Current));
        assert_eq!(Placeholder::from_char('x'), None);
    }
}

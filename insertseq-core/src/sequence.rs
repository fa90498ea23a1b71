//! Sequence preparation and emission
//!
//! [`Sequence::prepare`] runs the whole front end once (classification,
//! modifier extraction, generator factory); the caller then asks for one
//! [`Emission`] per index and stops at the first stop flag.

use crate::context::GenerationContext;
use crate::error::GenerateError;
use crate::generators::alpha::{AlphaGenerator, Alphabet};
use crate::generators::date::DateGenerator;
use crate::generators::decimal::DecimalGenerator;
use crate::generators::function::FunctionGenerator;
use crate::generators::own_list::OwnListGenerator;
use crate::generators::predefined::PredefinedGenerator;
use crate::generators::text::{ExpressionGenerator, TextSelectedGenerator};
use crate::generators::{Emission, InvalidGenerator, SequenceGenerator};
use crate::grammar::{classify, SequenceKind, StartToken};
use crate::modifiers::{extract, Modifiers};

/// One generator per kind.
#[derive(Debug)]
enum Generator {
    Decimal(DecimalGenerator),
    Alpha(AlphaGenerator),
    Date(DateGenerator),
    Expression(ExpressionGenerator),
    OwnList(OwnListGenerator),
    Predefined(PredefinedGenerator),
    Function(FunctionGenerator),
    TextSelected(TextSelectedGenerator),
    Invalid(InvalidGenerator),
}

impl Generator {
    fn as_dyn(&mut self) -> &mut dyn SequenceGenerator {
        match self {
            Generator::Decimal(g) => g,
            Generator::Alpha(g) => g,
            Generator::Date(g) => g,
            Generator::Expression(g) => g,
            Generator::OwnList(g) => g,
            Generator::Predefined(g) => g,
            Generator::Function(g) => g,
            Generator::TextSelected(g) => g,
            Generator::Invalid(g) => g,
        }
    }
}

/// A prepared sequence bound to its invocation context.
#[derive(Debug)]
pub struct Sequence<'ctx> {
    ctx: &'ctx GenerationContext,
    kind: SequenceKind,
    modifiers: Modifiers,
    generator: Generator,
}

impl<'ctx> Sequence<'ctx> {
    /// Classify `input`, extract its modifiers and build the generator.
    ///
    /// Only a broken alphabet is an error; everything else degrades and is
    /// recorded in the context's diagnostics.
    pub fn prepare(input: &str, ctx: &'ctx GenerationContext) -> Result<Self, GenerateError> {
        let classified = classify(input, ctx.segments(), &ctx.settings().start);
        let modifiers = extract(&classified.remainder, ctx);
        ctx.diagnostics().debug(format!(
            "'{input}' classified as {:?} with {modifiers:?}",
            classified.kind()
        ));

        let (kind, generator) = match classified.start {
            StartToken::Decimal(start) => (
                SequenceKind::Decimal(start.radix),
                Generator::Decimal(DecimalGenerator::new(start, &modifiers, ctx)),
            ),
            StartToken::Alpha(start) => {
                let alphabet = Alphabet::new(&ctx.settings().alphabet)?;
                if alphabet.spells(&start.word) {
                    (
                        SequenceKind::Alpha,
                        Generator::Alpha(AlphaGenerator::new(alphabet, start.word, &modifiers, ctx)),
                    )
                } else {
                    ctx.diagnostics().debug(format!(
                        "'{}' is not spelled by the alphabet, using the selected text",
                        start.word
                    ));
                    text_selected(&modifiers, ctx)
                }
            }
            StartToken::Date(start) => (
                SequenceKind::Date,
                Generator::Date(DateGenerator::new(&start, &modifiers, ctx)),
            ),
            StartToken::Expression(source) => (
                SequenceKind::Expression,
                Generator::Expression(ExpressionGenerator::new(source, &modifiers, ctx)),
            ),
            StartToken::OwnList(start) => (
                SequenceKind::OwnList,
                Generator::OwnList(OwnListGenerator::new(start, &modifiers, ctx)),
            ),
            StartToken::Predefined(start) => (
                SequenceKind::PredefinedList,
                Generator::Predefined(PredefinedGenerator::new(&start.selector, &modifiers, ctx)),
            ),
            StartToken::Function(start) => (
                SequenceKind::Function,
                Generator::Function(FunctionGenerator::new(&start, &modifiers, ctx)),
            ),
            StartToken::TextSelected => text_selected(&modifiers, ctx),
            StartToken::Invalid(reason) => {
                ctx.diagnostics()
                    .warn(format!("'{input}' is not a valid sequence: {reason}"));
                (SequenceKind::Invalid, Generator::Invalid(InvalidGenerator))
            }
        };

        Ok(Self {
            ctx,
            kind,
            modifiers,
            generator,
        })
    }

    pub fn kind(&self) -> SequenceKind {
        self.kind
    }

    pub fn modifiers(&self) -> &Modifiers {
        &self.modifiers
    }

    /// Text and stop flag for `index`. Indices are expected in order from 0.
    pub fn emit(&mut self, index: u64) -> Emission {
        self.generator.as_dyn().generate(index, self.ctx)
    }

    /// Emit from index 0 until the first stop flag, or `cap` values.
    pub fn collect(&mut self, cap: usize) -> Vec<String> {
        let mut values = Vec::new();
        for index in 0..cap as u64 {
            let emission = self.emit(index);
            if emission.stop {
                break;
            }
            values.push(emission.text);
        }
        if values.len() == cap {
            self.ctx
                .diagnostics()
                .debug(format!("stopped at the cap of {cap} values"));
        }
        values
    }
}

fn text_selected(modifiers: &Modifiers, ctx: &GenerationContext) -> (SequenceKind, Generator) {
    (
        SequenceKind::TextSelected,
        Generator::TextSelected(TextSelectedGenerator::new(modifiers, ctx)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Radix;
    use crate::settings::Settings;

    fn ctx(count: usize) -> GenerationContext {
        GenerationContext::new(vec![String::new(); count], Settings::default())
    }

    #[test]
    fn emits_exactly_one_value_per_selection() {
        let ctx = ctx(4);
        let mut sequence = Sequence::prepare("10 -2", &ctx).unwrap();
        assert_eq!(sequence.kind(), SequenceKind::Decimal(Radix::Decimal));
        assert_eq!(sequence.collect(100), vec!["10", "8", "6", "4"]);
    }

    #[test]
    fn stop_expression_replaces_the_selection_count() {
        let ctx = ctx(1);
        let mut sequence = Sequence::prepare("1 @'i >= 4'", &ctx).unwrap();
        assert_eq!(sequence.collect(100), vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn cap_bounds_endless_sequences() {
        let ctx = ctx(1);
        let mut sequence = Sequence::prepare("1 @false", &ctx).unwrap();
        assert_eq!(sequence.collect(3).len(), 3);
    }

    #[test]
    fn broken_alphabet_is_an_error() {
        let settings = Settings {
            alphabet: "abca".into(),
            ..Settings::default()
        };
        let ctx = GenerationContext::new(vec![String::new()], settings);
        assert_eq!(
            Sequence::prepare("b", &ctx).unwrap_err(),
            GenerateError::DuplicateAlphabetCharacter('a')
        );
        assert!(Sequence::prepare("5", &ctx).is_ok());
    }

    #[test]
    fn word_outside_the_alphabet_passes_text_through() {
        let settings = Settings {
            alphabet: "abc".into(),
            ..Settings::default()
        };
        let ctx = GenerationContext::new(vec!["kept".into()], settings);
        let mut sequence = Sequence::prepare("xyz", &ctx).unwrap();
        assert_eq!(sequence.kind(), SequenceKind::TextSelected);
        assert_eq!(sequence.collect(10), vec!["kept"]);
    }

    #[test]
    fn invalid_input_emits_nothing_and_warns() {
        let ctx = ctx(2);
        let mut sequence = Sequence::prepare("%abc", &ctx).unwrap();
        assert_eq!(sequence.kind(), SequenceKind::Invalid);
        assert!(sequence.collect(10).is_empty());
        assert_eq!(ctx.diagnostics().warnings().len(), 1);
    }

    #[test]
    fn modifiers_are_exposed() {
        let ctx = ctx(1);
        let sequence = Sequence::prepare("3 steps:2 *4 #5", &ctx).unwrap();
        let modifiers = sequence.modifiers();
        assert_eq!(modifiers.step, 2.0);
        assert_eq!(modifiers.frequency, 4);
        assert_eq!(modifiers.repetition, Some(5));
    }
}

//! Decimal (and binary, octal, hex) sequences

use super::{pick_format, Emission, ExpressionHooks, SequenceGenerator};
use crate::context::GenerationContext;
use crate::folding::Folding;
use crate::format::format_number;
use crate::grammar::{DecimalStart, Radix, RandomSpec};
use crate::modifiers::Modifiers;
use crate::sandbox::{format_js_number, Value};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug)]
pub struct DecimalGenerator {
    start: DecimalStart,
    folding: Folding,
    format: Option<String>,
    radix_prefix: bool,
    rng: StdRng,
    hooks: ExpressionHooks,
}

impl DecimalGenerator {
    pub fn new(start: DecimalStart, modifiers: &Modifiers, ctx: &GenerationContext) -> Self {
        let settings = ctx.settings();
        Self {
            folding: modifiers.folding(),
            format: pick_format(modifiers.format.as_deref(), &settings.number_format),
            radix_prefix: settings.radix_prefix,
            rng: StdRng::seed_from_u64(rand::random()),
            hooks: ExpressionHooks::new(modifiers, Value::Number(start.value), ctx),
            start,
        }
    }

    /// Use a fixed seed for random draws.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    fn value_at(&mut self, index: u64) -> f64 {
        match &self.start.random {
            Some(random) => draw(&mut self.rng, self.start.value, random),
            None => self.start.value + self.folding.logical_index(index),
        }
    }

    /// Decimal places the output keeps.
    fn precision(&self) -> Option<usize> {
        match (&self.start.random, self.start.precision) {
            (Some(random), precision) if random.precision > 0 => {
                Some(precision.unwrap_or(0).max(random.precision))
            }
            (_, precision) => precision,
        }
    }

    fn render(&self, value: f64) -> String {
        if let Some(format) = &self.format {
            return format_number(value, format);
        }
        if !value.is_finite() {
            return format_js_number(value);
        }
        let sign = if value < 0.0 { "-" } else { "" };
        let magnitude = value.abs();

        if self.start.radix != Radix::Decimal {
            let digits = radix_digits(magnitude.round() as u64, self.start.radix, self.start.uppercase);
            let digits = self.lead_pad(digits);
            let prefix = if self.radix_prefix {
                self.start.radix.prefix()
            } else {
                ""
            };
            return format!("{sign}{prefix}{digits}");
        }

        let text = match self.precision() {
            Some(precision) => format!("{magnitude:.precision$}"),
            None => format_js_number(magnitude),
        };
        let text = match text.split_once('.') {
            Some((int, frac)) => format!("{}.{frac}", self.lead_pad(int.to_string())),
            None if !text.contains('e') => self.lead_pad(text),
            None => text,
        };
        if text.chars().all(|c| c == '0' || c == '.') {
            text
        } else {
            format!("{sign}{text}")
        }
    }

    fn lead_pad(&self, digits: String) -> String {
        match self.start.lead_width {
            Some(width) if digits.len() < width => format!("{digits:0>width$}"),
            _ => digits,
        }
    }
}

impl SequenceGenerator for DecimalGenerator {
    fn generate(&mut self, index: u64, ctx: &GenerationContext) -> Emission {
        self.hooks.begin(index, ctx);
        let computed = self.value_at(index);
        let value = self
            .hooks
            .evaluate(Value::Number(computed), ctx)
            .and_then(|result| result.as_finite_number())
            .unwrap_or(computed);
        self.hooks.settle(Value::Number(value));
        let text = self.render(value);
        Emission::new(text, self.hooks.should_stop(index, ctx))
    }
}

/// Uniform draw between the start and start plus or minus the magnitude,
/// rounded to the magnitude's decimal places.
fn draw(rng: &mut StdRng, start: f64, random: &RandomSpec) -> f64 {
    let end = if random.negative {
        start - random.magnitude
    } else {
        start + random.magnitude
    };
    let (low, high) = if start <= end { (start, end) } else { (end, start) };
    let scale = 10f64.powi(random.precision as i32);
    if random.precision == 0 {
        return rng.random_range(low.round() as i64..=high.round() as i64) as f64;
    }
    let drawn: f64 = rng.random_range(low..=high);
    ((drawn * scale).round() / scale).clamp(low, high)
}

fn radix_digits(mut n: u64, radix: Radix, uppercase: bool) -> String {
    let base = u64::from(radix.base());
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        let c = char::from_digit((n % base) as u32, radix.base()).unwrap_or('0');
        digits.push(if uppercase { c.to_ascii_uppercase() } else { c });
        n /= base;
    }
    digits.iter().rev().collect()
}

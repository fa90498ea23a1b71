//! Date sequences

use super::{pick_format, Emission, ExpressionHooks, SequenceGenerator};
use crate::context::GenerationContext;
use crate::folding::Folding;
use crate::format::{format_date, parse_date_text};
use crate::grammar::DateStart;
use crate::modifiers::Modifiers;
use crate::sandbox::Value;
use crate::settings::DateUnit;
use chrono::{Datelike, Duration, Local, Months, NaiveDate, NaiveDateTime};

const ISO_FORMAT: &str = "yyyy-MM-dd";

#[derive(Debug)]
pub struct DateGenerator {
    start: NaiveDateTime,
    unit: DateUnit,
    folding: Folding,
    format: String,
    language: String,
    hooks: ExpressionHooks,
}

impl DateGenerator {
    pub fn new(start: &DateStart, modifiers: &Modifiers, ctx: &GenerationContext) -> Self {
        Self::with_today(start, modifiers, ctx, Local::now().naive_local())
    }

    /// Build with an explicit "now" for missing start components.
    pub fn with_today(
        start: &DateStart,
        modifiers: &Modifiers,
        ctx: &GenerationContext,
        now: NaiveDateTime,
    ) -> Self {
        let settings = ctx.settings();
        let start = resolve_start(start, &settings.century, now);
        Self {
            hooks: ExpressionHooks::new(
                modifiers,
                Value::Str(format_date(&start, ISO_FORMAT, "en")),
                ctx,
            ),
            start,
            unit: modifiers.date_unit.unwrap_or(settings.date_unit),
            folding: modifiers.folding(),
            format: pick_format(modifiers.format.as_deref(), &settings.date_format)
                .unwrap_or_else(|| ISO_FORMAT.to_string()),
            language: settings.language.clone(),
        }
    }

    fn date_at(&self, index: u64) -> NaiveDateTime {
        let steps = self.folding.logical_index(index).round() as i64;
        shift(self.start, steps, self.unit).unwrap_or(self.start)
    }
}

impl SequenceGenerator for DateGenerator {
    fn generate(&mut self, index: u64, ctx: &GenerationContext) -> Emission {
        self.hooks.begin(index, ctx);
        let computed = self.date_at(index);
        let current = Value::Str(format_date(&computed, ISO_FORMAT, "en"));
        let date = match self.hooks.evaluate(current, ctx) {
            Some(Value::Str(text)) => parse_date_text(&text).unwrap_or_else(|| {
                ctx.diagnostics()
                    .debug(format!("expression result '{text}' is not a date"));
                computed
            }),
            _ => computed,
        };
        self.hooks
            .settle(Value::Str(format_date(&date, ISO_FORMAT, "en")));
        let text = format_date(&date, &self.format, &self.language);
        Emission::new(text, self.hooks.should_stop(index, ctx))
    }
}

/// Fill missing components from `now`. Without any component the current
/// time is kept; otherwise the date starts at midnight.
fn resolve_start(start: &DateStart, century: &str, now: NaiveDateTime) -> NaiveDateTime {
    if start.year.is_none() && start.month.is_none() && start.day.is_none() {
        return now;
    }
    let year = start
        .year
        .as_deref()
        .and_then(|digits| {
            if digits.len() == 2 {
                format!("{century}{digits}").parse().ok()
            } else {
                digits.parse().ok()
            }
        })
        .unwrap_or(now.year());
    let month = start.month.filter(|m| (1..=12).contains(m)).unwrap_or(now.month());
    let day = start.day.unwrap_or(now.day()).max(1);

    let date = NaiveDate::from_ymd_opt(year, month, day.min(days_in_month(year, month)))
        .unwrap_or(now.date());
    date.and_hms_opt(0, 0, 0).unwrap_or(now)
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next.and_then(|first| first.pred_opt())
        .map_or(31, |last| last.day())
}

/// Move `date` by `steps` units; month and year steps clamp to month end.
fn shift(date: NaiveDateTime, steps: i64, unit: DateUnit) -> Option<NaiveDateTime> {
    let months = |n: i64| -> Option<NaiveDateTime> {
        let count = Months::new(u32::try_from(n.unsigned_abs()).ok()?);
        if n >= 0 {
            date.checked_add_months(count)
        } else {
            date.checked_sub_months(count)
        }
    };
    match unit {
        DateUnit::Day => date.checked_add_signed(Duration::try_days(steps)?),
        DateUnit::Week => date.checked_add_signed(Duration::try_weeks(steps)?),
        DateUnit::Month => months(steps),
        DateUnit::Year => months(steps.checked_mul(12)?),
    }
}

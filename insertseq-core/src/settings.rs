//! Configuration snapshot read by the generators.
//!
//! The host decides where settings come from (the `insertseq-config` crate
//! layers TOML files, an editor would read its own settings store). The core
//! only ever sees this plain struct, cloned once per invocation, so a single
//! run is deterministic even if the host's configuration changes mid-flight.
//!
//! Field names deserialize from camelCase (the editor-facing spelling) and also
//! accept snake_case aliases, which is what the TOML defaults use.

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Start value used when the input has no start token
    pub start: String,
    pub step: f64,
    pub frequency: u64,
    /// `None` means unbounded
    pub repetition: Option<u64>,
    /// `None` means unbounded
    pub startover: Option<u64>,
    #[serde(alias = "number_format")]
    pub number_format: String,
    #[serde(alias = "string_format")]
    pub string_format: String,
    #[serde(alias = "date_format")]
    pub date_format: String,
    #[serde(rename = "date_unit", alias = "dateUnit")]
    pub date_unit: DateUnit,
    /// Prefix for two-digit years
    pub century: String,
    /// Language used for month names
    pub language: String,
    pub alphabet: String,
    #[serde(alias = "alpha_capital")]
    pub alpha_capital: Capitalization,
    #[serde(alias = "radix_prefix")]
    pub radix_prefix: bool,
    pub mysequences: Vec<Vec<String>>,
    pub myfunctions: Vec<FunctionSource>,
    #[serde(alias = "default_function_nr")]
    pub default_function_nr: usize,
    #[serde(alias = "eval_timeout_ms")]
    pub eval_timeout_ms: u64,
    pub debug: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            start: "1".to_string(),
            step: 1.0,
            frequency: 1,
            repetition: None,
            startover: None,
            number_format: String::new(),
            string_format: String::new(),
            date_format: "yyyy-MM-dd".to_string(),
            date_unit: DateUnit::Day,
            century: "20".to_string(),
            language: "en".to_string(),
            alphabet: "abcdefghijklmnopqrstuvwxyz".to_string(),
            alpha_capital: Capitalization::Preserve,
            radix_prefix: false,
            mysequences: Vec::new(),
            myfunctions: Vec::new(),
            default_function_nr: 1,
            eval_timeout_ms: 1000,
            debug: false,
        }
    }
}

/// Calendar unit a date step is applied in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateUnit {
    #[default]
    #[serde(alias = "d", alias = "days")]
    Day,
    #[serde(alias = "w", alias = "weeks")]
    Week,
    #[serde(alias = "m", alias = "months")]
    Month,
    #[serde(alias = "y", alias = "years")]
    Year,
}

impl DateUnit {
    /// Parse the one-letter suffix used on step values (`2w`, `-1m`).
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "d" | "D" => Some(DateUnit::Day),
            "w" | "W" => Some(DateUnit::Week),
            "m" | "M" => Some(DateUnit::Month),
            "y" | "Y" => Some(DateUnit::Year),
            _ => None,
        }
    }
}

/// Capitalization policy for alphabetic sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capitalization {
    Upper,
    Lower,
    Pascal,
    #[default]
    Preserve,
}

/// A user function, either as raw source or wrapped as `{ code = "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FunctionSource {
    Raw(String),
    Wrapped { code: String },
}

impl FunctionSource {
    pub fn code(&self) -> &str {
        match self {
            FunctionSource::Raw(code) => code,
            FunctionSource::Wrapped { code } => code,
        }
    }
}

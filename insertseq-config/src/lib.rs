//! Settings sources for insertseq
//!
//! Layers, lowest first: the embedded `defaults/insertseq.default.toml`, TOML
//! files in the order they were added, then single-key overrides. Tables merge
//! key by key; arrays such as `mysequences` are replaced whole by a higher
//! layer. [`Loader::build`] yields the core's [`Settings`] snapshot.
//!
//! Keys are snake_case. Overrides also accept the camelCase spelling used by
//! editor settings (`numberFormat` is the same key as `number_format`).

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use insertseq_core::Settings;
use std::path::Path;

pub use config::ConfigError as Error;

const DEFAULT_TOML: &str = include_str!("../defaults/insertseq.default.toml");

/// Stack of settings sources, resolved by [`Loader::build`].
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Only the embedded defaults.
    pub fn new() -> Self {
        Self {
            builder: Config::builder()
                .add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml)),
        }
    }

    /// Add a TOML file that must exist; `build` fails otherwise.
    pub fn with_file(self, path: impl AsRef<Path>) -> Self {
        self.layer_toml(path.as_ref(), true)
    }

    /// Add a TOML file that is skipped when absent, e.g. a per-user file.
    pub fn with_optional_file(self, path: impl AsRef<Path>) -> Self {
        self.layer_toml(path.as_ref(), false)
    }

    fn layer_toml(mut self, path: &Path, required: bool) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path).format(FileFormat::Toml).required(required));
        self
    }

    /// Set one key above every file layer. camelCase keys are accepted.
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(normalize_key(key), value)?;
        Ok(self)
    }

    /// Merge the layers into a [`Settings`] snapshot.
    pub fn build(self) -> Result<Settings, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Settings from the embedded defaults alone.
pub fn load_defaults() -> Result<Settings, ConfigError> {
    Loader::new().build()
}

/// `numberFormat` -> `number_format`; snake_case keys pass through.
pub fn normalize_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.trim().chars() {
        if c.is_ascii_uppercase() {
            if !out.is_empty() {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use insertseq_core::{Capitalization, DateUnit, FunctionSource};
    use std::io::Write;

    #[test]
    fn loads_default_config() {
        let settings = load_defaults().expect("defaults to deserialize");
        assert_eq!(settings.start, "1");
        assert_eq!(settings.step, 1.0);
        assert_eq!(settings.repetition, None);
        assert_eq!(settings.date_unit, DateUnit::Day);
        assert_eq!(settings.alpha_capital, Capitalization::Preserve);
        assert_eq!(settings.mysequences.len(), 4);
        assert_eq!(settings.mysequences[2][0], "Mon");
        assert!(matches!(settings.myfunctions[1], FunctionSource::Wrapped { .. }));
        assert_eq!(settings.eval_timeout_ms, 1000);
    }

    #[test]
    fn defaults_match_the_core_defaults() {
        let loaded = load_defaults().expect("defaults to deserialize");
        let core = Settings::default();
        assert_eq!(loaded.number_format, core.number_format);
        assert_eq!(loaded.date_format, core.date_format);
        assert_eq!(loaded.alphabet, core.alphabet);
        assert_eq!(loaded.century, core.century);
        assert_eq!(loaded.default_function_nr, core.default_function_nr);
    }

    #[test]
    fn supports_overrides() {
        let settings = Loader::new()
            .set_override("date_unit", "month")
            .expect("override to apply")
            .set_override("numberFormat", "03d")
            .expect("override to apply")
            .set_override("repetition", 3)
            .expect("override to apply")
            .build()
            .expect("config to build");
        assert_eq!(settings.date_unit, DateUnit::Month);
        assert_eq!(settings.number_format, "03d");
        assert_eq!(settings.repetition, Some(3));
    }

    #[test]
    fn user_file_layers_over_defaults() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("temp file");
        writeln!(
            file,
            "language = \"de\"\nalphabet = \"xyz\"\nmysequences = [[\"rot\", \"gelb\"]]"
        )
        .expect("write config");

        let settings = Loader::new()
            .with_file(file.path())
            .build()
            .expect("config to build");
        assert_eq!(settings.language, "de");
        assert_eq!(settings.alphabet, "xyz");
        assert_eq!(settings.mysequences, vec![vec!["rot".to_string(), "gelb".to_string()]]);
        assert_eq!(settings.date_format, "yyyy-MM-dd");
    }

    #[test]
    fn missing_files() {
        assert!(Loader::new()
            .with_file("/definitely/not/here.toml")
            .build()
            .is_err());
        assert!(Loader::new()
            .with_optional_file("/definitely/not/here.toml")
            .build()
            .is_ok());
    }

    #[test]
    fn camel_case_keys_normalize() {
        assert_eq!(normalize_key("numberFormat"), "number_format");
        assert_eq!(normalize_key("defaultFunctionNr"), "default_function_nr");
        assert_eq!(normalize_key("radix_prefix"), "radix_prefix");
    }
}

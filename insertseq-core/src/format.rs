//! Formatting mini-languages
//!
//! - [`number`]: `[[fill]align][sign][#][0][width][,|_][.precision][type]`
//! - [`string`]: `[[fill]align]width[w][lr]`
//! - [`date`]: token templates such as `dd.MM.yyyy HH:mm`
//!
//! A spec that does not parse leaves the value unchanged; formatting never
//! fails.

pub mod date;
pub mod number;
pub mod string;

pub use date::{format_date, format_date_str, parse_date_text};
pub use number::{format_number, NumberFormat};
pub use string::pad_string;

//! # insertseq-core
//!
//! Interpreter for the insertseq sequence notation: one line such as
//! `5 steps:2 ~03d` or `%2025-01-31 step:1m` turns into a formatted value for
//! every insertion point.
//!
//! Flow
//!
//!   input line + selections + [`Settings`]
//!     -> [`GenerationContext`]   (compiles the segment grammar, holds diagnostics)
//!     -> [`Sequence::prepare`]   (classify, extract modifiers, build the generator)
//!     -> [`Sequence::emit`]      (one [`Emission`] per index, caller stops at `stop`)
//!
//! Layout
//!
//!   grammar      segment table, literal masking, classifier, list literals
//!   modifiers    step / format / frequency / repetition / startover / expressions
//!   folding      index folding shared by the stepping kinds
//!   generators   one generator per sequence kind
//!   format       number, string-pad and date-token formatting
//!   sandbox      the expression language (lexer, parser, machine)
//!   substitute   placeholder letters rewritten before evaluation
//!   values       per-index replacement values

pub mod context;
pub mod error;
pub mod folding;
pub mod format;
pub mod generators;
pub mod grammar;
pub mod modifiers;
pub mod sandbox;
pub mod sequence;
pub mod settings;
pub mod substitute;
pub mod values;

pub use context::{Diagnostic, Diagnostics, GenerationContext, Severity};
pub use error::{EvalError, GenerateError};
pub use format::{format_date, format_date_str, format_number, pad_string};
pub use generators::Emission;
pub use grammar::{Radix, SequenceKind};
pub use sandbox::{Sandbox, Value};
pub use sequence::Sequence;
pub use settings::{Capitalization, DateUnit, FunctionSource, Settings};

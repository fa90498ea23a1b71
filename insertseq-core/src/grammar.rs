//! Grammar for the sequence notation
//!
//! An input line consists of a start token followed by modifiers:
//!
//! ```text
//!   <prefix?><start> <modifier>*
//!   5 steps:2 *3            decimal start 5, step 2, each value three times
//!   %2025-01-31 step:1m     date, one month apart
//!   [north; south; "far east"] #2
//!   ;mon ?i                 predefined list search, ignore case
//! ```
//!
//! The grammar is data: named segments in [`segments`] reference each other with
//! `{{name}}` and are resolved in dependency order into compiled regexes. The
//! classifier in [`classify`] runs the prefix rules in order and hands the start
//! token to the kind-specific body segment, producing a typed [`StartToken`].
//!
//! Quoted and bracketed text is masked before any of this (see [`mask`]) so
//! characters inside literals never look like syntax.

pub mod classify;
pub mod list;
pub mod mask;
pub mod segments;

pub use classify::{
    classify, AlphaStart, Classified, DateStart, DecimalStart, FunctionStart, ListSelector,
    OwnListStart, PredefinedStart, Radix, RandomSpec, SequenceKind, StartToken,
};
pub use mask::mask_literals;
pub use segments::SegmentTable;

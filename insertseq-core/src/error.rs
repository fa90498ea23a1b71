//! Error types for sequence preparation and expression evaluation

use thiserror::Error;

/// Errors surfaced to the caller while preparing a sequence.
///
/// Everything else (bad modifiers, failing expressions, unparseable formats)
/// degrades to a default value and is only recorded in the diagnostics.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerateError {
    /// The configured alphabet lists a character twice
    #[error("alphabet contains duplicate character '{0}'")]
    DuplicateAlphabetCharacter(char),

    /// The configured alphabet has no characters at all
    #[error("alphabet is empty")]
    EmptyAlphabet,
}

/// Faults raised by the sandboxed evaluator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// Source could not be tokenized or parsed
    #[error("syntax error: {0}")]
    Syntax(String),

    /// Evaluation failed (unknown name, bad call, ...)
    #[error("runtime error: {0}")]
    Runtime(String),

    /// The wall-clock budget ran out
    #[error("evaluation exceeded {budget_ms} ms")]
    Timeout { budget_ms: u64 },

    /// The step budget ran out
    #[error("evaluation exceeded {steps} steps")]
    FuelExhausted { steps: u64 },

    /// Too many nested calls or evaluation levels
    #[error("recursion depth exceeded {0}")]
    RecursionLimit(usize),
}

impl EvalError {
    /// Whether the fault means the budget was used up; such faults abort
    /// every remaining evaluation strategy.
    pub fn is_budget(&self) -> bool {
        matches!(
            self,
            EvalError::Timeout { .. } | EvalError::FuelExhausted { .. }
        )
    }
}

pub type EvalResult<T> = Result<T, EvalError>;

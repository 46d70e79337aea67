//! # Error Types
//!
//! Two layers of errors:
//! - [`ExprError`]: failures inside the expression evaluator (syntax, types, arithmetic)
//! - [`DetectError`]: the classification pipeline taxonomy (missing field,
//!   placeholder value, evaluation, shape) plus export failures
//!
//! All errors propagate immediately; nothing in the core retries or suppresses them.

use thiserror::Error;

/// Result alias for pipeline operations.
pub type Result<T> = std::result::Result<T, DetectError>;

/// Errors raised while compiling or evaluating an expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExprError {
    /// The expression text is not well formed.
    #[error("syntax error at byte {offset}: {message}")]
    Syntax { offset: usize, message: String },

    /// A path resolved to neither a scope variable nor a size category.
    #[error("unknown identifier `{0}`")]
    UnknownIdentifier(String),

    /// An operand had the wrong type for its operator, or the result had
    /// the wrong type for its consumer.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// Checked integer arithmetic overflowed.
    #[error("integer overflow")]
    Overflow,

    /// Division or remainder by zero.
    #[error("division by zero")]
    DivisionByZero,
}

/// Errors raised by the size calculator, filter engine and exporter.
#[derive(Debug, Error)]
pub enum DetectError {
    /// A named element is absent from the loaded model.
    #[error("{0} not found")]
    MissingField(String),

    /// One or more selections are still at the placeholder weight (0).
    #[error("the following fields are still set to TBD: {}", .0.join(", "))]
    Placeholder(Vec<String>),

    /// An expression failed to compile or to reduce to the expected type.
    #[error("failed to evaluate {subject}: {source}")]
    Evaluation {
        subject: String,
        #[source]
        source: ExprError,
    },

    /// A value in the model has the wrong form (unknown option, non-numeric weight).
    #[error("invalid value for {subject}: {reason}")]
    InvalidValue { subject: String, reason: String },

    /// A record carries zero or several applicability predicates.
    #[error("{record} has {count} applicability predicates, expected 1")]
    Shape { record: String, count: usize },

    /// No size rule held for the computed number.
    #[error("no size rule matched system size number {0}")]
    NoMatchingSize(i64),

    /// CSV serialization failed.
    #[error("CSV export failed: {0}")]
    Export(#[from] csv::Error),
}

impl DetectError {
    /// Wrap an expression error with the element it was evaluated for.
    pub fn evaluation(subject: impl Into<String>, source: ExprError) -> Self {
        Self::Evaluation {
            subject: subject.into(),
            source,
        }
    }

    /// Build an invalid-value error.
    pub fn invalid(subject: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            subject: subject.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_message_names_every_field() {
        let err = DetectError::Placeholder(vec!["project_status".into(), "team_size".into()]);
        assert_eq!(
            err.to_string(),
            "the following fields are still set to TBD: project_status, team_size"
        );
    }

    #[test]
    fn evaluation_message_includes_source() {
        let err = DetectError::evaluation("size rule for Small", ExprError::DivisionByZero);
        assert_eq!(
            err.to_string(),
            "failed to evaluate size rule for Small: division by zero"
        );
    }
}

use std::fmt;
use thiserror::Error;

/// Precondition failures of the aggregator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregateError {
    /// Payload requested before the outcome is known
    #[error("Result is still pending")]
    StillPending,

    /// Outcome was already recorded; the first one stands
    #[error("Result was already resolved")]
    AlreadyResolved,
}

/// Result type alias for aggregator operations
pub type AggregateResult<T> = Result<T, AggregateError>;

/// Errors that carry a stable classification code
///
/// Implement this for errors routed into [`Subordinate::fail`](crate::Subordinate::fail)
/// or [`Aggregate::fail`](crate::Aggregate::fail) so that the payload gets a
/// meaningful `error_code`.
pub trait Classify: fmt::Display {
    fn code(&self) -> &str;
}

impl Classify for AggregateError {
    fn code(&self) -> &str {
        match self {
            AggregateError::StillPending => "StillPending",
            AggregateError::AlreadyResolved => "AlreadyResolved",
        }
    }
}

/// Human readable message plus classification code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub message: String,
    pub code: String,
}

impl ErrorReport {
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
        }
    }

    /// Build a report from a classified error (`Display` text and `code()`)
    pub fn from_classified<E: Classify + ?Sized>(err: &E) -> Self {
        Self::new(err.to_string(), err.code())
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

//! Usage errors raised when a caller breaks an API precondition.
//!
//! Domain failures never use this type; they live inside a failed
//! [`Outcome`](crate::Outcome) as [`Error`](crate::Error) values.

/// A precondition violated by the caller.
///
/// Panicking accessors (`value`, `as_t1`, `fail_many`, `with_tag`) panic with
/// this error's message; their `try_` twins return it instead.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    /// An argument was rejected (empty tag key, empty error list, ...).
    #[error("Invalid argument `{name}`: {reason}")]
    Argument {
        /// Name of the offending argument.
        name: &'static str,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The value was read in a state that does not hold it.
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl UsageError {
    pub(crate) fn argument(name: &'static str, reason: &'static str) -> Self {
        Self::Argument { name, reason }
    }

    pub(crate) fn inactive_branch(requested: usize, active: usize) -> Self {
        Self::InvalidState(format!(
            "branch T{requested} is not active (active branch is T{active})"
        ))
    }

    pub(crate) fn failed_value() -> Self {
        Self::InvalidState("value accessed on a failed outcome".into())
    }
}

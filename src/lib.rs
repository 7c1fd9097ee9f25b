#![deny(missing_docs)]

//! Railway: outcomes that carry their own explanation.
//!
//! # Design Goals
//!
//! - **Failures are values**: a failed [`Outcome`] holds at least one
//!   structured [`Error`]; nothing is thrown on the expected path
//! - **Short-circuiting pipelines**: `map`, `bind` and `ensure` skip their
//!   continuation once an outcome has failed
//! - **Closed unions**: [`OneOf2`], [`OneOf3`] and [`OneOf4`] hold exactly one
//!   of their declared types, with exhaustive `match_with`
//!
//! # Core Concepts
//!
//! - [`Reason`]: message plus ordered tags, specialised as [`Success`] and
//!   [`Error`]
//! - [`Outcome`]: success value or errors, with success annotations on both
//!   tracks
//! - [`OutcomeFutureExt`]: the same combinators chained on futures, with
//!   cancellable variants driven by a [`CancellationSignal`]
//!
//! ```
//! use railway::{Outcome, ReasonLike};
//!
//! let outcome = Outcome::ok("a@b.com".to_string())
//!     .ensure(|s| s.contains('@'), "Invalid email")
//!     .map(|s| s.len())
//!     .with_success("validated");
//!
//! assert_eq!(outcome.value(), &7);
//! assert_eq!(outcome.successes()[0].message(), "validated");
//! ```

// Modules
pub mod cancel;
pub mod classify;
pub mod error;
pub mod future;
mod macros;
pub mod one_of;
pub mod outcome;
pub mod reason;

// Re-exports for convenience
pub use cancel::{CancellationSignal, CancellationToken};
pub use classify::{BranchClass, BranchClassifier, TypeNameClassifier};
pub use error::UsageError;
pub use future::OutcomeFutureExt;
pub use one_of::{OneOf2, OneOf3, OneOf4};
pub use outcome::Outcome;
pub use reason::{Error, ErrorKind, Reason, ReasonLike, Success, TagValue, Tags, EXCEPTION_TAG};

#[cfg(test)]
mod tests;

//! The outcome container and its synchronous combinators.
//!
//! An [`Outcome`] is either a success holding a value, or a failure holding at
//! least one [`Error`]. Both tracks may carry [`Success`] annotations. Every
//! combinator consumes the receiver and returns a new outcome; once an outcome
//! has failed, every continuation is skipped until the failure is inspected.

use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::UsageError;
use crate::reason::{Error, ErrorKind, Success};

/// Convert a caught panic into an `Unexpected` error.
pub(crate) fn capture_panic(payload: Box<dyn Any + Send>) -> Error {
    let error = Error::from_panic(payload.as_ref());

    #[cfg(feature = "tracing")]
    tracing::warn!(error = %error, "outcome.panic_captured");

    error
}

// ============================================================================
// Outcome
// ============================================================================

/// Success with a value, or failure with one or more errors.
///
/// `Outcome<()>` is the value-less form. The success flag is derived:
/// an outcome is successful exactly when it holds no errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "RawOutcome<T>",
    bound(deserialize = "T: Deserialize<'de>")
)]
pub struct Outcome<T = ()> {
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<T>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    successes: Vec<Success>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<Error>,
}

/// Unchecked wire form, validated into an [`Outcome`].
#[derive(Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct RawOutcome<T> {
    #[serde(default = "none", deserialize_with = "present")]
    value: Option<T>,
    #[serde(default)]
    successes: Vec<Success>,
    #[serde(default)]
    errors: Vec<Error>,
}

fn none<T>() -> Option<T> {
    None
}

// A present `value` key always means a value, even when it is `null` (unit).
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl<T> TryFrom<RawOutcome<T>> for Outcome<T> {
    type Error = UsageError;

    fn try_from(raw: RawOutcome<T>) -> Result<Self, Self::Error> {
        match (&raw.value, raw.errors.is_empty()) {
            (None, true) => Err(UsageError::InvalidState(
                "successful outcome without a value".into(),
            )),
            (Some(_), false) => Err(UsageError::InvalidState(
                "failed outcome carrying a value".into(),
            )),
            _ => Ok(Self {
                value: raw.value,
                successes: raw.successes,
                errors: raw.errors,
            }),
        }
    }
}

impl<T> Outcome<T> {
    // ------------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------------

    /// A successful outcome holding `value`.
    pub fn ok(value: T) -> Self {
        Self {
            value: Some(value),
            successes: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// A failed outcome with a single error built from `message`.
    pub fn fail(message: impl Into<String>) -> Self {
        Self::fail_with(Error::new(message))
    }

    /// A failed outcome with a single error.
    pub fn fail_with(error: impl Into<Error>) -> Self {
        Self {
            value: None,
            successes: Vec::new(),
            errors: vec![error.into()],
        }
    }

    /// A failed outcome holding every error, in order.
    ///
    /// # Panics
    ///
    /// Panics if `errors` is empty.
    #[track_caller]
    pub fn fail_many<I>(errors: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Error>,
    {
        match Self::try_fail_many(errors) {
            Ok(outcome) => outcome,
            Err(e) => panic!("{e}"),
        }
    }

    /// Fallible form of [`fail_many`](Self::fail_many).
    pub fn try_fail_many<I>(errors: I) -> Result<Self, UsageError>
    where
        I: IntoIterator,
        I::Item: Into<Error>,
    {
        let errors: Vec<Error> = errors.into_iter().map(Into::into).collect();
        if errors.is_empty() {
            return Err(UsageError::argument(
                "errors",
                "a failure needs at least one error",
            ));
        }
        Ok(Self {
            value: None,
            successes: Vec::new(),
            errors,
        })
    }

    /// Combine many outcomes into one, accumulating every reason.
    ///
    /// The result succeeds with all values in order when no input failed;
    /// otherwise it fails with the errors of every failed input.
    pub fn merge<I>(outcomes: I) -> Outcome<Vec<T>>
    where
        I: IntoIterator<Item = Outcome<T>>,
    {
        let mut values = Vec::new();
        let mut successes = Vec::new();
        let mut errors = Vec::new();
        for outcome in outcomes {
            successes.extend(outcome.successes);
            errors.extend(outcome.errors);
            values.extend(outcome.value);
        }
        Outcome {
            value: errors.is_empty().then_some(values),
            successes,
            errors,
        }
    }

    // ------------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------------

    /// Returns `true` if the outcome holds no errors.
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns `true` if the outcome holds at least one error.
    pub fn is_failed(&self) -> bool {
        !self.is_success()
    }

    /// The success value.
    ///
    /// # Panics
    ///
    /// Panics if the outcome failed. Use [`try_value`](Self::try_value) when
    /// the state is not known.
    #[track_caller]
    pub fn value(&self) -> &T {
        match &self.value {
            Some(value) => value,
            None => panic!("{}", UsageError::failed_value()),
        }
    }

    /// The success value, or `None` if the outcome failed.
    pub fn try_value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Consume the outcome and return the success value.
    ///
    /// # Panics
    ///
    /// Panics if the outcome failed.
    #[track_caller]
    pub fn into_value(self) -> T {
        match self.value {
            Some(value) => value,
            None => panic!("{}", UsageError::failed_value()),
        }
    }

    /// Consume the outcome, keeping only the value if there is one.
    pub fn into_option(self) -> Option<T> {
        self.value
    }

    /// The value, or `default` if the outcome failed.
    pub fn value_or(self, default: T) -> T {
        self.value.unwrap_or(default)
    }

    /// The value, or one computed from the errors if the outcome failed.
    pub fn value_or_else(self, f: impl FnOnce(Vec<Error>) -> T) -> T {
        match self.value {
            Some(value) => value,
            None => f(self.errors),
        }
    }

    /// Success annotations in the order they were added.
    pub fn successes(&self) -> &[Success] {
        &self.successes
    }

    /// Errors in the order they were added. Empty on success.
    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    /// The first error, if the outcome failed.
    pub fn first_error(&self) -> Option<&Error> {
        self.errors.first()
    }

    /// Returns `true` if any error, or any nested cause, matches `pred`.
    pub fn has_error(&self, pred: impl Fn(&Error) -> bool) -> bool {
        fn walk(errors: &[Error], pred: &dyn Fn(&Error) -> bool) -> bool {
            errors.iter().any(|e| pred(e) || walk(e.causes(), pred))
        }
        walk(&self.errors, &pred)
    }

    /// Returns `true` if any error, or any nested cause, has `kind`.
    pub fn has_error_kind(&self, kind: ErrorKind) -> bool {
        self.has_error(|e| e.kind() == kind)
    }

    /// Returns `true` if any success annotation matches `pred`.
    pub fn has_success(&self, pred: impl Fn(&Success) -> bool) -> bool {
        self.successes.iter().any(pred)
    }

    /// Split into value, successes and errors.
    pub fn into_parts(self) -> (Option<T>, Vec<Success>, Vec<Error>) {
        (self.value, self.successes, self.errors)
    }

    /// Convert into a standard `Result`, dropping the success annotations.
    pub fn into_result(self) -> Result<T, Vec<Error>> {
        match self.value {
            Some(value) if self.errors.is_empty() => Ok(value),
            _ => Err(self.errors),
        }
    }

    // ------------------------------------------------------------------------
    // Reasons
    // ------------------------------------------------------------------------

    /// Append a success annotation. The outcome flag is unchanged.
    pub fn with_success(mut self, success: impl Into<Success>) -> Self {
        self.successes.push(success.into());
        self
    }

    /// Append several success annotations.
    pub fn with_successes<I>(mut self, successes: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Success>,
    {
        self.successes
            .extend(successes.into_iter().map(Into::into));
        self
    }

    /// Append an error. The outcome is failed afterwards, whatever it was.
    pub fn with_error(mut self, error: impl Into<Error>) -> Self {
        self.errors.push(error.into());
        self.value = None;
        self
    }

    /// Append several errors. Any appended error makes the outcome failed.
    pub fn with_errors<I>(mut self, errors: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Error>,
    {
        self.errors.extend(errors.into_iter().map(Into::into));
        if !self.errors.is_empty() {
            self.value = None;
        }
        self
    }

    /// Rewrite every error, keeping the outcome flag.
    pub fn map_errors(mut self, f: impl FnMut(Error) -> Error) -> Self {
        self.errors = self.errors.into_iter().map(f).collect();
        self
    }

    // ------------------------------------------------------------------------
    // Combinators
    // ------------------------------------------------------------------------

    /// Split a successful outcome for a continuation, or convert a failed one.
    pub(crate) fn split<U>(self) -> Result<(T, Vec<Success>), Outcome<U>> {
        match self.value {
            Some(value) if self.errors.is_empty() => Ok((value, self.successes)),
            _ => Err(Outcome {
                value: None,
                successes: self.successes,
                errors: self.errors,
            }),
        }
    }

    pub(crate) fn from_split(value: T, successes: Vec<Success>) -> Self {
        Self {
            value: Some(value),
            successes,
            errors: Vec::new(),
        }
    }

    pub(crate) fn failed_with(successes: Vec<Success>, error: Error) -> Self {
        Self {
            value: None,
            successes,
            errors: vec![error],
        }
    }

    /// Transform the success value. Reasons are carried over.
    ///
    /// `f` is never called on a failed outcome. A panic in `f` propagates;
    /// see [`try_map`](Self::try_map) for the catching variant.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self.split() {
            Ok((value, successes)) => Outcome::from_split(f(value), successes),
            Err(failed) => failed,
        }
    }

    /// Like [`map`](Self::map), but a panic in `f` becomes an
    /// [`ErrorKind::Unexpected`] error carrying the panic message.
    pub fn try_map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self.split() {
            Ok((value, successes)) => match catch_unwind(AssertUnwindSafe(|| f(value))) {
                Ok(mapped) => Outcome::from_split(mapped, successes),
                Err(payload) => Outcome::failed_with(successes, capture_panic(payload)),
            },
            Err(failed) => failed,
        }
    }

    /// Chain a step that itself returns an outcome.
    ///
    /// On success the continuation's outcome is returned as is: the
    /// receiver's success annotations are not merged into it. On failure `f`
    /// is never called and the reasons are carried into the new type.
    pub fn bind<U>(self, f: impl FnOnce(T) -> Outcome<U>) -> Outcome<U> {
        match self.split() {
            Ok((value, _)) => f(value),
            Err(failed) => failed,
        }
    }

    /// Like [`bind`](Self::bind), but a panic in `f` becomes a failed outcome
    /// holding only the captured [`ErrorKind::Unexpected`] error.
    pub fn try_bind<U>(self, f: impl FnOnce(T) -> Outcome<U>) -> Outcome<U> {
        match self.split() {
            Ok((value, _)) => catch_unwind(AssertUnwindSafe(|| f(value)))
                .unwrap_or_else(|payload| Outcome::fail_with(capture_panic(payload))),
            Err(failed) => failed,
        }
    }

    /// Fail with `error` unless the value satisfies `pred`.
    ///
    /// A failed outcome is returned unchanged without evaluating `pred`.
    pub fn ensure(self, pred: impl FnOnce(&T) -> bool, error: impl Into<Error>) -> Self {
        self.ensure_with(pred, |_| error.into())
    }

    /// Like [`ensure`](Self::ensure), building the error from the value.
    pub fn ensure_with(
        self,
        pred: impl FnOnce(&T) -> bool,
        error: impl FnOnce(&T) -> Error,
    ) -> Self {
        let rejected = match &self.value {
            Some(value) if self.errors.is_empty() => (!pred(value)).then(|| error(value)),
            _ => None,
        };
        match rejected {
            Some(error) => self.with_error(error),
            None => self,
        }
    }

    /// Run exactly one handler, chosen by the outcome.
    pub fn match_with<R>(
        self,
        on_success: impl FnOnce(T) -> R,
        on_failure: impl FnOnce(Vec<Error>) -> R,
    ) -> R {
        match self.split::<T>() {
            Ok((value, _)) => on_success(value),
            Err(failed) => on_failure(failed.errors),
        }
    }

    /// Borrowing form of [`match_with`](Self::match_with).
    pub fn match_ref<R>(
        &self,
        on_success: impl FnOnce(&T) -> R,
        on_failure: impl FnOnce(&[Error]) -> R,
    ) -> R {
        match &self.value {
            Some(value) if self.errors.is_empty() => on_success(value),
            _ => on_failure(&self.errors),
        }
    }

    /// Observe the value of a successful outcome.
    pub fn tap(self, f: impl FnOnce(&T)) -> Self {
        if let Some(value) = &self.value {
            f(value);
        }
        self
    }

    /// Observe the errors of a failed outcome.
    pub fn tap_error(self, f: impl FnOnce(&[Error])) -> Self {
        if self.is_failed() {
            f(&self.errors);
        }
        self
    }

    /// Replace the value of a successful outcome, keeping its reasons.
    pub fn with_value<U>(self, value: U) -> Outcome<U> {
        self.map(|_| value)
    }

    /// Drop the value, keeping the outcome and its reasons.
    pub fn discard(self) -> Outcome<()> {
        self.map(|_| ())
    }
}

impl Default for Outcome<()> {
    fn default() -> Self {
        Self::ok(())
    }
}

impl<T> FromIterator<Outcome<T>> for Outcome<Vec<T>> {
    fn from_iter<I: IntoIterator<Item = Outcome<T>>>(iter: I) -> Self {
        Outcome::merge(iter)
    }
}

impl<T, E: Into<Error>> From<Result<T, E>> for Outcome<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::ok(value),
            Err(error) => Self::fail_with(error),
        }
    }
}

impl<T> From<Error> for Outcome<T> {
    fn from(error: Error) -> Self {
        Self::fail_with(error)
    }
}

impl<T> fmt::Display for Outcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_success() {
            return f.write_str("Success");
        }
        f.write_str("Failure: ")?;
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            error.fmt(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reason::ReasonLike;

    #[test]
    fn ok_and_fail_flags() {
        let ok = Outcome::ok(1);
        assert!(ok.is_success());
        assert!(ok.errors().is_empty());
        assert_eq!(ok.value(), &1);

        let failed = Outcome::<i32>::fail("nope");
        assert!(failed.is_failed());
        assert_eq!(failed.errors().len(), 1);
        assert_eq!(failed.try_value(), None);
    }

    #[test]
    fn fail_many_keeps_order() {
        let outcome = Outcome::<()>::fail_many([Error::new("a"), Error::new("b")]);
        let messages: Vec<_> = outcome.errors().iter().map(|e| e.message()).collect();
        assert_eq!(messages, ["a", "b"]);
    }

    #[test]
    fn fail_many_rejects_empty() {
        let err = Outcome::<()>::try_fail_many(Vec::<Error>::new()).unwrap_err();
        assert!(matches!(err, UsageError::Argument { name: "errors", .. }));
    }

    #[test]
    #[should_panic(expected = "a failure needs at least one error")]
    fn fail_many_panics_on_empty() {
        let _ = Outcome::<()>::fail_many(Vec::<Error>::new());
    }

    #[test]
    #[should_panic(expected = "value accessed on a failed outcome")]
    fn value_on_failure_panics() {
        let outcome = Outcome::<u8>::fail("x");
        let _ = outcome.value();
    }

    #[test]
    #[should_panic(expected = "value accessed on a failed outcome")]
    fn into_value_on_failure_panics() {
        let _ = Outcome::<String>::fail("x").into_value();
    }

    #[test]
    fn value_fallbacks() {
        assert_eq!(Outcome::ok(3).into_value(), 3);
        assert_eq!(Outcome::ok(3).value_or(0), 3);
        assert_eq!(Outcome::<i32>::fail("x").value_or(0), 0);

        let recovered = Outcome::<usize>::fail_many(["a", "b"]).value_or_else(|errors| {
            assert_eq!(errors[1].message(), "b");
            errors.len()
        });
        assert_eq!(recovered, 2);
        assert_eq!(Outcome::ok(9).value_or_else(|_| 0), 9);
    }

    #[test]
    fn has_success_matches_annotations() {
        let outcome = Outcome::ok(()).with_success(Success::new("cached").with_tag("hit", true));
        assert!(outcome.has_success(|s| s.has_tag("hit")));
        assert!(!outcome.has_success(|s| s.message() == "fresh"));
        assert!(!Outcome::<()>::fail("x").has_success(|_| true));
    }

    #[test]
    fn with_value_and_discard_keep_reasons() {
        let ok = Outcome::ok(1).with_success("loaded");
        let replaced = ok.clone().with_value("one");
        assert_eq!(replaced.value(), &"one");
        assert_eq!(replaced.successes()[0].message(), "loaded");

        let unit = ok.discard();
        assert!(unit.is_success());
        assert_eq!(unit.successes().len(), 1);

        let failed = Outcome::<i32>::fail("boom").with_success("seen");
        let replaced = failed.clone().with_value("ignored");
        assert_eq!(replaced.try_value(), None);
        assert_eq!(replaced.errors()[0].message(), "boom");
        assert_eq!(replaced.successes()[0].message(), "seen");

        let unit = failed.discard();
        assert!(unit.is_failed());
        assert_eq!(unit.try_value(), None);
        assert_eq!(unit.successes().len(), 1);
    }

    #[test]
    fn with_error_flips_success() {
        let outcome = Outcome::ok(5).with_success("cached").with_error("late");
        assert!(outcome.is_failed());
        assert_eq!(outcome.try_value(), None);
        assert_eq!(outcome.successes().len(), 1);
    }

    #[test]
    fn with_errors_empty_keeps_success() {
        let outcome = Outcome::ok(5).with_errors(Vec::<Error>::new());
        assert!(outcome.is_success());
        assert_eq!(outcome.value(), &5);
    }

    #[test]
    fn with_success_keeps_flag() {
        let failed = Outcome::<()>::fail("x").with_success("noted");
        assert!(failed.is_failed());
        assert_eq!(failed.successes()[0].message(), "noted");
    }

    #[test]
    fn map_carries_reasons() {
        let outcome = Outcome::ok(2).with_success("loaded").map(|x| x + 1);
        assert_eq!(outcome.value(), &3);
        assert_eq!(outcome.successes().len(), 1);
    }

    #[test]
    fn try_map_captures_panic() {
        let outcome = Outcome::ok(1).with_success("kept").try_map(|_: i32| -> i32 {
            panic!("divide by zero")
        });
        assert!(outcome.is_failed());
        let error = outcome.first_error().expect("error");
        assert_eq!(error.message(), "divide by zero");
        assert_eq!(error.kind(), ErrorKind::Unexpected);
        assert_eq!(outcome.successes().len(), 1);
    }

    #[test]
    fn try_bind_captures_panic() {
        let outcome = Outcome::ok(1).try_bind(|_: i32| -> Outcome<i32> { panic!("bad") });
        assert!(outcome.has_error_kind(ErrorKind::Unexpected));
    }

    #[test]
    fn ensure_with_builds_error_from_value() {
        let outcome = Outcome::ok(17).ensure_with(
            |age| *age >= 18,
            |age| Error::validation(format!("age {age} is too young")),
        );
        assert_eq!(
            outcome.first_error().map(|e| e.message()),
            Some("age 17 is too young")
        );
        assert!(outcome.has_error_kind(ErrorKind::Validation));
    }

    #[test]
    fn match_ref_borrows() {
        let outcome = Outcome::ok("x".to_string());
        let len = outcome.match_ref(|s| s.len(), |errors| errors.len());
        assert_eq!(len, 1);
        assert_eq!(outcome.value(), "x");
    }

    #[test]
    fn tap_runs_on_matching_track_only() {
        let mut seen = Vec::new();
        let _ = Outcome::ok(1)
            .tap(|v| seen.push(format!("ok {v}")))
            .tap_error(|_| seen.push("err".into()));
        let _ = Outcome::<i32>::fail("x")
            .tap(|v| seen.push(format!("ok {v}")))
            .tap_error(|e| seen.push(format!("err {}", e.len())));
        assert_eq!(seen, ["ok 1", "err 1"]);
    }

    #[test]
    fn merge_accumulates() {
        let merged = Outcome::merge([Outcome::ok(1), Outcome::ok(2).with_success("two")]);
        assert_eq!(merged.value(), &vec![1, 2]);
        assert_eq!(merged.successes().len(), 1);

        let merged: Outcome<Vec<i32>> = vec![
            Outcome::ok(1),
            Outcome::fail("a"),
            Outcome::fail_many(["b", "c"]),
        ]
        .into_iter()
        .collect();
        assert!(merged.is_failed());
        assert_eq!(merged.errors().len(), 3);
        assert_eq!(merged.try_value(), None);
    }

    #[test]
    fn has_error_searches_causes() {
        let outcome = Outcome::<()>::fail_with(
            Error::new("save failed").with_cause(Error::not_found("row missing")),
        );
        assert!(outcome.has_error_kind(ErrorKind::NotFound));
        assert!(outcome.has_error(|e| e.message() == "row missing"));
        assert!(!outcome.has_error_kind(ErrorKind::Conflict));
    }

    #[test]
    fn map_errors_tags_every_error() {
        let outcome = Outcome::<()>::fail_many(["a", "b"])
            .map_errors(|e| e.with_tag("layer", "repo"));
        assert!(outcome.errors().iter().all(|e| e.has_tag("layer")));
    }

    #[test]
    fn std_result_conversions() {
        let outcome: Outcome<u8> = Ok::<u8, &str>(3).into();
        assert_eq!(outcome.into_result().ok(), Some(3));

        let outcome: Outcome<u8> = Err::<u8, String>("bad".into()).into();
        let errors = outcome.into_result().unwrap_err();
        assert_eq!(errors[0].message(), "bad");
    }

    #[test]
    fn display() {
        assert_eq!(Outcome::ok(1).to_string(), "Success");
        assert_eq!(
            Outcome::<()>::fail_many(["a", "b"]).to_string(),
            "Failure: a; b"
        );
    }

    #[test]
    fn unit_outcome_survives_json() {
        let ok = Outcome::default().with_success("done");
        let json = serde_json::to_string(&ok).expect("serialize");
        let back: Outcome = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, ok);
        assert!(back.is_success());
    }

    #[test]
    fn deserialize_rejects_broken_invariant() {
        let missing_value = serde_json::from_str::<Outcome<u8>>("{}");
        assert!(missing_value.is_err());

        let value_and_errors = serde_json::from_str::<Outcome<u8>>(
            r#"{"value": 1, "errors": [{"message": "x"}]}"#,
        );
        assert!(value_and_errors.is_err());

        let failed: Outcome<u8> =
            serde_json::from_str(r#"{"errors": [{"message": "x", "kind": "not_found"}]}"#)
                .expect("deserialize");
        assert!(failed.has_error_kind(ErrorKind::NotFound));
    }
}

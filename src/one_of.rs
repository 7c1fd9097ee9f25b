//! Closed unions over two, three or four branch types.
//!
//! A `OneOfN` value holds exactly one of its declared types. There is no
//! empty state and the active branch never changes after construction.
//! Values are built with the explicit `from_tn` factories (or the variants
//! themselves) because two branches may share a type.

use crate::macros::define_one_of;
use crate::outcome::Outcome;
use crate::reason::Error;

define_one_of! {
    /// A value of exactly one of two types.
    OneOf2[2] { T1 = 1, T2 = 2 }
}

define_one_of! {
    /// A value of exactly one of three types.
    OneOf3[3] { T1 = 1, T2 = 2, T3 = 3 }
}

define_one_of! {
    /// A value of exactly one of four types.
    OneOf4[4] { T1 = 1, T2 = 2, T3 = 3, T4 = 4 }
}

impl<E, T> OneOf2<E, T>
where
    E: Into<Error>,
{
    /// Convert an error-first union into an outcome: `T1` fails, `T2` succeeds.
    pub fn into_outcome(self) -> Outcome<T> {
        self.match_with(|error| Outcome::fail_with(error), Outcome::ok)
    }
}

impl<E, T> From<OneOf2<E, T>> for Outcome<T>
where
    E: Into<Error>,
{
    fn from(value: OneOf2<E, T>) -> Self {
        value.into_outcome()
    }
}

impl<E1, E2, T> OneOf3<E1, E2, T>
where
    E1: Into<Error>,
    E2: Into<Error>,
{
    /// Convert an error-first union into an outcome: `T3` succeeds, the
    /// other branches fail.
    pub fn into_outcome(self) -> Outcome<T> {
        self.match_with(
            |error| Outcome::fail_with(error),
            |error| Outcome::fail_with(error),
            Outcome::ok,
        )
    }
}

impl<E1, E2, T> From<OneOf3<E1, E2, T>> for Outcome<T>
where
    E1: Into<Error>,
    E2: Into<Error>,
{
    fn from(value: OneOf3<E1, E2, T>) -> Self {
        value.into_outcome()
    }
}

impl<E1, E2, E3, T> OneOf4<E1, E2, E3, T>
where
    E1: Into<Error>,
    E2: Into<Error>,
    E3: Into<Error>,
{
    /// Convert an error-first union into an outcome: `T4` succeeds, the
    /// other branches fail.
    pub fn into_outcome(self) -> Outcome<T> {
        self.match_with(
            |error| Outcome::fail_with(error),
            |error| Outcome::fail_with(error),
            |error| Outcome::fail_with(error),
            Outcome::ok,
        )
    }
}

impl<E1, E2, E3, T> From<OneOf4<E1, E2, E3, T>> for Outcome<T>
where
    E1: Into<Error>,
    E2: Into<Error>,
    E3: Into<Error>,
{
    fn from(value: OneOf4<E1, E2, E3, T>) -> Self {
        value.into_outcome()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{BranchClass, TypeNameClassifier};
    use crate::error::UsageError;
    use crate::reason::{ErrorKind, ReasonLike};

    #[derive(Debug, Clone, PartialEq)]
    struct MissingError(&'static str);

    impl From<MissingError> for Error {
        fn from(err: MissingError) -> Self {
            Error::not_found(err.0)
        }
    }

    #[test]
    fn exactly_one_branch_is_active() {
        let value: OneOf3<u8, String, bool> = OneOf3::from_t2("two".into());
        assert!(!value.is_t1());
        assert!(value.is_t2());
        assert!(!value.is_t3());
        assert_eq!(value.index(), 2);
        assert_eq!(value.as_t2(), "two");
    }

    #[test]
    fn inactive_access_is_an_invalid_state() {
        let value: OneOf2<u8, u8> = OneOf2::from_t1(1);
        assert_eq!(
            value.try_as_t2(),
            Err(UsageError::inactive_branch(2, 1))
        );
        assert_eq!(value.try_as_t1(), Ok(&1));
    }

    #[test]
    #[should_panic(expected = "branch T3 is not active (active branch is T4)")]
    fn as_inactive_panics() {
        let value: OneOf4<(), (), (), ()> = OneOf4::from_t4(());
        let _ = value.as_t3();
    }

    #[test]
    fn same_type_branches_stay_distinct() {
        let left: OneOf2<i32, i32> = OneOf2::from_t1(5);
        let right: OneOf2<i32, i32> = OneOf2::from_t2(5);
        assert_ne!(left, right);
        assert_eq!(left.into_t2(), Err(OneOf2::T1(5)));
        assert_eq!(right.into_t2(), Ok(5));
    }

    #[test]
    fn match_with_runs_active_handler() {
        let value: OneOf4<u8, &str, f64, bool> = OneOf4::from_t3(1.5);
        let rendered = value.match_with(
            |a| format!("u8 {a}"),
            |b| format!("str {b}"),
            |c| format!("f64 {c}"),
            |d| format!("bool {d}"),
        );
        assert_eq!(rendered, "f64 1.5");
    }

    #[test]
    fn reflection_reports_declared_types() {
        let value: OneOf2<MissingError, String> = OneOf2::from_t1(MissingError("x"));
        let names = OneOf2::<MissingError, String>::type_names();
        assert!(names[0].ends_with("MissingError"));
        assert_eq!(names[1], "alloc::string::String");
        assert_eq!(value.active_type_name(), names[0]);
        assert_eq!(
            value.classify(&TypeNameClassifier::default()),
            BranchClass::Failure
        );
    }

    #[test]
    fn error_first_union_converts_to_outcome() {
        let missing: OneOf2<MissingError, u32> = OneOf2::from_t1(MissingError("no user"));
        let outcome: Outcome<u32> = missing.into();
        assert_eq!(outcome.first_error().map(|e| e.message()), Some("no user"));

        let found: OneOf2<MissingError, u32> = OneOf2::from_t2(7);
        assert_eq!(found.into_outcome().value(), &7);
    }

    #[test]
    fn wider_error_first_unions_convert_to_outcome() {
        let conflict: OneOf3<MissingError, UsageError, u32> =
            OneOf3::from_t2(UsageError::InvalidState("locked".into()));
        let outcome: Outcome<u32> = conflict.into();
        assert!(outcome.is_failed());
        assert_eq!(outcome.errors().len(), 1);

        let missing: OneOf3<MissingError, UsageError, u32> =
            OneOf3::from_t1(MissingError("gone"));
        assert!(missing.into_outcome().has_error_kind(ErrorKind::NotFound));

        let found: OneOf4<MissingError, UsageError, Error, &str> = OneOf4::from_t4("ok");
        assert_eq!(found.into_outcome().value(), &"ok");

        let third: OneOf4<MissingError, UsageError, Error, &str> =
            OneOf4::from_t3(Error::conflict("taken"));
        let outcome: Outcome<&str> = third.into();
        assert_eq!(outcome.first_error().map(|e| e.message()), Some("taken"));
    }

    #[test]
    fn borrowed_keeps_branch() {
        let value: OneOf2<String, u8> = OneOf2::from_t1("s".into());
        let view = value.borrowed();
        assert!(view.is_t1());
        assert_eq!(*view.as_t1(), "s");
    }

    #[test]
    fn display_and_serde() {
        let value: OneOf3<u8, &str, bool> = OneOf3::from_t3(true);
        assert_eq!(value.to_string(), "true");

        let value: OneOf2<u8, String> = OneOf2::from_t2("hi".into());
        let json = serde_json::to_string(&value).expect("serialize");
        assert_eq!(json, r#"{"T2":"hi"}"#);
        let back: OneOf2<u8, String> = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, value);
    }
}

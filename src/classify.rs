//! Pluggable classification of union branches.
//!
//! Boundary layers decide whether the active branch of a `OneOf` should be
//! rendered as a success or a failure. The core only reports the branch
//! index and its declared type name; a [`BranchClassifier`] turns that into
//! a [`BranchClass`].

use serde::{Deserialize, Serialize};

/// Success-like or failure-like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchClass {
    /// The branch represents a successful result.
    Success,
    /// The branch represents a failure.
    Failure,
}

/// Strategy deciding the class of a branch.
pub trait BranchClassifier {
    /// Classify branch `index` (1-based) whose declared type is `type_name`.
    fn classify(&self, index: usize, type_name: &str) -> BranchClass;
}

impl<F> BranchClassifier for F
where
    F: Fn(usize, &str) -> BranchClass,
{
    fn classify(&self, index: usize, type_name: &str) -> BranchClass {
        self(index, type_name)
    }
}

/// Classifies by naming convention: a type whose short name ends with one of
/// the configured suffixes is a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeNameClassifier {
    failure_suffixes: Vec<String>,
}

impl Default for TypeNameClassifier {
    fn default() -> Self {
        Self {
            failure_suffixes: vec!["Error".into(), "Failure".into()],
        }
    }
}

impl TypeNameClassifier {
    /// Classifier with the default suffixes (`Error`, `Failure`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Classifier with no suffixes at all.
    pub fn empty() -> Self {
        Self {
            failure_suffixes: Vec::new(),
        }
    }

    /// Return a copy that also treats `suffix` as failure-like.
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.failure_suffixes.push(suffix.into());
        self
    }

    /// The configured suffixes.
    pub fn suffixes(&self) -> &[String] {
        &self.failure_suffixes
    }

    /// Strip module path and generic arguments from a `type_name` string.
    ///
    /// `my_app::users::NotFoundError<u32>` becomes `NotFoundError`.
    pub fn short_name(type_name: &str) -> &str {
        let base = type_name.split('<').next().unwrap_or(type_name);
        base.rsplit("::").next().unwrap_or(base)
    }
}

impl BranchClassifier for TypeNameClassifier {
    fn classify(&self, _index: usize, type_name: &str) -> BranchClass {
        let short = Self::short_name(type_name);
        if self
            .failure_suffixes
            .iter()
            .any(|suffix| short.ends_with(suffix.as_str()))
        {
            BranchClass::Failure
        } else {
            BranchClass::Success
        }
    }
}

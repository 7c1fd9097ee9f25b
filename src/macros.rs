//! Macros.
//!
//! - `fail!`: build a failed outcome from a format string
//! - `define_one_of!` (internal): generate a fixed-arity union type

/// Build a failed [`Outcome`](crate::Outcome) from a format string.
///
/// ```ignore
/// return fail!("user {} not found", id);
/// ```
#[macro_export]
macro_rules! fail {
    ($($arg:tt)+) => {
        $crate::Outcome::fail(::std::format!($($arg)+))
    };
}

/// Generate a closed union enum with one variant per branch.
///
/// # Generated Code
///
/// For every branch `Tn`:
/// - a variant `Tn(Tn)`
/// - `from_tn`, `is_tn`, `as_tn`, `try_as_tn` and `into_tn`
///
/// and for the whole union: `index`, `type_names`, `active_type_name`,
/// `match_with`, `borrowed`, `classify`, plus a delegating `Display`.
macro_rules! define_one_of {
    (
        $(#[$meta:meta])*
        $name:ident [$arity:literal] {
            $($variant:ident = $index:literal),+ $(,)?
        }
    ) => {
        ::paste::paste! {
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize)]
            pub enum $name<$($variant),+> {
                $(
                    #[doc = concat!("Branch ", stringify!($index), " is active.")]
                    $variant($variant),
                )+
            }

            impl<$($variant),+> $name<$($variant),+> {
                $(
                    #[doc = concat!("Create a value with branch `", stringify!($variant), "` active.")]
                    pub fn [<from_ $variant:lower>](value: $variant) -> Self {
                        Self::$variant(value)
                    }

                    #[doc = concat!("Returns `true` if branch `", stringify!($variant), "` is active.")]
                    pub fn [<is_ $variant:lower>](&self) -> bool {
                        matches!(self, Self::$variant(_))
                    }

                    #[doc = concat!("The `", stringify!($variant), "` value.")]
                    ///
                    /// # Panics
                    ///
                    /// Panics if another branch is active.
                    #[track_caller]
                    pub fn [<as_ $variant:lower>](&self) -> &$variant {
                        match self.[<try_as_ $variant:lower>]() {
                            Ok(value) => value,
                            Err(e) => panic!("{e}"),
                        }
                    }

                    #[doc = concat!("The `", stringify!($variant), "` value, or an invalid-state error.")]
                    pub fn [<try_as_ $variant:lower>](&self) -> Result<&$variant, $crate::error::UsageError> {
                        match self {
                            Self::$variant(value) => Ok(value),
                            _ => Err($crate::error::UsageError::inactive_branch($index, self.index())),
                        }
                    }

                    #[doc = concat!("Take the `", stringify!($variant), "` value, or get `self` back.")]
                    pub fn [<into_ $variant:lower>](self) -> Result<$variant, Self> {
                        match self {
                            Self::$variant(value) => Ok(value),
                            other => Err(other),
                        }
                    }
                )+

                /// The active branch, starting at 1.
                pub fn index(&self) -> usize {
                    match self {
                        $( Self::$variant(_) => $index, )+
                    }
                }

                /// Declared type name of every branch, in branch order.
                pub fn type_names() -> [&'static str; $arity] {
                    [$( ::std::any::type_name::<$variant>() ),+]
                }

                /// Declared type name of the active branch.
                pub fn active_type_name(&self) -> &'static str {
                    Self::type_names()[self.index() - 1]
                }

                /// Run the handler of the active branch and return its result.
                pub fn match_with<R>(
                    self,
                    $( [<on_ $variant:lower>]: impl FnOnce($variant) -> R, )+
                ) -> R {
                    match self {
                        $( Self::$variant(value) => [<on_ $variant:lower>](value), )+
                    }
                }

                /// Borrow the active value, keeping the branch.
                pub fn borrowed(&self) -> $name<$(&$variant),+> {
                    match self {
                        $( Self::$variant(value) => $name::$variant(value), )+
                    }
                }

                /// Classify the active branch with `classifier`.
                pub fn classify<C>(&self, classifier: &C) -> $crate::classify::BranchClass
                where
                    C: $crate::classify::BranchClassifier + ?Sized,
                {
                    classifier.classify(self.index(), self.active_type_name())
                }
            }

            impl<$($variant: ::std::fmt::Display),+> ::std::fmt::Display for $name<$($variant),+> {
                fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                    match self {
                        $( Self::$variant(value) => ::std::fmt::Display::fmt(value, f), )+
                    }
                }
            }
        }
    };
}

pub(crate) use define_one_of;

//! Utilities for `assert!`s.

/// Asserts that the provided expression, that returns an `Option`, is `None`.
///
/// The `Some` value is included in the panic message, so it must implement `Debug`.
#[macro_export]
macro_rules! assert_none {
    ($val:expr, $($msg:tt)+) => {{
        if let Some(found) = &$val {
            panic!(
                "assertion failed: expected None found Some({found:?}), {}",
                format_args!($($msg)+),
            );
        }
    }};
    ($val:expr) => {{
        if let Some(found) = &$val {
            panic!("assertion failed: expected None found Some({found:?})");
        }
    }};
}

/// Same as [`assert_none!`] but only checked when `debug_assertions` are enabled.
#[macro_export]
macro_rules! debug_assert_none {
    ($($arg:tt)+) => {{
        if cfg!(debug_assertions) {
            $crate::assert_none!($($arg)+);
        }
    }};
}

//! Utilities for reading environment variables.

use std::ffi::OsStr;

/// Values that are considered "falsey", compared case-insensitively.
static FALSEY: &[&str] = &["0", "", "no", "false"];

/// Returns true if the environment variable is set, and is _not_ one of the following:
/// `'0', '', 'no', 'false'`.
pub fn is_truthy<K: AsRef<OsStr>>(var: K) -> bool {
    // Return early if the value is not set.
    let Some(mut value) = std::env::var_os(var) else {
        return false;
    };
    value.make_ascii_lowercase();
    !FALSEY.iter().any(|falsey| value == *falsey)
}

/// Returns all of the environment variables whose name starts with `prefix`, with the prefix
/// stripped and the remainder lowercased.
///
/// Variables that are not valid unicode are skipped.
///
/// ```ignore
/// // PB_CFG_FLAG_PREFIX=++
/// let vars: Vec<_> = prefixed_vars("PB_CFG_").collect();
/// assert_eq!(vars, vec![("flag_prefix".to_string(), "++".to_string())]);
/// ```
pub fn prefixed_vars(prefix: &str) -> impl Iterator<Item = (String, String)> + '_ {
    std::env::vars_os().filter_map(move |(name, value)| {
        let name = name.into_string().ok()?;
        let value = value.into_string().ok()?;
        let stripped = name.strip_prefix(prefix)?;
        Some((stripped.to_ascii_lowercase(), value))
    })
}

//! Serde predicate for boolean switches on `ServeArgs`.

/// Returns `true` when `value` is `false`.
///
/// Used in `skip_serializing_if` so an unset `--no-*` switch never masks a
/// value from the configuration file or environment. Serde hands the field
/// over by reference.
///
/// # Examples
///
/// ```rust,ignore
/// use crate::bool_predicates;
///
/// assert!(bool_predicates::not(&false));
/// assert!(!bool_predicates::not(&true));
/// ```
#[must_use]
pub fn not<T>(value: &T) -> bool
where
    T: Copy + std::ops::Not<Output = bool>,
{
    !*value
}

//! Serde predicates for boolean CLI flags.

/// `true` when the flag is unset.
///
/// Used in `skip_serializing_if` so an omitted flag does not override a
/// value from the settings file or environment.
#[must_use]
pub fn not<T>(value: &T) -> bool
where
    T: Copy + std::ops::Not<Output = bool>,
{
    !*value
}

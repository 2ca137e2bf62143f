//! Serde helper for patch bodies.

use serde::{Deserialize, Deserializer};

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`), so patches can clear optional columns.
///
/// Use together with `#[serde(default)]`.
pub(crate) fn double_option<'de, D, T>(
  deserializer: D,
) -> Result<Option<Option<T>>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  Option::<T>::deserialize(deserializer).map(Some)
}

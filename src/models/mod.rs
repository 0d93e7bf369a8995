//! Data models for the helpdesk dashboard.
//!
//! Field names serialize as camelCase to match the dashboard's TypeScript types.

mod catalog;
mod event;
mod note;
mod resource;
mod status;
mod ticket;
mod user;

pub use catalog::*;
pub use event::*;
pub use note::*;
pub use resource::*;
pub use status::*;
pub use ticket::*;
pub use user::*;

use serde::{Deserialize, Deserializer};

/// Deserialize a nullable field of a partial update.
///
/// Absent → `None` (keep), `null` → `Some(None)` (clear), value → `Some(Some(v))`.
/// Use together with `#[serde(default)]`.
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Apply a partial update to a nullable field.
pub fn merge_nullable<T: Clone>(update: &Option<Option<T>>, current: &Option<T>) -> Option<T> {
    match update {
        Some(value) => value.clone(),
        None => current.clone(),
    }
}

/// `#RRGGBB`, case-insensitive.
pub fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}

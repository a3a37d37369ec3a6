//! Column decoding helpers
//!
//! Text columns holding enum labels or JSON arrays are decoded here so that
//! malformed rows surface as `FromSqlConversionFailure` instead of panics.

use std::str::FromStr;

use rusqlite::types::Type;
use rusqlite::Row;
use serde::de::DeserializeOwned;
use serde::Serialize;

fn conversion_failure<E>(row: &Row, name: &str, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    let index = row.as_ref().column_index(name).unwrap_or(0);
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(err))
}

/// Read a text column and parse it with `FromStr`
pub fn parse_text<T>(row: &Row, name: &str) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(name)?;
    raw.parse().map_err(|e| conversion_failure(row, name, e))
}

/// Read a text column holding JSON
pub fn parse_json<T: DeserializeOwned>(row: &Row, name: &str) -> rusqlite::Result<T> {
    let raw: String = row.get(name)?;
    serde_json::from_str(&raw).map_err(|e| conversion_failure(row, name, e))
}

/// Encode a value for a JSON text column
pub fn to_json<T: Serialize>(value: &T) -> crate::db::DbResult<String> {
    Ok(serde_json::to_string(value)?)
}

/// Lowercase and keep letters and digits only, so "Gluten-Free",
/// "gluten_free" and "GLUTEN FREE" compare equal.
pub fn normalize_label(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Declare an enum over a closed list of display labels.
///
/// The labels double as the stored text and the serde representation.
/// Parsing ignores case and punctuation.
macro_rules! closed_list {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident ($kind:literal) {
            $($variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $(#[serde(rename = $label)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::nutrition::GoalError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = $crate::models::columns::normalize_label(s);
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| $crate::models::columns::normalize_label(v.as_str()) == wanted)
                    .ok_or_else(|| $crate::nutrition::GoalError::InvalidArgument {
                        field: $kind,
                        value: s.to_string(),
                    })
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub(crate) use closed_list;

//! Customer identifier.
//!
//! Customer IDs are random UUID v4 values stored as hyphenated text so the
//! same value appears in the database, in JSON payloads and in URLs.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error returned when a string is not a valid customer ID.
#[derive(thiserror::Error, Debug, Clone)]
#[error("invalid customer id: {0}")]
pub struct CustomerIdError(String);

/// Opaque, immutable identifier of an enrolled customer.
///
/// # Example
///
/// ```rust
/// # use visitmark_core::CustomerId;
/// let id = CustomerId::generate();
/// let parsed: CustomerId = id.to_string().parse().unwrap();
/// assert_eq!(id, parsed);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(Uuid);

impl CustomerId {
    /// Generate a fresh random ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a customer ID from its textual form.
    ///
    /// # Errors
    ///
    /// Returns `CustomerIdError` if the input is not a UUID.
    pub fn parse(s: &str) -> Result<Self, CustomerIdError> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| CustomerIdError(s.to_owned()))
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for CustomerId {
    type Err = CustomerIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// SQLx support (with sqlite feature): stored as TEXT, not the BLOB encoding
// sqlx uses for `Uuid` by default.
#[cfg(feature = "sqlite")]
impl sqlx::Type<sqlx::Sqlite> for CustomerId {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <String as sqlx::Type<sqlx::Sqlite>>::type_info()
    }

    fn compatible(ty: &sqlx::sqlite::SqliteTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Sqlite>>::compatible(ty)
    }
}

#[cfg(feature = "sqlite")]
impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for CustomerId {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        Ok(Self(Uuid::parse_str(s)?))
    }
}

#[cfg(feature = "sqlite")]
impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for CustomerId {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Sqlite>>::encode(self.to_string(), buf)
    }
}

//! Identifier types for the records in the database.
//!
//! Each record type gets its own newtype around a [Uuid] so that, for example,
//! a category ID cannot be passed where a user ID is expected.

use std::fmt::Display;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::Serialize;
use uuid::Uuid;

use crate::{ValidationError, validation::parse_uuid};

macro_rules! database_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a new random ID.
            pub fn new_random() -> Self {
                Self(Uuid::new_v4())
            }

            /// Parse an ID sent by a client.
            ///
            /// `field` names the input the ID came from and is used in the
            /// validation error.
            ///
            /// # Errors
            ///
            /// Returns a [ValidationError] if `value` is not a UUID in
            /// canonical dashed form.
            pub fn parse(field: &'static str, value: &str) -> Result<Self, ValidationError> {
                parse_uuid(field, value).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.hyphenated().fmt(f)
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.0.hyphenated().to_string()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let text = value.as_str()?;

                Uuid::parse_str(text)
                    .map(Self)
                    .map_err(|error| FromSqlError::Other(Box::new(error)))
            }
        }
    };
}

database_id!(
    /// The ID of a [crate::User].
    UserId
);

database_id!(
    /// The ID of a [crate::Category].
    CategoryId
);

database_id!(
    /// The ID of a [crate::Transaction].
    TransactionId
);

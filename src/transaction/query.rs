//! Date range filtering for listing transactions.

use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    Error, UserId, ValidationError,
    db::to_unix_micros,
    validation::validate_date_range,
};

use super::core::{TRANSACTION_COLUMNS, Transaction, map_transaction_row};

/// An inclusive range of timestamps where either side may be unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    from: Option<OffsetDateTime>,
    to: Option<OffsetDateTime>,
}

impl DateRange {
    /// Create a date range.
    ///
    /// # Errors
    ///
    /// Returns a [ValidationError] for the field "from" if both bounds are
    /// given and `from` is after `to`.
    pub fn new(
        from: Option<OffsetDateTime>,
        to: Option<OffsetDateTime>,
    ) -> Result<Self, ValidationError> {
        validate_date_range(from, to)?;

        Ok(Self { from, to })
    }

    /// A range that includes every timestamp.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// The inclusive lower bound, if any.
    pub fn from(&self) -> Option<OffsetDateTime> {
        self.from
    }

    /// The inclusive upper bound, if any.
    pub fn to(&self) -> Option<OffsetDateTime> {
        self.to
    }

    /// The bounds as the integers stored in the database.
    pub(crate) fn to_sql_bounds(self) -> (Option<i64>, Option<i64>) {
        (self.from.map(to_unix_micros), self.to.map(to_unix_micros))
    }
}

/// Get the transactions of `user_id` that occurred within `range`, most
/// recent first.
///
/// Transactions that occurred at the same time are listed newest record first.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails or a row cannot be mapped.
pub fn list_transactions(
    user_id: UserId,
    range: DateRange,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let (from, to) = range.to_sql_bounds();

    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" t
             LEFT JOIN category c ON t.category_id = c.id
             WHERE t.user_id = ?1
                AND (?2 IS NULL OR t.occurred_at >= ?2)
                AND (?3 IS NULL OR t.occurred_at <= ?3)
             ORDER BY t.occurred_at DESC, t.rowid DESC"
        ))?
        .query_map((user_id, from, to), map_transaction_row)?
        .map(|transaction_result| transaction_result.map_err(Error::from))
        .collect()
}

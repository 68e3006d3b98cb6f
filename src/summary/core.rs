//! Totals of spending per category.

use rusqlite::{Connection, Row};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer, ser::SerializeStruct};
use time::{Duration, OffsetDateTime};

use crate::{
    CategoryId, Error, UserId,
    amount::{cents_to_decimal, serialize_decimal},
    category::CategoryName,
    db::to_unix_micros,
    timestamp::serialize_rfc3339,
    transaction::DateRange,
};

/// The name reported for transactions without a category.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// How far back a summary reaches when no date range is given.
pub const DEFAULT_SUMMARY_WINDOW: Duration = Duration::days(30);

/// The group that a [CategorySummary] totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryBucket {
    /// Transactions filed under a category.
    Category { id: CategoryId, name: CategoryName },
    /// Transactions without a category.
    Uncategorized,
}

impl SummaryBucket {
    /// The display name of the bucket.
    pub fn name(&self) -> &str {
        match self {
            SummaryBucket::Category { name, .. } => name.as_ref(),
            SummaryBucket::Uncategorized => UNCATEGORIZED,
        }
    }

    /// The category ID, `None` for the uncategorized bucket.
    pub fn category_id(&self) -> Option<CategoryId> {
        match self {
            SummaryBucket::Category { id, .. } => Some(*id),
            SummaryBucket::Uncategorized => None,
        }
    }
}

/// The total amount spent in one bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySummary {
    pub bucket: SummaryBucket,
    /// The exact sum of the amounts of the matching transactions.
    pub total: Decimal,
}

impl Serialize for CategorySummary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct Total<'a>(&'a Decimal);

        impl Serialize for Total<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serialize_decimal(self.0, serializer)
            }
        }

        let mut state = serializer.serialize_struct("CategorySummary", 3)?;
        state.serialize_field("category_id", &self.bucket.category_id())?;
        state.serialize_field("category_name", self.bucket.name())?;
        state.serialize_field("total", &Total(&self.total))?;
        state.end()
    }
}

/// The spending of a user per category over a window of time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub user_id: UserId,
    /// The reported start of the window.
    #[serde(serialize_with = "serialize_rfc3339")]
    pub from: OffsetDateTime,
    /// The reported end of the window.
    #[serde(serialize_with = "serialize_rfc3339")]
    pub to: OffsetDateTime,
    /// One entry per non-empty bucket, ordered by name.
    pub categories: Vec<CategorySummary>,
}

/// Compute how much `user_id` spent per category within `range`.
///
/// If `range` has neither bound, the last [DEFAULT_SUMMARY_WINDOW] up to
/// `now` is used. If it has only one bound the other side is unbounded,
/// although the reported `from`/`to` still fall back to the default window
/// for the missing side.
///
/// Buckets are sorted by name with a case-sensitive ordinal comparison. The
/// uncategorized bucket takes part in the sort and comes after a category
/// that is literally called "Uncategorized". Buckets without matching
/// transactions are omitted.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails or a row cannot be mapped.
pub fn compute_summary(
    user_id: UserId,
    range: DateRange,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Summary, Error> {
    let default_from = now - DEFAULT_SUMMARY_WINDOW;
    let default_to = now;

    let filter = match (range.from(), range.to()) {
        (None, None) => (Some(default_from), Some(default_to)),
        (from, to) => (from, to),
    };

    let categories = connection
        .prepare(&format!(
            "SELECT t.category_id, c.name, SUM(t.amount)
             FROM \"transaction\" t
             LEFT JOIN category c ON t.category_id = c.id
             WHERE t.user_id = ?1
                AND (?2 IS NULL OR t.occurred_at >= ?2)
                AND (?3 IS NULL OR t.occurred_at <= ?3)
             GROUP BY t.category_id
             ORDER BY COALESCE(c.name, '{UNCATEGORIZED}') ASC, t.category_id IS NULL ASC"
        ))?
        .query_map(
            (
                user_id,
                filter.0.map(to_unix_micros),
                filter.1.map(to_unix_micros),
            ),
            map_summary_row,
        )?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Summary {
        user_id,
        from: range.from().unwrap_or(default_from),
        to: range.to().unwrap_or(default_to),
        categories,
    })
}

fn map_summary_row(row: &Row) -> Result<CategorySummary, rusqlite::Error> {
    let category_id: Option<CategoryId> = row.get(0)?;
    let category_name: Option<String> = row.get(1)?;
    let total_cents: i64 = row.get(2)?;

    let bucket = match (category_id, category_name) {
        (Some(id), Some(name)) => SummaryBucket::Category {
            id,
            name: CategoryName::new_unchecked(&name),
        },
        _ => SummaryBucket::Uncategorized,
    };

    Ok(CategorySummary {
        bucket,
        total: cents_to_decimal(total_cents),
    })
}

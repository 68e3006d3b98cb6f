//! Core category domain types.

use std::fmt::Display;

use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    CategoryId, UserId, ValidationError, timestamp::serialize_rfc3339,
    validation::validate_category_name,
};

/// A validated category name: trimmed, not empty and at most 100 characters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Hash)]
#[serde(transparent)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name from untrimmed input.
    ///
    /// # Errors
    ///
    /// This function will return a [ValidationError] if `name` is empty, only
    /// whitespace, or longer than 100 characters after trimming.
    pub fn new(name: &str) -> Result<Self, ValidationError> {
        validate_category_name(name).map(Self)
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is trimmed and not empty.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user-defined label for grouping transactions (e.g., 'Food', 'Transport').
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: CategoryId,
    /// The user that owns the category.
    pub user_id: UserId,
    /// The name of the category, unique among the categories of its owner.
    pub name: CategoryName,
    #[serde(serialize_with = "serialize_rfc3339")]
    pub created_at: OffsetDateTime,
}

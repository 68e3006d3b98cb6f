//! Spending summaries grouped by category.

mod core;
mod endpoint;

pub use core::{
    CategorySummary, DEFAULT_SUMMARY_WINDOW, Summary, SummaryBucket, UNCATEGORIZED,
    compute_summary,
};
pub use endpoint::get_summary_endpoint;

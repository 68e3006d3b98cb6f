//! Categories that users define to group their transactions.

mod create;
mod db;
mod domain;
mod list;

pub use create::create_category_endpoint;
pub use db::{
    count_categories, create_category, create_category_table, get_category, list_categories,
    validate_ownership,
};
pub use domain::{Category, CategoryName};
pub use list::list_categories_endpoint;

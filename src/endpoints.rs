//! The API endpoints URIs.

/// The route for checking that the server and its database are up.
pub const HEALTH: &str = "/health";
/// The route to create users.
pub const USERS: &str = "/api/v1/users";
/// The route to create and list categories.
pub const CATEGORIES: &str = "/api/v1/categories";
/// The route to create and list transactions.
pub const TRANSACTIONS: &str = "/api/v1/transactions";
/// The route to get the spending summary by category.
pub const SUMMARY: &str = "/api/v1/summary";

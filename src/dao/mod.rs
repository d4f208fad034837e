/// Leaderboard persistence operations.
pub mod leaderboard_store;
/// Database model definitions.
pub mod models;
/// Storage abstraction layer for database operations.
pub mod storage;

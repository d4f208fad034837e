//! DTO definitions for the public leaderboard.

use serde::Serialize;
use utoipa::ToSchema;

use crate::{dao::models::LeaderboardEntryEntity, dto::format_system_time};

/// One ranked hall-of-flame entry.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardEntryDto {
    /// Name the user chose for the board.
    pub leaderboard_name: String,
    /// Roast severity the entry ranks by, 0-100.
    pub overall_roast_level: u8,
    /// Witty summary from the report card.
    pub feedback_summary: String,
    /// Submission timestamp (RFC 3339).
    pub created_at: String,
}

impl From<LeaderboardEntryEntity> for LeaderboardEntryDto {
    fn from(value: LeaderboardEntryEntity) -> Self {
        Self {
            leaderboard_name: value.leaderboard_name,
            overall_roast_level: value.overall_roast_level,
            feedback_summary: value.feedback_summary,
            created_at: format_system_time(value.created_at),
        }
    }
}

/// Ranked leaderboard response, most roasted first.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardResponse {
    /// Entries in rank order.
    pub entries: Vec<LeaderboardEntryDto>,
}

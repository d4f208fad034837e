use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

/// One hall-of-flame submission as stored in persistence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeaderboardEntryEntity {
    /// Stable identifier for the entry.
    pub id: Uuid,
    /// Anonymous identity of the submitting user.
    pub user_id: Uuid,
    /// Name the user chose for the board.
    pub leaderboard_name: String,
    /// Roast severity from the report card, 0-100. Entries rank by this.
    pub overall_roast_level: u8,
    /// Witty summary from the report card.
    pub feedback_summary: String,
    /// Submission timestamp.
    pub created_at: SystemTime,
}

// src/models/badge_award.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'badge_awards' table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeAward {
    pub badge_id: String,
    pub tier: String,
    pub xp_awarded: i64,
    #[sqlx(rename = "created_at")]
    pub earned_at: String,
}

/// Result of `POST /api/progress/check-badges`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckBadgesResponse {
    pub new_badges: Vec<String>,
    pub total_xp_earned: u64,
    pub new_xp: u64,
    pub new_level: u32,
    pub total_badges: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BadgeHistoryResponse {
    pub badges: Vec<BadgeAward>,
}

// src/models/api.rs

use serde::{Deserialize, Serialize};

use crate::models::progress::UserProgress;

/// Envelope wrapping every progress-service response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// Body of `POST /api/progress/sync`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncProgressRequest {
    pub local_progress: UserProgress,
    #[serde(default)]
    pub force_overwrite: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncProgressResponse {
    pub merged_progress: UserProgress,
    pub synced_at: chrono::DateTime<chrono::Utc>,
}

/// Result of `POST /api/progress/update-streak`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakResponse {
    pub streak: u32,
    pub longest_streak: u32,
    pub xp_earned: u64,
    pub new_xp: u64,
    pub new_level: u32,

    /// False when the streak was already registered today.
    pub new_login: bool,
}

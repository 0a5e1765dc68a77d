// src/models/xp_transaction.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'xp_transactions' table. Audit log of every XP credit.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XpTransaction {
    pub id: i64,
    #[serde(skip)]
    pub user_id: i64,
    pub amount: i64,
    pub reason: String,
    pub reference_id: Option<String>,
    pub reference_type: Option<String>,
    pub created_at: String,
}

/// DTO for `POST /api/progress/add-xp`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddXpRequest {
    #[validate(range(min = 1, max = 1000))]
    pub amount: u64,
    #[validate(length(min = 1, max = 100))]
    pub reason: String,
    #[validate(length(max = 100))]
    pub reference_id: Option<String>,
    #[validate(custom(function = validate_reference_type))]
    pub reference_type: Option<String>,
}

fn validate_reference_type(reference_type: &str) -> Result<(), validator::ValidationError> {
    match reference_type {
        "question" | "test" | "badge" | "streak" | "daily_challenge" => Ok(()),
        _ => Err(validator::ValidationError::new("invalid_reference_type")),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddXpResponse {
    pub new_xp: u64,
    pub new_level: u32,
    pub leveled_up: bool,
}

#[derive(Debug, Deserialize)]
pub struct XpHistoryParams {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct XpHistoryResponse {
    pub transactions: Vec<XpTransaction>,
    pub total: usize,
}

// src/handlers/progress.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use validator::Validate;

use crate::{
    error::AppError,
    gamification::{
        XpRewards, award_badges, evaluate_badges, merge::merge_progress, record::credit_xp,
        register_daily_login,
    },
    models::{
        api::{ApiResponse, StreakResponse, SyncProgressRequest, SyncProgressResponse},
        badge::BadgeCatalog,
        badge_award::{BadgeAward, BadgeHistoryResponse, CheckBadgesResponse},
        progress::UserProgress,
        xp_transaction::{
            AddXpRequest, AddXpResponse, XpHistoryParams, XpHistoryResponse, XpTransaction,
        },
    },
    utils::jwt::Claims,
};

const DEFAULT_HISTORY_LIMIT: i64 = 50;
const MAX_HISTORY_LIMIT: i64 = 100;
const BADGE_HISTORY_LIMIT: i64 = 100;

/// Returns the caller's authoritative progress, or zero defaults when nothing
/// has been stored yet.
pub async fn get_progress(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let mut conn = pool.acquire().await?;

    let progress = fetch_progress(&mut conn, user_id)
        .await?
        .unwrap_or_else(|| UserProgress::for_user(user_id.to_string()));

    Ok(Json(ApiResponse::ok(progress)))
}

/// Merges an uploaded device copy into the stored progress.
///
/// * Counters keep the higher value, badges and tests are unions.
/// * The merged record is stored and returned; the device replaces its copy with it.
pub async fn sync_progress(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SyncProgressRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let mut tx = pool.begin().await?;

    let stored = fetch_progress(&mut tx, user_id).await?;
    let mut merged = merge_progress(stored.as_ref(), &req.local_progress, req.force_overwrite);
    merged.user_id = user_id.to_string();

    store_progress(&mut tx, user_id, &merged).await?;
    tx.commit().await?;

    tracing::debug!(user_id, xp = merged.xp, badges = merged.badges.len(), "Progress synced");

    Ok(Json(ApiResponse::ok(SyncProgressResponse {
        merged_progress: merged,
        synced_at: Utc::now(),
    })))
}

/// Credits XP for a gamification event and records it in the XP log.
pub async fn add_xp(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<AddXpRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let user_id = claims.user_id()?;
    let mut tx = pool.begin().await?;

    let mut progress = fetch_progress(&mut tx, user_id)
        .await?
        .unwrap_or_else(|| UserProgress::for_user(user_id.to_string()));
    let level_before = progress.level;

    credit_xp(&mut progress, req.amount, Utc::now().date_naive());
    progress.normalize();

    store_progress(&mut tx, user_id, &progress).await?;
    log_xp_transaction(
        &mut tx,
        user_id,
        req.amount,
        &req.reason,
        req.reference_id.as_deref(),
        req.reference_type.as_deref(),
    )
    .await?;
    tx.commit().await?;

    Ok(Json(ApiResponse::ok(AddXpResponse {
        new_xp: progress.xp,
        new_level: progress.level,
        leveled_up: progress.level > level_before,
    })))
}

/// Lists the caller's XP transactions, newest first.
pub async fn xp_history(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<XpHistoryParams>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let limit = params
        .limit
        .filter(|l| (1..=MAX_HISTORY_LIMIT).contains(l))
        .unwrap_or(DEFAULT_HISTORY_LIMIT);

    let transactions = sqlx::query_as::<_, XpTransaction>(
        r#"
        SELECT id, user_id, amount, reason, reference_id, reference_type, created_at
        FROM xp_transactions
        WHERE user_id = ?
        ORDER BY id DESC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch XP history: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let total = transactions.len();
    Ok(Json(ApiResponse::ok(XpHistoryResponse { transactions, total })))
}

/// Evaluates every catalog badge against the stored progress and awards the
/// newly satisfied ones, crediting their XP rewards.
pub async fn check_badges(
    State(pool): State<SqlitePool>,
    State(catalog): State<Arc<BadgeCatalog>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let mut tx = pool.begin().await?;

    let mut progress = fetch_progress(&mut tx, user_id)
        .await?
        .unwrap_or_else(|| UserProgress::for_user(user_id.to_string()));

    let eligible = evaluate_badges(&progress, &catalog);
    let awards = award_badges(&mut progress, &catalog, &eligible, Utc::now().date_naive());

    if !awards.is_empty() {
        store_progress(&mut tx, user_id, &progress).await?;
        for badge_id in &awards.badge_ids {
            if let Some(badge) = catalog.get(badge_id) {
                let tier = badge.tier.as_str();
                log_badge_award(&mut tx, user_id, badge_id, tier, badge.xp_reward).await?;
            }
        }
        if awards.xp_awarded > 0 {
            let amount = awards.xp_awarded;
            log_xp_transaction(&mut tx, user_id, amount, "badges_earned", None, Some("badge"))
                .await?;
        }
        tracing::info!(user_id, badges = ?awards.badge_ids, "Badges awarded");
    }
    tx.commit().await?;

    Ok(Json(ApiResponse::ok(CheckBadgesResponse {
        new_badges: awards.badge_ids,
        total_xp_earned: awards.xp_awarded,
        new_xp: progress.xp,
        new_level: progress.level,
        total_badges: progress.badges.len(),
    })))
}

/// Lists the caller's badge awards, newest first.
pub async fn badge_history(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let badges = sqlx::query_as::<_, BadgeAward>(
        r#"
        SELECT badge_id, tier, xp_awarded, created_at
        FROM badge_awards
        WHERE user_id = ?
        ORDER BY id DESC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(BADGE_HISTORY_LIMIT)
    .fetch_all(&pool)
    .await?;

    Ok(Json(ApiResponse::ok(BadgeHistoryResponse { badges })))
}

/// Registers today's login on the server clock and pays the daily XP.
pub async fn update_streak(
    State(pool): State<SqlitePool>,
    State(rewards): State<Arc<XpRewards>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let mut tx = pool.begin().await?;

    let mut progress = fetch_progress(&mut tx, user_id)
        .await?
        .unwrap_or_else(|| UserProgress::for_user(user_id.to_string()));

    let update = register_daily_login(&mut progress, Utc::now().date_naive(), &rewards);

    if update.new_login {
        store_progress(&mut tx, user_id, &progress).await?;
        let amount = update.xp_earned;
        log_xp_transaction(&mut tx, user_id, amount, "daily_login", None, Some("streak")).await?;
    }
    tx.commit().await?;

    Ok(Json(ApiResponse::ok(StreakResponse {
        streak: update.streak,
        longest_streak: update.longest_streak,
        xp_earned: update.xp_earned,
        new_xp: progress.xp,
        new_level: progress.level,
        new_login: update.new_login,
    })))
}

/// Loads the stored progress blob of `user_id`.
async fn fetch_progress(
    conn: &mut SqliteConnection,
    user_id: i64,
) -> Result<Option<UserProgress>, AppError> {
    let row: Option<(String,)> = sqlx::query_as("SELECT data FROM user_progress WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

    let Some((data,)) = row else {
        return Ok(None);
    };

    let mut progress: UserProgress = serde_json::from_str(&data).map_err(|e| {
        tracing::error!(user_id, "Stored progress is corrupt: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;
    progress.user_id = user_id.to_string();
    progress.normalize();
    Ok(Some(progress))
}

async fn store_progress(
    conn: &mut SqliteConnection,
    user_id: i64,
    progress: &UserProgress,
) -> Result<(), AppError> {
    let data = serde_json::to_string(progress)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    sqlx::query(
        r#"
        INSERT INTO user_progress (user_id, data, updated_at)
        VALUES (?, ?, CURRENT_TIMESTAMP)
        ON CONFLICT(user_id) DO UPDATE SET
            data = excluded.data,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(user_id)
    .bind(data)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn log_xp_transaction(
    conn: &mut SqliteConnection,
    user_id: i64,
    amount: u64,
    reason: &str,
    reference_id: Option<&str>,
    reference_type: Option<&str>,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO xp_transactions (user_id, amount, reason, reference_id, reference_type)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(i64::try_from(amount).unwrap_or(i64::MAX))
    .bind(reason)
    .bind(reference_id)
    .bind(reference_type)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn log_badge_award(
    conn: &mut SqliteConnection,
    user_id: i64,
    badge_id: &str,
    tier: &str,
    xp_awarded: u64,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO badge_awards (user_id, badge_id, tier, xp_awarded)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(user_id, badge_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(badge_id)
    .bind(tier)
    .bind(i64::try_from(xp_awarded).unwrap_or(i64::MAX))
    .execute(&mut *conn)
    .await?;

    Ok(())
}

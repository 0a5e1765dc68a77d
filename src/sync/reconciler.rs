//! Reconciliation of the local progress copy with the progress service.
//!
//! The server copy is authoritative: whenever the service answers, its object
//! replaces the local one wholesale. Local mutations that have not reached the
//! server yet (see [`ProgressStore::pending`]) are pushed through the merging
//! sync endpoint first, so a plain fetch never discards them.

use serde::Serialize;

use crate::error::AppError;
use crate::models::progress::UserProgress;
use crate::sync::remote::RemoteProgress;
use crate::sync::store::{KeyValueStore, ProgressStore};

/// Outcome of one reconciliation, used to drive one-time notifications.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub synced: bool,

    /// The primary path failed and the basic fallback succeeded.
    pub used_fallback: bool,

    /// The daily-login streak was registered by this sync.
    pub streak_updated: bool,
    pub streak: u32,
    pub streak_xp: u64,

    /// XP granted by the server during this sync (login bonus, badge rewards).
    pub xp_earned: u64,

    /// Badges present after the sync that the local copy did not have before.
    pub new_badges: Vec<String>,
}

fn badges_gained(before: &UserProgress, after: &UserProgress) -> Vec<String> {
    after.badges.difference(&before.badges).cloned().collect()
}

/// Initial load: the cached copy is the optimistic value, the server copy
/// replaces it when reachable.
pub async fn load<S: KeyValueStore>(
    store: &ProgressStore<S>,
    remote: &dyn RemoteProgress,
) -> UserProgress {
    if store.pending() > 0 {
        return match push_local(store, remote).await {
            Ok(progress) => progress,
            Err(e) => {
                tracing::warn!("Could not push offline progress, keeping local copy: {}", e);
                store.load()
            }
        };
    }

    match remote.fetch_progress().await {
        Ok(server) => store.replace(server).unwrap_or_else(|e| {
            tracing::error!("Failed to cache server progress: {}", e);
            store.load()
        }),
        Err(e) => {
            tracing::warn!("Progress service unreachable, using local progress: {}", e);
            store.load()
        }
    }
}

/// Full sync: push, daily streak, badge check, then adopt the server copy.
///
/// Falls back once to [`basic_sync`] when any step fails. Errors never
/// propagate; the local copy is left as it was when both paths fail.
pub async fn reconcile<S: KeyValueStore>(
    store: &ProgressStore<S>,
    remote: &dyn RemoteProgress,
) -> SyncReport {
    let before = store.load();

    match full_sync(store, remote, &before).await {
        Ok(report) => report,
        Err(e) => {
            tracing::warn!("Progress sync failed, trying basic sync: {}", e);
            match basic_sync(store, remote).await {
                Ok(after) => SyncReport {
                    synced: true,
                    used_fallback: true,
                    new_badges: badges_gained(&before, &after),
                    ..SyncReport::default()
                },
                Err(e) => {
                    tracing::error!("Basic progress sync failed, keeping local progress: {}", e);
                    SyncReport::default()
                }
            }
        }
    }
}

async fn full_sync<S: KeyValueStore>(
    store: &ProgressStore<S>,
    remote: &dyn RemoteProgress,
    before: &UserProgress,
) -> Result<SyncReport, AppError> {
    let merged = remote.sync_progress(before, false).await?;
    store.replace(merged.merged_progress)?;

    let mut report = SyncReport {
        synced: true,
        ..SyncReport::default()
    };

    let streak = remote.update_streak().await?;
    report.streak = streak.streak;
    if streak.new_login {
        report.streak_updated = true;
        report.streak_xp = streak.xp_earned;
        report.xp_earned += streak.xp_earned;
    }

    let badges = remote.check_badges().await?;
    report.xp_earned += badges.total_xp_earned;

    let after = store.replace(remote.fetch_progress().await?)?;
    report.new_badges = badges_gained(before, &after);

    tracing::info!(
        xp = after.xp,
        level = after.level,
        new_badges = report.new_badges.len(),
        "Progress synchronized"
    );
    Ok(report)
}

/// Single round trip: push when there are unsynced local mutations,
/// otherwise fetch. Either way the server answer replaces the local copy.
pub async fn basic_sync<S: KeyValueStore>(
    store: &ProgressStore<S>,
    remote: &dyn RemoteProgress,
) -> Result<UserProgress, AppError> {
    if store.pending() > 0 {
        return push_local(store, remote).await;
    }
    store.replace(remote.fetch_progress().await?)
}

async fn push_local<S: KeyValueStore>(
    store: &ProgressStore<S>,
    remote: &dyn RemoteProgress,
) -> Result<UserProgress, AppError> {
    let local = store.load();
    let merged = remote.sync_progress(&local, false).await?;
    store.replace(merged.merged_progress)
}

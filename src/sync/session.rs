//! Device-side progress session: recording, badge checks, sync and events.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::config::ClientConfig;
use crate::error::AppError;
use crate::gamification::{
    BadgeAwards, ChallengeProgress, LevelInfo, ProgressChange, XpRewards, advance_daily_challenges,
    award_badges, evaluate_badges, record, refresh_daily_challenges, register_daily_login,
};
use crate::models::{
    badge::BadgeCatalog,
    challenge::ChallengeKind,
    progress::{Category, TestResult, UserProgress},
};
use crate::sync::{
    events::{EventLedger, ProgressEvent},
    reconciler::{self, SyncReport},
    remote::{HttpProgressClient, RemoteProgress},
    store::{FileStore, KeyValueStore, ProgressStore},
};

/// A recorded change plus the daily challenge kinds it counts towards.
type Transition = (ProgressChange, Vec<ChallengeKind>);

/// Owns the local progress copy of one user on one device.
///
/// Without a remote the session works fully offline; mutations then stay
/// pending until a session with a remote syncs them.
pub struct ProgressSync<S: KeyValueStore> {
    store: ProgressStore<S>,
    remote: Option<Arc<dyn RemoteProgress>>,
    catalog: Arc<BadgeCatalog>,
    rewards: XpRewards,
    ledger: EventLedger,
    events: Vec<ProgressEvent>,
}

impl ProgressSync<FileStore> {
    /// File-backed session under `config.data_dir`. Talks to the progress
    /// service only when a token is given.
    pub fn from_config(config: &ClientConfig, token: Option<String>) -> Result<Self, AppError> {
        let session = Self::new(ProgressStore::new(FileStore::new(&config.data_dir)));
        let Some(token) = token else {
            return Ok(session);
        };
        let client = HttpProgressClient::from_config(config)?.with_token(token);
        Ok(session.with_remote(Arc::new(client)))
    }
}

impl<S: KeyValueStore> ProgressSync<S> {
    pub fn new(store: ProgressStore<S>) -> Self {
        let mut ledger = EventLedger::new();
        ledger.seed(&store.load());
        Self {
            store,
            remote: None,
            catalog: Arc::new(BadgeCatalog::standard()),
            rewards: XpRewards::default(),
            ledger,
            events: Vec::new(),
        }
    }

    pub fn with_remote(mut self, remote: Arc<dyn RemoteProgress>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn with_catalog(mut self, catalog: Arc<BadgeCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_rewards(mut self, rewards: XpRewards) -> Self {
        self.rewards = rewards;
        self
    }

    pub fn store(&self) -> &ProgressStore<S> {
        &self.store
    }

    pub fn rewards(&self) -> &XpRewards {
        &self.rewards
    }

    /// The cached copy, available before any network round trip.
    pub fn progress(&self) -> UserProgress {
        self.store.load()
    }

    pub fn level_info(&self) -> LevelInfo {
        LevelInfo::for_xp(self.store.load().xp)
    }

    /// Replaces the cached copy with the server copy when a remote is
    /// reachable. Returns whatever is current afterwards.
    pub async fn load(&mut self) -> UserProgress {
        let Some(remote) = self.remote.clone() else {
            return self.store.load();
        };
        let before = self.store.load();
        let after = reconciler::load(&self.store, &*remote).await;
        self.announce_server_changes(&before, &after);
        after
    }

    /// Full reconciliation with the progress service. Never fails; an
    /// unreachable service yields an unsynced report.
    pub async fn sync(&mut self) -> SyncReport {
        let Some(remote) = self.remote.clone() else {
            tracing::debug!("No progress service configured, skipping sync");
            return SyncReport::default();
        };

        let before = self.store.load();
        let report = reconciler::reconcile(&self.store, &*remote).await;
        if !report.synced {
            return report;
        }

        let after = self.store.load();
        if report.streak_updated {
            let day = after.last_study_date.unwrap_or_else(|| self.store.today());
            self.push_streak(day, report.streak, report.streak_xp);
        }
        self.announce_server_changes(&before, &after);
        report
    }

    pub fn record_correct_answer(
        &mut self,
        category: Category,
        xp_earned: u64,
    ) -> Result<ProgressChange, AppError> {
        self.apply(|progress, today| {
            let change = record::record_correct_answer(progress, category, xp_earned, today);
            let mut kinds = vec![ChallengeKind::Questions, ChallengeKind::Correct];
            if category == Category::RoadSigns {
                kinds.push(ChallengeKind::Category);
            }
            (change, kinds)
        })
    }

    pub fn record_incorrect_answer(
        &mut self,
        category: Category,
    ) -> Result<ProgressChange, AppError> {
        self.apply(|progress, _| {
            let change = record::record_incorrect_answer(progress, category);
            let mut kinds = vec![ChallengeKind::Questions];
            if category == Category::RoadSigns {
                kinds.push(ChallengeKind::Category);
            }
            (change, kinds)
        })
    }

    pub fn record_test_completion(
        &mut self,
        passed: bool,
        is_perfect: bool,
        xp_earned: u64,
    ) -> Result<ProgressChange, AppError> {
        self.apply(|progress, today| {
            let change =
                record::record_test_completion(progress, passed, is_perfect, xp_earned, today);
            (change, vec![ChallengeKind::Test])
        })
    }

    pub fn record_test_result(&mut self, result: TestResult) -> Result<ProgressChange, AppError> {
        self.apply(|progress, today| {
            let change = record::record_test_result(progress, result, today);
            (change, vec![ChallengeKind::Test])
        })
    }

    /// Registers study activity for today on the device clock. The first
    /// activity of a day also rolls the daily challenges over.
    pub fn register_daily_activity(&mut self) -> Result<ProgressChange, AppError> {
        let rewards = self.rewards.clone();
        let mut login = None;
        let change = self.apply(|progress, today| {
            let (level_before, xp_before) = (progress.level, progress.xp);
            refresh_daily_challenges(progress, today);
            let update = register_daily_login(progress, today, &rewards);
            let kinds = if update.new_login {
                vec![ChallengeKind::Streak]
            } else {
                Vec::new()
            };
            login = update.new_login.then_some((today, update));
            let change = ProgressChange {
                xp_gained: progress.xp - xp_before,
                level_before,
                level_after: progress.level,
            };
            (change, kinds)
        })?;

        if let Some((day, update)) = login {
            self.push_streak(day, update.streak, update.xp_earned);
        }
        Ok(change)
    }

    /// Drains the notifications produced since the last call.
    pub fn take_events(&mut self) -> Vec<ProgressEvent> {
        std::mem::take(&mut self.events)
    }

    /// Runs a transition through the store, advances the daily challenges it
    /// counts towards, then runs the badge check and queues the resulting
    /// notifications.
    fn apply(
        &mut self,
        transition: impl FnOnce(&mut UserProgress, NaiveDate) -> Transition,
    ) -> Result<ProgressChange, AppError> {
        let catalog = Arc::clone(&self.catalog);
        let (progress, (change, challenges, awards)) = self.store.update(|progress, today| {
            let (change, kinds) = transition(progress, today);
            let mut challenges = ChallengeProgress::default();
            for kind in kinds {
                let step = advance_daily_challenges(progress, kind, 1, today);
                challenges.completed.extend(step.completed);
                challenges.xp_earned += step.xp_earned;
            }
            let eligible = evaluate_badges(progress, &catalog);
            let awards = award_badges(progress, &catalog, &eligible, today);
            (change, challenges, awards)
        })?;

        let rewards = ProgressChange {
            xp_gained: challenges.xp_earned + awards.xp_awarded,
            level_before: change.level_after,
            level_after: progress.level,
        };
        self.announce_challenges(&progress, &challenges.completed);
        self.announce(&awards, progress.level);
        Ok(change.then(rewards))
    }

    fn announce(&mut self, awards: &BadgeAwards, level: u32) {
        for badge_id in &awards.badge_ids {
            if let Some(event) = self.ledger.badge_unlocked(badge_id) {
                self.events.push(event);
            }
        }
        if let Some(event) = self.ledger.level_reached(level) {
            self.events.push(event);
        }
    }

    fn announce_challenges(&mut self, progress: &UserProgress, completed: &[String]) {
        for challenge in &progress.daily_challenges {
            if !completed.contains(&challenge.id) {
                continue;
            }
            let event = self.ledger.challenge_completed(&challenge.id, challenge.xp_reward);
            self.events.extend(event);
        }
    }

    fn announce_server_changes(&mut self, before: &UserProgress, after: &UserProgress) {
        let completed: Vec<String> = after
            .daily_challenges
            .iter()
            .filter(|challenge| challenge.completed)
            .map(|challenge| challenge.id.clone())
            .collect();
        self.announce_challenges(after, &completed);
        for badge_id in after.badges.difference(&before.badges) {
            if let Some(event) = self.ledger.badge_unlocked(badge_id) {
                self.events.push(event);
            }
        }
        if let Some(event) = self.ledger.level_reached(after.level) {
            self.events.push(event);
        }
    }

    fn push_streak(&mut self, day: NaiveDate, streak: u32, xp_earned: u64) {
        if let Some(event) = self.ledger.streak_extended(day, streak, xp_earned) {
            self.events.push(event);
        }
    }
}

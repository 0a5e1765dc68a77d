//! One-shot progress notifications.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::progress::UserProgress;

/// Something the presentation layer may want to announce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProgressEvent {
    BadgeUnlocked { badge_id: String },
    StreakExtended { streak: u32, xp_earned: u64 },
    LevelUp { level: u32 },
    ChallengeCompleted { challenge_id: String, xp_earned: u64 },
}

/// Remembers what has been announced so each event is emitted at most once,
/// however often the same state is observed.
#[derive(Debug, Default)]
pub struct EventLedger {
    badges: HashSet<String>,
    streak_days: HashSet<NaiveDate>,
    challenges: HashSet<String>,
    level: u32,
}

impl EventLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks everything `progress` already has as announced.
    pub fn seed(&mut self, progress: &UserProgress) {
        self.badges.extend(progress.badges.iter().cloned());
        self.level = self.level.max(progress.level);
        if let Some(day) = progress.last_study_date {
            self.streak_days.insert(day);
        }
        let completed = progress.daily_challenges.iter().filter(|c| c.completed);
        self.challenges.extend(completed.map(|c| c.id.clone()));
    }

    pub fn badge_unlocked(&mut self, badge_id: &str) -> Option<ProgressEvent> {
        self.badges.insert(badge_id.to_string()).then(|| ProgressEvent::BadgeUnlocked {
            badge_id: badge_id.to_string(),
        })
    }

    pub fn streak_extended(
        &mut self,
        day: NaiveDate,
        streak: u32,
        xp_earned: u64,
    ) -> Option<ProgressEvent> {
        self.streak_days
            .insert(day)
            .then_some(ProgressEvent::StreakExtended { streak, xp_earned })
    }

    pub fn challenge_completed(
        &mut self,
        challenge_id: &str,
        xp_earned: u64,
    ) -> Option<ProgressEvent> {
        self.challenges.insert(challenge_id.to_string()).then(|| {
            ProgressEvent::ChallengeCompleted {
                challenge_id: challenge_id.to_string(),
                xp_earned,
            }
        })
    }

    /// Only levels above the highest one seen so far produce an event.
    pub fn level_reached(&mut self, level: u32) -> Option<ProgressEvent> {
        if level <= self.level {
            return None;
        }
        self.level = level;
        Some(ProgressEvent::LevelUp { level })
    }
}

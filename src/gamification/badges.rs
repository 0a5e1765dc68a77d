//! Badge unlock rules.

use chrono::NaiveDate;
use serde::Serialize;

use crate::gamification::record::credit_xp;
use crate::models::{
    badge::{Badge, BadgeCatalog, BadgeRequirement},
    progress::{Category, UserProgress},
};

/// Whether `progress` satisfies a single requirement.
pub fn requirement_met(progress: &UserProgress, requirement: &BadgeRequirement) -> bool {
    match requirement {
        BadgeRequirement::TestsCompleted { value } => progress.tests_completed >= *value,
        BadgeRequirement::PerfectTests { value } => progress.perfect_tests >= *value,
        BadgeRequirement::Streak { value } => progress.current_streak >= *value,
        BadgeRequirement::Xp { value } => progress.xp >= *value,
        BadgeRequirement::CategoryMastery { value, category } => {
            progress.category(*category).mastery >= *value
        }
        BadgeRequirement::QuestionsCompleted { value } => progress.questions_completed >= *value,
        BadgeRequirement::CorrectStreak { value } => progress.best_correct_streak >= *value,
        BadgeRequirement::OverallAccuracy { value, min_questions } => {
            progress.questions_completed >= *min_questions
                && progress.accuracy() >= f64::from(*value)
        }
        BadgeRequirement::AllCategoriesMastery { value } => Category::ALL
            .iter()
            .all(|category| progress.category(*category).mastery >= *value),
        BadgeRequirement::FastTest { seconds } => progress
            .fastest_test_time
            .is_some_and(|fastest| fastest > 0 && fastest < *seconds),
    }
}

/// Ids of catalog badges that `progress` satisfies but has not unlocked yet,
/// in catalog order.
///
/// Pure: the caller appends the ids (see [`award_badges`]) and decides how to
/// announce them.
pub fn evaluate_badges(progress: &UserProgress, catalog: &BadgeCatalog) -> Vec<String> {
    catalog
        .badges
        .iter()
        .filter(|badge| !progress.has_badge(&badge.id))
        .filter(|badge| requirement_met(progress, &badge.requirement))
        .map(|badge| badge.id.clone())
        .collect()
}

/// How close a locked badge is, in percent.
pub fn badge_progress_percent(progress: &UserProgress, badge: &Badge) -> f64 {
    if progress.has_badge(&badge.id) {
        return 100.0;
    }
    let (current, target) = match &badge.requirement {
        BadgeRequirement::TestsCompleted { value } => {
            (f64::from(progress.tests_completed), f64::from(*value))
        }
        BadgeRequirement::PerfectTests { value } => {
            (f64::from(progress.perfect_tests), f64::from(*value))
        }
        BadgeRequirement::Streak { value } => {
            (f64::from(progress.current_streak), f64::from(*value))
        }
        BadgeRequirement::Xp { value } => (progress.xp as f64, *value as f64),
        BadgeRequirement::CategoryMastery { value, category } => {
            (f64::from(progress.category(*category).mastery), f64::from(*value))
        }
        BadgeRequirement::QuestionsCompleted { value } => {
            (f64::from(progress.questions_completed), f64::from(*value))
        }
        BadgeRequirement::CorrectStreak { value } => {
            (f64::from(progress.best_correct_streak), f64::from(*value))
        }
        // Both halves count: the question volume first, then the accuracy.
        BadgeRequirement::OverallAccuracy { value, min_questions } => {
            let volume = if *min_questions == 0 {
                1.0
            } else {
                (f64::from(progress.questions_completed) / f64::from(*min_questions)).min(1.0)
            };
            let accuracy = (progress.accuracy() / f64::from(*value).max(1.0)).min(1.0);
            (volume + accuracy, 2.0)
        }
        BadgeRequirement::AllCategoriesMastery { value } => {
            let total: u32 = Category::ALL
                .iter()
                .map(|category| u32::from(progress.category(*category).mastery.min(*value)))
                .sum();
            (f64::from(total), f64::from(*value) * Category::ALL.len() as f64)
        }
        BadgeRequirement::FastTest { .. } => {
            let met = requirement_met(progress, &badge.requirement);
            (if met { 1.0 } else { 0.0 }, 1.0)
        }
    };
    if target <= 0.0 {
        return 100.0;
    }
    (current / target * 100.0).clamp(0.0, 100.0)
}

/// Badges actually added by [`award_badges`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeAwards {
    pub badge_ids: Vec<String>,
    pub xp_awarded: u64,
}

impl BadgeAwards {
    pub fn is_empty(&self) -> bool {
        self.badge_ids.is_empty()
    }
}

/// Records `badge_ids` as unlocked and credits their XP rewards.
///
/// Ids already present or missing from the catalog are skipped, so a badge is
/// never awarded twice. Badges are never removed.
pub fn award_badges(
    progress: &mut UserProgress,
    catalog: &BadgeCatalog,
    badge_ids: &[String],
    today: NaiveDate,
) -> BadgeAwards {
    let mut awards = BadgeAwards::default();

    for id in badge_ids {
        let Some(badge) = catalog.get(id) else {
            tracing::warn!("Ignoring unknown badge id: {}", id);
            continue;
        };
        if !progress.badges.insert(badge.id.clone()) {
            continue;
        }
        awards.badge_ids.push(badge.id.clone());
        awards.xp_awarded += badge.xp_reward;
    }

    if awards.xp_awarded > 0 {
        credit_xp(progress, awards.xp_awarded, today);
    }
    progress.normalize();
    awards
}

//! Pure state transitions applied when a question is answered or a test ends.
//!
//! Every function mutates the given `UserProgress`, re-derives the level and
//! returns a [`ProgressChange`]. None of them persist or notify; that is the
//! caller's job.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::progress::{Category, MASTERY_GAIN, MASTERY_MAX, TestResult, UserProgress};

const MASTERY_LOSS: u8 = 1;

/// XP amounts awarded by the progress rules. Shared by every client and the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XpRewards {
    pub correct_answer: u64,
    pub test_completion: u64,
    pub perfect_test: u64,
    pub daily_login: u64,

    /// `(streak length, bonus)` pairs paid when a streak reaches that length.
    pub streak_milestones: Vec<(u32, u64)>,
}

impl Default for XpRewards {
    fn default() -> Self {
        Self {
            correct_answer: 10,
            test_completion: 25,
            perfect_test: 50,
            daily_login: 50,
            streak_milestones: vec![(7, 300), (14, 500), (30, 1000)],
        }
    }
}

impl XpRewards {
    /// XP for finishing a test, including the perfect-score bonus.
    pub fn for_test(&self, is_perfect: bool) -> u64 {
        if is_perfect {
            self.test_completion + self.perfect_test
        } else {
            self.test_completion
        }
    }

    pub fn streak_bonus(&self, streak: u32) -> u64 {
        self.streak_milestones
            .iter()
            .find(|(days, _)| *days == streak)
            .map(|(_, bonus)| *bonus)
            .unwrap_or(0)
    }
}

/// What a transition did to XP and level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressChange {
    pub xp_gained: u64,
    pub level_before: u32,
    pub level_after: u32,
}

impl ProgressChange {
    pub fn leveled_up(&self) -> bool {
        self.level_after > self.level_before
    }

    /// Folds two consecutive changes into one.
    pub fn then(self, next: ProgressChange) -> ProgressChange {
        ProgressChange {
            xp_gained: self.xp_gained + next.xp_gained,
            level_before: self.level_before,
            level_after: next.level_after,
        }
    }
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Adds `amount` XP earned on `today`, rolling the weekly buckets over when a
/// new week has started.
pub fn credit_xp(progress: &mut UserProgress, amount: u64, today: NaiveDate) {
    progress.xp = progress.xp.saturating_add(amount);

    let monday = week_start(today);
    match progress.week_start {
        Some(current) if current == monday => {}
        // Activity dated before the tracked week only counts towards the total.
        Some(current) if monday < current => return,
        _ => {
            progress.weekly_xp = [0; 7];
            progress.week_start = Some(monday);
        }
    }
    let day = today.weekday().num_days_from_monday() as usize;
    progress.weekly_xp[day] = progress.weekly_xp[day].saturating_add(amount);
}

fn finish(progress: &mut UserProgress, level_before: u32, xp_before: u64) -> ProgressChange {
    progress.normalize();
    ProgressChange {
        xp_gained: progress.xp - xp_before,
        level_before,
        level_after: progress.level,
    }
}

pub fn record_correct_answer(
    progress: &mut UserProgress,
    category: Category,
    xp_earned: u64,
    today: NaiveDate,
) -> ProgressChange {
    let (level_before, xp_before) = (progress.level, progress.xp);

    let mut stats = progress.category(category);
    stats.questions_answered += 1;
    stats.correct_answers += 1;
    stats.mastery = stats.mastery.saturating_add(MASTERY_GAIN).min(MASTERY_MAX);
    stats.normalize();
    progress.category_progress.insert(category, stats);

    progress.questions_completed += 1;
    progress.questions_correct += 1;
    progress.correct_streak += 1;
    credit_xp(progress, xp_earned, today);

    finish(progress, level_before, xp_before)
}

pub fn record_incorrect_answer(progress: &mut UserProgress, category: Category) -> ProgressChange {
    let (level_before, xp_before) = (progress.level, progress.xp);

    let mut stats = progress.category(category);
    stats.questions_answered += 1;
    stats.mastery = stats.mastery.saturating_sub(MASTERY_LOSS);
    stats.normalize();
    progress.category_progress.insert(category, stats);

    progress.questions_completed += 1;
    progress.correct_streak = 0;

    finish(progress, level_before, xp_before)
}

pub fn record_test_completion(
    progress: &mut UserProgress,
    passed: bool,
    is_perfect: bool,
    xp_earned: u64,
    today: NaiveDate,
) -> ProgressChange {
    let (level_before, xp_before) = (progress.level, progress.xp);

    progress.tests_completed += 1;
    if passed {
        progress.tests_passed += 1;
    }
    if is_perfect {
        progress.perfect_tests += 1;
    }
    credit_xp(progress, xp_earned, today);

    finish(progress, level_before, xp_before)
}

/// Prepends `result` to the test history and applies [`record_test_completion`].
///
/// A passed test with a known duration may also set a new fastest time.
pub fn record_test_result(
    progress: &mut UserProgress,
    result: TestResult,
    today: NaiveDate,
) -> ProgressChange {
    let (passed, is_perfect, xp_earned) = (result.passed, result.is_perfect(), result.xp_earned);
    if passed && result.time_spent > 0 {
        let fastest = progress.fastest_test_time.map_or(result.time_spent, |current| {
            current.min(result.time_spent)
        });
        progress.fastest_test_time = Some(fastest);
    }
    progress.test_history.insert(0, result);
    record_test_completion(progress, passed, is_perfect, xp_earned, today)
}

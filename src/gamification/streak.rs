//! Daily study streak.

use chrono::NaiveDate;
use serde::Serialize;

use crate::gamification::record::{XpRewards, credit_xp};
use crate::models::progress::UserProgress;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakUpdate {
    pub streak: u32,
    pub longest_streak: u32,

    /// Daily login XP plus any milestone bonus.
    pub xp_earned: u64,

    /// False when `today` was already registered.
    pub new_login: bool,
}

/// Registers activity on `today`.
///
/// A second call on the same day changes nothing. Activity on the day after
/// `last_study_date` extends the streak; any longer gap restarts it at 1.
pub fn register_daily_login(
    progress: &mut UserProgress,
    today: NaiveDate,
    rewards: &XpRewards,
) -> StreakUpdate {
    let streak = match progress.last_study_date {
        Some(last) if last >= today => {
            return StreakUpdate {
                streak: progress.current_streak,
                longest_streak: progress.longest_streak,
                xp_earned: 0,
                new_login: false,
            };
        }
        Some(last) if (today - last).num_days() == 1 => progress.current_streak + 1,
        _ => 1,
    };

    let xp_earned = rewards.daily_login + rewards.streak_bonus(streak);

    progress.current_streak = streak;
    progress.longest_streak = progress.longest_streak.max(streak);
    progress.last_study_date = Some(today);
    credit_xp(progress, xp_earned, today);
    progress.normalize();

    StreakUpdate {
        streak,
        longest_streak: progress.longest_streak,
        xp_earned,
        new_login: true,
    }
}

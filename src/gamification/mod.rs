//! Progress rules shared by the device core and the progress service.

pub mod badges;
pub mod challenges;
pub mod leveling;
pub mod merge;
pub mod record;
pub mod streak;

pub use badges::{BadgeAwards, award_badges, evaluate_badges};
pub use challenges::{
    ChallengeProgress, advance_daily_challenges, generate_daily_challenges,
    refresh_daily_challenges,
};
pub use leveling::{LevelInfo, level_from_xp, level_progress_percent, xp_for_level};
pub use record::{ProgressChange, XpRewards};
pub use streak::{StreakUpdate, register_daily_login};

//! Triangular XP curve.
//!
//! Reaching level `L` costs `T(L) = 100 * L * (L - 1) / 2` cumulative XP, so the
//! step from `L` to `L + 1` costs `100 * L`.

use serde::Serialize;

const XP_STEP: u128 = 100;

fn threshold(level: u32) -> u128 {
    let level = u128::from(level.max(1));
    XP_STEP * level * (level - 1) / 2
}

/// Cumulative XP needed to reach `level`. Level 0 is read as level 1.
pub fn xp_for_level(level: u32) -> u64 {
    u64::try_from(threshold(level)).unwrap_or(u64::MAX)
}

/// Largest level whose threshold does not exceed `xp`. Always at least 1.
pub fn level_from_xp(xp: u64) -> u32 {
    // Closed-form guess, then settle on the exact integer boundary.
    let guess = (1.0 + (1.0 + 8.0 * xp as f64 / XP_STEP as f64).sqrt()) / 2.0;
    let mut level = (guess as u32).max(1);
    let xp_wide = u128::from(xp);

    while level > 1 && threshold(level) > xp_wide {
        level -= 1;
    }
    while level < u32::MAX && threshold(level + 1) <= xp_wide {
        level += 1;
    }
    level
}

/// XP still missing before the next level.
pub fn xp_to_next_level(xp: u64) -> u64 {
    xp_for_level(level_from_xp(xp) + 1).saturating_sub(xp)
}

/// Position inside the current level, in percent, clamped to `[0, 100]`.
pub fn level_progress_percent(xp: u64) -> f64 {
    let level = level_from_xp(xp);
    let floor = xp_for_level(level);
    let ceiling = xp_for_level(level + 1);
    if ceiling <= floor {
        return 100.0;
    }
    let percent = (xp - floor) as f64 / (ceiling - floor) as f64 * 100.0;
    percent.clamp(0.0, 100.0)
}

/// Everything a progress bar needs for one XP total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelInfo {
    pub level: u32,
    pub current_level_xp: u64,
    pub next_level_xp: u64,
    pub progress_percent: f64,
}

impl LevelInfo {
    pub fn for_xp(xp: u64) -> Self {
        let level = level_from_xp(xp);
        Self {
            level,
            current_level_xp: xp_for_level(level),
            next_level_xp: xp_for_level(level + 1),
            progress_percent: level_progress_percent(xp),
        }
    }
}

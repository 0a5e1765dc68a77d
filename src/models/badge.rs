// src/models/badge.rs

use serde::{Deserialize, Serialize};

use crate::models::progress::Category;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
    Legendary,
}

impl BadgeTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            BadgeTier::Bronze => "bronze",
            BadgeTier::Silver => "silver",
            BadgeTier::Gold => "gold",
            BadgeTier::Platinum => "platinum",
            BadgeTier::Legendary => "legendary",
        }
    }
}

/// Unlock condition of a badge. Serialized with a `type` tag, e.g.
/// `{"type": "category_mastery", "value": 80, "category": "Rules of the Road"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BadgeRequirement {
    TestsCompleted { value: u32 },
    PerfectTests { value: u32 },
    Streak { value: u32 },
    Xp { value: u64 },
    CategoryMastery { value: u8, category: Category },
    QuestionsCompleted { value: u32 },
    /// Longest run of consecutive correct answers.
    CorrectStreak { value: u32 },
    /// Overall accuracy in percent, once at least `min_questions` are answered.
    OverallAccuracy { value: u8, min_questions: u32 },
    /// Mastery of at least `value` in every category.
    AllCategoriesMastery { value: u8 },
    /// A passed test finished in under `seconds`.
    FastTest { seconds: u32 },
}

/// Static catalog entry. Only the id is persisted per user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub tier: BadgeTier,

    /// XP credited when the badge is awarded.
    pub xp_reward: u64,
    pub requirement: BadgeRequirement,
}

/// Versioned list of every badge a user can earn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeCatalog {
    pub version: u32,
    pub badges: Vec<Badge>,
}

impl BadgeCatalog {
    pub const STANDARD_VERSION: u32 = 2;

    pub fn get(&self, badge_id: &str) -> Option<&Badge> {
        self.badges.iter().find(|b| b.id == badge_id)
    }

    pub fn len(&self) -> usize {
        self.badges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.badges.is_empty()
    }

    /// The compiled-in catalog shared by the device core and the progress service.
    pub fn standard() -> Self {
        use BadgeRequirement::*;
        use BadgeTier::*;

        let badges = vec![
            badge(
                "first_steps",
                "First Steps",
                "Complete your first question",
                "👶",
                Bronze,
                50,
                QuestionsCompleted { value: 1 },
            ),
            badge(
                "first_test",
                "First Test",
                "Complete your first practice test",
                "🎯",
                Bronze,
                50,
                TestsCompleted { value: 1 },
            ),
            badge(
                "xp_100",
                "Getting Started",
                "Earn 100 XP",
                "✨",
                Bronze,
                25,
                Xp { value: 100 },
            ),
            badge(
                "streak_3",
                "On Fire",
                "Maintain a 3-day study streak",
                "🔥",
                Bronze,
                75,
                Streak { value: 3 },
            ),
            badge(
                "quick_learner",
                "Quick Learner",
                "Complete 25 questions",
                "📚",
                Bronze,
                100,
                QuestionsCompleted { value: 25 },
            ),
            badge(
                "test_veteran",
                "Test Veteran",
                "Complete 10 practice tests",
                "🏅",
                Silver,
                200,
                TestsCompleted { value: 10 },
            ),
            badge(
                "road_scholar",
                "Road Scholar",
                "Complete 100 practice questions",
                "🎓",
                Silver,
                250,
                QuestionsCompleted { value: 100 },
            ),
            badge(
                "streak_7",
                "Week Warrior",
                "Maintain a 7-day study streak",
                "💪",
                Silver,
                300,
                Streak { value: 7 },
            ),
            badge(
                "xp_1000",
                "Rising Star",
                "Earn 1,000 XP",
                "🌟",
                Silver,
                200,
                Xp { value: 1000 },
            ),
            badge(
                "sharpshooter",
                "Sharpshooter",
                "Get 10 correct answers in a row",
                "🎯",
                Silver,
                200,
                CorrectStreak { value: 10 },
            ),
            badge(
                "speed_demon",
                "Speed Demon",
                "Pass a test in under 15 minutes",
                "⚡",
                Silver,
                250,
                FastTest { seconds: 900 },
            ),
            badge(
                "perfect_score",
                "Perfect Score",
                "Get 100% on a practice test",
                "⭐",
                Gold,
                500,
                PerfectTests { value: 1 },
            ),
            badge(
                "signs_master",
                "Signs Expert",
                "Master Road Signs & Signals",
                "🚦",
                Gold,
                500,
                CategoryMastery { value: 80, category: Category::RoadSigns },
            ),
            badge(
                "rules_master",
                "Rules Expert",
                "Master Rules of the Road",
                "📜",
                Gold,
                500,
                CategoryMastery { value: 80, category: Category::RulesOfTheRoad },
            ),
            badge(
                "driving_master",
                "Driving Expert",
                "Master Safe Driving & Vehicle Handling",
                "🚗",
                Gold,
                500,
                CategoryMastery { value: 80, category: Category::SafeDriving },
            ),
            badge(
                "dedicated_driver",
                "Dedicated Driver",
                "Complete 250 questions",
                "🚙",
                Gold,
                500,
                QuestionsCompleted { value: 250 },
            ),
            badge(
                "category_champion",
                "Category Champion",
                "Master all 6 categories",
                "🏆",
                Gold,
                750,
                AllCategoriesMastery { value: 80 },
            ),
            badge(
                "test_master",
                "Test Master",
                "Complete 50 practice tests",
                "🎖️",
                Platinum,
                750,
                TestsCompleted { value: 50 },
            ),
            badge(
                "perfectionist",
                "Perfectionist",
                "Get 5 perfect scores",
                "💎",
                Platinum,
                1000,
                PerfectTests { value: 5 },
            ),
            badge(
                "streak_30",
                "Dedicated Learner",
                "Maintain a 30-day study streak",
                "🏆",
                Platinum,
                1000,
                Streak { value: 30 },
            ),
            badge(
                "xp_5000",
                "XP Master",
                "Earn 5,000 XP",
                "👑",
                Legendary,
                2000,
                Xp { value: 5000 },
            ),
            badge(
                "g1_legend",
                "G1 Legend",
                "Complete 500+ questions with 90%+ accuracy",
                "👑",
                Legendary,
                2000,
                OverallAccuracy { value: 90, min_questions: 500 },
            ),
        ];

        Self {
            version: Self::STANDARD_VERSION,
            badges,
        }
    }
}

fn badge(
    id: &str,
    name: &str,
    description: &str,
    icon: &str,
    tier: BadgeTier,
    xp_reward: u64,
    requirement: BadgeRequirement,
) -> Badge {
    Badge {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        icon: icon.to_string(),
        tier,
        xp_reward,
        requirement,
    }
}

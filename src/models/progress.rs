// src/models/progress.rs

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::gamification::leveling::level_from_xp;
use crate::models::challenge::DailyChallenge;

/// Maximum number of test results kept in `UserProgress::test_history`.
pub const TEST_HISTORY_LIMIT: usize = 50;

pub const MASTERY_MAX: u8 = 100;

/// Mastery gained per correct answer; also bounds mastery by the number of
/// correct answers.
pub const MASTERY_GAIN: u8 = 2;

/// The six handbook categories every question belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Road Signs & Signals")]
    RoadSigns,
    #[serde(rename = "Rules of the Road")]
    RulesOfTheRoad,
    #[serde(rename = "Safe Driving & Vehicle Handling")]
    SafeDriving,
    #[serde(rename = "Alcohol/Drugs & Penalties")]
    AlcoholAndDrugs,
    #[serde(rename = "Licensing & Documents")]
    Licensing,
    #[serde(rename = "Miscellaneous")]
    Miscellaneous,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::RoadSigns,
        Category::RulesOfTheRoad,
        Category::SafeDriving,
        Category::AlcoholAndDrugs,
        Category::Licensing,
        Category::Miscellaneous,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Category::RoadSigns => "Road Signs & Signals",
            Category::RulesOfTheRoad => "Rules of the Road",
            Category::SafeDriving => "Safe Driving & Vehicle Handling",
            Category::AlcoholAndDrugs => "Alcohol/Drugs & Penalties",
            Category::Licensing => "Licensing & Documents",
            Category::Miscellaneous => "Miscellaneous",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Per-category answer statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CategoryProgress {
    pub questions_answered: u32,
    pub correct_answers: u32,

    /// Percentage of correct answers, recomputed on every update.
    pub accuracy: f64,

    /// Bounded mastery score in `0..=100`.
    pub mastery: u8,
}

impl CategoryProgress {
    /// Restores `correct <= answered`, bounds mastery and recomputes accuracy.
    pub fn normalize(&mut self) {
        self.correct_answers = self.correct_answers.min(self.questions_answered);

        let earned = u64::from(self.correct_answers) * u64::from(MASTERY_GAIN);
        let ceiling = earned.min(u64::from(MASTERY_MAX)) as u8;
        self.mastery = self.mastery.min(ceiling);

        self.accuracy = if self.questions_answered == 0 {
            0.0
        } else {
            f64::from(self.correct_answers) / f64::from(self.questions_answered) * 100.0
        };
    }
}

/// One finished practice test. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub id: String,
    pub completed_at: DateTime<Utc>,

    /// Number of correctly answered questions.
    pub score: u32,
    pub total_questions: u32,
    pub passed: bool,

    /// Seconds spent on the test.
    #[serde(default)]
    pub time_spent: u32,
    #[serde(default)]
    pub xp_earned: u64,
}

impl TestResult {
    pub fn new(
        score: u32,
        total_questions: u32,
        passed: bool,
        time_spent: u32,
        xp_earned: u64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            completed_at: Utc::now(),
            score,
            total_questions,
            passed,
            time_spent,
            xp_earned,
        }
    }

    pub fn is_perfect(&self) -> bool {
        self.total_questions > 0 && self.score == self.total_questions
    }
}

/// The progress record owned by the device and mirrored by the server.
///
/// Missing fields deserialize to their zero values so older blobs keep loading
/// after new fields are added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProgress {
    pub user_id: String,
    pub xp: u64,

    /// Derived from `xp`; see [`UserProgress::normalize`].
    pub level: u32,

    #[serde(alias = "streak")]
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_study_date: Option<NaiveDate>,

    pub tests_completed: u32,
    pub tests_passed: u32,
    pub perfect_tests: u32,

    #[serde(alias = "questionsAnswered")]
    pub questions_completed: u32,
    #[serde(alias = "correctAnswers")]
    pub questions_correct: u32,

    /// Current run of consecutive correct answers.
    pub correct_streak: u32,
    pub best_correct_streak: u32,

    pub category_progress: BTreeMap<Category, CategoryProgress>,

    /// Unlocked badge ids. Append-only.
    pub badges: BTreeSet<String>,

    /// Most recent first.
    pub test_history: Vec<TestResult>,

    /// XP per day of the current week, Monday first.
    pub weekly_xp: [u64; 7],
    pub week_start: Option<NaiveDate>,

    /// Seconds of the fastest passed test.
    pub fastest_test_time: Option<u32>,

    pub daily_challenges: Vec<DailyChallenge>,

    /// Day `daily_challenges` were generated for.
    pub daily_challenge_date: Option<NaiveDate>,
}

impl Default for UserProgress {
    fn default() -> Self {
        Self {
            user_id: String::new(),
            xp: 0,
            level: 1,
            current_streak: 0,
            longest_streak: 0,
            last_study_date: None,
            tests_completed: 0,
            tests_passed: 0,
            perfect_tests: 0,
            questions_completed: 0,
            questions_correct: 0,
            correct_streak: 0,
            best_correct_streak: 0,
            category_progress: BTreeMap::new(),
            badges: BTreeSet::new(),
            test_history: Vec::new(),
            weekly_xp: [0; 7],
            week_start: None,
            fastest_test_time: None,
            daily_challenges: Vec::new(),
            daily_challenge_date: None,
        }
    }
}

impl UserProgress {
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Self::default()
        }
    }

    /// Stats for `category`, or a zero record when it has never been answered.
    pub fn category(&self, category: Category) -> CategoryProgress {
        self.category_progress.get(&category).cloned().unwrap_or_default()
    }

    pub fn has_badge(&self, badge_id: &str) -> bool {
        self.badges.contains(badge_id)
    }

    /// Overall accuracy in percent.
    pub fn accuracy(&self) -> f64 {
        if self.questions_completed == 0 {
            return 0.0;
        }
        f64::from(self.questions_correct) / f64::from(self.questions_completed) * 100.0
    }

    /// Re-derives `level` from `xp` and restores the counter invariants.
    pub fn normalize(&mut self) {
        self.level = level_from_xp(self.xp);
        self.longest_streak = self.longest_streak.max(self.current_streak);
        self.best_correct_streak = self.best_correct_streak.max(self.correct_streak);
        self.questions_correct = self.questions_correct.min(self.questions_completed);
        self.tests_passed = self.tests_passed.min(self.tests_completed);
        self.perfect_tests = self.perfect_tests.min(self.tests_completed);
        self.test_history.truncate(TEST_HISTORY_LIMIT);
        for stats in self.category_progress.values_mut() {
            stats.normalize();
        }
        // Zero is how older clients spell "no passed test yet".
        self.fastest_test_time = self.fastest_test_time.filter(|seconds| *seconds > 0);
        for challenge in &mut self.daily_challenges {
            challenge.normalize();
        }
    }
}

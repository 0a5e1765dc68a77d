// src/models/challenge.rs

use serde::{Deserialize, Serialize};

/// What a daily challenge counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeKind {
    /// Any answered question.
    Questions,
    Correct,
    /// Answered Road Signs & Signals questions.
    Category,
    /// Finished practice tests.
    Test,
    Streak,
}

/// One of the day's three goals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyChallenge {
    /// `{date}-{kind}-{slot}`, stable across devices for the same day.
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ChallengeKind,
    pub description: String,
    pub target: u32,
    #[serde(default)]
    pub progress: u32,
    pub xp_reward: u64,
    #[serde(default)]
    pub completed: bool,
}

impl DailyChallenge {
    pub fn normalize(&mut self) {
        self.target = self.target.max(1);
        self.progress = self.progress.min(self.target);
        if self.progress == self.target {
            self.completed = true;
        }
    }
}

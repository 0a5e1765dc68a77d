//! Daily challenges: three small goals that rotate every day.
//!
//! The selection is seeded by the date, so every device generates the same
//! challenges for the same day.

use chrono::{Datelike, NaiveDate};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Serialize;

use crate::gamification::record::credit_xp;
use crate::models::challenge::{ChallengeKind, DailyChallenge};
use crate::models::progress::UserProgress;

pub const CHALLENGES_PER_DAY: usize = 3;

pub struct ChallengeTemplate {
    pub kind: ChallengeKind,
    description: &'static str,
    pub targets: &'static [u32],
    pub xp_reward: u64,
}

impl ChallengeTemplate {
    pub fn description(&self, target: u32) -> String {
        self.description.replace("{target}", &target.to_string())
    }
}

pub const CHALLENGE_TEMPLATES: [ChallengeTemplate; 5] = [
    ChallengeTemplate {
        kind: ChallengeKind::Questions,
        description: "Answer {target} questions",
        targets: &[10, 15, 20, 25],
        xp_reward: 100,
    },
    ChallengeTemplate {
        kind: ChallengeKind::Correct,
        description: "Get {target} correct answers",
        targets: &[5, 8, 10, 15],
        xp_reward: 120,
    },
    ChallengeTemplate {
        kind: ChallengeKind::Category,
        description: "Answer {target} Road Signs questions",
        targets: &[5, 8, 10],
        xp_reward: 100,
    },
    ChallengeTemplate {
        kind: ChallengeKind::Test,
        description: "Complete a practice test",
        targets: &[1],
        xp_reward: 150,
    },
    ChallengeTemplate {
        kind: ChallengeKind::Streak,
        description: "Maintain your daily streak",
        targets: &[1],
        xp_reward: 50,
    },
];

fn kind_slug(kind: ChallengeKind) -> &'static str {
    match kind {
        ChallengeKind::Questions => "questions",
        ChallengeKind::Correct => "correct",
        ChallengeKind::Category => "category",
        ChallengeKind::Test => "test",
        ChallengeKind::Streak => "streak",
    }
}

/// The challenges for `day`, with distinct kinds. Same day, same challenges.
pub fn generate_daily_challenges(day: NaiveDate) -> Vec<DailyChallenge> {
    let mut rng = StdRng::seed_from_u64(day.num_days_from_ce() as u64);

    CHALLENGE_TEMPLATES
        .choose_multiple(&mut rng, CHALLENGES_PER_DAY)
        .enumerate()
        .map(|(slot, template)| {
            let target = template.targets.choose(&mut rng).copied().unwrap_or(1);
            DailyChallenge {
                id: format!("{}-{}-{}", day, kind_slug(template.kind), slot),
                kind: template.kind,
                description: template.description(target),
                target,
                progress: 0,
                xp_reward: template.xp_reward,
                completed: false,
            }
        })
        .collect()
}

/// Replaces stale challenges with today's. Returns whether anything changed.
pub fn refresh_daily_challenges(progress: &mut UserProgress, today: NaiveDate) -> bool {
    if progress.daily_challenge_date == Some(today) && !progress.daily_challenges.is_empty() {
        return false;
    }
    progress.daily_challenges = generate_daily_challenges(today);
    progress.daily_challenge_date = Some(today);
    true
}

/// Challenges finished by one [`advance_daily_challenges`] call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeProgress {
    pub completed: Vec<String>,
    pub xp_earned: u64,
}

/// Moves every open challenge of `kind` forward by `amount` and credits the
/// reward of the ones that reach their target.
///
/// Challenges generated for another day are left alone.
pub fn advance_daily_challenges(
    progress: &mut UserProgress,
    kind: ChallengeKind,
    amount: u32,
    today: NaiveDate,
) -> ChallengeProgress {
    let mut outcome = ChallengeProgress::default();
    if progress.daily_challenge_date != Some(today) {
        return outcome;
    }

    for challenge in &mut progress.daily_challenges {
        if challenge.kind != kind || challenge.completed {
            continue;
        }
        challenge.progress = challenge.progress.saturating_add(amount).min(challenge.target);
        if challenge.progress >= challenge.target {
            challenge.completed = true;
            outcome.completed.push(challenge.id.clone());
            outcome.xp_earned += challenge.xp_reward;
        }
    }

    if outcome.xp_earned > 0 {
        credit_xp(progress, outcome.xp_earned, today);
        progress.normalize();
    }
    outcome
}

// tests/challenge_tests.rs

use std::collections::HashSet;

use chrono::{Duration, NaiveDate};
use driveprep::gamification::challenges::{
    CHALLENGE_TEMPLATES, CHALLENGES_PER_DAY, advance_daily_challenges, generate_daily_challenges,
    refresh_daily_challenges,
};
use driveprep::models::challenge::{ChallengeKind, DailyChallenge};
use driveprep::models::progress::UserProgress;

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 12).unwrap()
}

fn open_challenge(id: &str, kind: ChallengeKind, target: u32, xp_reward: u64) -> DailyChallenge {
    DailyChallenge {
        id: id.to_string(),
        kind,
        description: String::new(),
        target,
        progress: 0,
        xp_reward,
        completed: false,
    }
}

fn progress_with(challenges: Vec<DailyChallenge>) -> UserProgress {
    UserProgress {
        daily_challenges: challenges,
        daily_challenge_date: Some(day()),
        ..UserProgress::default()
    }
}

#[test]
fn same_day_generates_the_same_challenges() {
    let first = generate_daily_challenges(day());
    let second = generate_daily_challenges(day());

    assert_eq!(first, second);
    assert_eq!(first.len(), CHALLENGES_PER_DAY);
}

#[test]
fn generated_challenges_follow_the_templates() {
    for offset in 0..60 {
        let date = day() + Duration::days(offset);
        let challenges = generate_daily_challenges(date);

        let kinds: HashSet<_> = challenges.iter().map(|c| c.kind).collect();
        assert_eq!(kinds.len(), CHALLENGES_PER_DAY);

        for (slot, challenge) in challenges.iter().enumerate() {
            let template = CHALLENGE_TEMPLATES
                .iter()
                .find(|t| t.kind == challenge.kind)
                .unwrap();
            assert!(challenge.id.starts_with(&date.to_string()));
            assert!(challenge.id.ends_with(&format!("-{}", slot)));
            assert!(template.targets.contains(&challenge.target));
            assert_eq!(challenge.xp_reward, template.xp_reward);
            assert_eq!(challenge.description, template.description(challenge.target));
            assert_eq!(challenge.progress, 0);
            assert!(!challenge.completed);
        }
    }
}

#[test]
fn challenges_rotate_between_days() {
    let first = generate_daily_challenges(day());
    let rotated = (1..30)
        .map(|offset| generate_daily_challenges(day() + Duration::days(offset)))
        .any(|other| {
            let kinds = |list: &[DailyChallenge]| list.iter().map(|c| c.kind).collect::<Vec<_>>();
            kinds(&other) != kinds(&first)
        });
    assert!(rotated);
}

#[test]
fn refresh_only_replaces_stale_challenges() {
    let mut progress = UserProgress::default();
    assert!(refresh_daily_challenges(&mut progress, day()));
    assert_eq!(progress.daily_challenge_date, Some(day()));
    assert_eq!(progress.daily_challenges, generate_daily_challenges(day()));

    progress.daily_challenges[0].progress = 1;
    let snapshot = progress.clone();
    assert!(!refresh_daily_challenges(&mut progress, day()));
    assert_eq!(progress, snapshot);

    let tomorrow = day() + Duration::days(1);
    assert!(refresh_daily_challenges(&mut progress, tomorrow));
    assert_eq!(progress.daily_challenge_date, Some(tomorrow));
    assert!(progress.daily_challenges.iter().all(|c| c.progress == 0));
}

#[test]
fn advance_caps_progress_and_pays_once() {
    let mut progress = progress_with(vec![
        open_challenge("q", ChallengeKind::Questions, 3, 100),
        open_challenge("c", ChallengeKind::Correct, 5, 120),
    ]);

    let step = advance_daily_challenges(&mut progress, ChallengeKind::Questions, 2, day());
    assert!(step.completed.is_empty());
    assert_eq!(step.xp_earned, 0);
    assert_eq!(progress.daily_challenges[0].progress, 2);

    let step = advance_daily_challenges(&mut progress, ChallengeKind::Questions, 5, day());
    assert_eq!(step.completed, vec!["q"]);
    assert_eq!(step.xp_earned, 100);
    assert_eq!(progress.daily_challenges[0].progress, 3);
    assert!(progress.daily_challenges[0].completed);
    assert_eq!(progress.xp, 100);
    assert_eq!(progress.level, 2);

    let again = advance_daily_challenges(&mut progress, ChallengeKind::Questions, 1, day());
    assert_eq!(again.xp_earned, 0);
    assert_eq!(progress.xp, 100);
    assert_eq!(progress.daily_challenges[1].progress, 0);
}

#[test]
fn stale_challenges_do_not_advance() {
    let mut progress = progress_with(vec![open_challenge("t", ChallengeKind::Test, 1, 150)]);

    let tomorrow = day() + Duration::days(1);
    let step = advance_daily_challenges(&mut progress, ChallengeKind::Test, 1, tomorrow);

    assert_eq!(step.xp_earned, 0);
    assert_eq!(progress.daily_challenges[0].progress, 0);
    assert_eq!(progress.xp, 0);
}

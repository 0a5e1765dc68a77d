//! Server-side merge of an uploaded device copy into the stored copy.

use std::collections::{HashMap, HashSet};

use crate::models::challenge::DailyChallenge;
use crate::models::progress::UserProgress;

/// Combines the stored `server` copy with an uploaded `local` copy.
///
/// Counters keep the larger value, badges and test history are unions, so a
/// merge never loses progress recorded on either side. Category stats come
/// from `local` when `force_overwrite` is set or nothing is stored yet;
/// otherwise whichever side answered more questions in that category wins.
/// The fastest test time is the smaller known time; daily challenges follow
/// the newer day and keep the further progress of each challenge.
pub fn merge_progress(
    server: Option<&UserProgress>,
    local: &UserProgress,
    force_overwrite: bool,
) -> UserProgress {
    let Some(server) = server else {
        let mut merged = local.clone();
        merged.normalize();
        return merged;
    };

    let mut merged = server.clone();
    merged.xp = server.xp.max(local.xp);
    merged.current_streak = server.current_streak.max(local.current_streak);
    merged.longest_streak = server.longest_streak.max(local.longest_streak);
    merged.last_study_date = server.last_study_date.max(local.last_study_date);
    merged.tests_completed = server.tests_completed.max(local.tests_completed);
    merged.tests_passed = server.tests_passed.max(local.tests_passed);
    merged.perfect_tests = server.perfect_tests.max(local.perfect_tests);
    merged.questions_completed = server.questions_completed.max(local.questions_completed);
    merged.questions_correct = server.questions_correct.max(local.questions_correct);
    merged.best_correct_streak = server.best_correct_streak.max(local.best_correct_streak);
    merged.correct_streak = local.correct_streak;
    merged.badges.extend(local.badges.iter().cloned());
    merged.fastest_test_time = fastest(server.fastest_test_time, local.fastest_test_time);
    merge_challenges(&mut merged, local);

    if force_overwrite {
        merged.category_progress = local.category_progress.clone();
    } else {
        for (category, stats) in &local.category_progress {
            let keep_server = server
                .category_progress
                .get(category)
                .is_some_and(|s| s.questions_answered > stats.questions_answered);
            if !keep_server {
                merged.category_progress.insert(*category, stats.clone());
            }
        }
    }

    match (server.week_start, local.week_start) {
        (Some(s), Some(l)) if s == l => {
            for (bucket, local_xp) in merged.weekly_xp.iter_mut().zip(local.weekly_xp) {
                *bucket = (*bucket).max(local_xp);
            }
        }
        (s, l) if l > s => {
            merged.weekly_xp = local.weekly_xp;
            merged.week_start = local.week_start;
        }
        _ => {}
    }

    let mut seen: HashSet<String> = merged.test_history.iter().map(|t| t.id.clone()).collect();
    for test in &local.test_history {
        if seen.insert(test.id.clone()) {
            merged.test_history.push(test.clone());
        }
    }
    merged.test_history.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));

    merged.normalize();
    merged
}

fn fastest(server: Option<u32>, local: Option<u32>) -> Option<u32> {
    let known = |time: Option<u32>| time.filter(|seconds| *seconds > 0);
    match (known(server), known(local)) {
        (Some(s), Some(l)) => Some(s.min(l)),
        (s, l) => s.or(l),
    }
}

fn merge_challenges(merged: &mut UserProgress, local: &UserProgress) {
    if local.daily_challenges.is_empty() {
        return;
    }
    if local.daily_challenge_date > merged.daily_challenge_date
        || merged.daily_challenges.is_empty()
    {
        merged.daily_challenges = local.daily_challenges.clone();
        merged.daily_challenge_date = local.daily_challenge_date;
        return;
    }
    if local.daily_challenge_date < merged.daily_challenge_date {
        return;
    }

    let local_by_id: HashMap<&str, &DailyChallenge> = local
        .daily_challenges
        .iter()
        .map(|challenge| (challenge.id.as_str(), challenge))
        .collect();
    for challenge in &mut merged.daily_challenges {
        if let Some(other) = local_by_id.get(challenge.id.as_str()) {
            challenge.progress = challenge.progress.max(other.progress);
            challenge.completed |= other.completed;
        }
    }
}

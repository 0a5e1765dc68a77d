// tests/badge_tests.rs

use chrono::NaiveDate;
use driveprep::gamification::badges::{award_badges, badge_progress_percent, evaluate_badges};
use driveprep::gamification::record::{
    record_correct_answer, record_incorrect_answer, record_test_result,
};
use driveprep::models::badge::{BadgeCatalog, BadgeRequirement};
use driveprep::models::progress::{Category, CategoryProgress, TestResult, UserProgress};

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 12).unwrap()
}

#[test]
fn standard_catalog_ids_are_unique() {
    let catalog = BadgeCatalog::standard();
    assert_eq!(catalog.version, BadgeCatalog::STANDARD_VERSION);
    assert_eq!(catalog.len(), 22);

    let mut ids: Vec<_> = catalog.badges.iter().map(|b| b.id.as_str()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), catalog.len());
}

#[test]
fn fresh_progress_earns_nothing() {
    let catalog = BadgeCatalog::standard();
    assert!(evaluate_badges(&UserProgress::default(), &catalog).is_empty());
}

#[test]
fn perfect_test_unlocks_in_catalog_order() {
    let catalog = BadgeCatalog::standard();
    let progress = UserProgress {
        tests_completed: 1,
        perfect_tests: 1,
        ..UserProgress::default()
    };

    assert_eq!(evaluate_badges(&progress, &catalog), vec!["first_test", "perfect_score"]);
}

#[test]
fn held_badges_are_not_reported_again() {
    let catalog = BadgeCatalog::standard();
    let mut progress = UserProgress {
        tests_completed: 1,
        perfect_tests: 1,
        ..UserProgress::default()
    };
    progress.badges.insert("perfect_score".to_string());

    assert_eq!(evaluate_badges(&progress, &catalog), vec!["first_test"]);
}

#[test]
fn evaluation_is_pure() {
    let catalog = BadgeCatalog::standard();
    let progress = UserProgress {
        xp: 1_200,
        current_streak: 8,
        questions_completed: 120,
        ..UserProgress::default()
    };
    let snapshot = progress.clone();

    let first = evaluate_badges(&progress, &catalog);
    let second = evaluate_badges(&progress, &catalog);

    assert_eq!(first, second);
    assert_eq!(progress, snapshot);
    assert_eq!(
        first,
        vec![
            "first_steps",
            "xp_100",
            "streak_3",
            "quick_learner",
            "road_scholar",
            "streak_7",
            "xp_1000",
        ]
    );
}

#[test]
fn missing_category_reads_as_zero_mastery() {
    let catalog = BadgeCatalog::standard();
    let mut progress = UserProgress::default();
    assert!(!evaluate_badges(&progress, &catalog).contains(&"signs_master".to_string()));

    progress.category_progress.insert(
        Category::RoadSigns,
        CategoryProgress {
            questions_answered: 40,
            correct_answers: 40,
            accuracy: 100.0,
            mastery: 80,
        },
    );
    let earned = evaluate_badges(&progress, &catalog);
    assert!(earned.contains(&"signs_master".to_string()));
    assert!(!earned.contains(&"rules_master".to_string()));
}

#[test]
fn award_appends_once_and_credits_reward() {
    let catalog = BadgeCatalog::standard();
    let mut progress = UserProgress {
        tests_completed: 1,
        ..UserProgress::default()
    };

    let ids: Vec<String> = ["first_test", "first_test", "no_such_badge"]
        .iter()
        .map(|id| id.to_string())
        .collect();
    let awards = award_badges(&mut progress, &catalog, &ids, day());

    assert_eq!(awards.badge_ids, vec!["first_test"]);
    assert_eq!(awards.xp_awarded, 50);
    assert_eq!(progress.xp, 50);
    assert_eq!(progress.badges.len(), 1);
    assert!(!progress.has_badge("no_such_badge"));

    let again = award_badges(&mut progress, &catalog, &ids, day());
    assert!(again.is_empty());
    assert_eq!(progress.xp, 50);
}

#[test]
fn badge_rewards_can_unlock_more_badges() {
    let catalog = BadgeCatalog::standard();
    let mut progress = UserProgress {
        tests_completed: 1,
        perfect_tests: 1,
        ..UserProgress::default()
    };

    let eligible = evaluate_badges(&progress, &catalog);
    let awards = award_badges(&mut progress, &catalog, &eligible, day());

    assert_eq!(awards.xp_awarded, 550);
    assert_eq!(progress.level, 3);
    assert_eq!(evaluate_badges(&progress, &catalog), vec!["xp_100"]);
}

#[test]
fn progress_towards_locked_badge() {
    let catalog = BadgeCatalog::standard();
    let veteran = catalog.get("test_veteran").unwrap();
    let mut progress = UserProgress {
        tests_completed: 5,
        ..UserProgress::default()
    };

    assert_eq!(badge_progress_percent(&progress, veteran), 50.0);

    progress.tests_completed = 25;
    assert_eq!(badge_progress_percent(&progress, veteran), 100.0);
}

#[test]
fn requirement_json_uses_type_tag() {
    let json = r#"{"type": "category_mastery", "value": 80, "category": "Rules of the Road"}"#;
    let requirement: BadgeRequirement = serde_json::from_str(json).unwrap();

    assert_eq!(
        requirement,
        BadgeRequirement::CategoryMastery {
            value: 80,
            category: Category::RulesOfTheRoad
        }
    );
}

#[test]
fn perfect_passed_test_earns_perfect_score() {
    let catalog = BadgeCatalog::standard();
    let mut progress = UserProgress::default();

    let result = TestResult::new(20, 20, true, 1_200, 50);
    record_test_result(&mut progress, result, day());

    assert_eq!(progress.tests_completed, 1);
    assert_eq!(progress.perfect_tests, 1);
    assert_eq!(progress.xp, 50);
    assert!(evaluate_badges(&progress, &catalog).contains(&"perfect_score".to_string()));
}

fn earns(progress: &UserProgress, badge_id: &str) -> bool {
    evaluate_badges(progress, &BadgeCatalog::standard()).contains(&badge_id.to_string())
}

fn mastered(mastery: u8) -> CategoryProgress {
    CategoryProgress {
        questions_answered: 50,
        correct_answers: 50,
        accuracy: 100.0,
        mastery,
    }
}

#[test]
fn ten_correct_in_a_row_earns_sharpshooter() {
    let mut progress = UserProgress::default();
    for _ in 0..9 {
        record_correct_answer(&mut progress, Category::Licensing, 10, day());
    }
    assert!(!earns(&progress, "sharpshooter"));

    // The best run is kept after a mistake.
    record_correct_answer(&mut progress, Category::Licensing, 10, day());
    record_incorrect_answer(&mut progress, Category::Licensing);
    assert_eq!(progress.best_correct_streak, 10);
    assert!(earns(&progress, "sharpshooter"));
}

#[test]
fn only_a_fast_passed_test_earns_speed_demon() {
    let mut progress = UserProgress::default();

    record_test_result(&mut progress, TestResult::new(5, 20, false, 300, 25), day());
    assert_eq!(progress.fastest_test_time, None);

    record_test_result(&mut progress, TestResult::new(17, 20, true, 900, 25), day());
    assert_eq!(progress.fastest_test_time, Some(900));
    assert!(!earns(&progress, "speed_demon"));

    record_test_result(&mut progress, TestResult::new(18, 20, true, 840, 25), day());
    record_test_result(&mut progress, TestResult::new(19, 20, true, 1_000, 25), day());
    assert_eq!(progress.fastest_test_time, Some(840));
    assert!(earns(&progress, "speed_demon"));

    let speed_demon = BadgeCatalog::standard().get("speed_demon").cloned().unwrap();
    assert_eq!(badge_progress_percent(&progress, &speed_demon), 100.0);
}

#[test]
fn category_champion_needs_every_category() {
    let catalog = BadgeCatalog::standard();
    let champion = catalog.get("category_champion").unwrap();
    let mut progress = UserProgress::default();

    for category in &Category::ALL[..3] {
        progress.category_progress.insert(*category, mastered(80));
    }
    assert_eq!(badge_progress_percent(&progress, champion), 50.0);

    for category in &Category::ALL[3..5] {
        progress.category_progress.insert(*category, mastered(95));
    }
    assert!(!earns(&progress, "category_champion"));

    progress.category_progress.insert(Category::Miscellaneous, mastered(80));
    assert!(earns(&progress, "category_champion"));
    assert_eq!(badge_progress_percent(&progress, champion), 100.0);
}

#[test]
fn g1_legend_needs_volume_and_accuracy() {
    let catalog = BadgeCatalog::standard();
    let legend = catalog.get("g1_legend").unwrap();
    let mut progress = UserProgress {
        questions_completed: 250,
        questions_correct: 225,
        ..UserProgress::default()
    };
    assert_eq!(progress.accuracy(), 90.0);
    assert_eq!(badge_progress_percent(&progress, legend), 75.0);
    assert!(!earns(&progress, "g1_legend"));

    progress.questions_completed = 500;
    progress.questions_correct = 449;
    assert!(!earns(&progress, "g1_legend"));

    progress.questions_correct = 450;
    assert!(earns(&progress, "g1_legend"));
}

#[test]
fn new_requirements_use_type_tags() {
    let json = r#"[
        {"type": "correct_streak", "value": 10},
        {"type": "overall_accuracy", "value": 90, "min_questions": 500},
        {"type": "all_categories_mastery", "value": 80},
        {"type": "fast_test", "seconds": 900}
    ]"#;
    let requirements: Vec<BadgeRequirement> = serde_json::from_str(json).unwrap();

    assert_eq!(
        requirements,
        vec![
            BadgeRequirement::CorrectStreak { value: 10 },
            BadgeRequirement::OverallAccuracy {
                value: 90,
                min_questions: 500
            },
            BadgeRequirement::AllCategoriesMastery { value: 80 },
            BadgeRequirement::FastTest { seconds: 900 },
        ]
    );
}

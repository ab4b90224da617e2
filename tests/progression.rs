//! End-to-end progression tests for the realmforge engine.
//!
//! These exercise the full completion → streak → badge → quest pipeline
//! through the public engine API, against a memory-only store.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use realmforge::badge::BadgeType;
use realmforge::engine::{Engine, EngineConfig, QuestSpec};
use realmforge::error::{ForgeError, ProgressionError};
use realmforge::ident::{RealmId, UserId};
use realmforge::ledger::XpSource;
use realmforge::model::Difficulty;
use realmforge::quest::{QuestStatus, QuestType};

fn memory_engine() -> Engine {
    Engine::new(EngineConfig::default()).unwrap()
}

fn ts(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

/// Complete a fresh easy task at the given instant and return the streak it
/// produced.
fn complete_easy_at(engine: &Engine, user: UserId, realm: RealmId, at: &str) -> u32 {
    let task = engine
        .create_task(user, realm, "daily grind", Difficulty::Easy)
        .unwrap();
    engine
        .complete_task_at(user, realm, task.id, ts(at))
        .unwrap()
        .current_streak
}

#[test]
fn streak_builds_across_consecutive_days() {
    let engine = memory_engine();
    let user = engine.create_user("aria").unwrap();
    let realm = engine.create_realm(user.id, "Fire Realm").unwrap();

    assert_eq!(complete_easy_at(&engine, user.id, realm.id, "2026-03-01T09:00:00Z"), 1);
    assert_eq!(complete_easy_at(&engine, user.id, realm.id, "2026-03-02T09:00:00Z"), 2);
    assert_eq!(complete_easy_at(&engine, user.id, realm.id, "2026-03-03T09:00:00Z"), 3);

    // A second completion the same day leaves the streak untouched.
    assert_eq!(complete_easy_at(&engine, user.id, realm.id, "2026-03-03T21:00:00Z"), 3);

    // Skipping a day resets to 1.
    assert_eq!(complete_easy_at(&engine, user.id, realm.id, "2026-03-05T09:00:00Z"), 1);
}

#[test]
fn hard_task_at_streak_seven_grants_exactly_double() {
    let engine = memory_engine();
    let user = engine.create_user("aria").unwrap();
    let realm = engine.create_realm(user.id, "Fire Realm").unwrap();

    // Seven consecutive days of completions: streak reaches 7 on day 7.
    for day in 1..=7 {
        let streak =
            complete_easy_at(&engine, user.id, realm.id, &format!("2026-03-{day:02}T09:00:00Z"));
        assert_eq!(streak, day);
    }

    // Same-day hard task rides the 7-day streak: round(50 × 2.0) = 100.
    let hard = engine
        .create_task(user.id, realm.id, "boss fight", Difficulty::Hard)
        .unwrap();
    let outcome = engine
        .complete_task_at(user.id, realm.id, hard.id, ts("2026-03-07T20:00:00Z"))
        .unwrap();
    assert_eq!(outcome.streak_multiplier, 2.0);
    assert_eq!(outcome.xp_gained, 100);
}

#[test]
fn hard_task_at_streak_three_grants_exactly_seventy_five() {
    let engine = memory_engine();
    let user = engine.create_user("aria").unwrap();
    let realm = engine.create_realm(user.id, "Fire Realm").unwrap();

    for day in 1..=3 {
        complete_easy_at(&engine, user.id, realm.id, &format!("2026-03-{day:02}T09:00:00Z"));
    }

    let hard = engine
        .create_task(user.id, realm.id, "miniboss", Difficulty::Hard)
        .unwrap();
    let outcome = engine
        .complete_task_at(user.id, realm.id, hard.id, ts("2026-03-03T20:00:00Z"))
        .unwrap();
    assert_eq!(outcome.streak_multiplier, 1.5);
    assert_eq!(outcome.xp_gained, 75);
}

#[test]
fn streak_king_badge_is_awarded_once() {
    let engine = memory_engine();
    let user = engine.create_user("aria").unwrap();
    let realm = engine.create_realm(user.id, "Fire Realm").unwrap();
    engine.register_badges(user.id).unwrap();

    for day in 1..=6 {
        complete_easy_at(&engine, user.id, realm.id, &format!("2026-03-{day:02}T09:00:00Z"));
    }

    // Day 7 crosses the threshold: streak_king arrives exactly here.
    let task = engine
        .create_task(user.id, realm.id, "the seventh day", Difficulty::Easy)
        .unwrap();
    let outcome = engine
        .complete_task_at(user.id, realm.id, task.id, ts("2026-03-07T09:00:00Z"))
        .unwrap();
    assert!(
        outcome
            .new_badges
            .iter()
            .any(|b| b.badge_type == BadgeType::StreakKing)
    );

    // Day 8 keeps the streak at 8 but never re-awards the badge.
    let task = engine
        .create_task(user.id, realm.id, "the eighth day", Difficulty::Easy)
        .unwrap();
    let outcome = engine
        .complete_task_at(user.id, realm.id, task.id, ts("2026-03-08T09:00:00Z"))
        .unwrap();
    assert!(outcome.new_badges.is_empty());

    let badges = engine.badges(user.id).unwrap();
    let streak_king = badges
        .iter()
        .find(|b| b.badge_type == BadgeType::StreakKing)
        .unwrap();
    assert!(streak_king.completed);
    assert_eq!(streak_king.progress, 7);
}

#[test]
fn first_clear_bonus_is_a_separate_ledger_entry() {
    let engine = memory_engine();
    let user = engine.create_user("aria").unwrap();
    let realm = engine.create_realm(user.id, "Fire Realm").unwrap();
    let task = engine
        .create_task(user.id, realm.id, "first steps", Difficulty::Easy)
        .unwrap();

    engine
        .complete_task_at(user.id, realm.id, task.id, ts("2026-03-01T09:00:00Z"))
        .unwrap();

    let history = engine.xp_history(user.id).unwrap();
    assert_eq!(history.len(), 2);
    let sources: Vec<XpSource> = history.iter().map(|e| e.source).collect();
    assert!(sources.contains(&XpSource::TaskCompletion));
    assert!(sources.contains(&XpSource::FirstClearBonus));

    // The bonus entry carries no task reference; the completion entry does.
    let bonus = history
        .iter()
        .find(|e| e.source == XpSource::FirstClearBonus)
        .unwrap();
    assert!(bonus.task_id.is_none());
    assert_eq!(bonus.xp_gained, 20);
}

#[test]
fn concurrent_completions_of_one_task_let_exactly_one_win() {
    let engine = Arc::new(memory_engine());
    let user = engine.create_user("aria").unwrap();
    let realm = engine.create_realm(user.id, "Fire Realm").unwrap();
    let task = engine
        .create_task(user.id, realm.id, "contested", Difficulty::Medium)
        .unwrap();

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || engine.complete_task(user.id, realm.id, task.id))
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    assert!(results.iter().any(|r| matches!(
        r,
        Err(ForgeError::Progression(ProgressionError::TaskAlreadyCompleted { .. }))
    )));

    // Exactly one completion entry landed in the ledger.
    let completions = engine
        .xp_history(user.id)
        .unwrap()
        .into_iter()
        .filter(|e| e.source == XpSource::TaskCompletion)
        .count();
    assert_eq!(completions, 1);
}

#[test]
fn quest_advances_with_completions_and_claims_once() {
    let engine = memory_engine();
    let user = engine.create_user("aria").unwrap();
    let realm = engine.create_realm(user.id, "Fire Realm").unwrap();

    let quest = engine
        .create_quest(
            user.id,
            QuestSpec {
                title: "Task Slayer".into(),
                description: "Complete 2 tasks today".into(),
                quest_type: QuestType::CompleteTasks,
                target: 2,
                xp_reward: Some(30),
                is_custom: false,
                expires_at: ts("2026-03-02T00:00:00Z"),
            },
        )
        .unwrap();

    // First completion advances to 1/2.
    let task = engine
        .create_task(user.id, realm.id, "one", Difficulty::Easy)
        .unwrap();
    let outcome = engine
        .complete_task_at(user.id, realm.id, task.id, ts("2026-03-01T09:00:00Z"))
        .unwrap();
    let advanced = outcome
        .quests_advanced
        .iter()
        .find(|q| q.id == quest.id)
        .unwrap();
    assert_eq!(advanced.progress, 1);
    assert_eq!(advanced.status, QuestStatus::Active);

    // Second completion finishes the quest.
    let task = engine
        .create_task(user.id, realm.id, "two", Difficulty::Easy)
        .unwrap();
    let outcome = engine
        .complete_task_at(user.id, realm.id, task.id, ts("2026-03-01T10:00:00Z"))
        .unwrap();
    let advanced = outcome
        .quests_advanced
        .iter()
        .find(|q| q.id == quest.id)
        .unwrap();
    assert_eq!(advanced.progress, 2);
    assert_eq!(advanced.status, QuestStatus::Completed);

    // Claim pays out once.
    let xp_before = engine.user_stats(user.id).unwrap().xp;
    let claim = engine
        .claim_quest_at(user.id, quest.id, ts("2026-03-01T11:00:00Z"))
        .unwrap();
    assert_eq!(claim.xp_gained, 30);
    assert_eq!(engine.user_stats(user.id).unwrap().xp, xp_before + 30);

    // A second claim is a conflict and grants nothing.
    let err = engine
        .claim_quest_at(user.id, quest.id, ts("2026-03-01T11:05:00Z"))
        .unwrap_err();
    assert!(matches!(
        err,
        ForgeError::Progression(ProgressionError::QuestAlreadyClaimed { .. })
    ));
    assert_eq!(engine.user_stats(user.id).unwrap().xp, xp_before + 30);

    let quest_grants = engine
        .xp_history(user.id)
        .unwrap()
        .into_iter()
        .filter(|e| e.source == XpSource::DailyQuest)
        .count();
    assert_eq!(quest_grants, 1);

    // Claimed quests disappear from listings.
    assert!(engine.quests(user.id).unwrap().is_empty());
}

#[test]
fn expired_quests_are_frozen_and_unclaimable() {
    let engine = memory_engine();
    let user = engine.create_user("aria").unwrap();
    let realm = engine.create_realm(user.id, "Fire Realm").unwrap();

    let quest = engine
        .create_quest(
            user.id,
            QuestSpec {
                title: "Too late".into(),
                description: "Complete 1 task".into(),
                quest_type: QuestType::CompleteTasks,
                target: 1,
                xp_reward: Some(10),
                is_custom: false,
                expires_at: ts("2026-03-01T00:00:00Z"),
            },
        )
        .unwrap();

    // A completion after expiry does not advance the quest.
    let task = engine
        .create_task(user.id, realm.id, "late", Difficulty::Easy)
        .unwrap();
    let outcome = engine
        .complete_task_at(user.id, realm.id, task.id, ts("2026-03-02T09:00:00Z"))
        .unwrap();
    assert!(outcome.quests_advanced.iter().all(|q| q.id != quest.id));

    let err = engine
        .claim_quest_at(user.id, quest.id, ts("2026-03-02T10:00:00Z"))
        .unwrap_err();
    assert!(matches!(
        err,
        ForgeError::Progression(ProgressionError::QuestNotCompleted { .. })
            | ForgeError::Progression(ProgressionError::QuestExpired { .. })
    ));
}

#[test]
fn maintain_streak_quest_counts_only_the_first_completion_of_a_day() {
    let engine = memory_engine();
    let user = engine.create_user("aria").unwrap();
    let realm = engine.create_realm(user.id, "Fire Realm").unwrap();

    let quest = engine
        .create_quest(
            user.id,
            QuestSpec {
                title: "Consistency".into(),
                description: "Keep the streak alive".into(),
                quest_type: QuestType::MaintainStreak,
                target: 2,
                xp_reward: Some(35),
                is_custom: false,
                expires_at: ts("2026-03-10T00:00:00Z"),
            },
        )
        .unwrap();

    complete_easy_at(&engine, user.id, realm.id, "2026-03-01T09:00:00Z");
    complete_easy_at(&engine, user.id, realm.id, "2026-03-01T15:00:00Z");

    let stored = engine
        .quests(user.id)
        .unwrap()
        .into_iter()
        .find(|q| q.id == quest.id)
        .unwrap();
    // Two completions, one day: the streak advanced once.
    assert_eq!(stored.progress, 1);
}

#[test]
fn invalid_quest_bounds_are_rejected_before_any_write() {
    let engine = memory_engine();
    let user = engine.create_user("aria").unwrap();

    let err = engine
        .create_quest(
            user.id,
            QuestSpec {
                title: "Overreach".into(),
                description: "Too ambitious".into(),
                quest_type: QuestType::Custom,
                target: 500,
                xp_reward: Some(50),
                is_custom: true,
                expires_at: ts("2026-03-02T00:00:00Z"),
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        ForgeError::Progression(ProgressionError::InvalidQuestTarget { target: 500 })
    ));
    assert!(engine.quests(user.id).unwrap().is_empty());
}

//! Badges: one-time, non-revocable achievements.
//!
//! [`evaluate`] is a pure function from a stats snapshot and the set of
//! already-earned badge types to the list of newly qualifying types — calling
//! it again with the updated earned set yields nothing, which is what makes
//! badge awarding idempotent. Badges are never revoked, even if the
//! completion that earned them is later reversed.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ident::UserId;
use crate::model::StatsSnapshot;

/// Bonus XP granted alongside the first-clear badge, recorded as its own
/// ledger entry with source `first_clear_bonus`.
pub const FIRST_CLEAR_BONUS_XP: u64 = 20;

// ---------------------------------------------------------------------------
// Badge catalog
// ---------------------------------------------------------------------------

/// The badge types the evaluator knows how to award.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeType {
    /// First task ever completed.
    FirstClear,
    /// Streak reached 7 consecutive days.
    StreakKing,
    /// 100 tasks completed in total.
    DungeonMaster,
    /// Level 10 reached.
    EliteHunter,
}

impl BadgeType {
    /// All known types, in evaluation order.
    pub const ALL: [BadgeType; 4] = [
        BadgeType::FirstClear,
        BadgeType::StreakKing,
        BadgeType::DungeonMaster,
        BadgeType::EliteHunter,
    ];

    /// Stable wire name of the type.
    pub fn as_str(self) -> &'static str {
        match self {
            BadgeType::FirstClear => "first_clear",
            BadgeType::StreakKing => "streak_king",
            BadgeType::DungeonMaster => "dungeon_master",
            BadgeType::EliteHunter => "elite_hunter",
        }
    }

    /// Static catalog definition for this type.
    pub fn spec(self) -> BadgeSpec {
        match self {
            BadgeType::FirstClear => BadgeSpec {
                name: "First Clear",
                description: "Complete your first task",
                rarity: BadgeRarity::Common,
                target: 1,
            },
            BadgeType::StreakKing => BadgeSpec {
                name: "Streak King",
                description: "Maintain a 7-day completion streak",
                rarity: BadgeRarity::Epic,
                target: 7,
            },
            BadgeType::DungeonMaster => BadgeSpec {
                name: "Dungeon Master",
                description: "Complete 100 tasks",
                rarity: BadgeRarity::Epic,
                target: 100,
            },
            BadgeType::EliteHunter => BadgeSpec {
                name: "Elite Hunter",
                description: "Reach level 10",
                rarity: BadgeRarity::Legendary,
                target: 10,
            },
        }
    }

    /// Whether the snapshot satisfies this badge's trigger.
    fn qualifies(self, stats: &StatsSnapshot) -> bool {
        match self {
            // Exactly the first completion, not "at least one".
            BadgeType::FirstClear => stats.tasks_completed == 1,
            BadgeType::StreakKing => stats.streak >= 7,
            BadgeType::DungeonMaster => stats.tasks_completed >= 100,
            BadgeType::EliteHunter => stats.level >= 10,
        }
    }

    /// Live progress toward this badge derived from a stats snapshot,
    /// clamped to the target.
    pub fn progress_for(self, stats: &StatsSnapshot) -> u64 {
        let raw = match self {
            BadgeType::FirstClear | BadgeType::DungeonMaster => stats.tasks_completed,
            BadgeType::StreakKing => u64::from(stats.streak),
            BadgeType::EliteHunter => u64::from(stats.level),
        };
        raw.min(self.spec().target)
    }
}

impl std::fmt::Display for BadgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Badge rarity tier (display-only, supplied by the catalog).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeRarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

/// Static catalog definition of a badge type.
#[derive(Debug, Clone, Copy)]
pub struct BadgeSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub rarity: BadgeRarity,
    pub target: u64,
}

// ---------------------------------------------------------------------------
// Badge record
// ---------------------------------------------------------------------------

/// Per-(user, type) badge record.
///
/// Invariant: once `completed` is true it never flips back and `earned_at`
/// never changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Badge {
    pub user_id: UserId,
    pub badge_type: BadgeType,
    pub name: String,
    pub description: String,
    pub rarity: BadgeRarity,
    pub progress: u64,
    pub target: u64,
    pub completed: bool,
    pub earned_at: Option<DateTime<Utc>>,
}

impl Badge {
    /// Create the unearned shell for a badge type from the catalog.
    pub fn fresh(user_id: UserId, badge_type: BadgeType) -> Self {
        let spec = badge_type.spec();
        Self {
            user_id,
            badge_type,
            name: spec.name.to_string(),
            description: spec.description.to_string(),
            rarity: spec.rarity,
            progress: 0,
            target: spec.target,
            completed: false,
            earned_at: None,
        }
    }

    /// Mark the badge earned at `now` with progress pinned to the target.
    ///
    /// No-op if already completed, preserving the original `earned_at`.
    pub fn award(&mut self, now: DateTime<Utc>) {
        if self.completed {
            return;
        }
        self.completed = true;
        self.earned_at = Some(now);
        self.progress = self.target;
    }

    /// Refresh displayed progress of an unearned badge, completing it if the
    /// target is reached. Returns whether the record changed.
    pub fn update_progress(&mut self, progress: u64, now: DateTime<Utc>) -> bool {
        if self.completed {
            return false;
        }
        let clamped = progress.min(self.target);
        let changed = clamped != self.progress;
        self.progress = clamped;
        if self.progress >= self.target {
            self.award(now);
            return true;
        }
        changed
    }
}

// ---------------------------------------------------------------------------
// Evaluator
// ---------------------------------------------------------------------------

/// Decide which not-yet-earned badges now qualify.
///
/// Pure and idempotent: the same snapshot with the same earned set always
/// returns the same list, and a type in `already_earned` is never returned.
pub fn evaluate(stats: &StatsSnapshot, already_earned: &HashSet<BadgeType>) -> Vec<BadgeType> {
    BadgeType::ALL
        .into_iter()
        .filter(|t| !already_earned.contains(t) && t.qualifies(stats))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(tasks: u64, streak: u32, level: u32) -> StatsSnapshot {
        StatsSnapshot {
            tasks_completed: tasks,
            streak,
            total_xp: 0,
            level,
        }
    }

    #[test]
    fn first_clear_triggers_on_exactly_one() {
        let earned = HashSet::new();
        assert_eq!(
            evaluate(&snapshot(1, 1, 1), &earned),
            vec![BadgeType::FirstClear]
        );
        assert!(evaluate(&snapshot(2, 1, 1), &earned).is_empty());
        assert!(evaluate(&snapshot(0, 0, 1), &earned).is_empty());
    }

    #[test]
    fn thresholds_for_remaining_badges() {
        let earned = HashSet::new();
        assert_eq!(
            evaluate(&snapshot(50, 7, 1), &earned),
            vec![BadgeType::StreakKing]
        );
        assert_eq!(
            evaluate(&snapshot(100, 1, 1), &earned),
            vec![BadgeType::DungeonMaster]
        );
        assert_eq!(
            evaluate(&snapshot(5, 1, 10), &earned),
            vec![BadgeType::EliteHunter]
        );
    }

    #[test]
    fn evaluation_is_idempotent_once_earned() {
        let stats = snapshot(100, 8, 12);
        let mut earned = HashSet::new();

        let first = evaluate(&stats, &earned);
        assert_eq!(
            first,
            vec![
                BadgeType::StreakKing,
                BadgeType::DungeonMaster,
                BadgeType::EliteHunter
            ]
        );

        earned.extend(first);
        assert!(evaluate(&stats, &earned).is_empty());
    }

    #[test]
    fn award_is_one_time_and_pins_progress() {
        let now: DateTime<Utc> = "2026-03-01T10:00:00Z".parse().unwrap();
        let later: DateTime<Utc> = "2026-03-02T10:00:00Z".parse().unwrap();

        let mut badge = Badge::fresh(UserId::new(1).unwrap(), BadgeType::StreakKing);
        badge.award(now);
        assert!(badge.completed);
        assert_eq!(badge.progress, 7);
        assert_eq!(badge.earned_at, Some(now));

        // A second award never moves earned_at.
        badge.award(later);
        assert_eq!(badge.earned_at, Some(now));
    }

    #[test]
    fn update_progress_clamps_and_completes() {
        let now: DateTime<Utc> = "2026-03-01T10:00:00Z".parse().unwrap();
        let mut badge = Badge::fresh(UserId::new(1).unwrap(), BadgeType::DungeonMaster);

        assert!(badge.update_progress(40, now));
        assert_eq!(badge.progress, 40);
        assert!(!badge.completed);

        assert!(badge.update_progress(250, now));
        assert_eq!(badge.progress, 100);
        assert!(badge.completed);

        // Completed badges are frozen.
        assert!(!badge.update_progress(3, now));
        assert_eq!(badge.progress, 100);
    }

    #[test]
    fn progress_for_reads_the_right_counter() {
        let stats = snapshot(42, 5, 8);
        assert_eq!(BadgeType::FirstClear.progress_for(&stats), 1);
        assert_eq!(BadgeType::DungeonMaster.progress_for(&stats), 42);
        assert_eq!(BadgeType::StreakKing.progress_for(&stats), 5);
        assert_eq!(BadgeType::EliteHunter.progress_for(&stats), 8);
    }
}

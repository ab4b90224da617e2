//! Core domain records for the realmforge engine.
//!
//! Users, realms, and tasks are the three records the completion orchestrator
//! reconciles on every state change; badges, quests, and ledger entries live
//! in their own modules. All records serialize with serde (bincode in the
//! store, JSON at the CLI boundary).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ident::{RealmId, TaskId, UserId};
use crate::level;

// ---------------------------------------------------------------------------
// Difficulty and task status
// ---------------------------------------------------------------------------

/// Task difficulty, fixing the base XP reward at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Base XP granted for completing a task of this difficulty.
    pub fn base_xp(self) -> u64 {
        match self {
            Difficulty::Easy => 10,
            Difficulty::Medium => 25,
            Difficulty::Hard => 50,
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// Lifecycle state of a task. Pending ⇄ Completed, driven only by the
/// completion and reversal orchestrators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Completed,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Completed => write!(f, "completed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// A unit of work belonging to exactly one realm and one user.
///
/// `xp_reward` is fixed from the difficulty at creation and never changes.
/// `completed_at` is set iff `status == Completed`; a completed task holds
/// exactly one non-reversed `task_completion` ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub realm_id: RealmId,
    pub user_id: UserId,
    pub title: String,
    pub difficulty: Difficulty,
    pub status: TaskStatus,
    pub xp_reward: u64,
    pub due_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Create a new pending task with the difficulty-derived XP reward.
    pub fn new(
        id: TaskId,
        realm_id: RealmId,
        user_id: UserId,
        title: impl Into<String>,
        difficulty: Difficulty,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            realm_id,
            user_id,
            title: title.into(),
            difficulty,
            status: TaskStatus::Pending,
            xp_reward: difficulty.base_xp(),
            due_date: None,
            completed_at: None,
            created_at,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

// ---------------------------------------------------------------------------
// Realm
// ---------------------------------------------------------------------------

/// A user-owned task collection with aggregate counters.
///
/// Invariants: `completed_tasks <= total_tasks`; `total_xp_earned` equals the
/// sum of ledger entries for tasks in this realm.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Realm {
    pub id: RealmId,
    pub user_id: UserId,
    pub name: String,
    pub total_tasks: u64,
    pub completed_tasks: u64,
    pub total_xp_earned: u64,
    pub created_at: DateTime<Utc>,
}

impl Realm {
    pub fn new(
        id: RealmId,
        user_id: UserId,
        name: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            name: name.into(),
            total_tasks: 0,
            completed_tasks: 0,
            total_xp_earned: 0,
            created_at,
        }
    }

    /// Fraction of tasks completed, in `[0.0, 1.0]`. Zero-task realms report 0.
    pub fn completion_fraction(&self) -> f64 {
        if self.total_tasks == 0 {
            0.0
        } else {
            self.completed_tasks as f64 / self.total_tasks as f64
        }
    }
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// Per-user aggregate counters updated by the orchestrators.
///
/// The legacy data model carried a `total_xp` here that duplicated the user's
/// `xp`; realmforge keeps `xp` as the single source of truth and derives the
/// total (see [`User::total_xp`]).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserStats {
    pub tasks_completed: u64,
    pub streak: u32,
    pub active_realms: u64,
    pub last_active_date: Option<DateTime<Utc>>,
}

/// A user with cumulative XP and a cached level.
///
/// Invariant: `level == level::level_for_xp(xp)` after every mutation. The
/// level is always recomputed from XP, never incrementally patched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub xp: u64,
    pub level: u32,
    pub stats: UserStats,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: UserId, username: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            username: username.into(),
            xp: 0,
            level: 1,
            stats: UserStats::default(),
            created_at,
        }
    }

    /// Derived read-only view of the legacy `stats.totalXP` field.
    pub fn total_xp(&self) -> u64 {
        self.xp
    }

    /// Re-derive the cached level from cumulative XP.
    pub fn recompute_level(&mut self) {
        self.level = level::level_for_xp(self.xp);
    }

    /// Snapshot of progress counters for badge evaluation.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            tasks_completed: self.stats.tasks_completed,
            streak: self.stats.streak,
            total_xp: self.total_xp(),
            level: self.level,
        }
    }
}

/// Immutable view of a user's progress counters at one instant.
///
/// Badge evaluation is a pure function over this snapshot, so the same
/// snapshot always yields the same awards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub tasks_completed: u64,
    pub streak: u32,
    pub total_xp: u64,
    pub level: u32,
}

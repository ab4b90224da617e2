//! The XP ledger: an append-only record of every XP grant.
//!
//! Entries are never updated in place. A grant is an appended entry; undoing
//! a grant deletes that exact entry — there is no negative-amount entry. The
//! ledger is the audit trail and the sole mechanism the reversal orchestrator
//! uses to find out how much XP a completion originally granted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ident::{EntryId, TaskId, UserId};

/// Where an XP grant came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum XpSource {
    /// The main reward for completing a task.
    TaskCompletion,
    /// The one-time bonus attached to the first-clear badge.
    FirstClearBonus,
    /// A claimed daily-quest reward.
    DailyQuest,
}

impl XpSource {
    /// Stable wire name of the source.
    pub fn as_str(self) -> &'static str {
        match self {
            XpSource::TaskCompletion => "task_completion",
            XpSource::FirstClearBonus => "first_clear_bonus",
            XpSource::DailyQuest => "daily_quest",
        }
    }
}

impl std::fmt::Display for XpSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XpEntry {
    pub id: EntryId,
    pub user_id: UserId,
    /// Set for task-completion grants; `None` for bonuses and quest rewards.
    pub task_id: Option<TaskId>,
    pub xp_gained: u64,
    pub source: XpSource,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl XpEntry {
    pub fn new(
        id: EntryId,
        user_id: UserId,
        task_id: Option<TaskId>,
        xp_gained: u64,
        source: XpSource,
        description: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            task_id,
            xp_gained,
            source,
            description: description.into(),
            created_at,
        }
    }
}

/// Select the completion entry a reversal must delete.
///
/// Among `task_completion` entries for the task, the latest `created_at`
/// wins; equal timestamps tie-break on the highest entry id, which is the
/// most recently allocated.
pub fn latest_completion_entry<'a>(
    entries: impl IntoIterator<Item = &'a XpEntry>,
    task_id: TaskId,
) -> Option<&'a XpEntry> {
    entries
        .into_iter()
        .filter(|e| e.source == XpSource::TaskCompletion && e.task_id == Some(task_id))
        .max_by_key(|e| (e.created_at, e.id))
}

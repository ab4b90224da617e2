//! Daily quests: time-boxed objectives with claimable XP rewards.
//!
//! A quest's stored status is an explicit tagged state — Active, Completed,
//! or Claimed — rather than the legacy magic `progress = -1` "claimed"
//! sentinel. Expiry is not a stored state: it is evaluated lazily against
//! `expires_at` whenever a quest is read (there is no background sweeper). An
//! expired quest is frozen — it never advances, cannot complete, and its
//! reward cannot be claimed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ProgressionError;
use crate::ident::{QuestId, UserId};

/// Quest target and reward bounds for caller-supplied custom quests.
const TARGET_RANGE: std::ops::RangeInclusive<u64> = 1..=100;
const REWARD_RANGE: std::ops::RangeInclusive<u64> = 1..=200;

/// Base XP per target unit when deriving a quest reward.
const XP_PER_TARGET_UNIT: u64 = 5;

// ---------------------------------------------------------------------------
// Quest types and events
// ---------------------------------------------------------------------------

/// What kind of activity a quest counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestType {
    CompleteTasks,
    VisitRealms,
    EarnXp,
    MaintainStreak,
    /// Counts task completions, like `CompleteTasks`, under a combat skin.
    DefeatEnemies,
    /// User-defined; advanced only through explicit progress updates.
    Custom,
}

impl QuestType {
    pub fn as_str(self) -> &'static str {
        match self {
            QuestType::CompleteTasks => "complete_tasks",
            QuestType::VisitRealms => "visit_realms",
            QuestType::EarnXp => "earn_xp",
            QuestType::MaintainStreak => "maintain_streak",
            QuestType::DefeatEnemies => "defeat_enemies",
            QuestType::Custom => "custom",
        }
    }
}

impl std::fmt::Display for QuestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for QuestType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "complete_tasks" => Ok(QuestType::CompleteTasks),
            "visit_realms" => Ok(QuestType::VisitRealms),
            "earn_xp" => Ok(QuestType::EarnXp),
            "maintain_streak" => Ok(QuestType::MaintainStreak),
            "defeat_enemies" => Ok(QuestType::DefeatEnemies),
            "custom" => Ok(QuestType::Custom),
            other => Err(format!("unknown quest type: {other}")),
        }
    }
}

/// A progression event that may advance matching quests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestEvent {
    /// A task was completed.
    TaskCompleted,
    /// The user visited a realm (reported by the UI layer).
    RealmVisited,
    /// XP was earned; advances `EarnXp` quests by the amount.
    XpEarned { amount: u64 },
    /// The daily streak was extended or started today.
    StreakMaintained,
}

/// How much `event` advances a quest of type `quest_type`, if at all.
pub fn increment_for(quest_type: QuestType, event: QuestEvent) -> Option<u64> {
    match (quest_type, event) {
        (QuestType::CompleteTasks, QuestEvent::TaskCompleted) => Some(1),
        (QuestType::DefeatEnemies, QuestEvent::TaskCompleted) => Some(1),
        (QuestType::VisitRealms, QuestEvent::RealmVisited) => Some(1),
        (QuestType::EarnXp, QuestEvent::XpEarned { amount }) => Some(amount),
        (QuestType::MaintainStreak, QuestEvent::StreakMaintained) => Some(1),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Quest record
// ---------------------------------------------------------------------------

/// Stored lifecycle state of a quest.
///
/// `Claimed` is terminal: claimed quests are excluded from listings and never
/// advance again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestStatus {
    Active,
    Completed,
    Claimed,
}

/// Derived view of a quest at a point in time, folding in lazy expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestState {
    Active,
    Completed,
    Claimed,
    Expired,
}

/// A per-user daily quest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quest {
    pub id: QuestId,
    pub user_id: UserId,
    pub title: String,
    pub description: String,
    pub quest_type: QuestType,
    pub target: u64,
    pub progress: u64,
    pub xp_reward: u64,
    pub status: QuestStatus,
    pub is_custom: bool,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Quest {
    /// Whether the quest's window has passed at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Lifecycle state at `now`, with expiry folded in. A claimed quest stays
    /// claimed even past its window; a completed-but-unclaimed quest whose
    /// window passed is expired (the reward is forfeit).
    pub fn state_at(&self, now: DateTime<Utc>) -> QuestState {
        match self.status {
            QuestStatus::Claimed => QuestState::Claimed,
            _ if self.is_expired(now) => QuestState::Expired,
            QuestStatus::Completed => QuestState::Completed,
            QuestStatus::Active => QuestState::Active,
        }
    }

    /// Advance progress by `amount`, clamped to the target; flips to
    /// Completed when the target is reached. Returns whether the record
    /// changed. Expired, completed, and claimed quests are frozen.
    pub fn advance(&mut self, amount: u64, now: DateTime<Utc>) -> bool {
        if self.status != QuestStatus::Active || self.is_expired(now) || amount == 0 {
            return false;
        }
        self.progress = (self.progress + amount).min(self.target);
        if self.progress >= self.target {
            self.status = QuestStatus::Completed;
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Custom-quest validation and reward derivation
// ---------------------------------------------------------------------------

/// Validate caller-supplied target and reward for a custom quest.
pub fn validate_custom(target: u64, xp_reward: u64) -> Result<(), ProgressionError> {
    if !TARGET_RANGE.contains(&target) {
        return Err(ProgressionError::InvalidQuestTarget { target });
    }
    if !REWARD_RANGE.contains(&xp_reward) {
        return Err(ProgressionError::InvalidQuestReward { reward: xp_reward });
    }
    Ok(())
}

/// Difficulty band of a quest, judged from its target relative to its type.
pub fn quest_difficulty(target: u64, quest_type: QuestType) -> crate::model::Difficulty {
    use crate::model::Difficulty;

    let (easy, medium) = match quest_type {
        QuestType::CompleteTasks => (3, 5),
        QuestType::VisitRealms => (2, 3),
        QuestType::EarnXp => (50, 100),
        QuestType::DefeatEnemies => (5, 8),
        QuestType::MaintainStreak => (1, 3),
        QuestType::Custom => (5, 10),
    };

    if target <= easy {
        Difficulty::Easy
    } else if target <= medium {
        Difficulty::Medium
    } else {
        Difficulty::Hard
    }
}

/// Derive an XP reward from a quest's target: 5 XP per target unit, scaled
/// by the difficulty band (1.0 / 1.5 / 2.0).
pub fn quest_xp_reward(target: u64, quest_type: QuestType) -> u64 {
    use crate::model::Difficulty;

    let base = target * XP_PER_TARGET_UNIT;
    let multiplier = match quest_difficulty(target, quest_type) {
        Difficulty::Easy => 1.0,
        Difficulty::Medium => 1.5,
        Difficulty::Hard => 2.0,
    };
    (base as f64 * multiplier).round() as u64
}

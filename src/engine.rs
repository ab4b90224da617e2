//! Engine facade: the progression and rewards orchestrators.
//!
//! The `Engine` owns the datastore, the id allocator, and a per-user lock
//! registry. Completion, reversal, and quest-claim operations follow the same
//! shape: take the owner's lock, read and validate every record before any
//! write, compute the new state, then commit the whole [`WriteSet`] in one
//! transaction. The lock serializes read-modify-write per user (two
//! completions of the same task cannot both pass the pending check); the
//! transaction guarantees a failed operation leaves no partial state.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;

use crate::badge::{self, Badge, BadgeType, FIRST_CLEAR_BONUS_XP};
use crate::error::{EngineError, ForgeResult, ProgressionError};
use crate::ident::{EntryId, IdAllocator, QuestId, RealmId, TaskId, UserId};
use crate::ledger::{self, XpEntry, XpSource};
use crate::level;
use crate::model::{Difficulty, Realm, Task, TaskStatus, User};
use crate::quest::{self, Quest, QuestEvent, QuestStatus, QuestType};
use crate::store::{ForgeStore, WriteSet};
use crate::streak;

/// Configuration for the realmforge engine.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Data directory for persistence. `None` for memory-only mode.
    pub data_dir: Option<PathBuf>,
}

/// The realmforge progression engine.
///
/// Safe to share across threads (`Arc<Engine>`); every mutating operation
/// serializes on the owning user's lock.
pub struct Engine {
    config: EngineConfig,
    store: ForgeStore,
    alloc: IdAllocator,
    user_locks: DashMap<UserId, Arc<Mutex<()>>>,
}

impl Engine {
    /// Create a new engine with the given configuration.
    pub fn new(config: EngineConfig) -> ForgeResult<Self> {
        let store = match &config.data_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir).map_err(|_| EngineError::DataDir {
                    path: dir.display().to_string(),
                })?;
                ForgeStore::open(dir)?
            }
            None => ForgeStore::open_in_memory()?,
        };

        let watermark = store.next_id_watermark()?;
        tracing::info!(
            persistent = config.data_dir.is_some(),
            next_id = watermark,
            "initializing realmforge engine"
        );

        Ok(Self {
            config,
            store,
            alloc: IdAllocator::starting_from(watermark),
            user_locks: DashMap::new(),
        })
    }

    /// Get the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn user_lock(&self, user: UserId) -> Arc<Mutex<()>> {
        self.user_locks.entry(user).or_default().clone()
    }

    fn fresh_entry_id(&self) -> ForgeResult<EntryId> {
        Ok(EntryId::from_raw(self.alloc.next_raw()?))
    }

    // -----------------------------------------------------------------------
    // Record intake (collaborator-produced data)
    // -----------------------------------------------------------------------

    /// Register a new user with empty progress.
    pub fn create_user(&self, username: impl Into<String>) -> ForgeResult<User> {
        let user = User::new(UserId::from_raw(self.alloc.next_raw()?), username, Utc::now());
        let mut ws = WriteSet::new();
        ws.users.push(user.clone());
        ws.next_id_watermark = Some(self.alloc.peek_next());
        self.store.commit(&ws)?;
        Ok(user)
    }

    /// Register a new realm owned by `user`.
    pub fn create_realm(&self, user_id: UserId, name: impl Into<String>) -> ForgeResult<Realm> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut user = self.require_user(user_id)?;
        let realm = Realm::new(RealmId::from_raw(self.alloc.next_raw()?), user_id, name, Utc::now());
        user.stats.active_realms += 1;

        let mut ws = WriteSet::new();
        ws.users.push(user);
        ws.realms.push(realm.clone());
        ws.next_id_watermark = Some(self.alloc.peek_next());
        self.store.commit(&ws)?;
        Ok(realm)
    }

    /// Register a new pending task in a realm the user owns. The XP reward is
    /// fixed from the difficulty here and never changes afterwards.
    pub fn create_task(
        &self,
        user_id: UserId,
        realm_id: RealmId,
        title: impl Into<String>,
        difficulty: Difficulty,
    ) -> ForgeResult<Task> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut realm = self.require_realm(user_id, realm_id)?;
        let task = Task::new(
            TaskId::from_raw(self.alloc.next_raw()?),
            realm_id,
            user_id,
            title,
            difficulty,
            Utc::now(),
        );
        realm.total_tasks += 1;

        let mut ws = WriteSet::new();
        ws.realms.push(realm);
        ws.tasks.push(task.clone());
        ws.next_id_watermark = Some(self.alloc.peek_next());
        self.store.commit(&ws)?;
        Ok(task)
    }

    /// Ensure the user has an unearned shell for every catalog badge type.
    /// Already-present records (earned or not) are left untouched.
    pub fn register_badges(&self, user_id: UserId) -> ForgeResult<Vec<Badge>> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        self.require_user(user_id)?;
        let mut ws = WriteSet::new();
        for badge_type in BadgeType::ALL {
            if self.store.get_badge(user_id, badge_type)?.is_none() {
                ws.badges.push(Badge::fresh(user_id, badge_type));
            }
        }
        let created = ws.badges.clone();
        if !created.is_empty() {
            self.store.commit(&ws)?;
        }
        Ok(created)
    }

    /// Register a daily quest from a collaborator-supplied definition.
    ///
    /// Target and reward are validated (`InvalidInput` when out of range);
    /// when no reward is given it is derived from the target and type.
    pub fn create_quest(&self, user_id: UserId, spec: QuestSpec) -> ForgeResult<Quest> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        self.require_user(user_id)?;
        let xp_reward = spec
            .xp_reward
            .unwrap_or_else(|| quest::quest_xp_reward(spec.target, spec.quest_type));
        quest::validate_custom(spec.target, xp_reward)?;

        let quest = Quest {
            id: QuestId::from_raw(self.alloc.next_raw()?),
            user_id,
            title: spec.title,
            description: spec.description,
            quest_type: spec.quest_type,
            target: spec.target,
            progress: 0,
            xp_reward,
            status: QuestStatus::Active,
            is_custom: spec.is_custom,
            expires_at: spec.expires_at,
            created_at: Utc::now(),
        };

        let mut ws = WriteSet::new();
        ws.quests.push(quest.clone());
        ws.next_id_watermark = Some(self.alloc.peek_next());
        self.store.commit(&ws)?;
        Ok(quest)
    }

    // -----------------------------------------------------------------------
    // Completion orchestrator
    // -----------------------------------------------------------------------

    /// Complete a pending task now.
    pub fn complete_task(
        &self,
        user_id: UserId,
        realm_id: RealmId,
        task_id: TaskId,
    ) -> ForgeResult<CompletionOutcome> {
        self.complete_task_at(user_id, realm_id, task_id, Utc::now())
    }

    /// Complete a pending task at an explicit instant.
    ///
    /// The instant drives streak day-boundary math and every timestamp the
    /// operation writes, so callers that replay history (or tests) stay
    /// deterministic.
    pub fn complete_task_at(
        &self,
        user_id: UserId,
        realm_id: RealmId,
        task_id: TaskId,
        now: DateTime<Utc>,
    ) -> ForgeResult<CompletionOutcome> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        // Validate everything before the first write.
        let mut user = self.require_user(user_id)?;
        let mut realm = self.require_realm(user_id, realm_id)?;
        let mut task = self.require_task(user_id, realm_id, task_id)?;
        if task.is_completed() {
            return Err(ProgressionError::TaskAlreadyCompleted {
                task_id: task_id.get(),
            }
            .into());
        }

        // Streak: counts exclude this task, which is still pending.
        let today = streak::utc_day(now);
        let (today_start, today_end) = streak::day_bounds(today);
        let completed_today =
            self.store
                .count_completions_between(user_id, today_start, today_end)?;
        let completed_yesterday = match today.pred_opt() {
            Some(yesterday) => {
                let (from, to) = streak::day_bounds(yesterday);
                self.store.count_completions_between(user_id, from, to)?
            }
            None => 0,
        };
        let streak_outcome =
            streak::streak_on_completion(user.stats.streak, completed_today, completed_yesterday);

        let base_xp = task.xp_reward;
        let multiplier = streak::streak_multiplier(streak_outcome.streak);
        let xp_gained = streak::apply_multiplier(base_xp, multiplier);

        // Task.
        task.status = TaskStatus::Completed;
        task.completed_at = Some(now);

        // User aggregates; the level cache is re-derived, never patched.
        let previous_level = user.level;
        user.xp += xp_gained;
        user.stats.tasks_completed += 1;
        user.stats.streak = streak_outcome.streak;
        user.stats.last_active_date = Some(now);
        user.recompute_level();

        // Realm aggregates.
        realm.completed_tasks += 1;
        realm.total_xp_earned += xp_gained;

        let mut ledger_insert = vec![XpEntry::new(
            self.fresh_entry_id()?,
            user_id,
            Some(task_id),
            xp_gained,
            XpSource::TaskCompletion,
            format!("Completed task: {}", task.title),
            now,
        )];

        // Badges, evaluated against the fresh snapshot. The first-clear bonus
        // is its own ledger entry and lands in the same transaction.
        let earned_before: HashSet<BadgeType> = self
            .store
            .badges_for_user(user_id)?
            .into_iter()
            .filter(|b| b.completed)
            .map(|b| b.badge_type)
            .collect();
        let qualifying = badge::evaluate(&user.snapshot(), &earned_before);
        let mut new_badges = Vec::with_capacity(qualifying.len());
        let mut bonus_xp = 0u64;
        for badge_type in qualifying {
            let mut record = self
                .store
                .get_badge(user_id, badge_type)?
                .unwrap_or_else(|| Badge::fresh(user_id, badge_type));
            record.award(now);
            if badge_type == BadgeType::FirstClear {
                bonus_xp += FIRST_CLEAR_BONUS_XP;
                ledger_insert.push(XpEntry::new(
                    self.fresh_entry_id()?,
                    user_id,
                    None,
                    FIRST_CLEAR_BONUS_XP,
                    XpSource::FirstClearBonus,
                    "First Clear badge bonus",
                    now,
                ));
            }
            new_badges.push(record);
        }
        if bonus_xp > 0 {
            user.xp += bonus_xp;
            user.recompute_level();
        }

        let level_up = (user.level > previous_level).then_some(LevelUp {
            from: previous_level,
            to: user.level,
        });

        // Daily quests that match this completion advance in the same
        // transaction. Total granted XP (reward + bonus) feeds earn_xp.
        let mut events = vec![
            QuestEvent::TaskCompleted,
            QuestEvent::XpEarned {
                amount: xp_gained + bonus_xp,
            },
        ];
        if streak_outcome.advanced {
            events.push(QuestEvent::StreakMaintained);
        }
        let quests_advanced = self.advance_matching(user_id, &events, now)?;

        let ws = WriteSet {
            users: vec![user.clone()],
            realms: vec![realm],
            tasks: vec![task.clone()],
            quests: quests_advanced.clone(),
            badges: new_badges.clone(),
            ledger_insert,
            ledger_remove: Vec::new(),
            next_id_watermark: Some(self.alloc.peek_next()),
        };
        self.store.commit(&ws)?;

        tracing::info!(
            user = %user_id,
            task = %task_id,
            xp = xp_gained,
            streak = streak_outcome.streak,
            level = user.level,
            badges = new_badges.len(),
            "task completed"
        );

        Ok(CompletionOutcome {
            task,
            xp_gained,
            base_xp,
            streak_multiplier: multiplier,
            current_streak: streak_outcome.streak,
            level_up,
            new_badges,
            quests_advanced,
            user_stats: UserStatsView::from_user(&user),
        })
    }

    // -----------------------------------------------------------------------
    // Reversal orchestrator
    // -----------------------------------------------------------------------

    /// Revert a completed task to pending, reversing its exact XP grant.
    ///
    /// Badges earned from the original completion are deliberately kept:
    /// badges are permanent achievements.
    pub fn uncomplete_task(
        &self,
        user_id: UserId,
        realm_id: RealmId,
        task_id: TaskId,
    ) -> ForgeResult<ReversalOutcome> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut user = self.require_user(user_id)?;
        let mut realm = self.require_realm(user_id, realm_id)?;
        let mut task = self.require_task(user_id, realm_id, task_id)?;
        if !task.is_completed() {
            return Err(ProgressionError::TaskNotCompleted {
                task_id: task_id.get(),
            }
            .into());
        }

        // The grant to reverse: latest task_completion entry for this task.
        let entries = self.store.ledger_for_task(task_id)?;
        let entry = ledger::latest_completion_entry(&entries, task_id).ok_or(
            ProgressionError::MissingLedgerEntry {
                task_id: task_id.get(),
            },
        )?;
        let xp_lost = entry.xp_gained;
        let entry_id = entry.id;

        task.status = TaskStatus::Pending;
        task.completed_at = None;

        user.xp = user.xp.saturating_sub(xp_lost);
        user.stats.tasks_completed = user.stats.tasks_completed.saturating_sub(1);
        user.recompute_level();

        realm.completed_tasks = realm.completed_tasks.saturating_sub(1);
        realm.total_xp_earned = realm.total_xp_earned.saturating_sub(xp_lost);

        let ws = WriteSet {
            users: vec![user.clone()],
            realms: vec![realm],
            tasks: vec![task.clone()],
            ledger_remove: vec![entry_id],
            ..WriteSet::new()
        };
        self.store.commit(&ws)?;

        tracing::info!(
            user = %user_id,
            task = %task_id,
            xp_lost,
            level = user.level,
            "task completion reversed"
        );

        Ok(ReversalOutcome {
            task,
            xp_lost,
            user_stats: UserStatsView::from_user(&user),
        })
    }

    // -----------------------------------------------------------------------
    // Daily quests
    // -----------------------------------------------------------------------

    /// Advance every matching, unexpired, active quest of the user. Public
    /// entry point for events the engine cannot observe itself (realm visits).
    pub fn advance_quests(&self, user_id: UserId, event: QuestEvent) -> ForgeResult<Vec<Quest>> {
        self.advance_quests_at(user_id, event, Utc::now())
    }

    /// [`Engine::advance_quests`] at an explicit instant.
    pub fn advance_quests_at(
        &self,
        user_id: UserId,
        event: QuestEvent,
        now: DateTime<Utc>,
    ) -> ForgeResult<Vec<Quest>> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        self.require_user(user_id)?;
        let changed = self.advance_matching(user_id, &[event], now)?;
        if !changed.is_empty() {
            let ws = WriteSet {
                quests: changed.clone(),
                ..WriteSet::new()
            };
            self.store.commit(&ws)?;
        }
        Ok(changed)
    }

    /// Push explicit progress onto one quest (custom quests have no matching
    /// engine event, so this is their only way forward).
    pub fn advance_quest_progress(
        &self,
        user_id: UserId,
        quest_id: QuestId,
        increment: u64,
    ) -> ForgeResult<Quest> {
        self.advance_quest_progress_at(user_id, quest_id, increment, Utc::now())
    }

    /// [`Engine::advance_quest_progress`] at an explicit instant.
    pub fn advance_quest_progress_at(
        &self,
        user_id: UserId,
        quest_id: QuestId,
        increment: u64,
        now: DateTime<Utc>,
    ) -> ForgeResult<Quest> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        self.require_user(user_id)?;
        let mut quest = self.require_quest(user_id, quest_id)?;
        match quest.status {
            QuestStatus::Claimed => {
                return Err(ProgressionError::QuestAlreadyClaimed {
                    quest_id: quest_id.get(),
                }
                .into());
            }
            QuestStatus::Completed => {
                return Err(ProgressionError::QuestAlreadyCompleted {
                    quest_id: quest_id.get(),
                }
                .into());
            }
            QuestStatus::Active => {}
        }
        if quest.is_expired(now) {
            return Err(ProgressionError::QuestExpired {
                quest_id: quest_id.get(),
            }
            .into());
        }

        quest.advance(increment, now);
        let ws = WriteSet {
            quests: vec![quest.clone()],
            ..WriteSet::new()
        };
        self.store.commit(&ws)?;
        Ok(quest)
    }

    /// Claim the reward of a completed, unexpired quest now.
    pub fn claim_quest(&self, user_id: UserId, quest_id: QuestId) -> ForgeResult<ClaimOutcome> {
        self.claim_quest_at(user_id, quest_id, Utc::now())
    }

    /// Claim a quest reward at an explicit instant. Exactly-once: the quest
    /// flips to the terminal Claimed state in the same transaction that
    /// grants the XP, so a repeat claim is a `Conflict`.
    pub fn claim_quest_at(
        &self,
        user_id: UserId,
        quest_id: QuestId,
        now: DateTime<Utc>,
    ) -> ForgeResult<ClaimOutcome> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut user = self.require_user(user_id)?;
        let mut quest = self.require_quest(user_id, quest_id)?;
        match quest.status {
            QuestStatus::Claimed => {
                return Err(ProgressionError::QuestAlreadyClaimed {
                    quest_id: quest_id.get(),
                }
                .into());
            }
            QuestStatus::Active => {
                return Err(ProgressionError::QuestNotCompleted {
                    quest_id: quest_id.get(),
                }
                .into());
            }
            QuestStatus::Completed => {}
        }
        if quest.is_expired(now) {
            return Err(ProgressionError::QuestExpired {
                quest_id: quest_id.get(),
            }
            .into());
        }

        let previous_level = user.level;
        user.xp += quest.xp_reward;
        user.recompute_level();
        quest.status = QuestStatus::Claimed;

        let entry = XpEntry::new(
            self.fresh_entry_id()?,
            user_id,
            None,
            quest.xp_reward,
            XpSource::DailyQuest,
            format!("Completed daily quest: {}", quest.title),
            now,
        );

        let ws = WriteSet {
            users: vec![user.clone()],
            quests: vec![quest.clone()],
            ledger_insert: vec![entry],
            next_id_watermark: Some(self.alloc.peek_next()),
            ..WriteSet::new()
        };
        self.store.commit(&ws)?;

        let level_up = (user.level > previous_level).then_some(LevelUp {
            from: previous_level,
            to: user.level,
        });

        tracing::info!(
            user = %user_id,
            quest = %quest_id,
            xp = quest.xp_reward,
            "quest reward claimed"
        );

        Ok(ClaimOutcome {
            xp_gained: quest.xp_reward,
            quest,
            level_up,
            user_stats: UserStatsView::from_user(&user),
        })
    }

    /// Apply a batch of events to the user's quests without committing.
    fn advance_matching(
        &self,
        user_id: UserId,
        events: &[QuestEvent],
        now: DateTime<Utc>,
    ) -> ForgeResult<Vec<Quest>> {
        let mut quests = self.store.quests_for_user(user_id)?;
        let mut changed = Vec::new();
        for quest in quests.iter_mut() {
            let mut touched = false;
            for event in events {
                if let Some(increment) = quest::increment_for(quest.quest_type, *event) {
                    touched |= quest.advance(increment, now);
                }
            }
            if touched {
                changed.push(quest.clone());
            }
        }
        Ok(changed)
    }

    // -----------------------------------------------------------------------
    // Read views
    // -----------------------------------------------------------------------

    /// Aggregate progress summary for a user.
    pub fn user_stats(&self, user_id: UserId) -> ForgeResult<UserStatsView> {
        Ok(UserStatsView::from_user(&self.require_user(user_id)?))
    }

    /// Full XP history, newest first.
    pub fn xp_history(&self, user_id: UserId) -> ForgeResult<Vec<XpEntry>> {
        self.require_user(user_id)?;
        Ok(self.store.ledger_for_user(user_id)?)
    }

    /// All badges of the user, with unearned badge progress refreshed from
    /// the live stats snapshot (the stored progress is a display cache).
    pub fn badges(&self, user_id: UserId) -> ForgeResult<Vec<Badge>> {
        let user = self.require_user(user_id)?;
        let snapshot = user.snapshot();
        let mut badges = self.store.badges_for_user(user_id)?;
        for badge in badges.iter_mut() {
            if !badge.completed {
                badge.progress = badge.badge_type.progress_for(&snapshot);
            }
        }
        Ok(badges)
    }

    /// The user's quests, excluding claimed ones (claimed is terminal and
    /// hidden from every listing).
    pub fn quests(&self, user_id: UserId) -> ForgeResult<Vec<Quest>> {
        self.require_user(user_id)?;
        let quests = self.store.quests_for_user(user_id)?;
        Ok(quests
            .into_iter()
            .filter(|q| q.status != QuestStatus::Claimed)
            .collect())
    }

    /// Aggregate completion summary for a realm the user owns.
    pub fn realm_progress(&self, user_id: UserId, realm_id: RealmId) -> ForgeResult<RealmProgress> {
        let realm = self.require_realm(user_id, realm_id)?;
        Ok(RealmProgress {
            completion_fraction: realm.completion_fraction(),
            realm,
        })
    }

    // -----------------------------------------------------------------------
    // Record lookup with ownership checks
    // -----------------------------------------------------------------------

    fn require_user(&self, user_id: UserId) -> ForgeResult<User> {
        self.store
            .get_user(user_id)?
            .ok_or_else(|| {
                ProgressionError::UserNotFound {
                    user_id: user_id.get(),
                }
                .into()
            })
    }

    fn require_realm(&self, user_id: UserId, realm_id: RealmId) -> ForgeResult<Realm> {
        self.store
            .get_realm(realm_id)?
            .filter(|r| r.user_id == user_id)
            .ok_or_else(|| {
                ProgressionError::RealmNotFound {
                    realm_id: realm_id.get(),
                }
                .into()
            })
    }

    fn require_task(
        &self,
        user_id: UserId,
        realm_id: RealmId,
        task_id: TaskId,
    ) -> ForgeResult<Task> {
        self.store
            .get_task(task_id)?
            .filter(|t| t.realm_id == realm_id && t.user_id == user_id)
            .ok_or_else(|| {
                ProgressionError::TaskNotFound {
                    task_id: task_id.get(),
                }
                .into()
            })
    }

    fn require_quest(&self, user_id: UserId, quest_id: QuestId) -> ForgeResult<Quest> {
        self.store
            .get_quest(quest_id)?
            .filter(|q| q.user_id == user_id)
            .ok_or_else(|| {
                ProgressionError::QuestNotFound {
                    quest_id: quest_id.get(),
                }
                .into()
            })
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine").field("config", &self.config).finish()
    }
}

// ---------------------------------------------------------------------------
// Operation inputs and outcomes
// ---------------------------------------------------------------------------

/// Collaborator-supplied definition of a daily quest.
#[derive(Debug, Clone)]
pub struct QuestSpec {
    pub title: String,
    pub description: String,
    pub quest_type: QuestType,
    pub target: u64,
    /// Explicit reward; derived from target and type when `None`.
    pub xp_reward: Option<u64>,
    pub is_custom: bool,
    pub expires_at: DateTime<Utc>,
}

/// A level increase observed during an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelUp {
    pub from: u32,
    pub to: u32,
}

/// Result of a successful task completion.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionOutcome {
    pub task: Task,
    pub xp_gained: u64,
    pub base_xp: u64,
    pub streak_multiplier: f64,
    pub current_streak: u32,
    pub level_up: Option<LevelUp>,
    pub new_badges: Vec<Badge>,
    pub quests_advanced: Vec<Quest>,
    pub user_stats: UserStatsView,
}

/// Result of a successful task reversal.
#[derive(Debug, Clone, Serialize)]
pub struct ReversalOutcome {
    pub task: Task,
    pub xp_lost: u64,
    pub user_stats: UserStatsView,
}

/// Result of a successful quest claim.
#[derive(Debug, Clone, Serialize)]
pub struct ClaimOutcome {
    pub quest: Quest,
    pub xp_gained: u64,
    pub level_up: Option<LevelUp>,
    pub user_stats: UserStatsView,
}

/// Read-only summary of a user's progress.
#[derive(Debug, Clone, Serialize)]
pub struct UserStatsView {
    pub level: u32,
    pub xp: u64,
    /// Legacy duplicated field, derived from `xp`.
    pub total_xp: u64,
    pub tasks_completed: u64,
    pub streak: u32,
    pub active_realms: u64,
    pub xp_into_level: u64,
    pub xp_to_next_level: u64,
}

impl UserStatsView {
    fn from_user(user: &User) -> Self {
        Self {
            level: user.level,
            xp: user.xp,
            total_xp: user.total_xp(),
            tasks_completed: user.stats.tasks_completed,
            streak: user.stats.streak,
            active_realms: user.stats.active_realms,
            xp_into_level: level::xp_into_level(user.xp),
            xp_to_next_level: level::xp_to_next_level(user.xp),
        }
    }
}

impl std::fmt::Display for UserStatsView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "level:            {}", self.level)?;
        writeln!(f, "xp:               {}", self.xp)?;
        writeln!(f, "tasks completed:  {}", self.tasks_completed)?;
        writeln!(f, "streak:           {} day(s)", self.streak)?;
        writeln!(f, "active realms:    {}", self.active_realms)?;
        writeln!(f, "next level in:    {} XP", self.xp_to_next_level)?;
        Ok(())
    }
}

/// Read-only summary of a realm's completion state.
#[derive(Debug, Clone, Serialize)]
pub struct RealmProgress {
    pub realm: Realm,
    pub completion_fraction: f64,
}

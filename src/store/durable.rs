//! ACID record store backed by redb.
//!
//! One table per record kind, bincode-encoded values, and a meta table for
//! the id-allocator watermark. Every orchestrator operation commits through
//! [`ForgeStore::commit`] in a single write transaction; reads use MVCC
//! snapshots. A memory-only backend serves tests and ephemeral runs, the
//! file backend everything else.

use std::path::Path;

use chrono::{DateTime, Utc};
use redb::{Database, ReadableTable, TableDefinition, backends::InMemoryBackend};

use crate::badge::{Badge, BadgeType};
use crate::error::{StoreError, StoreResult};
use crate::ident::{QuestId, RealmId, TaskId, UserId};
use crate::ledger::XpEntry;
use crate::model::{Realm, Task, TaskStatus, User};
use crate::quest::Quest;
use crate::store::{WriteSet, decode, encode};

const USERS: TableDefinition<u64, &[u8]> = TableDefinition::new("users");
const REALMS: TableDefinition<u64, &[u8]> = TableDefinition::new("realms");
const TASKS: TableDefinition<u64, &[u8]> = TableDefinition::new("tasks");
const LEDGER: TableDefinition<u64, &[u8]> = TableDefinition::new("ledger");
const QUESTS: TableDefinition<u64, &[u8]> = TableDefinition::new("quests");

/// Badges key on (user id, badge type) — one record per pair.
const BADGES: TableDefinition<(u64, &str), &[u8]> = TableDefinition::new("badges");

/// Small scalar metadata (id-allocator watermark).
const META: TableDefinition<&str, u64> = TableDefinition::new("meta");

const NEXT_ID_KEY: &str = "next_id";

fn redb_err(op: &str, e: impl std::fmt::Display) -> StoreError {
    StoreError::Redb {
        message: format!("{op} failed: {e}"),
    }
}

/// The realmforge datastore.
pub struct ForgeStore {
    db: Database,
}

impl ForgeStore {
    /// Open or create the store in the given directory.
    pub fn open(data_dir: &Path) -> StoreResult<Self> {
        std::fs::create_dir_all(data_dir).map_err(|e| StoreError::Io { source: e })?;
        let db_path = data_dir.join("realmforge.redb");
        let db = Database::create(&db_path)
            .map_err(|e| redb_err(&format!("open redb at {}", db_path.display()), e))?;
        let store = Self { db };
        store.init_tables()?;
        Ok(store)
    }

    /// Open a memory-only store (nothing survives drop). Used by tests and
    /// ephemeral engines.
    pub fn open_in_memory() -> StoreResult<Self> {
        let db = Database::builder()
            .create_with_backend(InMemoryBackend::new())
            .map_err(|e| redb_err("open in-memory redb", e))?;
        let store = Self { db };
        store.init_tables()?;
        Ok(store)
    }

    /// Create every table up front so first reads never see a missing table.
    fn init_tables(&self) -> StoreResult<()> {
        let txn = self
            .db
            .begin_write()
            .map_err(|e| redb_err("begin_write", e))?;
        {
            txn.open_table(USERS).map_err(|e| redb_err("open_table users", e))?;
            txn.open_table(REALMS)
                .map_err(|e| redb_err("open_table realms", e))?;
            txn.open_table(TASKS).map_err(|e| redb_err("open_table tasks", e))?;
            txn.open_table(LEDGER)
                .map_err(|e| redb_err("open_table ledger", e))?;
            txn.open_table(QUESTS)
                .map_err(|e| redb_err("open_table quests", e))?;
            txn.open_table(BADGES)
                .map_err(|e| redb_err("open_table badges", e))?;
            txn.open_table(META).map_err(|e| redb_err("open_table meta", e))?;
        }
        txn.commit().map_err(|e| redb_err("commit", e))
    }

    // -----------------------------------------------------------------------
    // Point reads
    // -----------------------------------------------------------------------

    fn get_record<T: serde::de::DeserializeOwned>(
        &self,
        table: TableDefinition<u64, &[u8]>,
        key: u64,
    ) -> StoreResult<Option<T>> {
        let txn = self.db.begin_read().map_err(|e| redb_err("begin_read", e))?;
        let table = txn.open_table(table).map_err(|e| redb_err("open_table", e))?;
        let guard = table.get(key).map_err(|e| redb_err("get", e))?;
        guard.map(|g| decode(g.value())).transpose()
    }

    pub fn get_user(&self, id: UserId) -> StoreResult<Option<User>> {
        self.get_record(USERS, id.get())
    }

    pub fn get_realm(&self, id: RealmId) -> StoreResult<Option<Realm>> {
        self.get_record(REALMS, id.get())
    }

    pub fn get_task(&self, id: TaskId) -> StoreResult<Option<Task>> {
        self.get_record(TASKS, id.get())
    }

    pub fn get_quest(&self, id: QuestId) -> StoreResult<Option<Quest>> {
        self.get_record(QUESTS, id.get())
    }

    pub fn get_badge(&self, user: UserId, badge_type: BadgeType) -> StoreResult<Option<Badge>> {
        let txn = self.db.begin_read().map_err(|e| redb_err("begin_read", e))?;
        let table = txn
            .open_table(BADGES)
            .map_err(|e| redb_err("open_table badges", e))?;
        let guard = table
            .get((user.get(), badge_type.as_str()))
            .map_err(|e| redb_err("get badge", e))?;
        guard.map(|g| decode(g.value())).transpose()
    }

    /// The persisted id-allocator watermark (1 on a fresh store).
    pub fn next_id_watermark(&self) -> StoreResult<u64> {
        let txn = self.db.begin_read().map_err(|e| redb_err("begin_read", e))?;
        let table = txn.open_table(META).map_err(|e| redb_err("open_table meta", e))?;
        let guard = table
            .get(NEXT_ID_KEY)
            .map_err(|e| redb_err("get next_id", e))?;
        Ok(guard.map(|g| g.value()).unwrap_or(1))
    }

    // -----------------------------------------------------------------------
    // Scans
    // -----------------------------------------------------------------------

    fn scan<T, F>(&self, table: TableDefinition<u64, &[u8]>, mut keep: F) -> StoreResult<Vec<T>>
    where
        T: serde::de::DeserializeOwned,
        F: FnMut(&T) -> bool,
    {
        let txn = self.db.begin_read().map_err(|e| redb_err("begin_read", e))?;
        let table = txn.open_table(table).map_err(|e| redb_err("open_table", e))?;
        let mut out = Vec::new();
        for item in table.iter().map_err(|e| redb_err("iter", e))? {
            let (_, value) = item.map_err(|e| redb_err("iter entry", e))?;
            let record: T = decode(value.value())?;
            if keep(&record) {
                out.push(record);
            }
        }
        Ok(out)
    }

    pub fn tasks_for_realm(&self, realm: RealmId) -> StoreResult<Vec<Task>> {
        self.scan(TASKS, |t: &Task| t.realm_id == realm)
    }

    /// Completed tasks of `user` whose `completed_at` falls in `[from, to)`.
    ///
    /// This is the one query the streak tracker needs; it is shared by the
    /// today-count and the yesterday-count so both use identical bounds.
    pub fn count_completions_between(
        &self,
        user: UserId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<u64> {
        let hits = self.scan(TASKS, |t: &Task| {
            t.user_id == user
                && t.status == TaskStatus::Completed
                && t.completed_at.is_some_and(|at| from <= at && at < to)
        })?;
        Ok(hits.len() as u64)
    }

    pub fn quests_for_user(&self, user: UserId) -> StoreResult<Vec<Quest>> {
        let mut quests = self.scan(QUESTS, |q: &Quest| q.user_id == user)?;
        quests.sort_by_key(|q| q.id);
        Ok(quests)
    }

    pub fn badges_for_user(&self, user: UserId) -> StoreResult<Vec<Badge>> {
        let txn = self.db.begin_read().map_err(|e| redb_err("begin_read", e))?;
        let table = txn
            .open_table(BADGES)
            .map_err(|e| redb_err("open_table badges", e))?;
        let mut out = Vec::new();
        for item in table.iter().map_err(|e| redb_err("iter badges", e))? {
            let (key, value) = item.map_err(|e| redb_err("iter badge entry", e))?;
            if key.value().0 == user.get() {
                out.push(decode(value.value())?);
            }
        }
        Ok(out)
    }

    /// Every ledger entry referencing `task`, in insertion order.
    pub fn ledger_for_task(&self, task: TaskId) -> StoreResult<Vec<XpEntry>> {
        self.scan(LEDGER, |e: &XpEntry| e.task_id == Some(task))
    }

    /// A user's full XP history, newest first (ties broken by entry id).
    pub fn ledger_for_user(&self, user: UserId) -> StoreResult<Vec<XpEntry>> {
        let mut entries = self.scan(LEDGER, |e: &XpEntry| e.user_id == user)?;
        entries.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(entries)
    }

    // -----------------------------------------------------------------------
    // Atomic commit
    // -----------------------------------------------------------------------

    /// Apply every write in `ws` in one transaction.
    ///
    /// Either the whole set lands or none of it does; a crash mid-commit
    /// rolls back to the prior state. The watermark only ever moves forward,
    /// so interleaved commits cannot regress id allocation.
    pub fn commit(&self, ws: &WriteSet) -> StoreResult<()> {
        let txn = self
            .db
            .begin_write()
            .map_err(|e| redb_err("begin_write", e))?;
        {
            let mut users = txn.open_table(USERS).map_err(|e| redb_err("open_table users", e))?;
            for user in &ws.users {
                users
                    .insert(user.id.get(), encode(user)?.as_slice())
                    .map_err(|e| redb_err("insert user", e))?;
            }
        }
        {
            let mut realms = txn
                .open_table(REALMS)
                .map_err(|e| redb_err("open_table realms", e))?;
            for realm in &ws.realms {
                realms
                    .insert(realm.id.get(), encode(realm)?.as_slice())
                    .map_err(|e| redb_err("insert realm", e))?;
            }
        }
        {
            let mut tasks = txn.open_table(TASKS).map_err(|e| redb_err("open_table tasks", e))?;
            for task in &ws.tasks {
                tasks
                    .insert(task.id.get(), encode(task)?.as_slice())
                    .map_err(|e| redb_err("insert task", e))?;
            }
        }
        {
            let mut quests = txn
                .open_table(QUESTS)
                .map_err(|e| redb_err("open_table quests", e))?;
            for quest in &ws.quests {
                quests
                    .insert(quest.id.get(), encode(quest)?.as_slice())
                    .map_err(|e| redb_err("insert quest", e))?;
            }
        }
        {
            let mut badges = txn
                .open_table(BADGES)
                .map_err(|e| redb_err("open_table badges", e))?;
            for badge in &ws.badges {
                badges
                    .insert(
                        (badge.user_id.get(), badge.badge_type.as_str()),
                        encode(badge)?.as_slice(),
                    )
                    .map_err(|e| redb_err("insert badge", e))?;
            }
        }
        {
            let mut ledger = txn
                .open_table(LEDGER)
                .map_err(|e| redb_err("open_table ledger", e))?;
            for entry in &ws.ledger_insert {
                ledger
                    .insert(entry.id.get(), encode(entry)?.as_slice())
                    .map_err(|e| redb_err("insert ledger entry", e))?;
            }
            for id in &ws.ledger_remove {
                ledger
                    .remove(id.get())
                    .map_err(|e| redb_err("remove ledger entry", e))?;
            }
        }
        if let Some(mark) = ws.next_id_watermark {
            let mut meta = txn.open_table(META).map_err(|e| redb_err("open_table meta", e))?;
            let current = meta
                .get(NEXT_ID_KEY)
                .map_err(|e| redb_err("get next_id", e))?
                .map(|g| g.value())
                .unwrap_or(1);
            if mark > current {
                meta.insert(NEXT_ID_KEY, mark)
                    .map_err(|e| redb_err("insert next_id", e))?;
            }
        }
        txn.commit().map_err(|e| redb_err("commit", e))
    }
}

impl std::fmt::Debug for ForgeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForgeStore").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::EntryId;
    use crate::ledger::XpSource;
    use tempfile::TempDir;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn user(id: u64) -> User {
        User::new(UserId::new(id).unwrap(), format!("user-{id}"), ts("2026-03-01T08:00:00Z"))
    }

    #[test]
    fn user_round_trip_through_commit() {
        let store = ForgeStore::open_in_memory().unwrap();
        let mut ws = WriteSet::new();
        ws.users.push(user(1));
        store.commit(&ws).unwrap();

        let loaded = store.get_user(UserId::new(1).unwrap()).unwrap().unwrap();
        assert_eq!(loaded.username, "user-1");
        assert!(store.get_user(UserId::new(9).unwrap()).unwrap().is_none());
    }

    #[test]
    fn records_survive_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = ForgeStore::open(dir.path()).unwrap();
            let mut ws = WriteSet::new();
            ws.users.push(user(1));
            ws.next_id_watermark = Some(42);
            store.commit(&ws).unwrap();
        }

        let store = ForgeStore::open(dir.path()).unwrap();
        assert!(store.get_user(UserId::new(1).unwrap()).unwrap().is_some());
        assert_eq!(store.next_id_watermark().unwrap(), 42);
    }

    #[test]
    fn watermark_never_regresses() {
        let store = ForgeStore::open_in_memory().unwrap();
        let mut ws = WriteSet::new();
        ws.next_id_watermark = Some(10);
        store.commit(&ws).unwrap();

        let mut stale = WriteSet::new();
        stale.next_id_watermark = Some(5);
        store.commit(&stale).unwrap();

        assert_eq!(store.next_id_watermark().unwrap(), 10);
    }

    #[test]
    fn ledger_insert_and_remove() {
        let store = ForgeStore::open_in_memory().unwrap();
        let uid = UserId::new(1).unwrap();
        let tid = TaskId::new(2).unwrap();

        let mut ws = WriteSet::new();
        ws.ledger_insert.push(XpEntry::new(
            EntryId::new(3).unwrap(),
            uid,
            Some(tid),
            20,
            XpSource::TaskCompletion,
            "Completed task: demo",
            ts("2026-03-01T10:00:00Z"),
        ));
        store.commit(&ws).unwrap();
        assert_eq!(store.ledger_for_task(tid).unwrap().len(), 1);

        let mut undo = WriteSet::new();
        undo.ledger_remove.push(EntryId::new(3).unwrap());
        store.commit(&undo).unwrap();
        assert!(store.ledger_for_task(tid).unwrap().is_empty());
        assert!(store.ledger_for_user(uid).unwrap().is_empty());
    }

    #[test]
    fn ledger_for_user_is_newest_first() {
        let store = ForgeStore::open_in_memory().unwrap();
        let uid = UserId::new(1).unwrap();
        let mut ws = WriteSet::new();
        for (id, at) in [(1, "2026-03-01T10:00:00Z"), (2, "2026-03-02T10:00:00Z")] {
            ws.ledger_insert.push(XpEntry::new(
                EntryId::new(id).unwrap(),
                uid,
                None,
                5,
                XpSource::DailyQuest,
                "Completed daily quest: demo",
                ts(at),
            ));
        }
        store.commit(&ws).unwrap();

        let history = store.ledger_for_user(uid).unwrap();
        assert_eq!(history[0].id.get(), 2);
        assert_eq!(history[1].id.get(), 1);
    }

    #[test]
    fn badge_composite_key_lookup() {
        let store = ForgeStore::open_in_memory().unwrap();
        let uid = UserId::new(1).unwrap();

        let mut ws = WriteSet::new();
        ws.badges.push(Badge::fresh(uid, BadgeType::FirstClear));
        ws.badges.push(Badge::fresh(uid, BadgeType::StreakKing));
        store.commit(&ws).unwrap();

        let badge = store.get_badge(uid, BadgeType::FirstClear).unwrap().unwrap();
        assert_eq!(badge.name, "First Clear");
        assert_eq!(store.badges_for_user(uid).unwrap().len(), 2);
        assert!(
            store
                .get_badge(UserId::new(2).unwrap(), BadgeType::FirstClear)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn completion_counts_respect_day_bounds() {
        let store = ForgeStore::open_in_memory().unwrap();
        let uid = UserId::new(1).unwrap();
        let rid = RealmId::new(2).unwrap();

        let mut ws = WriteSet::new();
        for (id, at) in [
            (10, Some("2026-03-01T00:00:00Z")),
            (11, Some("2026-03-01T23:59:59Z")),
            (12, Some("2026-03-02T00:00:00Z")),
            (13, None),
        ] {
            let mut task = Task::new(
                TaskId::new(id).unwrap(),
                rid,
                uid,
                "t",
                crate::model::Difficulty::Easy,
                ts("2026-02-28T00:00:00Z"),
            );
            if let Some(at) = at {
                task.status = TaskStatus::Completed;
                task.completed_at = Some(ts(at));
            }
            ws.tasks.push(task);
        }
        store.commit(&ws).unwrap();

        let count = store
            .count_completions_between(uid, ts("2026-03-01T00:00:00Z"), ts("2026-03-02T00:00:00Z"))
            .unwrap();
        assert_eq!(count, 2);
    }
}

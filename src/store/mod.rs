//! Persistent storage for realmforge.
//!
//! A single ACID datastore ([`ForgeStore`], backed by redb) holds every
//! record the orchestrators reconcile: users, realms, tasks, the XP ledger,
//! badges, and daily quests. All writes of one logical operation travel in a
//! [`WriteSet`] and commit in one transaction — a failed or cancelled
//! operation leaves no partial state behind.

pub mod durable;

pub use durable::ForgeStore;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::badge::Badge;
use crate::error::{StoreError, StoreResult};
use crate::ident::EntryId;
use crate::ledger::XpEntry;
use crate::model::{Realm, Task, User};
use crate::quest::Quest;

/// Encode a record for storage.
pub(crate) fn encode<T: Serialize>(value: &T) -> StoreResult<Vec<u8>> {
    bincode::serialize(value).map_err(|e| StoreError::Serialization {
        message: format!("failed to encode record: {e}"),
    })
}

/// Decode a stored record.
pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> StoreResult<T> {
    bincode::deserialize(bytes).map_err(|e| StoreError::Serialization {
        message: format!("failed to decode record: {e}"),
    })
}

/// The complete set of writes produced by one orchestrator operation.
///
/// Upserts replace whole records by id; ledger entries are only ever inserted
/// or removed, never rewritten. The id-allocator watermark rides along so a
/// restart resumes allocation past every id this operation handed out.
#[derive(Debug, Default)]
pub struct WriteSet {
    pub users: Vec<User>,
    pub realms: Vec<Realm>,
    pub tasks: Vec<Task>,
    pub quests: Vec<Quest>,
    pub badges: Vec<Badge>,
    pub ledger_insert: Vec<XpEntry>,
    pub ledger_remove: Vec<EntryId>,
    pub next_id_watermark: Option<u64>,
}

impl WriteSet {
    pub fn new() -> Self {
        Self::default()
    }
}

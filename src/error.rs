//! Rich diagnostic error types for the realmforge engine.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes, help text, and source chains. Every progression error
//! additionally maps to one of four stable machine-readable kinds
//! ([`ErrorKind`]) so the API layer above can translate errors without matching
//! on individual variants.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the realmforge engine.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text, source spans) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum ForgeError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Progression(#[from] ProgressionError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Ident(#[from] IdentError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Engine(#[from] EngineError),
}

/// Convenience alias for functions returning realmforge results.
pub type ForgeResult<T> = std::result::Result<T, ForgeError>;

// ---------------------------------------------------------------------------
// Stable error kinds
// ---------------------------------------------------------------------------

/// The four stable, machine-readable failure categories exposed across the
/// engine boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A referenced record is missing or not owned by the caller.
    NotFound,
    /// The operation contradicts the record's current state.
    Conflict,
    /// A caller-supplied value is out of range.
    InvalidInput,
    /// Stored data contradicts an invariant (prior corruption).
    Inconsistent,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::NotFound => write!(f, "not_found"),
            ErrorKind::Conflict => write!(f, "conflict"),
            ErrorKind::InvalidInput => write!(f, "invalid_input"),
            ErrorKind::Inconsistent => write!(f, "inconsistent"),
        }
    }
}

// ---------------------------------------------------------------------------
// Progression errors
// ---------------------------------------------------------------------------

/// Precondition and invariant failures from the progression orchestrators.
///
/// All of these are detected before any write; an operation that returns one
/// has made no change to the datastore.
#[derive(Debug, Error, Diagnostic)]
pub enum ProgressionError {
    #[error("user not found: {user_id}")]
    #[diagnostic(
        code(forge::progress::user_not_found),
        help("No user record exists with this id. Seed the user before recording progress.")
    )]
    UserNotFound { user_id: u64 },

    #[error("realm not found: {realm_id}")]
    #[diagnostic(
        code(forge::progress::realm_not_found),
        help(
            "The realm does not exist or is not owned by the calling user. \
             Realm ids are only valid for their owner."
        )
    )]
    RealmNotFound { realm_id: u64 },

    #[error("task not found: {task_id}")]
    #[diagnostic(
        code(forge::progress::task_not_found),
        help(
            "The task does not exist in this realm or is not owned by the calling \
             user. Check the realm id and task id together."
        )
    )]
    TaskNotFound { task_id: u64 },

    #[error("daily quest not found: {quest_id}")]
    #[diagnostic(
        code(forge::progress::quest_not_found),
        help("No daily quest with this id belongs to the calling user.")
    )]
    QuestNotFound { quest_id: u64 },

    #[error("task {task_id} is already completed")]
    #[diagnostic(
        code(forge::progress::task_already_completed),
        help(
            "A task can only be completed once. If two requests raced, the first \
             one won; refresh the task and treat this completion as already applied."
        )
    )]
    TaskAlreadyCompleted { task_id: u64 },

    #[error("task {task_id} is not completed")]
    #[diagnostic(
        code(forge::progress::task_not_completed),
        help("Only a completed task can be reverted to pending.")
    )]
    TaskNotCompleted { task_id: u64 },

    #[error("daily quest {quest_id} is already completed")]
    #[diagnostic(
        code(forge::progress::quest_already_completed),
        help("Progress cannot be pushed past a completed quest; claim its reward instead.")
    )]
    QuestAlreadyCompleted { quest_id: u64 },

    #[error("daily quest {quest_id} is not completed yet")]
    #[diagnostic(
        code(forge::progress::quest_not_completed),
        help("A quest reward can only be claimed after progress reaches the target.")
    )]
    QuestNotCompleted { quest_id: u64 },

    #[error("daily quest {quest_id} has expired")]
    #[diagnostic(
        code(forge::progress::quest_expired),
        help("Expired quests are frozen: they cannot advance, complete, or be claimed.")
    )]
    QuestExpired { quest_id: u64 },

    #[error("daily quest {quest_id} reward was already claimed")]
    #[diagnostic(
        code(forge::progress::quest_already_claimed),
        help("Each quest reward can be claimed exactly once.")
    )]
    QuestAlreadyClaimed { quest_id: u64 },

    #[error("quest target {target} is out of range (1..=100)")]
    #[diagnostic(
        code(forge::progress::invalid_quest_target),
        help("Custom quest targets must be between 1 and 100 units.")
    )]
    InvalidQuestTarget { target: u64 },

    #[error("quest XP reward {reward} is out of range (1..=200)")]
    #[diagnostic(
        code(forge::progress::invalid_quest_reward),
        help("Custom quest rewards must be between 1 and 200 XP.")
    )]
    InvalidQuestReward { reward: u64 },

    #[error("no completion ledger entry found for task {task_id}")]
    #[diagnostic(
        code(forge::progress::missing_ledger_entry),
        help(
            "The task is marked completed but the XP ledger holds no matching \
             task_completion entry. This indicates prior data corruption; audit \
             the ledger before retrying the reversal."
        )
    )]
    MissingLedgerEntry { task_id: u64 },
}

impl ProgressionError {
    /// The stable machine-readable category for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UserNotFound { .. }
            | Self::RealmNotFound { .. }
            | Self::TaskNotFound { .. }
            | Self::QuestNotFound { .. } => ErrorKind::NotFound,
            Self::TaskAlreadyCompleted { .. }
            | Self::TaskNotCompleted { .. }
            | Self::QuestAlreadyCompleted { .. }
            | Self::QuestNotCompleted { .. }
            | Self::QuestExpired { .. }
            | Self::QuestAlreadyClaimed { .. } => ErrorKind::Conflict,
            Self::InvalidQuestTarget { .. } | Self::InvalidQuestReward { .. } => {
                ErrorKind::InvalidInput
            }
            Self::MissingLedgerEntry { .. } => ErrorKind::Inconsistent,
        }
    }
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("I/O error: {source}")]
    #[diagnostic(
        code(forge::store::io),
        help(
            "A filesystem operation failed. Check that the data directory exists, \
             has correct permissions, and that the disk is not full."
        )
    )]
    Io {
        #[source]
        source: std::io::Error,
    },

    #[error("redb transaction error: {message}")]
    #[diagnostic(
        code(forge::store::redb),
        help(
            "The embedded database encountered a transaction error. \
             This may indicate corruption — try running with a fresh data directory. \
             If the problem persists, file a bug report."
        )
    )]
    Redb { message: String },

    #[error("serialization error: {message}")]
    #[diagnostic(
        code(forge::store::serde),
        help(
            "Failed to serialize or deserialize a record. \
             This usually means the stored data format has changed between versions."
        )
    )]
    Serialization { message: String },

    #[error("key not found: {key}")]
    #[diagnostic(
        code(forge::store::not_found),
        help("The requested key does not exist in the store. Verify the key is correct.")
    )]
    NotFound { key: String },
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

// ---------------------------------------------------------------------------
// Identifier errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum IdentError {
    #[error("id allocator exhausted: cannot allocate more than u64::MAX ids")]
    #[diagnostic(
        code(forge::ident::exhausted),
        help(
            "The id space is exhausted. This is extremely unlikely in practice \
             (requires 2^64 allocations). If you see this error, check for an \
             allocation loop."
        )
    )]
    AllocatorExhausted,
}

// ---------------------------------------------------------------------------
// Engine errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum EngineError {
    #[error("data directory error: {path}")]
    #[diagnostic(
        code(forge::engine::data_dir),
        help(
            "The data directory could not be accessed. \
             Ensure the path exists and has read/write permissions."
        )
    )]
    DataDir { path: String },
}

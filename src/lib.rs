// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # realmforge
//!
//! A gamified task progression engine: tasks grouped into realms earn XP on
//! completion, levels derive from cumulative XP, daily streaks multiply
//! rewards, and badges and daily quests track longer arcs.
//!
//! ## Architecture
//!
//! - **Level math** (`level`): pure XP → level derivation, triangular thresholds
//! - **Streaks** (`streak`): UTC calendar-day streak tracking and multipliers
//! - **Badges** (`badge`): pure, idempotent evaluation of one-time achievements
//! - **Daily quests** (`quest`): time-boxed objectives with claimable rewards
//! - **XP ledger** (`ledger`): append-only grant audit log, the undo mechanism
//! - **Storage** (`store`): single ACID datastore (redb), one transaction per operation
//! - **Orchestrators** (`engine`): completion and reversal entry points
//!
//! ## Library usage
//!
//! ```no_run
//! use realmforge::engine::{Engine, EngineConfig};
//! use realmforge::model::Difficulty;
//!
//! let engine = Engine::new(EngineConfig::default()).unwrap();
//! let user = engine.create_user("aria").unwrap();
//! let realm = engine.create_realm(user.id, "Fire Realm").unwrap();
//! let task = engine.create_task(user.id, realm.id, "Slay the inbox", Difficulty::Hard).unwrap();
//! let outcome = engine.complete_task(user.id, realm.id, task.id).unwrap();
//! println!("+{} XP (streak ×{})", outcome.xp_gained, outcome.streak_multiplier);
//! ```

pub mod badge;
pub mod engine;
pub mod error;
pub mod ident;
pub mod ledger;
pub mod level;
pub mod model;
pub mod quest;
pub mod store;
pub mod streak;

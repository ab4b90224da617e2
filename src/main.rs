//! realmforge CLI: gamified task progression engine.

use std::path::PathBuf;

use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result, miette};

use realmforge::engine::{Engine, EngineConfig, QuestSpec};
use realmforge::ident::{QuestId, RealmId, TaskId, UserId};
use realmforge::model::Difficulty;
use realmforge::quest::QuestType;

#[derive(Parser)]
#[command(name = "realmforge", version, about = "Gamified task progression engine")]
struct Cli {
    /// Data directory for persistent storage.
    #[arg(long, global = true, default_value = ".realmforge")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new realmforge data directory.
    Init,

    /// Register a new user.
    UserCreate {
        /// Display name.
        #[arg(long)]
        name: String,
    },

    /// Create a realm for a user.
    RealmCreate {
        #[arg(long)]
        user: u64,
        /// Realm name.
        #[arg(long)]
        name: String,
    },

    /// Manage tasks.
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },

    /// Manage daily quests.
    Quest {
        #[command(subcommand)]
        action: QuestAction,
    },

    /// Show a user's progress summary.
    Stats {
        #[arg(long)]
        user: u64,
    },

    /// Show a user's XP history as JSON, newest first.
    History {
        #[arg(long)]
        user: u64,
    },

    /// Show a user's badges as JSON, with live progress.
    Badges {
        #[arg(long)]
        user: u64,
    },
}

#[derive(Subcommand)]
enum TaskAction {
    /// Add a pending task to a realm.
    Add {
        #[arg(long)]
        user: u64,
        #[arg(long)]
        realm: u64,
        /// Task title.
        #[arg(long)]
        title: String,
        /// easy, medium, or hard.
        #[arg(long, default_value = "easy")]
        difficulty: Difficulty,
    },
    /// Complete a pending task.
    Complete {
        #[arg(long)]
        user: u64,
        #[arg(long)]
        realm: u64,
        #[arg(long)]
        task: u64,
    },
    /// Revert a completed task to pending, reversing its XP.
    Uncomplete {
        #[arg(long)]
        user: u64,
        #[arg(long)]
        realm: u64,
        #[arg(long)]
        task: u64,
    },
}

#[derive(Subcommand)]
enum QuestAction {
    /// Add a daily quest.
    Add {
        #[arg(long)]
        user: u64,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        /// complete_tasks, visit_realms, earn_xp, maintain_streak,
        /// defeat_enemies, or custom.
        #[arg(long, default_value = "complete_tasks")]
        quest_type: QuestType,
        #[arg(long)]
        target: u64,
        /// Explicit XP reward; derived from the target when omitted.
        #[arg(long)]
        reward: Option<u64>,
        /// Hours until the quest expires.
        #[arg(long, default_value = "24")]
        expires_in_hours: i64,
    },
    /// List a user's quests (claimed quests are hidden).
    List {
        #[arg(long)]
        user: u64,
    },
    /// Claim the reward of a completed quest.
    Claim {
        #[arg(long)]
        user: u64,
        #[arg(long)]
        quest: u64,
    },
}

fn user_id(raw: u64) -> Result<UserId> {
    UserId::new(raw).ok_or_else(|| miette!("user id must be non-zero"))
}

fn realm_id(raw: u64) -> Result<RealmId> {
    RealmId::new(raw).ok_or_else(|| miette!("realm id must be non-zero"))
}

fn task_id(raw: u64) -> Result<TaskId> {
    TaskId::new(raw).ok_or_else(|| miette!("task id must be non-zero"))
}

fn quest_id(raw: u64) -> Result<QuestId> {
    QuestId::new(raw).ok_or_else(|| miette!("quest id must be non-zero"))
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let engine = Engine::new(EngineConfig {
        data_dir: Some(cli.data_dir.clone()),
    })?;

    match cli.command {
        Commands::Init => {
            println!("Initialized realmforge at {}", cli.data_dir.display());
        }

        Commands::UserCreate { name } => {
            let user = engine.create_user(name)?;
            engine.register_badges(user.id)?;
            println!("Created {} ({})", user.username, user.id);
        }

        Commands::RealmCreate { user, name } => {
            let realm = engine.create_realm(user_id(user)?, name)?;
            println!("Created realm \"{}\" ({})", realm.name, realm.id);
        }

        Commands::Task { action } => match action {
            TaskAction::Add {
                user,
                realm,
                title,
                difficulty,
            } => {
                let task = engine.create_task(user_id(user)?, realm_id(realm)?, title, difficulty)?;
                println!(
                    "Added task \"{}\" ({}, {} XP on completion)",
                    task.title, task.id, task.xp_reward
                );
            }
            TaskAction::Complete { user, realm, task } => {
                let outcome =
                    engine.complete_task(user_id(user)?, realm_id(realm)?, task_id(task)?)?;
                println!(
                    "Completed \"{}\": +{} XP ({} base × {:.1} streak bonus, {}-day streak)",
                    outcome.task.title,
                    outcome.xp_gained,
                    outcome.base_xp,
                    outcome.streak_multiplier,
                    outcome.current_streak,
                );
                if let Some(level_up) = outcome.level_up {
                    println!("Level up! {} → {}", level_up.from, level_up.to);
                }
                for badge in &outcome.new_badges {
                    println!("New badge: {} — {}", badge.name, badge.description);
                }
            }
            TaskAction::Uncomplete { user, realm, task } => {
                let outcome =
                    engine.uncomplete_task(user_id(user)?, realm_id(realm)?, task_id(task)?)?;
                println!(
                    "Reverted \"{}\": -{} XP (level {})",
                    outcome.task.title, outcome.xp_lost, outcome.user_stats.level
                );
            }
        },

        Commands::Quest { action } => match action {
            QuestAction::Add {
                user,
                title,
                description,
                quest_type,
                target,
                reward,
                expires_in_hours,
            } => {
                let quest = engine.create_quest(
                    user_id(user)?,
                    QuestSpec {
                        title,
                        description,
                        quest_type,
                        target,
                        xp_reward: reward,
                        is_custom: quest_type == QuestType::Custom,
                        expires_at: Utc::now() + Duration::hours(expires_in_hours),
                    },
                )?;
                println!(
                    "Added quest \"{}\" ({}, {} XP at {}/{})",
                    quest.title, quest.id, quest.xp_reward, quest.progress, quest.target
                );
            }
            QuestAction::List { user } => {
                let quests = engine.quests(user_id(user)?)?;
                for quest in quests {
                    let state = match quest.state_at(Utc::now()) {
                        realmforge::quest::QuestState::Active => "active",
                        realmforge::quest::QuestState::Completed => "completed",
                        realmforge::quest::QuestState::Claimed => "claimed",
                        realmforge::quest::QuestState::Expired => "expired",
                    };
                    println!(
                        "{}  {}/{}  [{}]  {} ({} XP)",
                        quest.id, quest.progress, quest.target, state, quest.title, quest.xp_reward
                    );
                }
            }
            QuestAction::Claim { user, quest } => {
                let outcome = engine.claim_quest(user_id(user)?, quest_id(quest)?)?;
                println!("Claimed \"{}\": +{} XP", outcome.quest.title, outcome.xp_gained);
                if let Some(level_up) = outcome.level_up {
                    println!("Level up! {} → {}", level_up.from, level_up.to);
                }
            }
        },

        Commands::Stats { user } => {
            let stats = engine.user_stats(user_id(user)?)?;
            print!("{stats}");
        }

        Commands::History { user } => {
            let history = engine.xp_history(user_id(user)?)?;
            println!(
                "{}",
                serde_json::to_string_pretty(&history).into_diagnostic()?
            );
        }

        Commands::Badges { user } => {
            let badges = engine.badges(user_id(user)?)?;
            println!(
                "{}",
                serde_json::to_string_pretty(&badges).into_diagnostic()?
            );
        }
    }

    Ok(())
}

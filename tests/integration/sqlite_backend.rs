//! Integration tests running the bot over the SQLite backend.
//!
//! The same command flows as the in-memory tests, plus persistence across
//! a reopen through [`AnyStore::open`].

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use taskbot::assistant::ConfiguredAssistant;
use taskbot::clock::{Calendar, ManualClock};
use taskbot::confirm::ConfirmationRegistry;
use taskbot::store::{AnyStore, SqliteTaskStore, StorageConfig, TaskStore};
use taskbot::tasks::{Scope, TaskService};
use taskbot::{BotSettings, TaskBot};
use taskbot_proto::task::OwnerId;

fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 2, 12, 0, 0).unwrap()
}

fn make_bot<S: TaskStore>(store: S) -> (Arc<ManualClock>, TaskBot<S, ConfiguredAssistant>) {
    let clock = Arc::new(ManualClock::new(noon()));
    let tasks = TaskService::new(store, clock.clone(), Calendar::utc());
    let bot = TaskBot::new(
        tasks,
        ConfirmationRegistry::new(clock.clone()),
        ConfiguredAssistant::Disabled,
        BotSettings::default(),
    );
    (clock, bot)
}

async fn say<S: TaskStore>(bot: &TaskBot<S, ConfiguredAssistant>, text: &str) -> String {
    bot.handle(&OwnerId::new("alice"), text).await.unwrap()
}

fn scratch_db() -> PathBuf {
    std::env::temp_dir()
        .join(format!("taskbot-it-{}", uuid::Uuid::now_v7()))
        .join("tasks.db")
}

#[tokio::test]
async fn scenario_over_sqlite() {
    let (_clock, bot) = make_bot(SqliteTaskStore::open_in_memory().unwrap());

    say(&bot, "!add Buy milk P1").await;
    say(&bot, "!add Clean desk").await;
    assert_eq!(
        say(&bot, "!list").await,
        "Today's tasks:\n⌛ [0] Buy milk (P1)\n⌛ [1] Clean desk (P4)"
    );
    say(&bot, "!done 0").await;
    assert_eq!(
        say(&bot, "!list").await,
        "Today's tasks:\n⌛ [0] Clean desk (P4)\n✅ [1] Buy milk (P1)"
    );
}

#[tokio::test]
async fn edits_and_deletes_over_sqlite() {
    let (_clock, bot) = make_bot(SqliteTaskStore::open_in_memory().unwrap());
    say(&bot, "!add Draft memo P3").await;
    say(&bot, "!add Book flights P2").await;

    assert_eq!(say(&bot, "!edit 1 P1").await, "✏️ Updated: Draft memo (P1)");
    assert_eq!(say(&bot, "!edit 0 Send memo").await, "✏️ Updated: Send memo (P1)");
    assert_eq!(say(&bot, "!delete 1").await, "🗑️ Deleted: Book flights (P2)");
    assert_eq!(say(&bot, "!list").await, "Today's tasks:\n⌛ [0] Send memo (P1)");
    assert_eq!(say(&bot, "!delete 4").await, "❌ There is no task number 4.");
}

#[tokio::test]
async fn scopes_over_sqlite() {
    let (clock, bot) = make_bot(SqliteTaskStore::open_in_memory().unwrap());
    clock.set(noon() - TimeDelta::days(1));
    say(&bot, "!add Yesterday done").await;
    say(&bot, "!add Yesterday open").await;
    say(&bot, "!done 0").await;
    clock.set(noon());
    say(&bot, "!add Today").await;

    let owner = OwnerId::new("alice");
    let previous = bot.tasks().view(&owner, Scope::Previous).await.unwrap();
    let titles: Vec<_> = previous.iter().map(|e| e.task.title.as_str()).collect();
    assert_eq!(titles, ["Yesterday open", "Yesterday done"]);

    assert_eq!(
        say(&bot, "!list").await,
        "Today's tasks:\n⌛ [0] Yesterday open (P4)\n⌛ [1] Today (P4)"
    );
    assert_eq!(say(&bot, "!reset").await, "✅ Deleted 1 task added today.");
}

#[tokio::test]
async fn tasks_survive_a_reopen() {
    let path = scratch_db();
    let config = StorageConfig::Sqlite(path.clone());

    {
        let (_clock, bot) = make_bot(AnyStore::open(&config).unwrap());
        say(&bot, "!add Persist me P2").await;
        bot.handle(&OwnerId::new("bob"), "!add Bob's too").await;
    }

    let (_clock, bot) = make_bot(AnyStore::open(&config).unwrap());
    assert_eq!(say(&bot, "!list").await, "Today's tasks:\n⌛ [0] Persist me (P2)");
    assert_eq!(
        bot.tasks().owners().await.unwrap(),
        [OwnerId::new("alice"), OwnerId::new("bob")]
    );

    say(&bot, "!reset all").await;
    assert_eq!(say(&bot, "!confirm reset").await, "✅ Deleted all 1 task.");

    if let Some(dir) = path.parent() {
        let _ = std::fs::remove_dir_all(dir);
    }
}

//! Integration tests for the two-step `reset all` / `confirm reset` flow.
//!
//! Time is driven by a [`ManualClock`] so the ten-minute window can be
//! crossed without sleeping.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use taskbot::assistant::ConfiguredAssistant;
use taskbot::clock::{Calendar, ManualClock};
use taskbot::confirm::ConfirmationRegistry;
use taskbot::store::MemoryTaskStore;
use taskbot::tasks::TaskService;
use taskbot::{BotSettings, ErrorKind, TaskBot};
use taskbot_proto::command::Command;
use taskbot_proto::task::OwnerId;

type Bot = TaskBot<MemoryTaskStore, ConfiguredAssistant>;

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 2, 18, 0, 0).unwrap()
}

fn make_bot(settings: BotSettings) -> (Arc<ManualClock>, Bot) {
    let clock = Arc::new(ManualClock::new(start()));
    let tasks = TaskService::new(MemoryTaskStore::new(), clock.clone(), Calendar::utc());
    let bot = TaskBot::new(
        tasks,
        ConfirmationRegistry::new(clock.clone()),
        ConfiguredAssistant::Disabled,
        settings,
    );
    (clock, bot)
}

async fn say(bot: &Bot, owner: &str, text: &str) -> String {
    bot.handle(&OwnerId::new(owner), text).await.unwrap()
}

async fn stored(bot: &Bot) -> usize {
    bot.tasks().store().len().await
}

/// Adds one task today and one three days ago, so a full reset has
/// something a today-only reset would miss.
async fn seed(clock: &ManualClock, bot: &Bot, owner: &str) {
    clock.set(start() - TimeDelta::days(3));
    say(bot, owner, "!add Old task").await;
    clock.set(start());
    say(bot, owner, "!add New task").await;
}

#[tokio::test]
async fn confirm_within_window_deletes_everything() {
    let (clock, bot) = make_bot(BotSettings::default());
    seed(&clock, &bot, "alice").await;

    let armed = say(&bot, "alice", "!reset all").await;
    assert!(armed.contains("within 10 minutes"), "{armed}");
    assert_eq!(stored(&bot).await, 2);

    clock.advance(TimeDelta::minutes(9));
    assert_eq!(say(&bot, "alice", "!confirm reset").await, "✅ Deleted all 2 tasks.");
    assert_eq!(stored(&bot).await, 0);
}

#[tokio::test]
async fn confirmation_is_single_use() {
    let (clock, bot) = make_bot(BotSettings::default());
    seed(&clock, &bot, "alice").await;

    say(&bot, "alice", "!reset all").await;
    say(&bot, "alice", "!confirm reset").await;
    say(&bot, "alice", "!add After reset").await;

    let again = say(&bot, "alice", "!confirm reset").await;
    assert!(again.contains("expired"), "{again}");
    assert_eq!(stored(&bot).await, 1);
}

#[tokio::test]
async fn confirm_after_window_deletes_nothing() {
    let (clock, bot) = make_bot(BotSettings::default());
    seed(&clock, &bot, "alice").await;

    say(&bot, "alice", "!reset all").await;
    clock.advance(TimeDelta::minutes(10) + TimeDelta::seconds(1));

    let err = bot
        .execute(&OwnerId::new("alice"), Command::Confirm)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfirmationExpired);
    assert_eq!(err.op(), "ConfirmReset");
    assert_eq!(stored(&bot).await, 2);
    assert!(!bot.confirmations().is_armed(&OwnerId::new("alice")));
}

#[tokio::test]
async fn confirm_exactly_at_expiry_still_counts() {
    let (clock, bot) = make_bot(BotSettings::default());
    seed(&clock, &bot, "alice").await;

    say(&bot, "alice", "!reset all").await;
    clock.advance(TimeDelta::minutes(10));
    assert_eq!(say(&bot, "alice", "!confirm reset").await, "✅ Deleted all 2 tasks.");
}

#[tokio::test]
async fn confirm_without_request_is_expired() {
    let (clock, bot) = make_bot(BotSettings::default());
    seed(&clock, &bot, "alice").await;

    let reply = say(&bot, "alice", "!confirm reset").await;
    assert!(reply.starts_with("⚠️ The '!reset all' confirmation has expired"), "{reply}");
    assert_eq!(stored(&bot).await, 2);
}

#[tokio::test]
async fn rearming_restarts_the_window() {
    let (clock, bot) = make_bot(BotSettings::default());
    seed(&clock, &bot, "alice").await;

    say(&bot, "alice", "!reset all").await;
    clock.advance(TimeDelta::minutes(8));
    say(&bot, "alice", "!reset all").await;
    clock.advance(TimeDelta::minutes(8));

    assert_eq!(say(&bot, "alice", "!confirm reset").await, "✅ Deleted all 2 tasks.");
}

#[tokio::test]
async fn expired_request_can_be_made_again() {
    let (clock, bot) = make_bot(BotSettings::default());
    seed(&clock, &bot, "alice").await;

    say(&bot, "alice", "!reset all").await;
    clock.advance(TimeDelta::hours(1));
    assert!(say(&bot, "alice", "!confirm reset").await.contains("expired"));

    say(&bot, "alice", "!reset all").await;
    assert_eq!(say(&bot, "alice", "!confirm reset").await, "✅ Deleted all 2 tasks.");
}

#[tokio::test]
async fn confirmation_belongs_to_one_owner() {
    let (clock, bot) = make_bot(BotSettings::default());
    seed(&clock, &bot, "alice").await;
    seed(&clock, &bot, "bob").await;

    say(&bot, "alice", "!reset all").await;
    assert!(say(&bot, "bob", "!confirm reset").await.contains("expired"));
    assert_eq!(stored(&bot).await, 4);

    assert_eq!(say(&bot, "alice", "!confirm reset").await, "✅ Deleted all 2 tasks.");
    assert_eq!(
        say(&bot, "bob", "!list").await,
        "Today's tasks:\n⌛ [0] Old task (P4)\n⌛ [1] New task (P4)"
    );
}

#[tokio::test]
async fn configured_window_is_honored() {
    let (clock, bot) = make_bot(BotSettings {
        confirmation_window: Duration::from_secs(30),
        ..BotSettings::default()
    });
    seed(&clock, &bot, "alice").await;

    let armed = say(&bot, "alice", "!reset all").await;
    assert!(armed.contains("within 30 seconds"), "{armed}");
    clock.advance(TimeDelta::seconds(31));
    assert!(say(&bot, "alice", "!confirm reset").await.contains("expired"));
    assert_eq!(stored(&bot).await, 2);
}

#[tokio::test]
async fn reset_all_takes_no_arguments() {
    let (_clock, bot) = make_bot(BotSettings::default());
    let reply = say(&bot, "alice", "!reset all now").await;
    assert_eq!(reply, "⚠️ !reset all takes no arguments");
    assert!(!bot.confirmations().is_armed(&OwnerId::new("alice")));
}

//! Integration tests for the assistant-backed flows: `!chat` and the daily
//! reminder round.
//!
//! A scripted assistant records every prompt so the tests can check what
//! task context reached it.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use taskbot::assistant::{Assistant, AssistantError};
use taskbot::clock::{Calendar, ManualClock};
use taskbot::confirm::ConfirmationRegistry;
use taskbot::reminder::deliver_reminders;
use taskbot::sink::ChannelSink;
use taskbot::store::MemoryTaskStore;
use taskbot::tasks::TaskService;
use taskbot::{BotSettings, TaskBot};
use taskbot_proto::task::OwnerId;

// ---------------------------------------------------------------------------
// Scripted assistant
// ---------------------------------------------------------------------------

/// Answers every prompt with a fixed reply, failing when the prompt
/// contains `fail_on`.
#[derive(Default)]
struct ScriptedAssistant {
    reply: String,
    fail_on: Option<String>,
    delay: Option<Duration>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedAssistant {
    fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            ..Self::default()
        }
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Assistant for ScriptedAssistant {
    async fn complete(&self, prompt: &str) -> Result<String, AssistantError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.fail_on {
            Some(marker) if prompt.contains(marker.as_str()) => Err(AssistantError::Api {
                status: 503,
                body: "overloaded".to_string(),
            }),
            _ => Ok(self.reply.clone()),
        }
    }
}

type Bot = TaskBot<MemoryTaskStore, ScriptedAssistant>;

fn morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 2, 7, 0, 0).unwrap()
}

fn make_bot(assistant: ScriptedAssistant, settings: BotSettings) -> (Arc<ManualClock>, Bot) {
    let clock = Arc::new(ManualClock::new(morning()));
    let tasks = TaskService::new(MemoryTaskStore::new(), clock.clone(), Calendar::utc());
    let bot = TaskBot::new(
        tasks,
        ConfirmationRegistry::new(clock.clone()),
        assistant,
        settings,
    );
    (clock, bot)
}

async fn say(bot: &Bot, owner: &str, text: &str) -> String {
    bot.handle(&OwnerId::new(owner), text).await.unwrap()
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

#[tokio::test]
async fn chat_prompt_carries_task_context() {
    let (clock, bot) = make_bot(
        ScriptedAssistant::replying("Start with the report."),
        BotSettings::default(),
    );
    clock.set(morning() - TimeDelta::days(2));
    say(&bot, "alice", "!add Old errand").await;
    say(&bot, "alice", "!add Old finished").await;
    say(&bot, "alice", "!done 1").await;
    clock.set(morning());
    say(&bot, "alice", "!add Write report P1").await;
    say(&bot, "alice", "!add Stretch").await;
    say(&bot, "alice", "!done 2").await; // Stretch

    let reply = say(&bot, "alice", "!chat What should I do first?").await;
    assert_eq!(reply, "Start with the report.");

    let prompts = bot.assistant().prompts();
    assert_eq!(prompts.len(), 1);
    let prompt = &prompts[0];
    assert!(prompt.contains("[Pending tasks]\n- Old errand\n- Write report\n"), "{prompt}");
    assert!(prompt.contains("[Recently completed tasks]\n- Stretch\n"), "{prompt}");
    assert!(!prompt.contains("Old finished"), "{prompt}");
    assert!(prompt.contains("[Question]\nWhat should I do first?"), "{prompt}");
}

#[tokio::test]
async fn chat_without_tasks_uses_placeholders() {
    let (_clock, bot) = make_bot(ScriptedAssistant::replying("Rest up."), BotSettings::default());
    say(&bot, "alice", "!chat Any advice?").await;
    let prompt = &bot.assistant().prompts()[0];
    assert!(prompt.contains("(no pending tasks)"));
    assert!(prompt.contains("(no completed tasks)"));
}

#[tokio::test]
async fn chat_failure_replies_with_apology() {
    let assistant = ScriptedAssistant {
        fail_on: Some("[Question]".to_string()),
        ..ScriptedAssistant::replying("never")
    };
    let (_clock, bot) = make_bot(assistant, BotSettings::default());
    assert_eq!(
        say(&bot, "alice", "!chat hello").await,
        "❌ Something went wrong. Please try again later."
    );
}

#[tokio::test(start_paused = true)]
async fn slow_assistant_times_out() {
    let assistant = ScriptedAssistant {
        delay: Some(Duration::from_secs(120)),
        ..ScriptedAssistant::replying("too late")
    };
    let settings = BotSettings {
        assistant_timeout: Duration::from_secs(5),
        ..BotSettings::default()
    };
    let (_clock, bot) = make_bot(assistant, settings);
    assert_eq!(
        say(&bot, "alice", "!chat are you there?").await,
        "❌ Something went wrong. Please try again later."
    );
}

#[tokio::test]
async fn empty_chat_is_rejected_before_the_assistant() {
    let (_clock, bot) = make_bot(ScriptedAssistant::replying("unused"), BotSettings::default());
    assert_eq!(say(&bot, "alice", "!chat   ").await, "⚠️ write a message after !chat");
    assert!(bot.assistant().prompts().is_empty());
}

// ---------------------------------------------------------------------------
// Daily reminder
// ---------------------------------------------------------------------------

/// Seeds yesterday's tasks for three owners, then moves to this morning.
async fn seed_yesterday(clock: &ManualClock, bot: &Bot) {
    clock.set(morning() - TimeDelta::days(1));
    say(bot, "alice", "!add Gym").await;
    say(bot, "alice", "!add Taxes P1").await;
    say(bot, "alice", "!done 1").await; // Gym
    say(bot, "bob", "!add Call plumber").await;
    say(bot, "carol", "!add Carol's chore").await;
    clock.set(morning());
}

#[tokio::test]
async fn reminder_prompt_uses_yesterdays_view() {
    let (clock, bot) = make_bot(ScriptedAssistant::replying("Good morning!"), BotSettings::default());
    seed_yesterday(&clock, &bot).await;
    say(&bot, "alice", "!add Added today").await;

    let reminder = bot.reminder_for(&OwnerId::new("alice")).await.unwrap();
    assert_eq!(reminder.text, "Good morning!");
    assert_eq!(reminder.destination, "alice");

    let prompt = bot.assistant().prompts().pop().unwrap();
    assert!(prompt.contains("Completed:\n- Gym\n"), "{prompt}");
    assert!(prompt.contains("Unfinished:\n- Taxes\n"), "{prompt}");
    assert!(!prompt.contains("Added today"), "{prompt}");
}

#[tokio::test]
async fn reminders_reach_every_owner() {
    let (clock, bot) = make_bot(ScriptedAssistant::replying("You got this."), BotSettings::default());
    seed_yesterday(&clock, &bot).await;

    let (sink, mut rx) = ChannelSink::pair();
    assert_eq!(deliver_reminders(&bot, &sink).await, 3);

    let mut destinations = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        assert_eq!(msg.text, "You got this.");
        destinations.push(msg.destination);
    }
    destinations.sort();
    assert_eq!(destinations, ["alice", "bob", "carol"]);
}

#[tokio::test]
async fn one_failing_owner_does_not_stop_the_others() {
    let assistant = ScriptedAssistant {
        fail_on: Some("Carol's chore".to_string()),
        ..ScriptedAssistant::replying("Keep going.")
    };
    let (clock, bot) = make_bot(assistant, BotSettings::default());
    seed_yesterday(&clock, &bot).await;

    let reminders = bot.daily_reminders().await;
    let mut owners: Vec<_> = reminders.iter().map(|r| r.owner.as_str().to_string()).collect();
    owners.sort();
    assert_eq!(owners, ["alice", "bob"]);
    assert_eq!(bot.assistant().prompts().len(), 3);
}

#[tokio::test]
async fn owner_without_yesterday_tasks_still_gets_a_reminder() {
    let (clock, bot) = make_bot(ScriptedAssistant::replying("Fresh start."), BotSettings::default());
    clock.set(morning() - TimeDelta::days(5));
    say(&bot, "dave", "!add Ancient task").await;
    clock.set(morning());

    let reminders = bot.daily_reminders().await;
    assert_eq!(reminders.len(), 1);
    let prompt = &bot.assistant().prompts()[0];
    assert!(prompt.contains("Completed:\n(no completed tasks)\n"), "{prompt}");
    assert!(prompt.contains("Unfinished:\n(no pending tasks)\n"), "{prompt}");
}

#[tokio::test]
async fn no_owners_means_no_reminders() {
    let (_clock, bot) = make_bot(ScriptedAssistant::replying("unused"), BotSettings::default());
    let (sink, _rx) = ChannelSink::pair();
    assert_eq!(deliver_reminders(&bot, &sink).await, 0);
    assert!(bot.assistant().prompts().is_empty());
}

#[tokio::test]
async fn closed_sink_counts_as_undelivered() {
    let (clock, bot) = make_bot(ScriptedAssistant::replying("Hi."), BotSettings::default());
    seed_yesterday(&clock, &bot).await;
    let (sink, rx) = ChannelSink::pair();
    drop(rx);
    assert_eq!(deliver_reminders(&bot, &sink).await, 0);
}

//! Prompt text sent to the assistant.

use std::fmt::Write as _;

use taskbot_proto::task::Task;

use crate::tasks::ProjectedView;

const NONE_PENDING: &str = "(no pending tasks)";
const NONE_COMPLETED: &str = "(no completed tasks)";

fn push_titles<'a>(out: &mut String, titles: impl IntoIterator<Item = &'a str>, empty: &str) {
    let mut any = false;
    for title in titles {
        any = true;
        let _ = writeln!(out, "- {title}");
    }
    if !any {
        let _ = writeln!(out, "{empty}");
    }
}

/// Prompt for `!chat`: coach persona, the owner's task state, their question.
#[must_use]
pub fn chat_prompt(pending: &[Task], completed: &[Task], question: &str) -> String {
    let mut out = String::from("You are a coach who helps people manage themselves.\n\n");
    out.push_str("[Pending tasks]\n");
    push_titles(&mut out, pending.iter().map(|t| t.title.as_str()), NONE_PENDING);
    out.push_str("\n[Recently completed tasks]\n");
    push_titles(&mut out, completed.iter().map(|t| t.title.as_str()), NONE_COMPLETED);
    out.push_str("\n[Question]\n");
    out.push_str(question);
    out.push_str("\n\nGive advice based on the above.");
    out
}

/// Prompt for the daily reminder, built from yesterday's view.
#[must_use]
pub fn reminder_prompt(yesterday: &ProjectedView) -> String {
    let mut out = String::from(
        "You are a professional coach who helps people manage themselves.\n\
         Based on how yesterday's tasks went, give positive and practical advice \
         so the user can start today on a good note.\n\
         Follow these rules:\n\
         - Briefly and positively acknowledge what was finished yesterday, if anything\n\
         - If tasks were left unfinished, suggest how to pick them up today\n\
         - Give one to three pieces of advice, simple and actionable\n\n",
    );
    out.push_str("[Yesterday's tasks]\n");
    out.push_str("Completed:\n");
    push_titles(
        &mut out,
        yesterday.completed().map(|e| e.task.title.as_str()),
        NONE_COMPLETED,
    );
    out.push_str("Unfinished:\n");
    push_titles(
        &mut out,
        yesterday.pending().map(|e| e.task.title.as_str()),
        NONE_PENDING,
    );
    out.push_str("\nWrite a message that helps the user start today positively.\n");
    out
}

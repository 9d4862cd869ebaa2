//! Telegram bot commands: parsing, execution and queue presentation.
//!
//! This is the only layer that turns [`QueueError`] kinds into user text.

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::core::{EstimateTracker, QueueState};
use crate::daemon::Daemon;
use crate::directory::{display_name, Directory};
use crate::error::QueueError;
use crate::listeners::format_duration;

pub const HELP_TEXT: &str = r#"TurnQueue Commands:

/add - Join the queue
/del - Leave the queue
/kick <id> - Remove someone else from the queue
/pop - Remove whoever holds the turn
/clear - Empty the queue
/pass - Hand your turn to the next person
/ack - Confirm you are using your turn
/show - Show the queue and your expected wait
/help - Show this help"#;

const SOMETHING_WENT_WRONG: &str = "Something went wrong, please try again later.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueCommand {
    Add,
    Del,
    Kick(String),
    Pop,
    Clear,
    Pass,
    Ack,
    Show,
    Help,
    Usage(&'static str),
    Unknown(String),
}

/// Parse a slash command. Plain chat text yields `None`.
///
/// Accepts the `/cmd@botname` form Telegram uses in group chats.
pub fn parse_command(text: &str) -> Option<QueueCommand> {
    let mut parts = text.split_whitespace();
    let head = parts.next()?.strip_prefix('/')?;
    let name = head.split('@').next().unwrap_or(head).to_lowercase();

    let command = match name.as_str() {
        "add" => QueueCommand::Add,
        "del" => QueueCommand::Del,
        "kick" => match parts.next() {
            Some(id) => QueueCommand::Kick(id.to_string()),
            None => QueueCommand::Usage("Usage: /kick <id>"),
        },
        "pop" => QueueCommand::Pop,
        "clear" => QueueCommand::Clear,
        "pass" => QueueCommand::Pass,
        "ack" => QueueCommand::Ack,
        "show" => QueueCommand::Show,
        "help" | "start" => QueueCommand::Help,
        _ => QueueCommand::Unknown(name),
    };
    Some(command)
}

/// Run `command` on behalf of `sender` and return the reply text.
pub async fn execute(daemon: &Daemon, sender: &str, command: QueueCommand) -> String {
    let queue = &daemon.orchestrator;
    let directory = daemon.directory.as_ref();

    let outcome = match command {
        QueueCommand::Add => queue
            .add(sender)
            .await
            .map(|_| "Added to the queue.".to_string()),
        QueueCommand::Del => queue
            .remove_by_id(sender, sender)
            .await
            .map(|_| "Removed from the queue.".to_string()),
        QueueCommand::Kick(id) => queue
            .remove_by_id(&id, sender)
            .await
            .map(|_| format!("Removed {} from the queue.", display_name(directory, &id))),
        QueueCommand::Pop => queue.pop_head(sender).await.map(|popped| {
            format!(
                "Removed {} from the head of the queue.",
                display_name(directory, &popped)
            )
        }),
        QueueCommand::Clear => queue
            .clear_all(sender)
            .await
            .map(|removed| format!("Queue cleared, {} removed.", removed.len())),
        QueueCommand::Pass => queue
            .pass_turn(sender)
            .await
            .map(|_| "You passed your turn to the next person.".to_string()),
        QueueCommand::Ack => queue
            .acknowledge(sender)
            .await
            .map(|_| "Got it, the turn is yours.".to_string()),
        QueueCommand::Show => Ok(String::new()),
        QueueCommand::Help => return HELP_TEXT.to_string(),
        QueueCommand::Usage(usage) => return usage.to_string(),
        QueueCommand::Unknown(name) => {
            tracing::debug!("Unknown command /{} from {}", name, sender);
            return format!("Unknown command /{}. /help for available commands.", name);
        }
    };

    let headline = match outcome {
        Ok(text) => text,
        Err(e) => match rejection_text(&e) {
            Some(text) => text.to_string(),
            None => {
                tracing::error!("Command from {} failed: {}", sender, e);
                return SOMETHING_WENT_WRONG.to_string();
            }
        },
    };

    let rendered = match queue.snapshot().await {
        Ok(state) => render_queue(
            &state,
            directory,
            &daemon.tracker,
            sender,
            daemon.clock.now(),
        ),
        Err(e) => {
            tracing::error!("Failed to read the queue for {}: {}", sender, e);
            return SOMETHING_WENT_WRONG.to_string();
        }
    };

    if headline.is_empty() {
        rendered
    } else {
        format!("{}\n\n{}", headline, rendered)
    }
}

/// User text for an expected rejection. `None` for persistence failures.
fn rejection_text(error: &QueueError) -> Option<&'static str> {
    if !error.is_rejection() {
        return None;
    }
    Some(match error {
        QueueError::AlreadyPresent => "You are already in the queue.",
        QueueError::NotPresent => "That participant is not in the queue.",
        QueueError::QueueEmpty => "The queue is already empty.",
        QueueError::NotHolder => "It is not your turn.",
        QueueError::NoOneToPassTo => "There is no one to pass the turn to.",
        QueueError::NotSleeping => "Your turn is already acknowledged.",
        QueueError::StoreUnavailable(_) => return None,
    })
}

/// Numbered queue listing. Marks the holder's hold time and sleeping state
/// and appends the viewer's expected wait.
pub fn render_queue(
    state: &QueueState,
    directory: &dyn Directory,
    tracker: &EstimateTracker,
    viewer: &str,
    now: DateTime<Utc>,
) -> String {
    if state.is_empty() {
        return "The queue is empty.".to_string();
    }

    let mut out = String::from("Queue:\n");
    for (position, id) in state.entries.iter().enumerate() {
        out.push_str(&format!("{}. {}", position + 1, display_name(directory, id)));
        if position == 0 {
            if let Some(held) = state
                .hold_started_at
                .and_then(|start| (now - start).to_std().ok())
            {
                out.push_str(&format!(", holding for {}", format_duration(held)));
            }
            if state.holder_sleeping {
                out.push_str(" (waiting for /ack)");
            }
        }
        if id == viewer {
            out.push_str(" <- you");
        }
        out.push('\n');
    }

    if let Some(wait) = viewer_wait(state, tracker, viewer, now) {
        out.push_str(&format!("\nYour estimated wait: ~{}", format_duration(wait)));
        let done_at = chrono::Duration::from_std(wait)
            .ok()
            .and_then(|wait| now.checked_add_signed(wait));
        if let Some(done_at) = done_at {
            out.push_str(&format!(" (around {} UTC)", done_at.format("%a %b %-d %H:%M")));
        }
    }
    out.trim_end().to_string()
}

fn viewer_wait(
    state: &QueueState,
    tracker: &EstimateTracker,
    viewer: &str,
    now: DateTime<Utc>,
) -> Option<Duration> {
    let ahead = state.position_of(viewer).filter(|&p| p > 0)?;
    let estimate = match tracker.current() {
        Ok(estimate) => estimate,
        Err(e) => {
            tracing::warn!("Failed to read the estimate: {}", e);
            return None;
        }
    };
    if estimate.sample_count == 0 {
        return None;
    }
    let wait = estimate.predict_wait_time(ahead, state.hold_started_at, now);
    (!wait.is_zero()).then_some(wait)
}

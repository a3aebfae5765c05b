use mentor_core::OutboundMessage;
use mentor_store::types::{TodoReminderRow, User};

use crate::context::JobContext;
use crate::error::Result;
use crate::types::Outcome;

const EVENING_PROMPT: &str = "🌙 The day is winding down. Take five minutes \
to look over what's left and sketch tomorrow's plan.";

/// 20:00 planning-for-tomorrow nudge.
pub async fn run_evening(ctx: &JobContext, user: &User) -> Result<Outcome> {
    ctx.sink
        .send(&OutboundMessage::text(user.chat_id, EVENING_PROMPT))
        .await?;
    Ok(Outcome::Sent)
}

/// Per-artifact todo reminder. The engine has already applied the due-date
/// guard for non-daily todos; this just composes and sends.
pub async fn run_reminder(ctx: &JobContext, row: &TodoReminderRow) -> Result<Outcome> {
    let todo = &row.todo;
    let body = if todo.is_daily {
        format!("⏰ Daily task: {} ({} priority)", todo.title, todo.priority)
    } else {
        format!(
            "⏰ Due today: {} ({} priority, {})",
            todo.title, todo.priority, todo.due_date
        )
    };
    ctx.sink
        .send(&OutboundMessage::text(row.user.chat_id, body))
        .await?;
    Ok(Outcome::Sent)
}

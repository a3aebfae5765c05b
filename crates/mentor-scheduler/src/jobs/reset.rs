use chrono::NaiveDate;
use tracing::debug;

use mentor_store::types::User;

use crate::context::JobContext;
use crate::error::Result;
use crate::materialize;
use crate::types::Outcome;

const TASK_TITLE_SYSTEM: &str = "You turn a long-term goal into one concrete \
task for today. Reply with a single short imperative line, nothing else.";

/// 06:00 daily reset: clear completion on daily todos (re-dating stale ones),
/// regenerate goal-derived daily tasks, materialize nutrition todos.
///
/// Always on — no preference flag guards it. The goal-task titles come from
/// the LLM with a deterministic fallback, so a dead model never blocks the
/// reset.
pub async fn run(ctx: &JobContext, user: &User, today: NaiveDate) -> Result<Outcome> {
    let reset_count = { ctx.store.session().reset_daily_todos(&user.id, today)? };
    if reset_count > 0 {
        debug!(user_id = %user.id, reset_count, "daily todos reset");
    }

    // Load goals in a scoped session, then resolve titles — the LLM await
    // must not happen while the session is held.
    let goals = { ctx.store.session().active_goals(&user.id)? };
    for goal in goals {
        let fallback = materialize::fallback_goal_task_title(&goal.title);
        let prompt = format!("Goal: {}", goal.title);
        let raw = ctx
            .llm
            .complete_or(TASK_TITLE_SYSTEM, &prompt, 64, &fallback)
            .await;
        let title = sanitize_title(&raw, &fallback);
        materialize::goal_task(ctx, user, today, &title)?;
    }

    materialize::nutrition_todos(ctx, user, today)?;
    Ok(Outcome::Sent)
}

/// Model output can be chatty; keep the first non-empty line, bounded.
fn sanitize_title(raw: &str, fallback: &str) -> String {
    let line = raw
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or(fallback)
        .trim_matches('"');
    let title: String = line.chars().take(100).collect();
    if title.is_empty() {
        fallback.to_string()
    } else {
        title
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_keeps_first_line_and_strips_quotes() {
        assert_eq!(
            sanitize_title("\"Run intervals for 30 minutes\"\nExtra prose.", "fb"),
            "Run intervals for 30 minutes"
        );
        assert_eq!(sanitize_title("\n\n  ", "fb"), "fb");
        let long = "y".repeat(150);
        assert_eq!(sanitize_title(&long, "fb").chars().count(), 100);
    }
}

//! Materializers — derive todo rows from upstream artifacts.
//!
//! Idempotency is enforced by pre-insert existence probes, not unique
//! constraints: each insert first checks for a marker (obligations) or an
//! identical title (goal tasks, nutrition todos) on the same local day, so
//! repeated invocation within a day is safe.

use chrono::{Datelike, Duration, NaiveDate};
use tracing::debug;

use mentor_core::types::{ClockTime, Priority};
use mentor_store::types::{Direction, NewTodo, NutritionReminder, User};

use crate::context::JobContext;
use crate::error::Result;

/// Default nutrition fire times, used when the settings row leaves the
/// corresponding column null.
pub const DEFAULT_SHOPPING_TIME: ClockTime = ClockTime::new(16, 0);
pub const DEFAULT_COOKING_TIME: ClockTime = ClockTime::new(18, 0);

pub const COOKING_TODO_TITLE: &str = "Cook today's meals";
pub const SHOPPING_TODO_TITLE: &str = "Buy groceries for tomorrow's cooking";

/// Finance-obligation → todo: one high-priority todo per active obligation
/// with `due_date == today`, keyed by the obligation marker embedded in the
/// description. Returns the number of todos inserted.
pub fn finance_todos(ctx: &JobContext, user: &User, today: NaiveDate) -> Result<usize> {
    let session = ctx.store.session();
    let obligations = session.active_obligations(&user.id)?;

    let mut created = 0;
    for obligation in obligations.iter().filter(|o| o.due_date == today) {
        let marker = obligation.marker();
        if session.todo_marker_exists(&user.id, today, &marker)? {
            continue;
        }
        let title = match obligation.direction {
            Direction::Receive => {
                format!("Collect {:.2} from {}", obligation.amount, obligation.party)
            }
            Direction::Pay => format!("Repay {:.2} to {}", obligation.amount, obligation.party),
        };
        session.insert_todo(&NewTodo {
            user_id: user.id.clone(),
            title,
            description: Some(format!("Payment due today {marker}")),
            due_date: today,
            priority: Priority::High,
            is_daily: false,
            reminder_time: None,
            is_reminder_active: false,
        })?;
        created += 1;
    }

    if created > 0 {
        debug!(user_id = %user.id, created, "materialized finance todos");
    }
    Ok(created)
}

/// Fallback title when the LLM can't produce one for a goal task.
pub fn fallback_goal_task_title(goal_title: &str) -> String {
    let truncated: String = goal_title.chars().take(50).collect();
    format!("work on goal: {truncated}")
}

/// Goal → daily goal-task. Skips creation when a task with the identical
/// title already exists today. Returns true iff a row was inserted.
pub fn goal_task(ctx: &JobContext, user: &User, today: NaiveDate, title: &str) -> Result<bool> {
    let session = ctx.store.session();
    if session.todo_titled_exists(&user.id, today, title)? {
        return Ok(false);
    }
    session.insert_todo(&NewTodo {
        user_id: user.id.clone(),
        title: title.to_string(),
        description: None,
        due_date: today,
        priority: Priority::High,
        is_daily: true,
        reminder_time: None,
        is_reminder_active: false,
    })?;
    Ok(true)
}

/// Nutrition → todos for `today`: a high-priority cooking todo when today is
/// a cooking day, a medium-priority shopping todo when tomorrow is. Both
/// carry the reminder time propagated from the settings. Returns the number
/// of todos inserted.
pub fn nutrition_todos(ctx: &JobContext, user: &User, today: NaiveDate) -> Result<usize> {
    let session = ctx.store.session();
    let Some(settings) = session.nutrition_for(&user.id)? else {
        return Ok(0);
    };

    let mut created = 0;

    if settings.cooking_days.contains(today.weekday())
        && !session.todo_titled_exists(&user.id, today, COOKING_TODO_TITLE)?
    {
        session.insert_todo(&NewTodo {
            user_id: user.id.clone(),
            title: COOKING_TODO_TITLE.to_string(),
            description: None,
            due_date: today,
            priority: Priority::High,
            is_daily: false,
            reminder_time: Some(cooking_time(&settings).to_string()),
            is_reminder_active: true,
        })?;
        created += 1;
    }

    let tomorrow = today + Duration::days(1);
    if settings.cooking_days.contains(tomorrow.weekday())
        && !session.todo_titled_exists(&user.id, today, SHOPPING_TODO_TITLE)?
    {
        session.insert_todo(&NewTodo {
            user_id: user.id.clone(),
            title: SHOPPING_TODO_TITLE.to_string(),
            description: None,
            due_date: today,
            priority: Priority::Medium,
            is_daily: false,
            reminder_time: Some(shopping_time(&settings).to_string()),
            is_reminder_active: true,
        })?;
        created += 1;
    }

    Ok(created)
}

/// The cooking reminder's fire time for a settings row.
pub fn cooking_time(settings: &NutritionReminder) -> ClockTime {
    settings
        .cooking_time
        .as_deref()
        .and_then(|t| t.parse().ok())
        .unwrap_or(DEFAULT_COOKING_TIME)
}

/// The shopping reminder's fire time for a settings row.
pub fn shopping_time(settings: &NutritionReminder) -> ClockTime {
    settings
        .shopping_reminder_time
        .as_deref()
        .and_then(|t| t.parse().ok())
        .unwrap_or(DEFAULT_SHOPPING_TIME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_title_truncates_long_goals() {
        let long = "x".repeat(80);
        let title = fallback_goal_task_title(&long);
        assert_eq!(title, format!("work on goal: {}", "x".repeat(50)));
        assert_eq!(fallback_goal_task_title("run 10k"), "work on goal: run 10k");
    }
}

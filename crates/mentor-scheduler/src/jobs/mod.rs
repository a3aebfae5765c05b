//! Per-feature reminder handlers.
//!
//! Uniform contract: a handler receives the user (and for per-artifact jobs
//! the artifact row), composes its messages, calls the sink, and returns
//! [`Outcome::Sent`] only when every required outbound send succeeded. Store
//! sessions are scoped — never held across sink or LLM awaits.

pub mod finance;
pub mod goals;
pub mod health;
pub mod motivation;
pub mod nutrition;
pub mod principle;
pub mod reset;
pub mod todos;

use chrono::NaiveDateTime;
use tracing::warn;

use mentor_store::types::User;

use crate::context::JobContext;
use crate::error::Result;
use crate::types::{JobKind, Outcome};

/// Dispatch one per-user job for one user. The per-artifact kinds and the
/// nutrition pair have dedicated paths in the engine and never reach here.
pub async fn dispatch_per_user(
    ctx: &JobContext,
    kind: JobKind,
    user: &User,
    local: NaiveDateTime,
) -> Result<Outcome> {
    match kind {
        JobKind::DailyPrinciple => principle::run(ctx, user).await,
        JobKind::DailyMotivation => motivation::run(ctx, user).await,
        JobKind::HealthDaily => health::run(ctx, user).await,
        JobKind::TodoEvening => todos::run_evening(ctx, user).await,
        JobKind::FinanceTodoCreation => finance::run_todo_creation(ctx, user, local.date()).await,
        JobKind::DailyTasksReset => reset::run(ctx, user, local.date()).await,
        JobKind::FinanceReminders => finance::run_reminders(ctx, user, local.date()).await,
        other => {
            warn!(kind = %other, "kind routed to per-user dispatch by mistake");
            Ok(Outcome::Skipped)
        }
    }
}

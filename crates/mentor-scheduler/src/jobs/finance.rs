use chrono::{Duration, NaiveDate};

use mentor_core::OutboundMessage;
use mentor_store::types::{Direction, Obligation, User};

use crate::context::JobContext;
use crate::error::Result;
use crate::materialize;
use crate::types::Outcome;

/// "Upcoming" spans today through three days out, inclusive.
pub const UPCOMING_WINDOW_DAYS: i64 = 3;

/// 06:00 materializer: one high-priority todo per obligation due today.
/// No outbound message; success means the derived writes landed.
pub async fn run_todo_creation(ctx: &JobContext, user: &User, today: NaiveDate) -> Result<Outcome> {
    materialize::finance_todos(ctx, user, today)?;
    Ok(Outcome::Sent)
}

/// 09:00 aggregated report of overdue and upcoming obligations, both
/// directions, in a single message.
pub async fn run_reminders(ctx: &JobContext, user: &User, today: NaiveDate) -> Result<Outcome> {
    let obligations = { ctx.store.session().active_obligations(&user.id)? };
    let body = build_report(&obligations, today);
    ctx.sink
        .send(&OutboundMessage::text(user.chat_id, body))
        .await?;
    Ok(Outcome::Sent)
}

/// Compose the four-section report. Overdue entries never repeat in the
/// upcoming sections; when everything is clear, a single line says so.
pub fn build_report(obligations: &[Obligation], today: NaiveDate) -> String {
    let horizon = today + Duration::days(UPCOMING_WINDOW_DAYS);

    let section = |direction: Direction, overdue: bool| -> Vec<String> {
        obligations
            .iter()
            .filter(|o| o.direction == direction)
            .filter(|o| {
                if overdue {
                    o.due_date < today
                } else {
                    o.due_date >= today && o.due_date <= horizon
                }
            })
            .map(|o| format!("  • {} — {:.2} (due {})", o.party, o.amount, o.due_date))
            .collect()
    };

    let overdue_receive = section(Direction::Receive, true);
    let overdue_pay = section(Direction::Pay, true);
    let upcoming_receive = section(Direction::Receive, false);
    let upcoming_pay = section(Direction::Pay, false);

    if overdue_receive.is_empty()
        && overdue_pay.is_empty()
        && upcoming_receive.is_empty()
        && upcoming_pay.is_empty()
    {
        return "✅ No overdue or upcoming money matters.".to_string();
    }

    let mut report = String::from("💰 Money matters\n");
    let mut push_section = |title: &str, lines: Vec<String>| {
        if !lines.is_empty() {
            report.push_str(&format!("\n{title}\n"));
            for line in lines {
                report.push_str(&line);
                report.push('\n');
            }
        }
    };

    push_section("⚠️ Overdue — owed to you:", overdue_receive);
    push_section("⚠️ Overdue — you owe:", overdue_pay);
    push_section("📅 Coming up — owed to you:", upcoming_receive);
    push_section("📅 Coming up — you owe:", upcoming_pay);

    report
}

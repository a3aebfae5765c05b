use rand::seq::SliceRandom;

use mentor_core::OutboundMessage;
use mentor_store::types::GoalReminderRow;

use crate::context::JobContext;
use crate::error::Result;
use crate::types::Outcome;

/// Message templates for per-goal reminders; `{goal_title}` is substituted.
pub const TEMPLATES: [&str; 10] = [
    "🎯 Time to move on \"{goal_title}\" — even ten minutes counts.",
    "🚀 \"{goal_title}\" won't chase itself. What's the next small step?",
    "💡 A little progress on \"{goal_title}\" today beats a lot of intentions.",
    "🔥 You set \"{goal_title}\" for a reason. Honour it for a moment now.",
    "🏁 One step closer to \"{goal_title}\" — take it before the day runs out.",
    "⚡ Momentum check: what did \"{goal_title}\" get from you today?",
    "🌱 \"{goal_title}\" grows a little every time you show up for it.",
    "🧭 Remember where \"{goal_title}\" is taking you. Keep the heading.",
    "⏳ Future you is counting on today's work toward \"{goal_title}\".",
    "🏔️ Big goals are climbed in steps. \"{goal_title}\" is waiting for today's.",
];

/// Per-artifact goal reminder: fires at the record's own time, one dedup key
/// per (user, goal) per day. Two goals reminding in the same minute both
/// dispatch.
pub async fn run(ctx: &JobContext, row: &GoalReminderRow) -> Result<Outcome> {
    let template = TEMPLATES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(TEMPLATES[0]);

    let body = template.replace("{goal_title}", &row.goal_title);
    ctx.sink
        .send(&OutboundMessage::text(row.user.chat_id, body))
        .await?;
    Ok(Outcome::Sent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_template_mentions_the_goal() {
        for template in TEMPLATES {
            assert!(
                template.contains("{goal_title}"),
                "template missing placeholder: {template}"
            );
        }
    }
}

use mentor_core::outbound::{Button, Keyboard};
use mentor_core::OutboundMessage;
use mentor_store::types::User;

use crate::context::JobContext;
use crate::error::Result;
use crate::types::Outcome;

const PROMPT: &str = "💪 Morning check-in: how are you feeling today? \
Log your weight and plan your meals while the day is still young.";

/// 09:00 wellbeing nudge with quick-log buttons.
pub async fn run(ctx: &JobContext, user: &User) -> Result<Outcome> {
    let keyboard = Keyboard::single_row(vec![
        Button {
            label: "Log weight".into(),
            data: "health:weight".into(),
        },
        Button {
            label: "Log meal".into(),
            data: "health:meal".into(),
        },
    ]);
    ctx.sink
        .send(&OutboundMessage::with_keyboard(user.chat_id, PROMPT, keyboard))
        .await?;
    Ok(Outcome::Sent)
}

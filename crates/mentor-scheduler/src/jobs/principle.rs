use rand::seq::SliceRandom;

use mentor_core::OutboundMessage;
use mentor_store::types::User;

use crate::context::JobContext;
use crate::error::Result;
use crate::types::Outcome;

/// The fixed catalog the 07:00 send draws from, uniformly at random.
pub const PRINCIPLES: [&str; 11] = [
    "Do the hardest thing first, while your willpower is full.",
    "A plan you wrote down is a plan you can improve.",
    "Small daily steps beat rare heroic efforts.",
    "Protect your mornings; they set the tone for everything after.",
    "Finish one thing before starting the next.",
    "If it takes less than two minutes, do it now.",
    "Rest is part of the work, not a break from it.",
    "Review your day before it reviews you.",
    "Say no to the good so you can say yes to the great.",
    "Your environment decides more than your motivation.",
    "Progress you can measure is progress you can keep.",
];

pub async fn run(ctx: &JobContext, user: &User) -> Result<Outcome> {
    let principle = PRINCIPLES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(PRINCIPLES[0]);

    let body = format!("🌅 Principle of the day\n\n{principle}");
    ctx.sink
        .send(&OutboundMessage::text(user.chat_id, body))
        .await?;
    Ok(Outcome::Sent)
}

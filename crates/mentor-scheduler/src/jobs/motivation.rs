use rand::seq::SliceRandom;

use mentor_core::OutboundMessage;
use mentor_store::types::User;

use crate::context::JobContext;
use crate::error::Result;
use crate::types::Outcome;

/// Morning motivation: one of the user's non-null motivation fields, chosen
/// uniformly. Users with an empty (or missing) motivation row are skipped
/// without a send or a dedup mark.
pub async fn run(ctx: &JobContext, user: &User) -> Result<Outcome> {
    let motivation = { ctx.store.session().motivation(&user.id)? };
    let Some(motivation) = motivation else {
        return Ok(Outcome::Skipped);
    };

    let fields = motivation.filled_fields();
    let Some((label, text)) = fields.choose(&mut rand::thread_rng()).copied() else {
        return Ok(Outcome::Skipped);
    };

    let body = format!("🔥 Remember your {label}\n\n{text}");
    ctx.sink
        .send(&OutboundMessage::text(user.chat_id, body))
        .await?;
    Ok(Outcome::Sent)
}

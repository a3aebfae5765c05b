use chrono::NaiveDate;

use mentor_core::OutboundMessage;
use mentor_store::types::NutritionRow;

use crate::context::JobContext;
use crate::error::Result;
use crate::materialize;
use crate::types::Outcome;

/// Shopping reminder — fires at the record's shopping time on the eve of a
/// cooking day (the engine applies the weekday guard). Sends, then
/// materializes today's shopping todo.
pub async fn run_shopping(ctx: &JobContext, row: &NutritionRow, today: NaiveDate) -> Result<Outcome> {
    let cooking = materialize::cooking_time(&row.settings);
    let body = format!(
        "🛒 Tomorrow is a cooking day ({cooking}). Do the grocery run today so \
         everything's ready."
    );
    ctx.sink
        .send(&OutboundMessage::text(row.user.chat_id, body))
        .await?;
    materialize::nutrition_todos(ctx, &row.user, today)?;
    Ok(Outcome::Sent)
}

/// Cooking reminder — fires at the record's cooking time on cooking days.
/// Sends, then materializes today's cooking todo.
pub async fn run_cooking(ctx: &JobContext, row: &NutritionRow, today: NaiveDate) -> Result<Outcome> {
    let mut body = String::from("🍳 Cooking time! Batch your meals now and the rest of the week feeds itself.");
    if let Some(calories) = row.settings.target_calories {
        body.push_str(&format!("\nTarget: {calories} kcal/day."));
    }
    ctx.sink
        .send(&OutboundMessage::text(row.user.chat_id, body))
        .await?;
    materialize::nutrition_todos(ctx, &row.user, today)?;
    Ok(Outcome::Sent)
}

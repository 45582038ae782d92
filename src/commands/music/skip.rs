use super::*;

/// Skip to the next track in the queue
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    aliases("next"),
    category = "Music"
)]
pub async fn skip(ctx: Context<'_>) -> CommandResult {
    dispatch(ctx, Action::Next, "⏭️ Skipped to the next track").await
}

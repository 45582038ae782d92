use super::*;

/// Go back to the previous track in the queue
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    aliases("prev"),
    category = "Music"
)]
pub async fn previous(ctx: Context<'_>) -> CommandResult {
    dispatch(ctx, Action::Previous, "⏮️ Back to the previous track").await
}

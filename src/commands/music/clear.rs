use super::*;

/// Stop playback and empty the queue
#[poise::command(slash_command, prefix_command, guild_only, category = "Music")]
pub async fn clear(ctx: Context<'_>) -> CommandResult {
    dispatch(ctx, Action::Clear, "🗑️ Cleared the queue").await
}

use super::*;

/// Leave the voice channel
#[poise::command(slash_command, prefix_command, guild_only, category = "Music")]
pub async fn leave(ctx: Context<'_>) -> CommandResult {
    dispatch(ctx, Action::Leave, "👋 Left the voice channel").await
}

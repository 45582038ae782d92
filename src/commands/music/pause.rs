use super::*;

/// Pause the current track
#[poise::command(slash_command, prefix_command, guild_only, category = "Music")]
pub async fn pause(ctx: Context<'_>) -> CommandResult {
    dispatch(ctx, Action::Pause, "⏸️ Paused").await
}

/// Resume the paused track
#[poise::command(slash_command, prefix_command, guild_only, category = "Music")]
pub async fn resume(ctx: Context<'_>) -> CommandResult {
    dispatch(ctx, Action::Resume, "▶️ Resumed").await
}

use super::*;

/// Show the music player for your voice channel
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    aliases("print"),
    category = "Music"
)]
pub async fn show(ctx: Context<'_>) -> CommandResult {
    dispatch(ctx, Action::Show, "🎵 Player refreshed").await
}

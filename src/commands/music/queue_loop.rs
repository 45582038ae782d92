use super::*;

/// Loop the whole queue
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    rename = "loop",
    category = "Music"
)]
pub async fn loop_queue(ctx: Context<'_>) -> CommandResult {
    dispatch(ctx, Action::Loop(true), "🔁 Looping the queue").await
}

/// Stop looping the queue
#[poise::command(slash_command, prefix_command, guild_only, category = "Music")]
pub async fn unloop(ctx: Context<'_>) -> CommandResult {
    dispatch(ctx, Action::Loop(false), "➡️ No longer looping").await
}

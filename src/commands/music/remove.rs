use super::*;

/// Remove a track from the queue by its position
#[poise::command(slash_command, prefix_command, guild_only, category = "Music")]
pub async fn remove(
    ctx: Context<'_>,
    #[description = "Position of the track to remove (1-based)"]
    #[min = 1]
    position: usize,
) -> CommandResult {
    // Convert to 0-based index
    let Some(index) = position.checked_sub(1) else {
        ctx.send(embedded_messages::invalid_queue_position()).await?;
        return Ok(());
    };

    dispatch(
        ctx,
        Action::Remove(index),
        &format!("🗑️ Removed track #{}", position),
    )
    .await
}

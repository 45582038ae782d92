use super::*;
use tracing::info;

/// Play a song or playlist from YouTube, Spotify or a search query
#[poise::command(slash_command, prefix_command, guild_only, category = "Music")]
pub async fn play(
    ctx: Context<'_>,
    #[description = "URL or search query"]
    #[rest]
    query: String,
) -> CommandResult {
    info!("Received play command with query: {}", query);

    let key = match voice_session(ctx) {
        Ok(key) => key,
        Err(err) => {
            ctx.send(music_error(&err)).await?;
            return Ok(());
        }
    };

    // Defer the response since resolving the query might take time
    ctx.defer().await?;

    let data = ctx.data();
    match data
        .player
        .play_query(data.resolver.as_ref(), key, ctx.channel_id(), &query)
        .await
    {
        Ok(count) => ctx.send(embedded_messages::tracks_added(count)).await?,
        Err(err) => ctx.send(music_error(&err)).await?,
    };

    Ok(())
}

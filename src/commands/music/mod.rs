//! Music commands. Each one finds the caller's voice session and hands an action
//! to the player.

pub mod audio_sources;
pub mod utils;

pub(crate) mod clear;
pub(crate) mod leave;
pub(crate) mod pause;
pub(crate) mod play;
pub(crate) mod previous;
pub(crate) mod queue_loop;
pub(crate) mod remove;
pub(crate) mod show;
pub(crate) mod skip;

pub(crate) use crate::{CommandResult, Context};
pub(crate) use utils::actions::{Action, ActionRequest};
pub(crate) use utils::embedded_messages::{self, music_error};
pub(crate) use utils::music_manager::{MusicError, MusicResult};
pub(crate) use utils::session::SessionKey;

use utils::voice::user_voice_channel;

/// Every music command, ready to be handed to the framework.
pub fn commands() -> Vec<poise::Command<crate::Data, crate::Error>> {
    vec![
        play::play(),
        skip::skip(),
        previous::previous(),
        pause::pause(),
        pause::resume(),
        queue_loop::loop_queue(),
        queue_loop::unloop(),
        clear::clear(),
        leave::leave(),
        remove::remove(),
        show::show(),
    ]
}

/// The session of the voice channel the command's author sits in.
pub(crate) fn voice_session(ctx: Context<'_>) -> MusicResult<SessionKey> {
    let guild_id = ctx.guild_id().ok_or(MusicError::NotInGuild)?;
    let channel_id = user_voice_channel(ctx.serenity_context(), guild_id, ctx.author().id)?;
    Ok(SessionKey::new(guild_id, channel_id))
}

/// Run `action` on the author's session. Slash commands get an ephemeral
/// acknowledgement; the panel shows the rest.
pub(crate) async fn dispatch(ctx: Context<'_>, action: Action, done: &str) -> CommandResult {
    let result = match voice_session(ctx) {
        Ok(key) => {
            ctx.defer_ephemeral().await?;
            ctx.data()
                .player
                .submit(ActionRequest::command(key, ctx.channel_id(), action))
                .await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => {
            if let poise::Context::Application(_) = ctx {
                ctx.send(embedded_messages::action_done(done)).await?;
            }
        }
        Err(e) => {
            ctx.send(music_error(&e)).await?;
        }
    }

    Ok(())
}

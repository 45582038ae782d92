use ::serenity::all::ComponentInteraction;
use poise::serenity_prelude::{self as serenity, Context};
use tracing::{error, info};

use super::actions::ActionRequest;
use super::button_controls::ControlButton;
use super::music_manager::PlayerHandle;

type ButtonInteractionResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Handle a press on one of the player panel's buttons
pub async fn handle_interaction(
    ctx: &Context,
    interaction: &ComponentInteraction,
    player: &PlayerHandle,
) -> ButtonInteractionResult {
    // Defer the interaction response immediately; the panel itself is edited by the player
    interaction.defer(&ctx.http).await?;

    let Some(control) = ControlButton::from_custom_id(&interaction.data.custom_id) else {
        error!("Unknown button ID: {}", interaction.data.custom_id);
        return error_followup(ctx, interaction, "Unknown button action.").await;
    };

    info!(
        "Button {} pressed by {} on panel {}",
        control.custom_id(),
        interaction.user.id,
        interaction.message.id
    );

    let request = ActionRequest::button(
        interaction.message.id,
        interaction.channel_id,
        control.action(),
    );

    if let Err(e) = player.submit(request).await {
        return error_followup(ctx, interaction, &e.to_string()).await;
    }

    Ok(())
}

/// Send an ephemeral error followup message for failed interactions
async fn error_followup(
    ctx: &Context,
    interaction: &ComponentInteraction,
    content: &str,
) -> ButtonInteractionResult {
    interaction
        .create_followup(
            &ctx.http,
            serenity::CreateInteractionResponseFollowup::new()
                .content(content)
                .ephemeral(true),
        )
        .await?;
    Ok(())
}

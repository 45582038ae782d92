use serenity::all::{ComponentInteraction, Ready};
use serenity::async_trait;
use serenity::model::application::Interaction;
use serenity::prelude::*;
use tracing::{error, info};

use crate::commands::music::utils::button_controls::ControlButton;
use crate::commands::music::utils::component_handlers;
use crate::commands::music::utils::music_manager::PlayerHandle;

pub struct Handler {
    pub player: PlayerHandle,
}

#[async_trait]
impl serenity::prelude::EventHandler for Handler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("{} is connected", ready.user.name);
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::Component(component) = interaction {
            if ControlButton::from_custom_id(&component.data.custom_id).is_some() {
                self.music_component_interaction(&ctx, &component).await;
            }
        }
    }
}

impl Handler {
    /// Handle presses on the player panel's buttons
    async fn music_component_interaction(&self, ctx: &Context, component: &ComponentInteraction) {
        if let Err(e) = component_handlers::handle_interaction(ctx, component, &self.player).await {
            error!("Error handling component interaction: {}", e);
        }
    }
}

use ::serenity::all::ClientBuilder;
use carrot_jams::commands::music::{
    self,
    audio_sources::{QueryResolver, Resolver, youtube::YoutubeApi},
    utils::{
        embedded_messages::ChannelDisplay,
        music_manager::{MusicManager, PlayerHandle},
        voice::SongbirdTransport,
    },
};
use carrot_jams::config::Config;
use carrot_jams::events::Handler;
use carrot_jams::{CommandResult, Context, Data, Error, HTTP_CLIENT};
use dotenv::dotenv;
use poise::serenity_prelude as serenity;
use songbird::{SerenityInit, Songbird};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[poise::command(slash_command, prefix_command, category = "General")]
async fn help(
    ctx: Context<'_>,
    #[description = "Specific command to show help about"]
    #[autocomplete = "poise::builtins::autocomplete_command"]
    command: Option<String>,
) -> CommandResult {
    poise::builtins::help(
        ctx,
        command.as_deref(),
        poise::builtins::HelpConfiguration {
            show_context_menu_commands: true,
            ..Default::default()
        },
    )
    .await
    .map_err(|e| e.into())
}

#[poise::command(prefix_command, hide_in_help)]
async fn register(ctx: Context<'_>) -> Result<(), Error> {
    poise::builtins::register_application_commands_buttons(ctx)
        .await
        .map_err(|e| e.into())
}

fn build_resolver(config: &Config) -> Arc<dyn Resolver> {
    let resolver = QueryResolver::new(YoutubeApi::new(config.ytdlp_path.clone()));

    #[cfg(feature = "spotify")]
    let resolver = match &config.spotify {
        Some(credentials) => {
            use carrot_jams::commands::music::audio_sources::spotify::SpotifyApi;
            resolver.with_spotify(SpotifyApi::new(credentials.clone(), HTTP_CLIENT.clone()))
        }
        None => {
            info!("Spotify credentials not set, Spotify links are disabled");
            resolver
        }
    };

    Arc::new(resolver)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize logging with debug level for our crate
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("carrot_jams=debug,warn")),
        )
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .with_target(true)
        .with_ansi(true)
        .pretty()
        .init();

    dotenv().ok();

    let config = Config::from_env()?;

    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILD_VOICE_STATES;

    let (player, jobs) = PlayerHandle::new();
    let resolver = build_resolver(&config);

    let mut commands = vec![register(), help()];
    commands.extend(music::commands());

    let data_player = player.clone();
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands,
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(config.command_prefix.clone()),
                ..Default::default()
            },
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(Data {
                    player: data_player,
                    resolver,
                })
            })
        });

    let voice = Songbird::serenity();
    let mut client = ClientBuilder::new(&config.discord_token, intents)
        .framework(framework.build())
        .event_handler(Handler {
            player: player.clone(),
        })
        .register_songbird_with(voice.clone())
        .await?;

    let manager = MusicManager::new(
        Arc::new(SongbirdTransport::new(voice, HTTP_CLIENT.clone())),
        Arc::new(ChannelDisplay::new(client.http.clone())),
        player,
        config.session_idle_timeout,
    );
    tokio::spawn(manager.run(jobs));

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            return;
        }
        info!("Received Ctrl-C, shutting down");
        shard_manager.shutdown_all().await;
    });

    client.start().await.map_err(Into::into)
}

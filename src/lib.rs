//! Carrot Jams: a Discord music bot that keeps one playlist per voice session.
//!
//! The binary in `main.rs` wires these modules to a live gateway connection; everything
//! below is usable (and tested) without one.

use std::sync::{Arc, LazyLock};

pub mod commands;
pub mod config;
pub mod events;

use commands::music::audio_sources::Resolver;
use commands::music::utils::music_manager::PlayerHandle;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
pub type CommandResult = Result<(), Error>;

/// Shared HTTP client used by songbird inputs and the Spotify client.
pub static HTTP_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(reqwest::Client::new);

/// User data, stored and accessible in all command invocations
pub struct Data {
    /// Entry point into the playback scheduler.
    pub player: PlayerHandle,
    /// Turns `play` queries into tracks, off the scheduler.
    pub resolver: Arc<dyn Resolver>,
}

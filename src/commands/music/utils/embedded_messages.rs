use poise::{CreateReply, serenity_prelude as serenity};
use serenity::all::{CreateActionRow, CreateEmbed, CreateMessage, EditMessage};
use serenity::async_trait;
use serenity::http::Http;
use serenity::model::id::ChannelId;
use std::sync::Arc;

use crate::Error;
use crate::commands::music::audio_sources::track::Track;

use super::button_controls::create_music_control_buttons;
use super::format_duration;
use super::music_manager::MusicError;
use super::session::{MessageRef, PlayerState, Session};

/// How many queue entries the panel lists.
pub const QUEUE_WINDOW: usize = 10;

const COLOR_OK: u32 = 0x00ff00;
const COLOR_IDLE: u32 = 0xffa500;
const COLOR_ERROR: u32 = 0xff0000;

/// Messages posted to a session's text channel outside any command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    QueueFinished,
    PlaybackFailed(String),
}

/// Snapshot of a session, taken on the scheduler and rendered elsewhere.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerView {
    pub state: PlayerState,
    pub now_playing: Option<Track>,
    pub current_index: Option<usize>,
    /// The first [`QUEUE_WINDOW`] entries with their queue positions.
    pub entries: Vec<(usize, Track)>,
    pub total: usize,
    pub loop_enabled: bool,
    pub has_previous: bool,
    pub has_next: bool,
}

impl PlayerView {
    pub fn from_session(session: &Session) -> Self {
        let queue = &session.queue;
        let entries = (0..queue.len().min(QUEUE_WINDOW))
            .filter_map(|index| queue.get(index).ok().map(|track| (index, track.clone())))
            .collect();

        Self {
            state: session.state(),
            now_playing: queue.current().cloned(),
            current_index: queue.current_index(),
            entries,
            total: queue.len(),
            loop_enabled: queue.is_loop_enabled(),
            has_previous: queue.has_previous(),
            has_next: queue.has_next(),
        }
    }
}

/// Renders views and notices into a Discord channel.
#[async_trait]
pub trait StatusDisplay: Send + Sync {
    async fn send_new(&self, channel: ChannelId, view: &PlayerView) -> Result<MessageRef, Error>;

    async fn edit(&self, message: MessageRef, view: &PlayerView) -> Result<(), Error>;

    async fn delete(&self, message: MessageRef) -> Result<(), Error>;

    async fn notify(&self, channel: ChannelId, notice: &Notice) -> Result<(), Error>;
}

pub struct ChannelDisplay {
    http: Arc<Http>,
}

impl ChannelDisplay {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl StatusDisplay for ChannelDisplay {
    async fn send_new(&self, channel: ChannelId, view: &PlayerView) -> Result<MessageRef, Error> {
        let (embed, components) = render(view);
        let message = channel
            .send_message(
                &self.http,
                CreateMessage::new().embed(embed).components(components),
            )
            .await?;

        Ok(MessageRef {
            channel_id: message.channel_id,
            message_id: message.id,
        })
    }

    async fn edit(&self, message: MessageRef, view: &PlayerView) -> Result<(), Error> {
        let (embed, components) = render(view);
        message
            .channel_id
            .edit_message(
                &self.http,
                message.message_id,
                EditMessage::new().embed(embed).components(components),
            )
            .await?;
        Ok(())
    }

    async fn delete(&self, message: MessageRef) -> Result<(), Error> {
        self.http
            .delete_message(message.channel_id, message.message_id, None)
            .await?;
        Ok(())
    }

    async fn notify(&self, channel: ChannelId, notice: &Notice) -> Result<(), Error> {
        channel
            .send_message(&self.http, CreateMessage::new().embed(notice_embed(notice)))
            .await?;
        Ok(())
    }
}

fn state_label(state: PlayerState) -> &'static str {
    match state {
        PlayerState::Idle => "💤 Idle",
        PlayerState::Playing => "▶️ Playing",
        PlayerState::Paused => "⏸️ Paused",
        PlayerState::Stopped => "⏹️ Stopped",
    }
}

fn track_line(track: &Track) -> String {
    let mut line = format!("[{}]({})", track.title(), track.display_link());
    if let Some(duration) = track.duration() {
        line.push_str(&format!(" `{}`", format_duration(duration)));
    }
    line
}

/// The queue section of the panel, current entry marked.
pub fn queue_listing(view: &PlayerView) -> String {
    if view.entries.is_empty() {
        return "**📭 Queue is empty**".to_string();
    }

    let mut listing = format!("**📋 Queue - {} tracks**\n", view.total);
    for (index, track) in &view.entries {
        if Some(*index) == view.current_index {
            listing.push_str(&format!("▶️ **{}**\n", track_line(track)));
        } else {
            listing.push_str(&format!("`{}.` {}\n", index + 1, track_line(track)));
        }
    }

    let hidden = view.total.saturating_sub(view.entries.len());
    if hidden > 0 {
        listing.push_str(&format!("*...and {} more*", hidden));
    }

    listing.trim_end().to_string()
}

pub fn player_embed(view: &PlayerView) -> CreateEmbed {
    let mut description = String::new();
    match (&view.now_playing, view.state) {
        (Some(track), PlayerState::Playing | PlayerState::Paused) => {
            description.push_str("**🎵 Now Playing**\n");
            description.push_str(&format!("**{}**\n\n", track_line(track)));
        }
        _ => description.push_str("**🔇 Nothing playing**\n\n"),
    }
    description.push_str(&queue_listing(view));

    let mut embed = CreateEmbed::new()
        .title("🎵 Music Player")
        .description(description)
        .field("Status", state_label(view.state), true)
        .field("Loop", if view.loop_enabled { "🔁 On" } else { "Off" }, true)
        .color(match view.state {
            PlayerState::Playing => COLOR_OK,
            _ => COLOR_IDLE,
        });

    if let Some(thumbnail) = view.now_playing.as_ref().and_then(Track::thumbnail_url) {
        embed = embed.thumbnail(thumbnail);
    }

    embed
}

/// Turn a view into the panel's embed and its control buttons.
pub fn render(view: &PlayerView) -> (CreateEmbed, Vec<CreateActionRow>) {
    (player_embed(view), create_music_control_buttons(view))
}

pub fn notice_embed(notice: &Notice) -> CreateEmbed {
    match notice {
        Notice::QueueFinished => CreateEmbed::new()
            .title("🏁 Queue Finished")
            .description("Add more tracks with `play` or turn on `loop`")
            .color(COLOR_OK),
        Notice::PlaybackFailed(reason) => CreateEmbed::new()
            .title("❌ Playback Failed")
            .description(format!("Stopped playback: {}", reason))
            .color(COLOR_ERROR),
    }
}

/// Create an embed for a failed music operation
pub fn music_error(err: &MusicError) -> CreateReply {
    CreateReply::default()
        .embed(
            CreateEmbed::new()
                .title("❌ Error")
                .description(err.to_string())
                .color(COLOR_ERROR),
        )
        .ephemeral(true)
}

/// Create an embed for when a queue position is invalid
pub fn invalid_queue_position() -> CreateReply {
    CreateReply::default()
        .embed(
            CreateEmbed::new()
                .title("❌ Error")
                .description("Queue positions start at 1")
                .color(COLOR_ERROR),
        )
        .ephemeral(true)
}

/// Acknowledge a slash command whose result is visible on the panel.
pub fn action_done(description: &str) -> CreateReply {
    CreateReply::default()
        .embed(
            CreateEmbed::new()
                .description(description.to_string())
                .color(COLOR_OK),
        )
        .ephemeral(true)
}

pub fn tracks_added(count: usize) -> CreateReply {
    let description = if count == 1 {
        "Added 1 track to the queue".to_string()
    } else {
        format!("Added {} tracks to the queue", count)
    };

    CreateReply::default().embed(
        CreateEmbed::new()
            .title("🎵 Added to Queue")
            .description(description)
            .color(COLOR_OK),
    )
}

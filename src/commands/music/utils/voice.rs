use dashmap::DashMap;
use poise::serenity_prelude as serenity;
use serenity::async_trait;
use serenity::model::id::{ChannelId, GuildId, UserId};
use songbird::error::ControlError;
use songbird::input::YoutubeDl;
use songbird::tracks::{PlayMode, TrackHandle};
use songbird::{Event, Songbird, TrackEvent};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::commands::music::audio_sources::track::Track;

use super::event_handlers::{ContinuationBridge, TrackEndNotifier};
use super::music_manager::{MusicError, MusicResult};
use super::session::SessionKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Nothing loaded, or the last track is done.
    Idle,
    Playing,
    Paused,
}

/// The audio side of a session: joining voice and driving the one active track.
///
/// A guild has a single call. A session owns it while the call sits in the session's
/// voice channel; every per-session query answers for the owner only.
#[async_trait]
pub trait VoiceTransport: Send + Sync {
    /// Join the session's channel, moving the call if it sits elsewhere. Audio owned
    /// by another channel is dropped.
    async fn connect(&self, key: SessionKey) -> MusicResult<()>;

    async fn disconnect(&self, guild_id: GuildId) -> MusicResult<()>;

    /// Whether the guild's call sits in this session's channel.
    async fn is_connected(&self, key: SessionKey) -> bool;

    /// The channel currently holding the guild's call, if any.
    async fn connected_channel(&self, guild_id: GuildId) -> Option<ChannelId>;

    /// Replace whatever is playing with a fresh source for `track`. `bridge` is
    /// signalled once the audio ends or fails.
    async fn play(
        &self,
        key: SessionKey,
        track: &Track,
        bridge: ContinuationBridge,
    ) -> MusicResult<()>;

    async fn stop(&self, key: SessionKey) -> MusicResult<()>;

    async fn pause(&self, key: SessionKey) -> MusicResult<()>;

    async fn resume(&self, key: SessionKey) -> MusicResult<()>;

    /// Idle unless this session owns the loaded track.
    async fn playback_state(&self, key: SessionKey) -> PlaybackState;
}

/// The track songbird is playing for a guild and the session that started it.
struct OwnedTrack {
    owner: SessionKey,
    handle: TrackHandle,
}

/// Songbird-backed transport. Keeps the handle of the single track it started
/// per guild.
pub struct SongbirdTransport {
    manager: Arc<Songbird>,
    http: reqwest::Client,
    tracks: DashMap<GuildId, OwnedTrack>,
}

impl SongbirdTransport {
    pub fn new(manager: Arc<Songbird>, http: reqwest::Client) -> Self {
        Self {
            manager,
            http,
            tracks: DashMap::new(),
        }
    }

    fn current(&self, key: SessionKey) -> MusicResult<TrackHandle> {
        self.tracks
            .get(&key.guild_id)
            .filter(|entry| entry.owner == key)
            .map(|entry| entry.handle.clone())
            .ok_or(MusicError::NothingPlaying)
    }
}

fn control_error(e: ControlError) -> MusicError {
    MusicError::TrackControl(e.to_string())
}

#[async_trait]
impl VoiceTransport for SongbirdTransport {
    async fn connect(&self, key: SessionKey) -> MusicResult<()> {
        if let Some((_, displaced)) = self
            .tracks
            .remove_if(&key.guild_id, |_, track| track.owner != key)
        {
            debug!(
                "Dropping audio of voice channel {} in guild {}",
                displaced.owner.voice_channel_id, key.guild_id
            );
            let _ = displaced.handle.stop();
        }

        self.manager
            .join(key.guild_id, key.voice_channel_id)
            .await
            .map_err(|e| MusicError::JoinError(e.to_string()))?;
        info!(
            "Joined voice channel {} in guild {}",
            key.voice_channel_id, key.guild_id
        );
        Ok(())
    }

    async fn disconnect(&self, guild_id: GuildId) -> MusicResult<()> {
        if let Some((_, track)) = self.tracks.remove(&guild_id) {
            // The session already invalidated this track, its end event is ignored
            let _ = track.handle.stop();
        }

        self.manager
            .remove(guild_id)
            .await
            .map_err(|_| MusicError::JoinError("Failed to leave voice channel".to_string()))
    }

    async fn is_connected(&self, key: SessionKey) -> bool {
        self.connected_channel(key.guild_id).await == Some(key.voice_channel_id)
    }

    async fn connected_channel(&self, guild_id: GuildId) -> Option<ChannelId> {
        let call = self.manager.get(guild_id)?;
        let channel = call.lock().await.current_channel()?;
        Some(ChannelId::new(channel.0.get()))
    }

    async fn play(
        &self,
        key: SessionKey,
        track: &Track,
        bridge: ContinuationBridge,
    ) -> MusicResult<()> {
        if !self.is_connected(key).await {
            return Err(MusicError::NotConnected);
        }
        let call = self
            .manager
            .get(key.guild_id)
            .ok_or(MusicError::NotConnected)?;

        // Stream URLs expire, so every play builds a new input
        let input = YoutubeDl::new(self.http.clone(), track.source_url().to_string());

        let handle = {
            let mut handler = call.lock().await;
            handler.play_only_input(input.into())
        };

        for event in [TrackEvent::End, TrackEvent::Error] {
            handle
                .add_event(
                    Event::Track(event),
                    TrackEndNotifier {
                        bridge: bridge.clone(),
                    },
                )
                .map_err(|e| MusicError::PlaybackSetupError(e.to_string()))?;
        }

        debug!("Started songbird track for '{}'", track.title());
        self.tracks.insert(key.guild_id, OwnedTrack { owner: key, handle });
        Ok(())
    }

    async fn stop(&self, key: SessionKey) -> MusicResult<()> {
        match self.current(key)?.stop() {
            Ok(()) | Err(ControlError::Finished) => Ok(()),
            Err(e) => Err(control_error(e)),
        }
    }

    async fn pause(&self, key: SessionKey) -> MusicResult<()> {
        self.current(key)?.pause().map_err(control_error)
    }

    async fn resume(&self, key: SessionKey) -> MusicResult<()> {
        self.current(key)?.play().map_err(control_error)
    }

    async fn playback_state(&self, key: SessionKey) -> PlaybackState {
        let Ok(handle) = self.current(key) else {
            return PlaybackState::Idle;
        };

        match handle.get_info().await {
            Ok(info) => match info.playing {
                PlayMode::Play => PlaybackState::Playing,
                PlayMode::Pause => PlaybackState::Paused,
                _ => PlaybackState::Idle,
            },
            Err(ControlError::Finished) => PlaybackState::Idle,
            Err(e) => {
                warn!(
                    "Could not query track state in guild {}: {}",
                    key.guild_id, e
                );
                PlaybackState::Idle
            }
        }
    }
}

/// Get the voice channel ID that the user is currently in
pub fn user_voice_channel(
    ctx: &serenity::Context,
    guild_id: GuildId,
    user_id: UserId,
) -> MusicResult<ChannelId> {
    let guild = ctx.cache.guild(guild_id).ok_or(MusicError::NotInGuild)?;

    guild
        .voice_states
        .get(&user_id)
        .and_then(|voice_state| voice_state.channel_id)
        .ok_or(MusicError::NotInVoiceChannel)
}

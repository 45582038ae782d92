//! Stand-ins for the voice connection, the Discord channel and the query resolver

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use carrot_jams::commands::music::audio_sources::track::Track;
use carrot_jams::commands::music::audio_sources::{AudioSourceResult, Resolver};
use carrot_jams::commands::music::utils::embedded_messages::{Notice, PlayerView, StatusDisplay};
use carrot_jams::commands::music::utils::event_handlers::ContinuationBridge;
use carrot_jams::commands::music::utils::music_manager::{MusicError, MusicResult};
use carrot_jams::commands::music::utils::session::{MessageRef, SessionKey};
use carrot_jams::commands::music::utils::voice::{PlaybackState, VoiceTransport};
use carrot_jams::Error;
use mockall::mock;
use serenity::model::id::{ChannelId, GuildId, MessageId};
use tokio::sync::Notify;

mock! {
    /// Resolver with scripted answers
    pub Resolver {}

    #[async_trait]
    impl Resolver for Resolver {
        async fn resolve(&self, query: &str) -> AudioSourceResult<Vec<Track>>;
    }
}

/// Resolver that holds its answer until the test opens the gate.
pub struct GatedResolver {
    pub gate: Notify,
    tracks: Vec<Track>,
}

impl GatedResolver {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self {
            gate: Notify::new(),
            tracks,
        }
    }
}

#[async_trait]
impl Resolver for GatedResolver {
    async fn resolve(&self, _query: &str) -> AudioSourceResult<Vec<Track>> {
        self.gate.notified().await;
        Ok(self.tracks.clone())
    }
}

struct ActiveTrack {
    owner: SessionKey,
    title: String,
    bridge: ContinuationBridge,
    paused: bool,
}

#[derive(Default)]
struct TransportState {
    /// Channel holding each guild's call.
    connected: HashMap<GuildId, ChannelId>,
    active: HashMap<GuildId, ActiveTrack>,
    played: Vec<String>,
    fail_connect: bool,
    fail_play: bool,
}

impl TransportState {
    fn owns_call(&self, key: SessionKey) -> bool {
        self.connected.get(&key.guild_id) == Some(&key.voice_channel_id)
    }

    fn owned_track(&mut self, key: SessionKey) -> Option<&mut ActiveTrack> {
        self.active
            .get_mut(&key.guild_id)
            .filter(|track| track.owner == key)
    }
}

/// In-memory voice backend with one call per guild. Ending a track, by stopping it
/// or replacing it, signals its bridge the way songbird's end event would.
#[derive(Default)]
pub struct FakeTransport {
    state: Mutex<TransportState>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Titles in the order they were started.
    pub fn played(&self) -> Vec<String> {
        self.state.lock().unwrap().played.clone()
    }

    pub fn now_playing(&self, guild_id: GuildId) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .active
            .get(&guild_id)
            .map(|track| track.title.clone())
    }

    pub fn call_channel(&self, guild_id: GuildId) -> Option<ChannelId> {
        self.state.lock().unwrap().connected.get(&guild_id).copied()
    }

    pub fn active_bridge(&self, guild_id: GuildId) -> Option<ContinuationBridge> {
        self.state
            .lock()
            .unwrap()
            .active
            .get(&guild_id)
            .map(|track| track.bridge.clone())
    }

    pub fn set_fail_connect(&self, fail: bool) {
        self.state.lock().unwrap().fail_connect = fail;
    }

    pub fn set_fail_play(&self, fail: bool) {
        self.state.lock().unwrap().fail_play = fail;
    }

    /// The current track plays to its end.
    pub fn finish_current(&self, guild_id: GuildId) {
        let finished = self.state.lock().unwrap().active.remove(&guild_id);
        if let Some(track) = finished {
            track.bridge.track_ended();
        }
    }

    /// The current track's stream breaks.
    pub fn fail_current(&self, guild_id: GuildId, reason: &str) {
        let failed = self.state.lock().unwrap().active.remove(&guild_id);
        if let Some(track) = failed {
            track.bridge.track_failed(reason);
        }
    }

    /// A late end signal for the track that is still loaded.
    pub fn stray_end_signal(&self, guild_id: GuildId) {
        if let Some(bridge) = self.active_bridge(guild_id) {
            bridge.track_ended();
        }
    }
}

#[async_trait]
impl VoiceTransport for FakeTransport {
    async fn connect(&self, key: SessionKey) -> MusicResult<()> {
        let displaced = {
            let mut state = self.state.lock().unwrap();
            if state.fail_connect {
                return Err(MusicError::JoinError("voice gateway timed out".to_string()));
            }
            state.connected.insert(key.guild_id, key.voice_channel_id);
            let foreign = state
                .active
                .get(&key.guild_id)
                .is_some_and(|track| track.owner != key);
            if foreign {
                state.active.remove(&key.guild_id)
            } else {
                None
            }
        };
        if let Some(track) = displaced {
            track.bridge.track_ended();
        }
        Ok(())
    }

    async fn disconnect(&self, guild_id: GuildId) -> MusicResult<()> {
        let dropped = {
            let mut state = self.state.lock().unwrap();
            state.connected.remove(&guild_id);
            state.active.remove(&guild_id)
        };
        if let Some(track) = dropped {
            track.bridge.track_ended();
        }
        Ok(())
    }

    async fn is_connected(&self, key: SessionKey) -> bool {
        self.state.lock().unwrap().owns_call(key)
    }

    async fn connected_channel(&self, guild_id: GuildId) -> Option<ChannelId> {
        self.call_channel(guild_id)
    }

    async fn play(
        &self,
        key: SessionKey,
        track: &Track,
        bridge: ContinuationBridge,
    ) -> MusicResult<()> {
        let replaced = {
            let mut state = self.state.lock().unwrap();
            if !state.owns_call(key) {
                return Err(MusicError::NotConnected);
            }
            if state.fail_play {
                return Err(MusicError::PlaybackSetupError(format!(
                    "no audio stream for {}",
                    track.title()
                )));
            }
            state.played.push(track.title().to_string());
            state.active.insert(
                key.guild_id,
                ActiveTrack {
                    owner: key,
                    title: track.title().to_string(),
                    bridge,
                    paused: false,
                },
            )
        };
        if let Some(old) = replaced {
            old.bridge.track_ended();
        }
        Ok(())
    }

    async fn stop(&self, key: SessionKey) -> MusicResult<()> {
        let stopped = {
            let mut state = self.state.lock().unwrap();
            if state.owned_track(key).is_some() {
                state.active.remove(&key.guild_id)
            } else {
                None
            }
        };
        match stopped {
            Some(track) => {
                track.bridge.track_ended();
                Ok(())
            }
            None => Err(MusicError::NothingPlaying),
        }
    }

    async fn pause(&self, key: SessionKey) -> MusicResult<()> {
        let mut state = self.state.lock().unwrap();
        let track = state.owned_track(key).ok_or(MusicError::NothingPlaying)?;
        track.paused = true;
        Ok(())
    }

    async fn resume(&self, key: SessionKey) -> MusicResult<()> {
        let mut state = self.state.lock().unwrap();
        let track = state.owned_track(key).ok_or(MusicError::NothingToResume)?;
        track.paused = false;
        Ok(())
    }

    async fn playback_state(&self, key: SessionKey) -> PlaybackState {
        let mut state = self.state.lock().unwrap();
        match state.owned_track(key) {
            None => PlaybackState::Idle,
            Some(track) if track.paused => PlaybackState::Paused,
            Some(_) => PlaybackState::Playing,
        }
    }
}

#[derive(Default)]
struct DisplayLog {
    next_id: u64,
    sent: Vec<MessageRef>,
    edits: Vec<MessageRef>,
    renders: Vec<PlayerView>,
    deleted: Vec<MessageRef>,
    notices: Vec<(ChannelId, Notice)>,
}

/// Records everything the player would have shown in Discord.
#[derive(Default)]
pub struct FakeDisplay {
    log: Mutex<DisplayLog>,
}

impl FakeDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<MessageRef> {
        self.log.lock().unwrap().sent.clone()
    }

    pub fn edit_count(&self) -> usize {
        self.log.lock().unwrap().edits.len()
    }

    pub fn deleted(&self) -> Vec<MessageRef> {
        self.log.lock().unwrap().deleted.clone()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.log
            .lock()
            .unwrap()
            .notices
            .iter()
            .map(|(_, notice)| notice.clone())
            .collect()
    }

    /// The most recent view rendered, whether sent or edited in.
    pub fn last_view(&self) -> Option<PlayerView> {
        self.log.lock().unwrap().renders.last().cloned()
    }
}

#[async_trait]
impl StatusDisplay for FakeDisplay {
    async fn send_new(&self, channel: ChannelId, view: &PlayerView) -> Result<MessageRef, Error> {
        let mut log = self.log.lock().unwrap();
        log.next_id += 1;
        let message = MessageRef {
            channel_id: channel,
            message_id: MessageId::new(log.next_id),
        };
        log.sent.push(message);
        log.renders.push(view.clone());
        Ok(message)
    }

    async fn edit(&self, message: MessageRef, view: &PlayerView) -> Result<(), Error> {
        let mut log = self.log.lock().unwrap();
        if log.deleted.contains(&message) {
            return Err("Unknown Message".into());
        }
        log.edits.push(message);
        log.renders.push(view.clone());
        Ok(())
    }

    async fn delete(&self, message: MessageRef) -> Result<(), Error> {
        self.log.lock().unwrap().deleted.push(message);
        Ok(())
    }

    async fn notify(&self, channel: ChannelId, notice: &Notice) -> Result<(), Error> {
        self.log
            .lock()
            .unwrap()
            .notices
            .push((channel, notice.clone()));
        Ok(())
    }
}

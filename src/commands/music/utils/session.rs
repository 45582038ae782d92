//! Playback sessions, one per (guild, voice channel), and the registry that owns them.

use serenity::model::id::{ChannelId, GuildId, MessageId};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::queue::Queue;

/// Identifies a session: the guild and the voice channel the music plays in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub guild_id: GuildId,
    pub voice_channel_id: ChannelId,
}

impl SessionKey {
    pub fn new(guild_id: GuildId, voice_channel_id: ChannelId) -> Self {
        Self {
            guild_id,
            voice_channel_id,
        }
    }
}

/// Points at a status message owned by Discord, not by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub channel_id: ChannelId,
    pub message_id: MessageId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    /// No track has been started yet.
    Idle,
    Playing,
    Paused,
    Stopped,
}

#[derive(Debug)]
pub struct Session {
    pub key: SessionKey,
    pub queue: Queue,
    pub is_paused: bool,
    pub is_stopped: bool,
    /// Lookahead: the next natural completion has nothing to continue with.
    pub end_of_queue: bool,
    pub status_message: Option<MessageRef>,
    /// Text channel that receives the status panel and notices.
    pub text_channel: ChannelId,
    /// Bumped every time audio is started or invalidated; completions carry the value
    /// they were installed with.
    pub(crate) generation: u64,
    /// Set by skip/previous: the cursor already moved, the next completion only plays.
    pub(crate) manual_advance: bool,
    last_active: Instant,
}

impl Session {
    /// A session at rest: paused, not stopped and with nothing left to play.
    pub fn new(key: SessionKey, text_channel: ChannelId) -> Self {
        Self {
            key,
            queue: Queue::new(),
            is_paused: true,
            is_stopped: false,
            end_of_queue: true,
            status_message: None,
            text_channel,
            generation: 0,
            manual_advance: false,
            last_active: Instant::now(),
        }
    }

    pub fn state(&self) -> PlayerState {
        if self.is_stopped {
            PlayerState::Stopped
        } else if self.queue.current_index().is_none() {
            PlayerState::Idle
        } else if self.is_paused {
            PlayerState::Paused
        } else {
            PlayerState::Playing
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn touch(&mut self) {
        self.last_active = Instant::now();
    }

    /// Whether the session has sat idle or stopped for at least `idle_for` as of `now`.
    pub fn is_evictable(&self, idle_for: Duration, now: Instant) -> bool {
        matches!(self.state(), PlayerState::Idle | PlayerState::Stopped)
            && now.saturating_duration_since(self.last_active) >= idle_for
    }

    /// Recompute the end-of-queue lookahead for the track that just became current.
    pub(crate) fn look_ahead(&mut self) {
        self.end_of_queue = !self.queue.is_loop_enabled() && self.queue.is_last();
    }
}

/// Owns every session. Only the scheduler task touches it.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<SessionKey, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find_or_create(&mut self, key: SessionKey, text_channel: ChannelId) -> &mut Session {
        self.sessions.entry(key).or_insert_with(|| {
            info!(
                "Creating session for guild {} / voice channel {}",
                key.guild_id, key.voice_channel_id
            );
            Session::new(key, text_channel)
        })
    }

    pub fn get(&self, key: &SessionKey) -> Option<&Session> {
        self.sessions.get(key)
    }

    pub fn get_mut(&mut self, key: &SessionKey) -> Option<&mut Session> {
        self.sessions.get_mut(key)
    }

    /// Find the session whose status panel is `message_id`.
    pub fn find_by_status_message(&self, message_id: MessageId) -> Option<SessionKey> {
        self.sessions
            .values()
            .find(|session| {
                session
                    .status_message
                    .is_some_and(|message| message.message_id == message_id)
            })
            .map(|session| session.key)
    }

    /// Drop sessions that have been idle or stopped for `idle_for`; returns their keys.
    pub fn evict_idle(&mut self, idle_for: Duration, now: Instant) -> Vec<SessionKey> {
        let stale: Vec<SessionKey> = self
            .sessions
            .values()
            .filter(|session| session.is_evictable(idle_for, now))
            .map(|session| session.key)
            .collect();

        for key in &stale {
            debug!("Evicting idle session for guild {}", key.guild_id);
            self.sessions.remove(key);
        }

        stale
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

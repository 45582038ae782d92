//! The user-visible operations. Commands and buttons both end up here, through
//! [`MusicManager::apply`], and differ only in how the panel is refreshed.

use serenity::model::id::{ChannelId, MessageId};
use tracing::{debug, info, warn};

use crate::commands::music::audio_sources::track::Track;

use super::event_handlers::Advance;
use super::music_manager::{MusicError, MusicManager, MusicResult, PlayerIo, Refresh};
use super::queue::Queue;
use super::session::{PlayerState, Session, SessionKey};
use super::voice::PlaybackState;

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Append already resolved tracks and start playing if nothing is.
    Play(Vec<Track>),
    Next,
    Previous,
    Pause,
    Resume,
    /// Pause when playing, resume otherwise (the panel's play/pause button).
    TogglePause,
    Loop(bool),
    Clear,
    Leave,
    /// Delete the queue entry at a zero-based position.
    Remove(usize),
    /// Re-render the panel without changing anything.
    Show,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Play(_) => "play",
            Action::Next => "skip",
            Action::Previous => "previous",
            Action::Pause => "pause",
            Action::Resume => "resume",
            Action::TogglePause => "pause/resume",
            Action::Loop(true) => "loop",
            Action::Loop(false) => "unloop",
            Action::Clear => "clear",
            Action::Leave => "leave",
            Action::Remove(_) => "remove",
            Action::Show => "show",
        }
    }

    /// Actions that may join the guild's call or move it to their channel.
    fn may_take_call(&self) -> bool {
        matches!(self, Action::Play(_) | Action::Resume | Action::TogglePause)
    }
}

/// Which session an action is aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionTarget {
    /// The session of the voice channel the invoking user sits in.
    Voice(SessionKey),
    /// The session whose status panel carries the pressed button.
    Panel(MessageId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActionRequest {
    pub target: SessionTarget,
    pub text_channel: ChannelId,
    pub from_button: bool,
    pub action: Action,
}

impl ActionRequest {
    pub fn command(key: SessionKey, text_channel: ChannelId, action: Action) -> Self {
        Self {
            target: SessionTarget::Voice(key),
            text_channel,
            from_button: false,
            action,
        }
    }

    pub fn button(panel: MessageId, text_channel: ChannelId, action: Action) -> Self {
        Self {
            target: SessionTarget::Panel(panel),
            text_channel,
            from_button: true,
            action,
        }
    }
}

impl MusicError {
    /// Failures that happen after the session was already changed, so the panel
    /// still needs to catch up.
    fn left_session_changed(&self) -> bool {
        matches!(
            self,
            MusicError::PlaybackSetupError(_) | MusicError::JoinError(_)
        )
    }
}

impl MusicManager {
    /// Execute one action against its session and refresh the status panel.
    ///
    /// Only `play` creates a session. A rejected action leaves every session as it was.
    pub async fn apply(&mut self, request: ActionRequest) -> MusicResult<()> {
        let ActionRequest {
            target,
            text_channel,
            from_button,
            action,
        } = request;

        let key = match target {
            SessionTarget::Voice(key) => key,
            SessionTarget::Panel(message_id) => self
                .sessions
                .find_by_status_message(message_id)
                .ok_or(MusicError::StalePanel)?,
        };

        let name = action.name();
        debug!("Applying {} in guild {}", name, key.guild_id);

        if let Err(e) = self.admit(key, &action).await {
            debug!("{} rejected in guild {}: {}", name, key.guild_id, e);
            return Err(e);
        }

        let io = &self.io;
        let session = if matches!(action, Action::Play(_)) {
            self.sessions.find_or_create(key, text_channel)
        } else {
            self.sessions
                .get_mut(&key)
                .ok_or(MusicError::NotConnected)?
        };

        let result = match action {
            Action::Play(tracks) => io.play(session, tracks).await,
            Action::Next => io.skip(session).await,
            Action::Previous => io.previous(session).await,
            Action::Pause => io.pause(session).await,
            Action::Resume => io.resume(session).await,
            Action::TogglePause => match io.transport.playback_state(key).await {
                PlaybackState::Playing => io.pause(session).await,
                _ => io.resume(session).await,
            },
            Action::Loop(enabled) => {
                session.queue.set_loop(enabled);
                info!("Loop set to {} for guild {}", enabled, key.guild_id);
                Ok(())
            }
            Action::Clear => io.clear(session).await,
            Action::Leave => io.leave(session).await,
            Action::Remove(index) => session.queue.remove(index).map(|track| {
                info!("Removed '{}' from the queue in guild {}", track.title(), key.guild_id);
            }),
            Action::Show => Ok(()),
        };

        match &result {
            Ok(()) => {
                session.touch();
                if !from_button {
                    session.text_channel = text_channel;
                }
                io.refresh_status(session, Refresh::for_request(from_button))
                    .await
            }
            Err(e) if e.left_session_changed() => {
                warn!("{} failed in guild {}: {}", name, key.guild_id, e);
                io.refresh_status(session, Refresh::for_request(from_button))
                    .await
            }
            Err(e) => debug!("{} rejected in guild {}: {}", name, key.guild_id, e),
        }

        result
    }

    /// Checks that run before any session is created or changed.
    async fn admit(&self, key: SessionKey, action: &Action) -> MusicResult<()> {
        match action {
            Action::Play(tracks) if tracks.is_empty() => {
                return Err(MusicError::ResolutionError(
                    "Nothing playable was found".to_string(),
                ));
            }
            Action::Play(_) => {}
            _ if self.sessions.get(&key).is_none() => return Err(MusicError::NotConnected),
            _ => {}
        }

        if action.may_take_call() {
            self.ensure_call_available(key).await?;
        }

        if let Action::Play(_) = action {
            // Joining can fail, so it happens before the session exists
            self.io.ensure_connected(key).await?;
        }

        Ok(())
    }

    /// A guild has one call. Another channel may take it over only once the session
    /// holding it has no audio loaded.
    async fn ensure_call_available(&self, key: SessionKey) -> MusicResult<()> {
        let Some(holder) = self.io.transport.connected_channel(key.guild_id).await else {
            return Ok(());
        };
        if holder == key.voice_channel_id {
            return Ok(());
        }

        let holder_key = SessionKey::new(key.guild_id, holder);
        let holder_active = self
            .sessions
            .get(&holder_key)
            .is_some_and(|session| {
                matches!(session.state(), PlayerState::Playing | PlayerState::Paused)
            });

        if holder_active
            || self.io.transport.playback_state(holder_key).await != PlaybackState::Idle
        {
            return Err(MusicError::ChannelBusy);
        }

        debug!(
            "Voice channel {} in guild {} is done with the call",
            holder, key.guild_id
        );
        Ok(())
    }
}

impl PlayerIo {
    async fn require_connection(&self, key: SessionKey) -> MusicResult<()> {
        if self.transport.is_connected(key).await {
            Ok(())
        } else {
            Err(MusicError::NotConnected)
        }
    }

    /// Expects the session's channel to hold the call already.
    async fn play(&self, session: &mut Session, tracks: Vec<Track>) -> MusicResult<()> {
        let was_fresh = session.queue.is_empty();
        let ran_out = session.is_stopped && session.end_of_queue;
        let prior_state = session.state();

        let added = tracks.len();
        session.queue.extend(tracks);
        session.end_of_queue = false;
        info!(
            "Queued {} track(s) in guild {} ({} total)",
            added,
            session.key.guild_id,
            session.queue.len()
        );

        if self.transport.playback_state(session.key).await != PlaybackState::Idle {
            return Ok(());
        }

        if was_fresh {
            session.queue.set_first_as_current();
        } else if ran_out {
            // The cursor still sits on the last finished track; step onto the new ones
            session.queue.next();
        } else if prior_state == PlayerState::Playing {
            debug!(
                "Track in guild {} just ended, leaving the advance to its completion",
                session.key.guild_id
            );
            return Ok(());
        }

        session.manual_advance = false;
        self.start_current(session).await
    }

    async fn skip(&self, session: &mut Session) -> MusicResult<()> {
        self.require_connection(session.key).await?;
        if !session.queue.has_next() {
            return Err(MusicError::NoNextTrack);
        }
        self.advance_manually(session, Queue::next).await
    }

    async fn previous(&self, session: &mut Session) -> MusicResult<()> {
        self.require_connection(session.key).await?;
        if !session.queue.has_previous() {
            return Err(MusicError::NoPreviousTrack);
        }
        self.advance_manually(session, Queue::previous).await?;
        session.end_of_queue = false;
        Ok(())
    }

    /// Move the cursor and hand the new current track to the continuation path.
    ///
    /// With audio active, stopping it produces the completion that starts the new
    /// track. With nothing active there is no completion coming, so the continuation
    /// runs right away.
    async fn advance_manually(
        &self,
        session: &mut Session,
        step: fn(&mut Queue) -> bool,
    ) -> MusicResult<()> {
        let active = self.transport.playback_state(session.key).await != PlaybackState::Idle;

        if active {
            self.transport.stop(session.key).await?;
        }

        step(&mut session.queue);
        session.is_paused = false;

        if active {
            session.manual_advance = true;
            Ok(())
        } else {
            session.manual_advance = false;
            self.continue_playback(session, Advance::AlreadyMoved).await
        }
    }

    async fn pause(&self, session: &mut Session) -> MusicResult<()> {
        let guild_id = session.key.guild_id;
        if self.transport.playback_state(session.key).await != PlaybackState::Playing {
            return Err(MusicError::NothingPlaying);
        }
        self.transport.pause(session.key).await?;
        session.is_paused = true;
        info!("Paused playback in guild {}", guild_id);
        Ok(())
    }

    async fn resume(&self, session: &mut Session) -> MusicResult<()> {
        let guild_id = session.key.guild_id;
        match self.transport.playback_state(session.key).await {
            PlaybackState::Paused => {
                self.transport.resume(session.key).await?;
                session.is_paused = false;
                session.is_stopped = false;
                info!("Resumed playback in guild {}", guild_id);
                Ok(())
            }
            PlaybackState::Idle if session.queue.current().is_some() => {
                info!(
                    "No live source in guild {}, restarting the current track",
                    guild_id
                );
                self.ensure_connected(session.key).await?;
                session.manual_advance = false;
                self.start_current(session).await
            }
            _ => Err(MusicError::NothingToResume),
        }
    }

    async fn clear(&self, session: &mut Session) -> MusicResult<()> {
        let guild_id = session.key.guild_id;
        if self.transport.playback_state(session.key).await != PlaybackState::Idle {
            if let Err(e) = self.transport.stop(session.key).await {
                warn!("Failed to stop playback in guild {}: {}", guild_id, e);
            }
        }

        session.queue.clear_queue();
        // Whatever completion the stop produces belongs to the old queue
        session.generation += 1;
        session.manual_advance = false;
        session.is_stopped = true;
        session.is_paused = false;
        session.end_of_queue = true;
        info!("Cleared the queue in guild {}", guild_id);
        Ok(())
    }

    async fn leave(&self, session: &mut Session) -> MusicResult<()> {
        self.require_connection(session.key).await?;
        self.transport.disconnect(session.key.guild_id).await?;

        session.generation += 1;
        session.manual_advance = false;
        session.is_stopped = true;
        info!("Left voice in guild {}", session.key.guild_id);
        Ok(())
    }
}

use serenity::model::id::ChannelId;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::commands::music::audio_sources::Resolver;

use super::actions::{Action, ActionRequest, SessionTarget};
use super::embedded_messages::{Notice, PlayerView, StatusDisplay};
use super::event_handlers::{Completion, ContinuationBridge};
use super::session::{Session, SessionKey, SessionRegistry};
use super::voice::VoiceTransport;

/// How often the scheduler looks for idle sessions to evict.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Errors that can occur during music operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MusicError {
    #[error("Not in a guild")]
    NotInGuild,

    #[error("You must be connected to a voice channel")]
    NotInVoiceChannel,

    #[error("Not connected to a voice channel")]
    NotConnected,

    #[error("Failed to join voice channel: {0}")]
    JoinError(String),

    #[error("Already playing in another voice channel of this server")]
    ChannelBusy,

    #[error("There is no next track in the queue")]
    NoNextTrack,

    #[error("There is no previous track in the queue")]
    NoPreviousTrack,

    #[error("Nothing is playing")]
    NothingPlaying,

    #[error("Nothing to resume")]
    NothingToResume,

    #[error("Could not resolve track: {0}")]
    ResolutionError(String),

    #[error("Failed to prepare audio: {0}")]
    PlaybackSetupError(String),

    #[error("Failed to control the current track: {0}")]
    TrackControl(String),

    #[error("External API error: {0}")]
    ExternalApiError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Position {} is out of range for a queue of {len} tracks", .index + 1)]
    OutOfRange { index: usize, len: usize },

    #[error("The current track cannot be removed, skip it instead")]
    CannotRemoveCurrent,

    #[error("This player panel is no longer active")]
    StalePanel,

    #[error("The music player is not running")]
    SchedulerUnavailable,
}

/// Result type for music operations
pub type MusicResult<T> = Result<T, MusicError>;

/// Work items executed one at a time by the scheduler task.
#[derive(Debug)]
pub enum Job {
    /// A user action plus the channel its result is reported on.
    Action(ActionRequest, oneshot::Sender<MusicResult<()>>),
    /// The audio backend finished (or failed) a track.
    TrackEnded(Completion),
}

pub type JobReceiver = mpsc::UnboundedReceiver<Job>;

/// Cloneable entry point into the scheduler. Commands, buttons and continuation
/// bridges all go through one of these.
#[derive(Clone, Debug)]
pub struct PlayerHandle {
    jobs: mpsc::UnboundedSender<Job>,
}

impl PlayerHandle {
    pub fn new() -> (Self, JobReceiver) {
        let (jobs, receiver) = mpsc::unbounded_channel();
        (Self { jobs }, receiver)
    }

    /// Run an action on the scheduler and wait for its outcome.
    pub async fn submit(&self, request: ActionRequest) -> MusicResult<()> {
        let (reply, outcome) = oneshot::channel();
        self.jobs
            .send(Job::Action(request, reply))
            .map_err(|_| MusicError::SchedulerUnavailable)?;
        outcome.await.map_err(|_| MusicError::SchedulerUnavailable)?
    }

    /// Resolve `query` on the caller's task, then append the result to the session.
    ///
    /// Resolution can take seconds and is deliberately kept off the scheduler. Whatever
    /// the session looks like once it finishes (even freshly cleared), the tracks are
    /// appended to that state. Returns the number of tracks added.
    pub async fn play_query(
        &self,
        resolver: &dyn Resolver,
        key: SessionKey,
        text_channel: ChannelId,
        query: &str,
    ) -> MusicResult<usize> {
        let tracks = resolver.resolve(query).await?;
        if tracks.is_empty() {
            return Err(MusicError::ResolutionError(format!(
                "No playable tracks found for {}",
                query
            )));
        }

        let added = tracks.len();
        self.submit(ActionRequest {
            target: SessionTarget::Voice(key),
            text_channel,
            from_button: false,
            action: Action::Play(tracks),
        })
        .await?;

        Ok(added)
    }

    pub(crate) fn bridge(&self, key: SessionKey, generation: u64) -> ContinuationBridge {
        ContinuationBridge::new(key, generation, self.jobs.clone())
    }
}

/// How the status panel is refreshed after a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    /// Edit the existing panel (button presses, automatic continuation).
    InPlace,
    /// Delete the old panel and post a new one (fresh commands).
    Replace,
}

impl Refresh {
    pub fn for_request(from_button: bool) -> Self {
        if from_button {
            Refresh::InPlace
        } else {
            Refresh::Replace
        }
    }
}

/// The collaborators the scheduler drives. Kept apart from the registry so a borrowed
/// session and the collaborators can be used side by side.
pub(crate) struct PlayerIo {
    pub(crate) transport: Arc<dyn VoiceTransport>,
    pub(crate) display: Arc<dyn StatusDisplay>,
    pub(crate) handle: PlayerHandle,
}

impl PlayerIo {
    pub(crate) async fn ensure_connected(&self, key: SessionKey) -> MusicResult<()> {
        if !self.transport.is_connected(key).await {
            info!(
                "Connecting to voice channel {} in guild {}",
                key.voice_channel_id, key.guild_id
            );
            self.transport.connect(key).await?;
        }
        Ok(())
    }

    /// Build a fresh source for the current track and start it, installing a
    /// continuation bridge tagged with a new generation.
    pub(crate) async fn start_current(&self, session: &mut Session) -> MusicResult<()> {
        let track = session
            .queue
            .current()
            .cloned()
            .ok_or(MusicError::NothingPlaying)?;

        session.generation += 1;
        let bridge = self.handle.bridge(session.key, session.generation);

        if let Err(err) = self
            .transport
            .play(session.key, &track, bridge)
            .await
        {
            session.is_stopped = true;
            return Err(err);
        }

        session.is_paused = false;
        session.is_stopped = false;
        info!(
            "Now playing '{}' in guild {} (generation {})",
            track.title(),
            session.key.guild_id,
            session.generation
        );
        Ok(())
    }

    pub(crate) async fn refresh_status(&self, session: &mut Session, refresh: Refresh) {
        let view = PlayerView::from_session(session);

        if let (Refresh::InPlace, Some(message)) = (refresh, session.status_message) {
            match self.display.edit(message, &view).await {
                Ok(()) => return,
                Err(e) => debug!("Failed to update existing panel, sending new one: {}", e),
            }
        } else if let Some(message) = session.status_message.take() {
            if let Err(e) = self.display.delete(message).await {
                warn!(
                    "Failed to delete player message {} in channel {}: {}",
                    message.message_id, message.channel_id, e
                );
            }
        }

        match self.display.send_new(session.text_channel, &view).await {
            Ok(message) => session.status_message = Some(message),
            Err(e) => {
                session.status_message = None;
                warn!(
                    "Error sending music player message for guild {}: {}",
                    session.key.guild_id, e
                );
            }
        }
    }

    pub(crate) async fn notify(&self, session: &Session, notice: Notice) {
        if let Err(e) = self.display.notify(session.text_channel, &notice).await {
            warn!(
                "Failed to post notice to channel {}: {}",
                session.text_channel, e
            );
        }
    }
}

/// The single cooperative scheduler: owns every session and runs jobs strictly in order.
pub struct MusicManager {
    pub(crate) sessions: SessionRegistry,
    pub(crate) io: PlayerIo,
    idle_timeout: Duration,
}

impl MusicManager {
    pub fn new(
        transport: Arc<dyn VoiceTransport>,
        display: Arc<dyn StatusDisplay>,
        handle: PlayerHandle,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            sessions: SessionRegistry::new(),
            io: PlayerIo {
                transport,
                display,
                handle,
            },
            idle_timeout,
        }
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Drain the job queue until every handle is gone, sweeping idle sessions
    /// in between.
    pub async fn run(mut self, mut jobs: JobReceiver) {
        let mut sweep = tokio::time::interval(SWEEP_INTERVAL);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Music scheduler started");

        loop {
            tokio::select! {
                job = jobs.recv() => match job {
                    Some(job) => self.process(job).await,
                    None => break,
                },
                _ = sweep.tick() => self.evict_idle_sessions(Instant::now()),
            }
        }

        info!("Music scheduler stopped");
    }

    pub async fn process(&mut self, job: Job) {
        match job {
            Job::Action(request, reply) => {
                let outcome = self.apply(request).await;
                if reply.send(outcome).is_err() {
                    debug!("Requester went away before its action finished");
                }
            }
            Job::TrackEnded(completion) => self.on_track_end(completion).await,
        }
    }

    pub fn evict_idle_sessions(&mut self, now: Instant) {
        let evicted = self.sessions.evict_idle(self.idle_timeout, now);
        if !evicted.is_empty() {
            info!("Evicted {} idle session(s)", evicted.len());
        }
    }
}

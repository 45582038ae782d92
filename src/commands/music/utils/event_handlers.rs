use serenity::async_trait;
use songbird::tracks::PlayMode;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, warn};

use super::embedded_messages::Notice;
use super::music_manager::{Job, MusicManager, MusicResult, PlayerIo, Refresh};
use super::session::{Session, SessionKey};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackOutcome {
    /// The audio ran out or was stopped.
    Ended,
    Failed(String),
}

/// A completion signal, tagged with the session and the generation it was installed for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub key: SessionKey,
    pub generation: u64,
    pub outcome: TrackOutcome,
}

/// The only thing the audio backend holds on to. Signalling never blocks and never
/// touches session state; it just queues a job for the scheduler.
#[derive(Debug, Clone)]
pub struct ContinuationBridge {
    key: SessionKey,
    generation: u64,
    jobs: UnboundedSender<Job>,
}

impl ContinuationBridge {
    pub(crate) fn new(key: SessionKey, generation: u64, jobs: UnboundedSender<Job>) -> Self {
        Self {
            key,
            generation,
            jobs,
        }
    }

    pub fn key(&self) -> SessionKey {
        self.key
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn track_ended(&self) {
        self.signal(TrackOutcome::Ended);
    }

    pub fn track_failed(&self, reason: impl Into<String>) {
        self.signal(TrackOutcome::Failed(reason.into()));
    }

    fn signal(&self, outcome: TrackOutcome) {
        let completion = Completion {
            key: self.key,
            generation: self.generation,
            outcome,
        };
        if let Err(e) = self.jobs.send(Job::TrackEnded(completion)) {
            error!(
                "Could not hand track completion for guild {} to the scheduler: {}",
                self.key.guild_id, e
            );
        }
    }
}

/// Event handler for when a song ends
pub struct TrackEndNotifier {
    pub bridge: ContinuationBridge,
}

#[async_trait]
impl songbird::EventHandler for TrackEndNotifier {
    async fn act(&self, ctx: &songbird::EventContext<'_>) -> Option<songbird::Event> {
        if let songbird::EventContext::Track(tracks) = ctx {
            match tracks.first().map(|(state, _)| &state.playing) {
                Some(PlayMode::Errored(e)) => self.bridge.track_failed(format!("{:?}", e)),
                _ => self.bridge.track_ended(),
            }
        }
        None
    }
}

/// How the cursor relates to the track that just ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Advance {
    /// The track ran to its end; the cursor still points at it.
    Natural,
    /// Skip or previous already put the cursor on the next track to play.
    AlreadyMoved,
}

impl MusicManager {
    pub(crate) async fn on_track_end(&mut self, completion: Completion) {
        let Some(session) = self.sessions.get_mut(&completion.key) else {
            debug!(
                "Dropping completion for unknown session in guild {}",
                completion.key.guild_id
            );
            return;
        };

        if completion.generation != session.generation {
            debug!(
                "Dropping stale completion for guild {} (generation {}, current {})",
                completion.key.guild_id, completion.generation, session.generation
            );
            return;
        }

        if session.is_paused {
            info!(
                "Ignoring completion in guild {}: playback is paused",
                completion.key.guild_id
            );
            return;
        }

        // Retire the generation so a second signal for the same audio is stale
        session.generation += 1;
        session.touch();

        if let TrackOutcome::Failed(reason) = completion.outcome {
            warn!(
                "Track failed in guild {}: {}",
                completion.key.guild_id, reason
            );
            session.is_stopped = true;
            session.manual_advance = false;
            self.io.notify(session, Notice::PlaybackFailed(reason)).await;
            self.io.refresh_status(session, Refresh::InPlace).await;
            return;
        }

        let advance = if std::mem::take(&mut session.manual_advance) {
            Advance::AlreadyMoved
        } else {
            Advance::Natural
        };

        if let Err(e) = self.io.continue_playback(session, advance).await {
            warn!(
                "Could not continue playback in guild {}: {}",
                completion.key.guild_id, e
            );
            self.io
                .notify(session, Notice::PlaybackFailed(e.to_string()))
                .await;
        }
        self.io.refresh_status(session, Refresh::InPlace).await;
    }
}

impl PlayerIo {
    /// Pick the track to play after a completion and start it.
    pub(crate) async fn continue_playback(
        &self,
        session: &mut Session,
        advance: Advance,
    ) -> MusicResult<()> {
        match advance {
            Advance::Natural => {
                if session.end_of_queue && !session.queue.is_loop_enabled() {
                    self.finish(session).await;
                    return Ok(());
                }
                if !session.queue.next() {
                    self.finish(session).await;
                    return Ok(());
                }
            }
            Advance::AlreadyMoved => {
                if session.queue.current_index().is_none() && !session.queue.next() {
                    self.finish(session).await;
                    return Ok(());
                }
            }
        }

        session.look_ahead();

        let started = match self.ensure_connected(session.key).await {
            Ok(()) => self.start_current(session).await,
            Err(e) => Err(e),
        };
        if started.is_err() {
            session.is_stopped = true;
        }
        started
    }

    async fn finish(&self, session: &mut Session) {
        session.is_stopped = true;
        session.end_of_queue = true;
        info!("Queue finished in guild {}", session.key.guild_id);
        self.notify(session, Notice::QueueFinished).await;
    }
}

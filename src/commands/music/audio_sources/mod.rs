//! Turning user queries into playable tracks.
//!
//! [`Resolver`] is the seam the player relies on. [`QueryResolver`] is the real one:
//! Spotify links (when enabled) become YouTube searches, every other URL and free
//! text goes through `yt-dlp`.

#[cfg(feature = "spotify")]
pub mod spotify;
pub mod track;
pub mod youtube;

use serenity::async_trait;
use url::Url;

use crate::commands::music::utils::music_manager::MusicError;
use track::Track;
use youtube::YoutubeApi;

#[cfg(feature = "spotify")]
use futures::stream::{self, StreamExt};
#[cfg(feature = "spotify")]
use spotify::SpotifyApi;
#[cfg(feature = "spotify")]
use tracing::{info, warn};

/// A specialized `Result` type for operations within the `audio_sources` module.
pub type AudioSourceResult<T> = Result<T, MusicError>;

/// Spotify tracks searched on YouTube at the same time.
#[cfg(feature = "spotify")]
const SEARCH_CONCURRENCY: usize = 4;

#[async_trait]
pub trait Resolver: Send + Sync {
    /// Resolve a query into one or more tracks. Playlists keep their order.
    async fn resolve(&self, query: &str) -> AudioSourceResult<Vec<Track>>;
}

/// A utility struct providing general helper functions related to audio sources.
pub struct AudioSource;

impl AudioSource {
    /// Performs a basic check if the input string can be parsed as a URL.
    pub fn is_url(input: &str) -> bool {
        Url::parse(input).is_ok()
    }
}

pub struct QueryResolver {
    youtube: YoutubeApi,
    #[cfg(feature = "spotify")]
    spotify: Option<SpotifyApi>,
}

impl QueryResolver {
    pub fn new(youtube: YoutubeApi) -> Self {
        Self {
            youtube,
            #[cfg(feature = "spotify")]
            spotify: None,
        }
    }

    #[cfg(feature = "spotify")]
    pub fn with_spotify(mut self, spotify: SpotifyApi) -> Self {
        self.spotify = Some(spotify);
        self
    }

    #[cfg(feature = "spotify")]
    async fn resolve_spotify(&self, url: &str) -> AudioSourceResult<Vec<Track>> {
        let spotify = self.spotify.as_ref().ok_or_else(|| {
            MusicError::ConfigError("Spotify credentials are not configured".to_string())
        })?;

        let queries: Vec<String> = spotify
            .get_tracks(url)
            .await?
            .iter()
            .map(|track| track.youtube_search_query())
            .collect();
        info!("Searching YouTube for {} Spotify track(s)", queries.len());

        let results: Vec<_> = stream::iter(queries)
            .map(|query| async move {
                let result = self.youtube.search(&query).await;
                (query, result)
            })
            .buffered(SEARCH_CONCURRENCY)
            .collect()
            .await;

        let tracks: Vec<Track> = results
            .into_iter()
            .filter_map(|(query, result)| match result {
                Ok(track) => Some(track),
                Err(e) => {
                    warn!("Dropping Spotify track '{}': {}", query, e);
                    None
                }
            })
            .collect();

        if tracks.is_empty() {
            return Err(MusicError::ResolutionError(format!(
                "None of the tracks in {} could be found on YouTube",
                url
            )));
        }

        Ok(tracks)
    }
}

#[async_trait]
impl Resolver for QueryResolver {
    async fn resolve(&self, query: &str) -> AudioSourceResult<Vec<Track>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(MusicError::ResolutionError(
                "Please provide a URL or search term".to_string(),
            ));
        }

        #[cfg(feature = "spotify")]
        if SpotifyApi::is_spotify_url(query) {
            return self.resolve_spotify(query).await;
        }

        if AudioSource::is_url(query) {
            self.youtube.from_url(query).await
        } else {
            self.youtube.search(query).await.map(|track| vec![track])
        }
    }
}

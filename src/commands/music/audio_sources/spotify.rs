//! Spotify Web API client (client credentials flow).
//!
//! Spotify never supplies playable audio. Its tracks are only turned into YouTube search
//! queries by the resolver.

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use regex::Regex;
use reqwest::header;
use serde::Deserialize;
use serde_json::Value;
use std::sync::LazyLock;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::commands::music::utils::music_manager::MusicError;
use crate::config::SpotifyCredentials;

/// Result type specific to Spotify API operations.
pub type SpotifyResult<T> = Result<T, MusicError>;

pub const ACCOUNTS_URL: &str = "https://accounts.spotify.com";
pub const API_URL: &str = "https://api.spotify.com/v1";

/// Data structure for Spotify track information
#[derive(Clone, Debug, PartialEq)]
pub struct SpotifyTrack {
    pub name: String,
    pub artists: Vec<String>,
}

impl SpotifyTrack {
    /// Get search query for YouTube from a Spotify track
    pub fn youtube_search_query(&self) -> String {
        format!("{} by {} audio", self.name, self.artists.join(", "))
    }

    /// Local files and unavailable entries carry no id and are skipped.
    fn from_json(track: &Value) -> Option<Self> {
        track["id"].as_str()?;
        let name = track["name"].as_str()?.to_string();
        let artists = track["artists"]
            .as_array()
            .map(|arr| {
                arr.iter()
                    .filter_map(|a| a["name"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        Some(Self { name, artists })
    }
}

/// Authentication tokens for Spotify API
#[derive(Debug, Deserialize)]
struct SpotifyToken {
    access_token: String,
    expires_in: u64,
    #[serde(skip, default = "Instant::now")]
    created_at: Instant,
}

impl SpotifyToken {
    fn is_expired(&self) -> bool {
        let expiry = Duration::from_secs(self.expires_in);
        // Consider it expired 30 seconds before actual expiry
        self.created_at.elapsed() > expiry.saturating_sub(Duration::from_secs(30))
    }
}

static SPOTIFY_TRACK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(https?://)?(open\.spotify\.com|spotify)/track/([a-zA-Z0-9]+)(\?.*)?$")
        .expect("valid regex")
});

static SPOTIFY_PLAYLIST_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(https?://)?(open\.spotify\.com|spotify)/playlist/([a-zA-Z0-9]+)(\?.*)?$")
        .expect("valid regex")
});

static SPOTIFY_ALBUM_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(https?://)?(open\.spotify\.com|spotify)/album/([a-zA-Z0-9]+)(\?.*)?$")
        .expect("valid regex")
});

/// What a Spotify link points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpotifyLink {
    Track(String),
    Playlist(String),
    Album(String),
}

impl SpotifyLink {
    pub fn parse(url: &str) -> Option<Self> {
        let id = |regex: &Regex| {
            regex
                .captures(url)
                .and_then(|cap| cap.get(3))
                .map(|m| m.as_str().to_string())
        };

        id(&SPOTIFY_TRACK_REGEX)
            .map(SpotifyLink::Track)
            .or_else(|| id(&SPOTIFY_PLAYLIST_REGEX).map(SpotifyLink::Playlist))
            .or_else(|| id(&SPOTIFY_ALBUM_REGEX).map(SpotifyLink::Album))
    }
}

/// Spotify API client
pub struct SpotifyApi {
    credentials: SpotifyCredentials,
    http: reqwest::Client,
    accounts_url: String,
    api_url: String,
    token: Mutex<Option<SpotifyToken>>,
}

impl SpotifyApi {
    pub fn new(credentials: SpotifyCredentials, http: reqwest::Client) -> Self {
        Self::with_base_urls(credentials, http, ACCOUNTS_URL, API_URL)
    }

    pub fn with_base_urls(
        credentials: SpotifyCredentials,
        http: reqwest::Client,
        accounts_url: impl Into<String>,
        api_url: impl Into<String>,
    ) -> Self {
        Self {
            credentials,
            http,
            accounts_url: accounts_url.into(),
            api_url: api_url.into(),
            token: Mutex::new(None),
        }
    }

    /// Check if the given URL is a Spotify URL
    pub fn is_spotify_url(url: &str) -> bool {
        SpotifyLink::parse(url).is_some()
    }

    /// All tracks behind a track, album or playlist link, in order.
    pub async fn get_tracks(&self, url: &str) -> SpotifyResult<Vec<SpotifyTrack>> {
        let link = SpotifyLink::parse(url)
            .ok_or_else(|| MusicError::ResolutionError(format!("Not a Spotify link: {}", url)))?;
        info!("Fetching Spotify {:?}", link);

        match link {
            SpotifyLink::Track(id) => self.get_track(&id).await.map(|track| vec![track]),
            SpotifyLink::Playlist(id) => {
                self.get_paged(
                    format!("{}/playlists/{}/tracks?limit=50", self.api_url, id),
                    |item| &item["track"],
                )
                .await
            }
            SpotifyLink::Album(id) => {
                self.get_paged(
                    format!("{}/albums/{}/tracks?limit=50", self.api_url, id),
                    |item| item,
                )
                .await
            }
        }
    }

    /// Get an access token for Spotify API
    async fn get_access_token(&self) -> SpotifyResult<String> {
        let mut token_lock = self.token.lock().await;

        // Return existing token if it's still valid
        if let Some(token) = token_lock.as_ref().filter(|token| !token.is_expired()) {
            return Ok(token.access_token.clone());
        }

        debug!("Requesting a new Spotify access token");
        let auth = BASE64_STANDARD.encode(format!(
            "{}:{}",
            self.credentials.client_id, self.credentials.client_secret
        ));

        let params = [("grant_type", "client_credentials")];
        let response = self
            .http
            .post(format!("{}/api/token", self.accounts_url))
            .header(header::AUTHORIZATION, format!("Basic {}", auth))
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                MusicError::ExternalApiError(format!("Failed to request Spotify token: {}", e))
            })?;

        let token = check_status(response)
            .await?
            .json::<SpotifyToken>()
            .await
            .map_err(|e| {
                MusicError::ExternalApiError(format!("Failed to parse Spotify token: {}", e))
            })?;

        let access_token = token.access_token.clone();
        *token_lock = Some(token);

        Ok(access_token)
    }

    async fn get_json(&self, url: &str) -> SpotifyResult<Value> {
        let token = self.get_access_token().await?;
        let response = self
            .http
            .get(url)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .send()
            .await
            .map_err(|e| MusicError::ExternalApiError(format!("Failed to request {}: {}", url, e)))?;

        check_status(response).await?.json().await.map_err(|e| {
            MusicError::ExternalApiError(format!("Failed to parse Spotify response: {}", e))
        })
    }

    /// Get track information from Spotify API
    pub async fn get_track(&self, track_id: &str) -> SpotifyResult<SpotifyTrack> {
        let data = self
            .get_json(&format!("{}/tracks/{}", self.api_url, track_id))
            .await?;

        SpotifyTrack::from_json(&data)
            .ok_or_else(|| MusicError::ExternalApiError("Missing track data".to_string()))
    }

    /// Walk a paginated listing, following `next` until it runs out.
    async fn get_paged<F>(&self, first_page: String, track_of: F) -> SpotifyResult<Vec<SpotifyTrack>>
    where
        F: Fn(&Value) -> &Value,
    {
        let mut tracks = Vec::new();
        let mut url = Some(first_page);

        while let Some(page_url) = url {
            let page = self.get_json(&page_url).await?;

            if let Some(items) = page["items"].as_array() {
                tracks.extend(items.iter().filter_map(|item| SpotifyTrack::from_json(track_of(item))));
            }

            url = page["next"].as_str().map(str::to_string);
        }

        Ok(tracks)
    }
}

async fn check_status(response: reqwest::Response) -> SpotifyResult<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let text = response
        .text()
        .await
        .unwrap_or_else(|_| "Cannot read response".to_string());
    Err(MusicError::ExternalApiError(format!(
        "Spotify API error: {} - {}",
        status, text
    )))
}

//! Runtime configuration, read from the process environment (after `.env` is loaded).

use humantime_serde::re::humantime;
use std::time::Duration;
use thiserror::Error;

/// Prefix for text commands.
pub const DEFAULT_PREFIX: &str = "]";
/// Sessions that have been idle or stopped this long are evicted.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_YTDLP_PATH: &str = "yt-dlp";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} not specified in env")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Client-credentials pair for the Spotify Web API.
#[derive(Debug, Clone, PartialEq)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub command_prefix: String,
    pub session_idle_timeout: Duration,
    pub spotify: Option<SpotifyCredentials>,
    pub ytdlp_path: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let discord_token = get("DISCORD_TOKEN").ok_or(ConfigError::Missing("DISCORD_TOKEN"))?;

        let command_prefix = get("COMMAND_PREFIX").unwrap_or_else(|| DEFAULT_PREFIX.to_string());

        let session_idle_timeout = match get("SESSION_IDLE_TIMEOUT") {
            Some(raw) => humantime::parse_duration(raw.trim()).map_err(|e| ConfigError::Invalid {
                key: "SESSION_IDLE_TIMEOUT",
                reason: e.to_string(),
            })?,
            None => DEFAULT_IDLE_TIMEOUT,
        };

        // Spotify is optional, but half a credential pair is a mistake worth failing on
        let spotify = match (get("SPOTIFY_CLIENT_ID"), get("SPOTIFY_CLIENT_SECRET")) {
            (Some(client_id), Some(client_secret)) => Some(SpotifyCredentials {
                client_id,
                client_secret,
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing("SPOTIFY_CLIENT_SECRET")),
            (None, Some(_)) => return Err(ConfigError::Missing("SPOTIFY_CLIENT_ID")),
        };

        let ytdlp_path = get("YTDLP_PATH").unwrap_or_else(|| DEFAULT_YTDLP_PATH.to_string());

        Ok(Self {
            discord_token,
            command_prefix,
            session_idle_timeout,
            spotify,
            ytdlp_path,
        })
    }
}

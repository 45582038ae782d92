//! Metadata lookup through the `yt-dlp` command-line tool.
//!
//! Only metadata is fetched here. The audio stream itself is extracted again by songbird
//! every time a track starts, since stream URLs expire.

use serde_json::Value;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};
use url::Url;

use crate::commands::music::utils::music_manager::MusicError;

use super::AudioSourceResult;
use super::track::Track;

pub struct YoutubeApi {
    ytdlp_path: String,
}

impl YoutubeApi {
    pub fn new(ytdlp_path: impl Into<String>) -> Self {
        Self {
            ytdlp_path: ytdlp_path.into(),
        }
    }

    /// Checks if the input string is a YouTube URL (watch page, playlist or youtu.be).
    pub fn is_youtube_url(query: &str) -> bool {
        match Url::parse(query) {
            Ok(url) => url.host_str().is_some_and(|host| {
                matches!(
                    host,
                    "www.youtube.com" | "youtube.com" | "m.youtube.com" | "music.youtube.com"
                        | "youtu.be"
                )
            }),
            Err(_) => false,
        }
    }

    /// Resolve a URL. Playlists expand to one track per entry, in playlist order.
    pub async fn from_url(&self, url: &str) -> AudioSourceResult<Vec<Track>> {
        info!("Fetching metadata for URL: {}", url);
        let stdout = self.run(url).await?;
        parse_ytdlp_output(&stdout)
    }

    /// Resolve the first YouTube search result for `search_term`.
    pub async fn search(&self, search_term: &str) -> AudioSourceResult<Track> {
        info!("Searching YouTube for: {}", search_term);
        let stdout = self.run(&format!("ytsearch1:{}", search_term)).await?;
        parse_ytdlp_output(&stdout)?
            .into_iter()
            .next()
            .ok_or_else(|| MusicError::ResolutionError(format!("No results for {}", search_term)))
    }

    async fn run(&self, target: &str) -> AudioSourceResult<String> {
        let output = Command::new(&self.ytdlp_path)
            .args([
                "-j",              // Output as JSON, one object per line
                "--flat-playlist", // Don't resolve each playlist entry separately
                "--no-warnings",
                target,
            ])
            .output()
            .await
            .map_err(|e| {
                MusicError::ResolutionError(format!("Failed to run {}: {}", self.ytdlp_path, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MusicError::ResolutionError(format!(
                "yt-dlp failed for {}: {}",
                target,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Parse `yt-dlp -j --flat-playlist` output: one JSON object per line.
pub fn parse_ytdlp_output(stdout: &str) -> AudioSourceResult<Vec<Track>> {
    let mut tracks = Vec::new();

    for line in stdout.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let entry: Value = serde_json::from_str(line).map_err(|e| {
            MusicError::ResolutionError(format!("Failed to parse video metadata: {}", e))
        })?;

        match track_from_entry(&entry) {
            Some(track) => tracks.push(track),
            None => debug!("Skipping yt-dlp entry without a usable link"),
        }
    }

    if tracks.is_empty() {
        return Err(MusicError::ResolutionError(
            "No playable tracks found".to_string(),
        ));
    }

    Ok(tracks)
}

fn track_from_entry(entry: &Value) -> Option<Track> {
    let link = entry["webpage_url"]
        .as_str()
        .or_else(|| entry["url"].as_str().filter(|url| url.starts_with("http")))
        .map(str::to_string)
        .or_else(|| {
            entry["id"]
                .as_str()
                .map(|id| format!("https://www.youtube.com/watch?v={}", id))
        })?;

    let title = entry["title"].as_str().unwrap_or("Unknown Title");

    let mut track = Track::new(title, link.clone()).with_link(link);

    let thumbnail = entry["thumbnail"].as_str().or_else(|| {
        entry["thumbnails"]
            .as_array()
            .and_then(|thumbnails| thumbnails.last())
            .and_then(|thumbnail| thumbnail["url"].as_str())
    });
    if let Some(thumbnail) = thumbnail {
        track = track.with_thumbnail(thumbnail);
    }

    if let Some(seconds) = entry["duration"].as_f64().filter(|s| *s >= 0.0) {
        track = track.with_duration(Duration::from_secs_f64(seconds));
    }

    Some(track)
}

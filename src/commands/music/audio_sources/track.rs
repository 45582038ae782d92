//! Defines `Track`, the resolved and playable unit every queue is made of.

use std::time::Duration;

/// One playable audio item. Immutable once resolved: the queue only ever hands out
/// shared references, and a refreshed stream is built from `source_url` at play time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    title: String,
    source_url: String,
    thumbnail_url: Option<String>,
    canonical_link: Option<String>,
    duration: Option<Duration>,
}

impl Track {
    pub fn new(title: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            source_url: source_url.into(),
            thumbnail_url: None,
            canonical_link: None,
            duration: None,
        }
    }

    pub fn with_thumbnail(mut self, thumbnail_url: impl Into<String>) -> Self {
        self.thumbnail_url = Some(thumbnail_url.into());
        self
    }

    pub fn with_link(mut self, canonical_link: impl Into<String>) -> Self {
        self.canonical_link = Some(canonical_link.into());
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Locator handed to the audio backend when building a source.
    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn thumbnail_url(&self) -> Option<&str> {
        self.thumbnail_url.as_deref()
    }

    pub fn canonical_link(&self) -> Option<&str> {
        self.canonical_link.as_deref()
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// Link shown to users: the canonical page if known, else the source itself.
    pub fn display_link(&self) -> &str {
        self.canonical_link().unwrap_or(&self.source_url)
    }
}

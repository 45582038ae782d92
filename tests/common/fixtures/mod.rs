//! Sample ids and tracks shared by the integration tests

use carrot_jams::commands::music::audio_sources::track::Track;
use carrot_jams::commands::music::utils::session::SessionKey;
use fake::Fake;
use fake::faker::lorem::en::Words;
use serenity::model::id::{ChannelId, GuildId};

pub const GUILD_ID: u64 = 123456789;
pub const VOICE_CHANNEL_ID: u64 = 555;
pub const OTHER_VOICE_CHANNEL_ID: u64 = 556;
pub const TEXT_CHANNEL_ID: u64 = 987654321;

pub fn guild() -> GuildId {
    GuildId::new(GUILD_ID)
}

pub fn session_key() -> SessionKey {
    SessionKey::new(guild(), ChannelId::new(VOICE_CHANNEL_ID))
}

/// A second voice channel of the same guild.
pub fn other_session_key() -> SessionKey {
    SessionKey::new(guild(), ChannelId::new(OTHER_VOICE_CHANNEL_ID))
}

pub fn text_channel() -> ChannelId {
    ChannelId::new(TEXT_CHANNEL_ID)
}

pub fn track(title: &str) -> Track {
    Track::new(title, format!("https://www.youtube.com/watch?v={}", title))
        .with_thumbnail(format!("https://i.ytimg.com/vi/{}/hqdefault.jpg", title))
}

pub fn tracks(titles: &[&str]) -> Vec<Track> {
    titles.iter().map(|title| track(title)).collect()
}

/// Tracks with generated titles. The position prefix keeps them distinct.
pub fn random_playlist(len: usize) -> Vec<Track> {
    (0..len)
        .map(|i| {
            let words: Vec<String> = Words(2..4).fake();
            track(&format!("{}-{}", i, words.join("-")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_playlist_titles_are_distinct() {
        let playlist = random_playlist(8);
        let mut titles: Vec<&str> = playlist.iter().map(Track::title).collect();
        titles.sort();
        titles.dedup();
        assert_eq!(titles.len(), 8);
    }
}

//! The per-session playlist: an append-only list of tracks, a cursor and a loop flag.
//!
//! Advancing never removes tracks. Played entries stay in place so `previous` can
//! return to them; only `clear_queue` (and the explicit indexed `remove`) shrink it.

use crate::commands::music::audio_sources::track::Track;

use super::music_manager::{MusicError, MusicResult};

#[derive(Debug, Clone, Default)]
pub struct Queue {
    tracks: Vec<Track>,
    // None until a track has been made current
    current: Option<usize>,
    loop_enabled: bool,
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a track. The first track ever enqueued becomes current, which does not
    /// mean it is playing.
    pub fn enqueue(&mut self, track: Track) {
        self.tracks.push(track);
        if self.current.is_none() {
            self.current = Some(0);
        }
        self.check_invariants();
    }

    pub fn extend<I>(&mut self, tracks: I)
    where
        I: IntoIterator<Item = Track>,
    {
        for track in tracks {
            self.enqueue(track);
        }
    }

    pub fn set_first_as_current(&mut self) {
        if !self.tracks.is_empty() {
            self.current = Some(0);
        }
    }

    pub fn has_next(&self) -> bool {
        if self.tracks.is_empty() {
            return false;
        }
        match self.current {
            None => true,
            Some(_) if self.loop_enabled => true,
            Some(index) => index + 1 < self.tracks.len(),
        }
    }

    /// Move the cursor forward, wrapping when looping. Returns false (and leaves the
    /// cursor alone) when there is nothing to advance to.
    pub fn next(&mut self) -> bool {
        if !self.has_next() {
            return false;
        }
        let len = self.tracks.len();
        self.current = Some(match self.current {
            None => 0,
            Some(index) if self.loop_enabled => (index + 1) % len,
            Some(index) => index + 1,
        });
        self.check_invariants();
        true
    }

    pub fn has_previous(&self) -> bool {
        match self.current {
            None => false,
            Some(_) if self.tracks.is_empty() => false,
            Some(_) if self.loop_enabled => true,
            Some(index) => index > 0,
        }
    }

    pub fn previous(&mut self) -> bool {
        if !self.has_previous() {
            return false;
        }
        let len = self.tracks.len();
        self.current = self.current.map(|index| {
            if self.loop_enabled {
                (index + len - 1) % len
            } else {
                index - 1
            }
        });
        self.check_invariants();
        true
    }

    /// Empty the queue, forget the cursor and turn looping off.
    pub fn clear_queue(&mut self) {
        self.tracks.clear();
        self.current = None;
        self.loop_enabled = false;
    }

    pub fn current(&self) -> Option<&Track> {
        self.current.and_then(|index| self.tracks.get(index))
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// True when the cursor sits on the last entry.
    pub fn is_last(&self) -> bool {
        self.current
            .is_some_and(|index| index + 1 == self.tracks.len())
    }

    pub fn is_loop_enabled(&self) -> bool {
        self.loop_enabled
    }

    pub fn set_loop(&mut self, enabled: bool) {
        self.loop_enabled = enabled;
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, index: usize) -> MusicResult<&Track> {
        self.tracks.get(index).ok_or(MusicError::OutOfRange {
            index,
            len: self.tracks.len(),
        })
    }

    /// Indexed write: swap the track stored at `index`, returning the old one.
    ///
    /// Together with [`Queue::get`] and [`Queue::remove`] this is the positional API
    /// offered to presentation code. The cursor is left alone; a replaced current entry
    /// is what plays the next time that entry is started.
    pub fn replace(&mut self, index: usize, track: Track) -> MusicResult<Track> {
        let len = self.tracks.len();
        let slot = self
            .tracks
            .get_mut(index)
            .ok_or(MusicError::OutOfRange { index, len })?;
        Ok(std::mem::replace(slot, track))
    }

    /// Delete the entry at `index`. The cursor keeps pointing at the same track, so
    /// the current entry itself cannot be removed.
    pub fn remove(&mut self, index: usize) -> MusicResult<Track> {
        let len = self.tracks.len();
        if index >= len {
            return Err(MusicError::OutOfRange { index, len });
        }
        match self.current {
            Some(current) if current == index => return Err(MusicError::CannotRemoveCurrent),
            Some(current) if index < current => self.current = Some(current - 1),
            _ => {}
        }
        let removed = self.tracks.remove(index);
        self.check_invariants();
        Ok(removed)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter()
    }

    fn check_invariants(&self) {
        debug_assert!(
            self.current.is_none_or(|index| index < self.tracks.len()),
            "queue cursor {:?} out of bounds for {} tracks",
            self.current,
            self.tracks.len()
        );
        debug_assert!(
            self.current.is_some() || self.tracks.is_empty(),
            "non-empty queue without a current track"
        );
    }
}

//! Playlist descriptors.

use serde::{Deserialize, Serialize};

use super::broadcast::{Broadcast, BroadcastStatus};

/// An ordered, cyclable list of broadcasts played one at a time under one
/// logical stream.
///
/// Owned by the datastore; the advancement engine mutates the index and
/// status and writes back through it. Item order is playback order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    pub playlist_id: String,
    pub status: BroadcastStatus,
    /// 0-based index of the item currently playing. Stays within bounds or
    /// wraps to 0.
    pub current_play_index: usize,
    pub items: Vec<Broadcast>,
}

impl Playlist {
    pub fn new(playlist_id: impl Into<String>, items: Vec<Broadcast>) -> Self {
        Self {
            playlist_id: playlist_id.into(),
            status: BroadcastStatus::Created,
            current_play_index: 0,
            items,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The item at the current play index, if the index is in bounds.
    pub fn current_item(&self) -> Option<&Broadcast> {
        self.items.get(self.current_play_index)
    }

    /// Whether a later item exists without wrapping.
    pub fn has_next(&self) -> bool {
        self.current_play_index + 1 < self.items.len()
    }

    /// Advance the index by one, wrapping to 0 at the end. Returns the new
    /// index.
    pub fn advance_wrapping(&mut self) -> usize {
        if !self.items.is_empty() {
            self.current_play_index = (self.current_play_index + 1) % self.items.len();
        }
        self.current_play_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playlist_of(n: usize) -> Playlist {
        let items = (0..n)
            .map(|i| Broadcast::new(format!("item-{i}"), format!("item {i}"), "http://example.com"))
            .collect();
        Playlist::new("pl-1", items)
    }

    #[test]
    fn advance_wraps_at_end() {
        let mut playlist = playlist_of(3);
        playlist.current_play_index = 2;
        assert_eq!(playlist.advance_wrapping(), 0);
        assert_eq!(playlist.advance_wrapping(), 1);
    }

    #[test]
    fn has_next_is_false_on_last_item() {
        let mut playlist = playlist_of(2);
        assert!(playlist.has_next());
        playlist.current_play_index = 1;
        assert!(!playlist.has_next());
    }

    #[test]
    fn empty_playlist_has_no_current_item() {
        let mut playlist = playlist_of(0);
        assert!(playlist.current_item().is_none());
        assert_eq!(playlist.advance_wrapping(), 0);
    }
}

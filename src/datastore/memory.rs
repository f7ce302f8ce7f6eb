//! In-memory datastore.
//!
//! Backs embedded deployments and tests. Every operation is keyed the same
//! way a database-backed implementation would key it, so the two are
//! interchangeable behind the [`DataStore`] trait.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::domain::{Broadcast, Playlist, StreamQuality};
use crate::{Error, Result};

use super::DataStore;

/// DashMap-backed [`DataStore`].
#[derive(Default)]
pub struct MemoryDataStore {
    broadcasts: DashMap<String, Broadcast>,
    playlists: DashMap<String, Playlist>,
}

impl MemoryDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a broadcast record.
    pub fn insert_broadcast(&self, broadcast: Broadcast) {
        self.broadcasts
            .insert(broadcast.stream_id.clone(), broadcast);
    }

    /// Seed a playlist record.
    pub fn insert_playlist(&self, playlist: Playlist) {
        self.playlists
            .insert(playlist.playlist_id.clone(), playlist);
    }

    pub fn get_broadcast(&self, stream_id: &str) -> Option<Broadcast> {
        self.broadcasts.get(stream_id).map(|b| b.clone())
    }
}

#[async_trait]
impl DataStore for MemoryDataStore {
    async fn update_source_quality(
        &self,
        stream_id: &str,
        quality: StreamQuality,
        frame_rate: u32,
        bitrate: u64,
    ) -> Result<()> {
        let mut broadcast = self
            .broadcasts
            .get_mut(stream_id)
            .ok_or_else(|| Error::not_found("Broadcast", stream_id))?;
        broadcast.set_quality(quality, frame_rate, bitrate);
        Ok(())
    }

    async fn get_playlist(&self, playlist_id: &str) -> Result<Playlist> {
        self.playlists
            .get(playlist_id)
            .map(|p| p.clone())
            .ok_or_else(|| Error::not_found("Playlist", playlist_id))
    }

    async fn edit_playlist(&self, playlist_id: &str, playlist: &Playlist) -> Result<bool> {
        match self.playlists.get_mut(playlist_id) {
            Some(mut stored) => {
                *stored = playlist.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_broadcast_fields(
        &self,
        stream_id: &str,
        broadcast: &Broadcast,
    ) -> Result<bool> {
        match self.broadcasts.get_mut(stream_id) {
            Some(mut stored) => {
                *stored = broadcast.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

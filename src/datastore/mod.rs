//! Persistence seam consumed by the manager.
//!
//! The manager never retries persistence failures; retry policy, if any,
//! belongs to the implementation behind this trait.

pub mod memory;

use async_trait::async_trait;

use crate::Result;
use crate::domain::{Broadcast, Playlist, StreamQuality};

pub use memory::MemoryDataStore;

/// Storage operations the manager depends on.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Record the reported quality metrics for a source stream.
    async fn update_source_quality(
        &self,
        stream_id: &str,
        quality: StreamQuality,
        frame_rate: u32,
        bitrate: u64,
    ) -> Result<()>;

    async fn get_playlist(&self, playlist_id: &str) -> Result<Playlist>;

    /// Replace a stored playlist. Returns false when the id is unknown.
    async fn edit_playlist(&self, playlist_id: &str, playlist: &Playlist) -> Result<bool>;

    /// Replace a stored broadcast. Returns false when the id is unknown.
    async fn update_broadcast_fields(&self, stream_id: &str, broadcast: &Broadcast)
    -> Result<bool>;
}

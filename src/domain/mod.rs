//! Domain model: stream descriptors and playlists.

pub mod broadcast;
pub mod playlist;

pub use broadcast::{Broadcast, BroadcastStatus, StreamQuality};
pub use playlist::Playlist;

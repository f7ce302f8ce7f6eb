//! Playlist advancement.
//!
//! The entry path scans forward from the current index, skipping items whose
//! URL fails the reachability probe, and stops at the end of the list. The
//! completion path advances unconditionally with wrap-around and does not
//! re-probe; a worker that fails immediately simply completes and advances
//! again on the next completion event.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::domain::{Broadcast, BroadcastStatus, Playlist};
use crate::fetcher::{CompletionListener, StreamFetcher};

use super::FetcherManager;
use super::events::FetcherManagerEvent;

/// Completion listener that chains a playlist's items.
///
/// Re-attaches itself to each replacement worker, so one advancer follows a
/// playlist for as long as it keeps broadcasting.
struct PlaylistAdvancer {
    manager: Weak<FetcherManager>,
    playlist_id: String,
    /// The item currently playing under this playlist.
    current: Mutex<Broadcast>,
}

impl CompletionListener for PlaylistAdvancer {
    fn stream_finished(self: Arc<Self>) {
        let Some(manager) = self.manager.upgrade() else {
            return;
        };
        tokio::spawn(async move { manager.advance_playlist(self).await });
    }
}

impl FetcherManager {
    /// Start playing a playlist from its current index.
    ///
    /// Items whose URL is unreachable are skipped with a forward scan (index
    /// advanced and persisted per skip, no wrap-around). When no reachable
    /// item remains the playlist is left exhausted: nothing is started and no
    /// further automatic action is taken.
    pub async fn start_playlist(
        self: &Arc<Self>,
        playlist: Playlist,
    ) -> Option<Arc<dyn StreamFetcher>> {
        let mut playlist = playlist;

        loop {
            let Some(item) = playlist.current_item().cloned() else {
                warn!(
                    playlist_id = %playlist.playlist_id,
                    index = playlist.current_play_index,
                    "playlist has no item at the current index"
                );
                return None;
            };

            if self.prober.check(&item.stream_url).await {
                return self.start_playlist_item(&mut playlist, item).await;
            }

            info!(
                playlist_id = %playlist.playlist_id,
                stream_id = %item.stream_id,
                url = %item.stream_url,
                "playlist item unreachable, skipping"
            );

            if !playlist.has_next() {
                warn!(playlist_id = %playlist.playlist_id, "no reachable item left in playlist");
                self.events.emit(FetcherManagerEvent::PlaylistExhausted {
                    playlist_id: playlist.playlist_id.clone(),
                });
                return None;
            }

            playlist.current_play_index += 1;
            self.persist_playlist(&playlist).await;
        }
    }

    async fn start_playlist_item(
        self: &Arc<Self>,
        playlist: &mut Playlist,
        mut item: Broadcast,
    ) -> Option<Arc<dyn StreamFetcher>> {
        let fetcher = match self.factory.make(item.clone()) {
            Ok(fetcher) => fetcher,
            Err(error) => {
                error!(stream_id = %item.stream_id, error = %error, "failed to build playlist fetcher");
                return None;
            }
        };

        // index and status must be persisted before the worker transition is
        // observable
        item.status = BroadcastStatus::Broadcasting;
        playlist.status = BroadcastStatus::Broadcasting;
        if let Some(stored) = playlist.items.get_mut(playlist.current_play_index) {
            stored.status = BroadcastStatus::Broadcasting;
        }
        self.persist_playlist(playlist).await;

        let advancer = Arc::new(PlaylistAdvancer {
            manager: Arc::downgrade(self),
            playlist_id: playlist.playlist_id.clone(),
            current: Mutex::new(item),
        });
        fetcher.set_completion_listener(advancer);

        self.playlist_start_streaming(fetcher).await
    }

    /// Completion path: stop the finished worker, advance `(i + 1) % len`,
    /// and start the next item, unless the playlist was stopped externally
    /// in the meantime.
    async fn advance_playlist(self: &Arc<Self>, advancer: Arc<PlaylistAdvancer>) {
        let finished = advancer.current.lock().clone();
        if let Err(error) = self.stop_streaming(&finished.stream_id).await {
            debug!(stream_id = %finished.stream_id, error = %error, "finished fetcher was already removed");
        }

        // time may have passed; trust only fresh state
        let mut playlist = match self.datastore.get_playlist(&advancer.playlist_id).await {
            Ok(playlist) => playlist,
            Err(error) => {
                warn!(playlist_id = %advancer.playlist_id, error = %error, "cannot re-read playlist");
                return;
            }
        };

        if !playlist.status.is_broadcasting() {
            info!(
                playlist_id = %playlist.playlist_id,
                status = playlist.status.as_str(),
                "playlist is no longer broadcasting, not advancing"
            );
            return;
        }
        if playlist.is_empty() {
            warn!(playlist_id = %playlist.playlist_id, "playlist has no items left, not advancing");
            return;
        }

        let next = playlist.advance_wrapping();
        self.persist_playlist(&playlist).await;

        let mut next_item = playlist.items[next].clone();
        next_item.status = BroadcastStatus::Broadcasting;
        match self
            .datastore
            .update_broadcast_fields(&next_item.stream_id, &next_item)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                warn!(stream_id = %next_item.stream_id, "next playlist item has no broadcast record")
            }
            Err(error) => {
                warn!(stream_id = %next_item.stream_id, error = %error, "failed to mark next playlist item")
            }
        }

        let fetcher = match self.factory.make(next_item.clone()) {
            Ok(fetcher) => fetcher,
            Err(error) => {
                error!(
                    stream_id = %next_item.stream_id,
                    error = %error,
                    "failed to build fetcher for next playlist item"
                );
                return;
            }
        };

        info!(
            playlist_id = %playlist.playlist_id,
            index = next,
            stream_id = %next_item.stream_id,
            "advancing playlist"
        );

        *advancer.current.lock() = next_item;
        fetcher.set_completion_listener(advancer.clone());
        self.events.emit(FetcherManagerEvent::PlaylistAdvanced {
            playlist_id: playlist.playlist_id.clone(),
            index: next,
        });
        self.playlist_start_streaming(fetcher).await;
    }

    async fn persist_playlist(&self, playlist: &Playlist) {
        match self
            .datastore
            .edit_playlist(&playlist.playlist_id, playlist)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                warn!(playlist_id = %playlist.playlist_id, "playlist not found while persisting")
            }
            Err(error) => {
                warn!(playlist_id = %playlist.playlist_id, error = %error, "failed to persist playlist")
            }
        }
    }
}

//! Worker-side contracts consumed by the manager.
//!
//! A fetcher owns its own unit of concurrency (task, thread, subprocess);
//! the manager only reacts to the liveness and completion it reports.

use std::sync::Arc;

use async_trait::async_trait;

use crate::Result;
use crate::domain::Broadcast;

/// One active pull of a source stream.
#[async_trait]
pub trait StreamFetcher: Send + Sync {
    /// Begin (or resume) pulling the source.
    async fn start(&self) -> Result<()>;

    /// Stop pulling. Must be complete when this returns: the worker's own
    /// concurrency is wound down and no completion callback fires afterwards.
    async fn stop(&self) -> Result<()>;

    /// Whether the worker is currently producing data.
    fn is_alive(&self) -> bool;

    /// The broadcast this worker serves.
    fn broadcast(&self) -> Broadcast;

    /// Whether the periodic restart policy applies to this worker.
    fn set_auto_restart(&self, enabled: bool);

    /// Install the callback invoked when the source ends or fails.
    fn set_completion_listener(&self, listener: Arc<dyn CompletionListener>);

    fn stream_id(&self) -> String {
        self.broadcast().stream_id
    }
}

/// Callback invoked by a worker when its source ends or fails.
///
/// Takes `Arc<Self>` so an implementation can re-attach itself to the
/// replacement worker it spins up.
pub trait CompletionListener: Send + Sync {
    fn stream_finished(self: Arc<Self>);
}

/// Builds workers for the manager.
///
/// Construction must not block; anything expensive belongs in
/// [`StreamFetcher::start`].
pub trait FetcherFactory: Send + Sync {
    fn make(&self, broadcast: Broadcast) -> Result<Arc<dyn StreamFetcher>>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! Hand-rolled fetcher doubles shared by the manager and playlist tests.

    use std::collections::HashSet;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use crate::domain::Broadcast;
    use crate::{Error, Result};

    use super::{CompletionListener, FetcherFactory, StreamFetcher};

    pub(crate) struct TestFetcher {
        broadcast: Broadcast,
        alive: AtomicBool,
        fail_start: bool,
        pub(crate) starts: AtomicUsize,
        pub(crate) stops: AtomicUsize,
        pub(crate) auto_restart: Mutex<Option<bool>>,
        listener: Mutex<Option<Arc<dyn CompletionListener>>>,
    }

    impl TestFetcher {
        pub(crate) fn new(broadcast: Broadcast) -> Arc<Self> {
            Arc::new(Self {
                broadcast,
                alive: AtomicBool::new(true),
                fail_start: false,
                starts: AtomicUsize::new(0),
                stops: AtomicUsize::new(0),
                auto_restart: Mutex::new(None),
                listener: Mutex::new(None),
            })
        }

        pub(crate) fn dead(broadcast: Broadcast) -> Arc<Self> {
            let fetcher = Self::new(broadcast);
            fetcher.alive.store(false, Ordering::SeqCst);
            fetcher
        }

        pub(crate) fn failing_start(broadcast: Broadcast) -> Arc<Self> {
            Arc::new(Self {
                broadcast,
                alive: AtomicBool::new(false),
                fail_start: true,
                starts: AtomicUsize::new(0),
                stops: AtomicUsize::new(0),
                auto_restart: Mutex::new(None),
                listener: Mutex::new(None),
            })
        }

        pub(crate) fn start_count(&self) -> usize {
            self.starts.load(Ordering::SeqCst)
        }

        pub(crate) fn stop_count(&self) -> usize {
            self.stops.load(Ordering::SeqCst)
        }

        /// Simulate the source ending: fire the installed completion listener.
        pub(crate) fn finish(&self) {
            self.alive.store(false, Ordering::SeqCst);
            let listener = self.listener.lock().clone();
            if let Some(listener) = listener {
                listener.stream_finished();
            }
        }
    }

    #[async_trait]
    impl StreamFetcher for TestFetcher {
        async fn start(&self) -> Result<()> {
            if self.fail_start {
                return Err(Error::fetcher("refusing to start"));
            }
            self.starts.fetch_add(1, Ordering::SeqCst);
            self.alive.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn stop(&self) -> Result<()> {
            self.stops.fetch_add(1, Ordering::SeqCst);
            self.alive.store(false, Ordering::SeqCst);
            Ok(())
        }

        fn is_alive(&self) -> bool {
            self.alive.load(Ordering::SeqCst)
        }

        fn broadcast(&self) -> Broadcast {
            self.broadcast.clone()
        }

        fn set_auto_restart(&self, enabled: bool) {
            *self.auto_restart.lock() = Some(enabled);
        }

        fn set_completion_listener(&self, listener: Arc<dyn CompletionListener>) {
            *self.listener.lock() = Some(listener);
        }
    }

    /// Factory producing [`TestFetcher`]s, with optional per-stream failures.
    #[derive(Default)]
    pub(crate) struct TestFetcherFactory {
        fail_for: HashSet<String>,
        pub(crate) made: Mutex<Vec<Arc<TestFetcher>>>,
    }

    impl TestFetcherFactory {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn failing_for(stream_ids: &[&str]) -> Self {
            Self {
                fail_for: stream_ids.iter().map(|s| s.to_string()).collect(),
                made: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn made_for(&self, stream_id: &str) -> Option<Arc<TestFetcher>> {
            self.made
                .lock()
                .iter()
                .rev()
                .find(|f| f.broadcast.stream_id == stream_id)
                .cloned()
        }
    }

    impl FetcherFactory for TestFetcherFactory {
        fn make(&self, broadcast: Broadcast) -> Result<Arc<dyn StreamFetcher>> {
            if self.fail_for.contains(&broadcast.stream_id) {
                return Err(Error::fetcher(format!(
                    "no fetcher available for {}",
                    broadcast.stream_id
                )));
            }
            let fetcher = TestFetcher::new(broadcast);
            self.made.lock().push(fetcher.clone());
            Ok(fetcher)
        }
    }
}

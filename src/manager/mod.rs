//! Fetcher fleet orchestration.
//!
//! [`FetcherManager`] owns the registry of active fetchers, the start/stop
//! lifecycle API, and the periodic checker job that either health-checks or
//! restarts the fleet. Playlist advancement lives in the [`playlist`] sibling
//! and drives the registry through the same lifecycle API.

pub mod events;
mod playlist;
pub mod registry;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::datastore::DataStore;
use crate::domain::{Broadcast, StreamQuality};
use crate::fetcher::{FetcherFactory, StreamFetcher};
use crate::probe::{HttpUrlProber, UrlProber};
use crate::{Error, Result};

use events::{EventBroadcaster, FetcherManagerEvent};
use registry::FetcherRegistry;

/// Default period between checker ticks.
pub const DEFAULT_CHECK_INTERVAL_MS: u64 = 10_000;

/// Manager configuration.
///
/// All three values stay tunable on a live manager through the setter
/// methods; interval changes take effect the next time the checker job is
/// scheduled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherManagerConfig {
    /// Period between checker ticks, in milliseconds.
    pub check_interval_ms: u64,
    /// Period between full restart passes, in seconds. Zero disables
    /// scheduled restarts.
    pub restart_period_secs: u64,
    /// Default auto-restart flag applied to newly started fetchers.
    pub auto_restart: bool,
}

impl Default for FetcherManagerConfig {
    fn default() -> Self {
        Self {
            check_interval_ms: DEFAULT_CHECK_INTERVAL_MS,
            restart_period_secs: 0,
            auto_restart: true,
        }
    }
}

/// The single outstanding checker job.
struct CheckerJob {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl CheckerJob {
    fn cancel(self) {
        self.token.cancel();
        self.handle.abort();
    }
}

/// Orchestrates a fleet of stream fetchers.
pub struct FetcherManager {
    datastore: Arc<dyn DataStore>,
    factory: Arc<dyn FetcherFactory>,
    prober: Arc<dyn UrlProber>,
    registry: FetcherRegistry,
    check_interval_ms: AtomicU64,
    restart_period_secs: AtomicU64,
    auto_restart: AtomicBool,
    /// Ticks observed with a non-empty registry.
    checker_count: AtomicU64,
    /// Restart threshold reached by the last restart pass.
    last_restart_count: AtomicU64,
    checker_job: Mutex<Option<CheckerJob>>,
    events: EventBroadcaster,
}

impl FetcherManager {
    pub fn new(datastore: Arc<dyn DataStore>, factory: Arc<dyn FetcherFactory>) -> Self {
        Self::with_config(datastore, factory, FetcherManagerConfig::default())
    }

    pub fn with_config(
        datastore: Arc<dyn DataStore>,
        factory: Arc<dyn FetcherFactory>,
        config: FetcherManagerConfig,
    ) -> Self {
        Self {
            datastore,
            factory,
            prober: Arc::new(HttpUrlProber::new()),
            registry: FetcherRegistry::new(),
            check_interval_ms: AtomicU64::new(config.check_interval_ms),
            restart_period_secs: AtomicU64::new(config.restart_period_secs),
            auto_restart: AtomicBool::new(config.auto_restart),
            checker_count: AtomicU64::new(0),
            last_restart_count: AtomicU64::new(0),
            checker_job: Mutex::new(None),
            events: EventBroadcaster::new(),
        }
    }

    /// Replace the URL prober (the playlist engine's reachability check).
    pub fn with_prober(mut self, prober: Arc<dyn UrlProber>) -> Self {
        self.prober = prober;
        self
    }

    /// Subscribe to manager events.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<FetcherManagerEvent> {
        self.events.subscribe()
    }

    pub fn datastore(&self) -> Arc<dyn DataStore> {
        self.datastore.clone()
    }

    /// Period between checker ticks, in milliseconds. A new value applies
    /// the next time the checker job is scheduled.
    pub fn set_check_interval(&self, interval_ms: u64) {
        self.check_interval_ms.store(interval_ms, Ordering::SeqCst);
    }

    pub fn check_interval(&self) -> u64 {
        self.check_interval_ms.load(Ordering::SeqCst)
    }

    /// Period between full restart passes, in seconds. Zero disables them.
    pub fn set_restart_period_secs(&self, secs: u64) {
        self.restart_period_secs.store(secs, Ordering::SeqCst);
    }

    pub fn restart_period_secs(&self) -> u64 {
        self.restart_period_secs.load(Ordering::SeqCst)
    }

    /// Default auto-restart flag applied to fetchers started through
    /// [`start_streaming`](Self::start_streaming).
    pub fn set_auto_restart(&self, enabled: bool) {
        self.auto_restart.store(enabled, Ordering::SeqCst);
    }

    pub fn auto_restart(&self) -> bool {
        self.auto_restart.load(Ordering::SeqCst)
    }

    /// Ticks observed so far with a non-empty registry.
    pub fn checker_count(&self) -> u64 {
        self.checker_count.load(Ordering::SeqCst)
    }

    pub fn is_fetching(&self, stream_id: &str) -> bool {
        self.registry.contains(stream_id)
    }

    /// Snapshot of the active fetchers.
    pub fn active_fetchers(&self) -> Vec<Arc<dyn StreamFetcher>> {
        self.registry.snapshot()
    }

    /// Swap the active fetcher set wholesale.
    pub fn replace_fetchers(&self, fetchers: Vec<Arc<dyn StreamFetcher>>) {
        self.registry.replace_all(fetchers);
    }

    /// Start fetching a broadcast.
    ///
    /// Idempotent per stream id: when a fetcher for it is already active this
    /// is a no-op returning `None`. Construction or start failures are
    /// contained here (logged, surfaced as `None`) so one bad stream cannot
    /// abort a batch start.
    pub async fn start_streaming(
        self: &Arc<Self>,
        broadcast: &Broadcast,
    ) -> Option<Arc<dyn StreamFetcher>> {
        if self.registry.contains(&broadcast.stream_id) {
            debug!(stream_id = %broadcast.stream_id, "already fetching, ignoring start");
            return None;
        }

        let fetcher = match self.factory.make(broadcast.clone()) {
            Ok(fetcher) => fetcher,
            Err(error) => {
                error!(stream_id = %broadcast.stream_id, error = %error, "failed to build fetcher");
                return None;
            }
        };
        fetcher.set_auto_restart(self.auto_restart());

        self.launch(fetcher).await
    }

    /// Start an already-built fetcher on behalf of the playlist engine.
    ///
    /// Same dedup/registration/scheduling as [`start_streaming`](Self::start_streaming),
    /// but auto-restart is forced off: playlist fetches are advanced by the
    /// playlist state machine, not by the periodic restart policy.
    pub async fn playlist_start_streaming(
        self: &Arc<Self>,
        fetcher: Arc<dyn StreamFetcher>,
    ) -> Option<Arc<dyn StreamFetcher>> {
        if self.registry.contains(&fetcher.stream_id()) {
            debug!(stream_id = %fetcher.stream_id(), "already fetching, ignoring playlist start");
            return None;
        }

        fetcher.set_auto_restart(false);
        self.launch(fetcher).await
    }

    async fn launch(self: &Arc<Self>, fetcher: Arc<dyn StreamFetcher>) -> Option<Arc<dyn StreamFetcher>> {
        let stream_id = fetcher.stream_id();

        if let Err(error) = fetcher.start().await {
            error!(stream_id = %stream_id, error = %error, "failed to start fetcher");
            return None;
        }

        if !self.registry.insert(fetcher.clone()) {
            // lost a registration race; the loser must not keep pulling
            warn!(stream_id = %stream_id, "concurrent start won the registration, stopping duplicate");
            if let Err(error) = fetcher.stop().await {
                warn!(stream_id = %stream_id, error = %error, "duplicate fetcher stop failed");
            }
            return None;
        }

        if !self.checker_running() {
            self.schedule_checker_job();
        }

        info!(stream_id = %stream_id, "started fetching");
        self.events
            .emit(FetcherManagerEvent::FetcherStarted { stream_id });

        Some(fetcher)
    }

    /// Stop fetching a stream.
    ///
    /// When this returns the fetcher is out of the registry and will not be
    /// observed by a later checker tick. Unknown stream ids report
    /// [`Error::NotFound`] without mutating anything.
    pub async fn stop_streaming(&self, stream_id: &str) -> Result<()> {
        let Some(fetcher) = self.registry.remove(stream_id) else {
            return Err(Error::not_found("Fetcher", stream_id));
        };

        if let Err(error) = fetcher.stop().await {
            warn!(stream_id = %stream_id, error = %error, "fetcher stop reported an error");
        }

        info!(stream_id = %stream_id, "stopped fetching");
        self.events.emit(FetcherManagerEvent::FetcherStopped {
            stream_id: stream_id.to_string(),
        });
        Ok(())
    }

    /// Start a batch of broadcasts, then (re)schedule the checker job.
    ///
    /// Not transactional: individual failures are contained per stream and
    /// do not block the remaining items.
    pub async fn start_streams(self: &Arc<Self>, broadcasts: &[Broadcast]) {
        for broadcast in broadcasts {
            self.start_streaming(broadcast).await;
        }
        self.schedule_checker_job();
    }

    fn checker_running(&self) -> bool {
        self.checker_job.lock().is_some()
    }

    /// Schedule the periodic checker job, cancelling any outstanding one
    /// first so at most one timer is ever live.
    pub fn schedule_checker_job(self: &Arc<Self>) {
        let mut slot = self.checker_job.lock();
        if let Some(previous) = slot.take() {
            previous.cancel();
        }

        let interval_ms = self.check_interval().max(1);
        let token = CancellationToken::new();
        let task_token = token.clone();
        let weak = Arc::downgrade(self);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // the first interval tick completes immediately; the first real
            // check should only run after one full period
            ticker.tick().await;

            loop {
                tokio::select! {
                    biased;
                    _ = task_token.cancelled() => break,
                    _ = ticker.tick() => {
                        let Some(manager) = weak.upgrade() else { break };
                        manager.run_checker_tick().await;
                    }
                }
            }
        });

        *slot = Some(CheckerJob { token, handle });
        info!(interval_ms, "scheduled fetcher checker job");
    }

    /// Cancel the checker job. No tick body runs after this returns.
    pub fn stop_checker_job(&self) {
        if let Some(job) = self.checker_job.lock().take() {
            job.cancel();
            info!("stopped fetcher checker job");
        }
    }

    async fn run_checker_tick(&self) {
        if self.registry.is_empty() {
            return;
        }

        let count = self.checker_count.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(count, "fetcher check tick");

        let restart_period = self.restart_period_secs();
        let count_to_restart = if restart_period > 0 {
            let interval_secs = self.check_interval() / 1000;
            count * interval_secs / restart_period
        } else {
            0
        };

        if count_to_restart > self.last_restart_count.load(Ordering::SeqCst) {
            self.last_restart_count
                .store(count_to_restart, Ordering::SeqCst);
            info!(round = count_to_restart, "restart period elapsed, restarting fetchers");
            self.restart_fetchers().await;
        } else {
            self.check_fetchers_status().await;
        }
    }

    /// Health pass: degrade the stored quality of every stream whose fetcher
    /// reports not-alive. Liveness is the worker's verdict; the manager only
    /// reacts to it.
    pub async fn check_fetchers_status(&self) {
        for fetcher in self.registry.snapshot() {
            let broadcast = fetcher.broadcast();
            if fetcher.is_alive() {
                continue;
            }

            info!(
                stream_id = %broadcast.stream_id,
                url = %broadcast.stream_url,
                "fetcher is not alive, marking quality as poor"
            );
            if let Err(error) = self
                .datastore
                .update_source_quality(&broadcast.stream_id, StreamQuality::Poor, 0, 0)
                .await
            {
                warn!(stream_id = %broadcast.stream_id, error = %error, "failed to record degraded quality");
            }
            self.events.emit(FetcherManagerEvent::QualityDegraded {
                stream_id: broadcast.stream_id,
            });
        }
    }

    /// Restart pass: stop every currently-alive fetcher, then start every
    /// fetcher in the registry regardless of its prior state.
    pub async fn restart_fetchers(&self) {
        let snapshot = self.registry.snapshot();
        for fetcher in &snapshot {
            let stream_id = fetcher.stream_id();

            if fetcher.is_alive() {
                info!(stream_id = %stream_id, "stopping fetcher for restart");
                if let Err(error) = fetcher.stop().await {
                    warn!(stream_id = %stream_id, error = %error, "fetcher stop reported an error");
                }
            } else {
                info!(stream_id = %stream_id, "fetcher is not alive");
            }

            if let Err(error) = fetcher.start().await {
                error!(stream_id = %stream_id, error = %error, "failed to restart fetcher");
            }
        }

        self.events.emit(FetcherManagerEvent::FetchersRestarted {
            count: snapshot.len(),
        });
    }
}

impl Drop for FetcherManager {
    fn drop(&mut self) {
        if let Some(job) = self.checker_job.get_mut().take() {
            job.cancel();
        }
    }
}

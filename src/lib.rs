//! # streampull
//!
//! Orchestration core for fleets of external stream fetchers. The manager
//! tracks which source streams are being pulled, periodically verifies their
//! liveness, restarts them on a configurable cadence, and chains playlist
//! items into one continuous broadcast.
//!
//! The fetching itself, persistence, and the hosting runtime stay behind the
//! [`fetcher::StreamFetcher`], [`datastore::DataStore`], and
//! [`probe::UrlProber`] seams.

pub mod datastore;
pub mod domain;
pub mod error;
pub mod fetcher;
pub mod logging;
pub mod manager;
pub mod probe;

pub use error::{Error, Result};
pub use manager::events::FetcherManagerEvent;
pub use manager::registry::FetcherRegistry;
pub use manager::{DEFAULT_CHECK_INTERVAL_MS, FetcherManager, FetcherManagerConfig};

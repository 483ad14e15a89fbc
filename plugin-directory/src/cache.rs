//! Short lived cache in front of the upstream plugin list.
//!
//! There is exactly one slot. It starts empty, gets filled by the first
//! successful fetch and is only ever replaced as a whole afterwards. While the
//! slot is fresh no upstream request is made at all. Once it is stale every
//! request tries to refresh it, and if that fails the stale document is served
//! instead. A failed refresh leaves the timestamp alone, so the next request
//! tries again right away.
//!
//! Refreshes are single-flight: callers arriving while a refresh is running
//! wait for it and share its outcome.

use crate::api::PluginsResponse;
use crate::error::FetchError;
use bytes::Bytes;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Something that can produce the raw plugin list.
pub trait PluginSource: Send + Sync + 'static {
    fn fetch_plugins(&self) -> impl Future<Output = Result<Bytes, FetchError>> + Send;
}

/// A plugin list that is known to match the expected schema.
///
/// The body is kept exactly as upstream sent it.
#[derive(Debug, Clone)]
pub struct PluginsDocument {
    body: Bytes,
    plugin_count: usize,
}

impl PluginsDocument {
    pub fn parse(body: Bytes) -> Result<Self, FetchError> {
        let parsed: PluginsResponse = serde_json::from_slice(&body)?;

        Ok(Self {
            plugin_count: parsed.plugins.len(),
            body,
        })
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn plugin_count(&self) -> usize {
        self.plugin_count
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    document: PluginsDocument,
    fetched_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Empty,
    Fresh { age: Duration },
    Stale { age: Duration },
}

impl CacheState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Fresh { .. } => "fresh",
            Self::Stale { .. } => "stale",
        }
    }

    pub fn age(&self) -> Option<Duration> {
        match self {
            Self::Empty => None,
            Self::Fresh { age } | Self::Stale { age } => Some(*age),
        }
    }
}

/// Where a served document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Served from the slot without contacting upstream.
    Cached,
    /// Fetched from upstream for this request (or a request it waited on).
    Refreshed,
    /// Upstream failed; this is the last good document.
    Stale,
}

#[derive(Debug, Clone)]
pub struct Served {
    pub document: PluginsDocument,
    pub freshness: Freshness,
}

pub struct PluginCache<S> {
    source: S,
    ttl: Duration,
    entry: RwLock<Option<CacheEntry>>,

    /// Number of completed refresh attempts.
    attempts: AtomicU64,

    /// Held for the duration of a refresh. Contains the error of the last
    /// attempt, `None` if it succeeded.
    refresh: Mutex<Option<Arc<FetchError>>>,
}

impl<S: PluginSource> PluginCache<S> {
    pub fn new(source: S, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            entry: RwLock::new(None),
            attempts: AtomicU64::new(0),
            refresh: Mutex::new(None),
        }
    }

    pub async fn state(&self) -> CacheState {
        self.classify(self.entry.read().await.as_ref())
    }

    /// Drop the cached document and the last refresh failure, returning the
    /// cache to its initial state.
    #[cfg(test)]
    pub async fn reset(&self) {
        tracing::debug!("Resetting plugin cache");

        let mut last_failure = self.refresh.lock().await;
        *self.entry.write().await = None;
        *last_failure = None;
    }

    /// Get the plugin list, refreshing it from upstream if needed.
    ///
    /// Fails only if upstream could not be reached and nothing was ever cached.
    #[tracing::instrument(skip(self))]
    pub async fn get_plugins(&self) -> Result<Served, Arc<FetchError>> {
        let seen_attempts = self.attempts.load(Ordering::Acquire);

        {
            let entry = self.entry.read().await;
            match (entry.as_ref(), self.classify(entry.as_ref())) {
                (Some(entry), CacheState::Fresh { age }) => {
                    tracing::trace!("Serving cached plugin list ({}s old)", age.as_secs());

                    return Ok(Served {
                        document: entry.document.clone(),
                        freshness: Freshness::Cached,
                    });
                }
                (_, state) => tracing::debug!("Plugin cache is {}, refreshing", state.name()),
            }
        }

        let mut last_failure = self.refresh.lock().await;

        if self.attempts.load(Ordering::Acquire) != seen_attempts {
            // Someone else refreshed while we were waiting, use their result.
            let entry = self.entry.read().await.clone();

            match (entry, last_failure.clone()) {
                (Some(entry), None) => {
                    return Ok(Served {
                        document: entry.document,
                        freshness: Freshness::Refreshed,
                    });
                }
                (Some(entry), Some(_)) => {
                    return Ok(Served {
                        document: entry.document,
                        freshness: Freshness::Stale,
                    });
                }
                (None, Some(err)) => return Err(err),
                // Reset in between, nothing to share.
                (None, None) => {}
            }
        }

        let started_at = Instant::now();
        let result = self
            .source
            .fetch_plugins()
            .await
            .and_then(PluginsDocument::parse);

        let served = match result {
            Ok(document) => {
                tracing::info!("Refreshed plugin list, {} plugins", document.plugin_count());

                *self.entry.write().await = Some(CacheEntry {
                    document: document.clone(),
                    fetched_at: started_at,
                });
                *last_failure = None;

                Ok(Served {
                    document,
                    freshness: Freshness::Refreshed,
                })
            }
            Err(err) => {
                let err = Arc::new(err);
                *last_failure = Some(err.clone());

                match self.entry.read().await.as_ref() {
                    Some(entry) => {
                        tracing::warn!("Failed to refresh plugin list, serving stale copy: {}", err);

                        Ok(Served {
                            document: entry.document.clone(),
                            freshness: Freshness::Stale,
                        })
                    }
                    None => {
                        tracing::error!("Failed to fetch plugin list: {}", err);

                        let mut src = std::error::Error::source(err.as_ref());
                        while let Some(cause) = src {
                            tracing::error!("-> Caused by: {}", cause);
                            src = cause.source();
                        }

                        Err(err)
                    }
                }
            }
        };

        self.attempts.fetch_add(1, Ordering::AcqRel);

        served
    }

    fn classify(&self, entry: Option<&CacheEntry>) -> CacheState {
        match entry {
            None => CacheState::Empty,
            Some(entry) => {
                let age = entry.fetched_at.elapsed();
                if age < self.ttl {
                    CacheState::Fresh { age }
                } else {
                    CacheState::Stale { age }
                }
            }
        }
    }
}

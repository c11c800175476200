//! Single-slot snapshot cache with single-flight refresh.

use std::future::Future;
use std::sync::Arc;

use chrono::Duration;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};
use xrate_common::{time::constants, CurrencyCode};

use crate::error::FxResult;
use crate::provider::RateProvider;
use crate::snapshot::CurrencySnapshot;

type RefreshFuture = Shared<BoxFuture<'static, FxResult<Arc<CurrencySnapshot>>>>;

/// Configuration for the snapshot cache.
#[derive(Debug, Clone)]
pub struct RateCacheConfig {
    /// Maximum age of a snapshot before it must be refetched in full.
    pub expiration_window: Duration,
}

impl Default for RateCacheConfig {
    fn default() -> Self {
        Self {
            expiration_window: constants::cache_expiration_window(),
        }
    }
}

/// What a caller needs from the cache.
#[derive(Debug, Clone)]
enum Wanted {
    /// A fresh snapshot expressed against exactly this base.
    Base(CurrencyCode),
    /// Any fresh snapshot; refresh against the fallback when cold or expired.
    AnyBase(CurrencyCode),
}

impl Wanted {
    fn target(&self) -> &CurrencyCode {
        match self {
            Wanted::Base(base) | Wanted::AnyBase(base) => base,
        }
    }

    fn accepts(&self, snapshot: &CurrencySnapshot, window: Duration) -> bool {
        match self {
            Wanted::Base(base) => snapshot.is_fresh_for(base, window),
            Wanted::AnyBase(_) => !snapshot.is_expired(window),
        }
    }
}

/// How much to refetch.
enum RefreshPlan {
    /// Currency list and rates, concurrently.
    Full,
    /// Rates only; the currency list is carried over from the previous generation.
    RatesOnly(Arc<CurrencySnapshot>),
}

struct InFlight {
    generation: u64,
    base: CurrencyCode,
    future: RefreshFuture,
}

#[derive(Default)]
struct CacheState {
    snapshot: Option<Arc<CurrencySnapshot>>,
    in_flight: Option<InFlight>,
    next_generation: u64,
    stats: CacheStats,
}

enum Step {
    Ready(Arc<CurrencySnapshot>),
    Await(RefreshFuture),
}

/// Owns the current [`CurrencySnapshot`] and decides when to refresh it.
///
/// At most one refresh runs at a time. Callers that arrive while it is in
/// flight await the same shared future and observe the same result, success or
/// failure. A snapshot is only ever replaced whole, under the state lock, and
/// that lock is never held across an await.
pub struct RateCache {
    provider: Arc<dyn RateProvider>,
    state: Arc<Mutex<CacheState>>,
    config: RateCacheConfig,
}

impl RateCache {
    /// Create a new cache with default configuration.
    pub fn new(provider: Arc<dyn RateProvider>) -> Self {
        Self::with_config(provider, RateCacheConfig::default())
    }

    /// Create a new cache with custom configuration.
    pub fn with_config(provider: Arc<dyn RateProvider>, config: RateCacheConfig) -> Self {
        Self {
            provider,
            state: Arc::new(Mutex::new(CacheState::default())),
            config,
        }
    }

    /// Return a snapshot that is fresh and expressed against `base`, refreshing if needed.
    #[instrument(skip(self), fields(base = %base))]
    pub async fn ensure_fresh(&self, base: &CurrencyCode) -> FxResult<Arc<CurrencySnapshot>> {
        self.ensure(Wanted::Base(base.clone())).await
    }

    /// Return any fresh snapshot, refreshing against `fallback_base` when cold or expired.
    #[instrument(skip(self), fields(fallback = %fallback_base))]
    pub async fn ensure_any_fresh(
        &self,
        fallback_base: &CurrencyCode,
    ) -> FxResult<Arc<CurrencySnapshot>> {
        self.ensure(Wanted::AnyBase(fallback_base.clone())).await
    }

    /// Current snapshot, which may be stale or absent.
    pub fn snapshot(&self) -> Option<Arc<CurrencySnapshot>> {
        self.state.lock().snapshot.clone()
    }

    /// Check if a refresh is currently running.
    pub fn is_refreshing(&self) -> bool {
        self.state.lock().in_flight.is_some()
    }

    pub fn config(&self) -> &RateCacheConfig {
        &self.config
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        let mut stats = state.stats.clone();
        if let Some(snapshot) = &state.snapshot {
            stats.base_currency = Some(snapshot.base_currency().clone());
            stats.snapshot_age = Some(snapshot.age());
        }
        stats
    }

    async fn ensure(&self, wanted: Wanted) -> FxResult<Arc<CurrencySnapshot>> {
        loop {
            match self.next_step(&wanted) {
                Step::Ready(snapshot) => return Ok(snapshot),
                Step::Await(future) => {
                    let snapshot = future.await?;
                    // A joined refresh may have been for another base.
                    if wanted.accepts(&snapshot, self.config.expiration_window) {
                        return Ok(snapshot);
                    }
                    debug!(
                        refreshed = %snapshot.base_currency(),
                        wanted = %wanted.target(),
                        "Joined refresh was for another base, re-evaluating"
                    );
                }
            }
        }
    }

    /// Decide, under the lock, whether to serve, join or start a refresh.
    fn next_step(&self, wanted: &Wanted) -> Step {
        let window = self.config.expiration_window;
        let mut guard = self.state.lock();
        let state = &mut *guard;

        if let Some(snapshot) = &state.snapshot {
            if wanted.accepts(snapshot, window) {
                debug!(base = %snapshot.base_currency(), "Cache hit");
                return Step::Ready(snapshot.clone());
            }
        }

        if let Some(in_flight) = &state.in_flight {
            debug!(refreshing = %in_flight.base, "Joining in-flight refresh");
            state.stats.coalesced_waits += 1;
            return Step::Await(in_flight.future.clone());
        }

        let plan = match &state.snapshot {
            Some(snapshot) if !snapshot.is_expired(window) => {
                RefreshPlan::RatesOnly(snapshot.clone())
            }
            _ => RefreshPlan::Full,
        };

        let base = wanted.target().clone();
        let generation = state.next_generation;
        state.next_generation += 1;

        debug!(
            base = %base,
            generation,
            full = matches!(plan, RefreshPlan::Full),
            "Cache miss, starting refresh"
        );

        let future = self.refresh(plan, base.clone(), generation).boxed().shared();
        state.in_flight = Some(InFlight {
            generation,
            base,
            future: future.clone(),
        });

        Step::Await(future)
    }

    /// Fetch from the provider and swap the snapshot in one step on success.
    fn refresh(
        &self,
        plan: RefreshPlan,
        base: CurrencyCode,
        generation: u64,
    ) -> impl Future<Output = FxResult<Arc<CurrencySnapshot>>> + Send + 'static {
        let provider = self.provider.clone();
        let state = self.state.clone();

        async move {
            let full = matches!(plan, RefreshPlan::Full);
            let fetched = match plan {
                RefreshPlan::Full => {
                    tokio::try_join!(provider.fetch_currencies(), provider.fetch_rates(&base))
                        .map(|(currencies, rates)| {
                            CurrencySnapshot::new(Arc::new(currencies), rates, base.clone())
                        })
                }
                RefreshPlan::RatesOnly(previous) => provider
                    .fetch_rates(&base)
                    .await
                    .map(|rates| previous.rebased(rates, base.clone())),
            };

            let mut guard = state.lock();
            let state = &mut *guard;
            if state
                .in_flight
                .as_ref()
                .is_some_and(|in_flight| in_flight.generation == generation)
            {
                state.in_flight = None;
            }

            match fetched {
                Ok(snapshot) => {
                    let snapshot = Arc::new(snapshot);
                    state.snapshot = Some(snapshot.clone());
                    if full {
                        state.stats.full_refreshes += 1;
                    } else {
                        state.stats.rate_refreshes += 1;
                    }
                    info!(
                        base = %base,
                        generation,
                        currencies = snapshot.currencies().len(),
                        rates = snapshot.rates().len(),
                        full,
                        "Snapshot replaced"
                    );
                    Ok(snapshot)
                }
                Err(e) => {
                    state.stats.failed_refreshes += 1;
                    warn!(base = %base, generation, error = %e, "Refresh failed, keeping previous snapshot");
                    Err(e)
                }
            }
        }
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Refreshes that fetched both currency list and rates.
    pub full_refreshes: u64,
    /// Refreshes that fetched rates for a new base only.
    pub rate_refreshes: u64,
    pub failed_refreshes: u64,
    /// Callers that awaited a refresh started by someone else.
    pub coalesced_waits: u64,
    pub base_currency: Option<CurrencyCode>,
    pub snapshot_age: Option<Duration>,
}

/// Shared rate cache.
pub type SharedRateCache = Arc<RateCache>;

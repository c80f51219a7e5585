//! Geocoding ports and the shared call-pacing primitives.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use kasira_core::AppResult;
use kasira_domain::SuggestItem;
use serde_json::{Map, Value};
use tokio::time::Instant;

/// A latitude/longitude pair used to bias forward searches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

/// Forward-geocoding search port (and its coarse reverse endpoint).
#[async_trait]
pub trait ForwardGeocoder: Send + Sync {
    /// Searches free text, optionally biased toward a coordinate.
    /// Implementations bound and bias results to the country of interest.
    async fn search(
        &self,
        query: &str,
        limit: usize,
        bias: Option<GeoPoint>,
    ) -> AppResult<Vec<SuggestItem>>;

    /// Reverse-geocodes a coordinate to a single property bag.
    async fn reverse(&self, lat: f64, lon: f64) -> AppResult<Map<String, Value>>;
}

/// Secondary reverse-geocoding port with a richer administrative
/// breakdown, including RT/RW convention fields where the provider
/// knows them.
#[async_trait]
pub trait DetailReverseGeocoder: Send + Sync {
    /// Reverse-geocodes a coordinate to a detailed property bag.
    async fn reverse(&self, lat: f64, lon: f64) -> AppResult<Map<String, Value>>;
}

/// Point-in-time view of the geocoder diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeocoderStatsSnapshot {
    /// Total provider calls since startup.
    pub hits: u64,
    /// HTTP status of the last call, 0 for transport errors.
    pub last_status: Option<u16>,
    /// Latency of the last call in milliseconds.
    pub last_ms: Option<u64>,
    /// URL of the last call.
    pub last_url: Option<String>,
    /// Whether the last call hit the provider's rate limit (429/503).
    /// Surfaced to the UI; never triggers an automatic retry.
    pub rate_limited: bool,
    /// Transport error of the last call, when one occurred.
    pub last_error: Option<String>,
}

/// Shared diagnostics recorded by geocoder adapters for display in the
/// suggestion dropdown.
#[derive(Debug, Default)]
pub struct GeocoderStats {
    inner: Mutex<GeocoderStatsSnapshot>,
}

impl GeocoderStats {
    /// Creates empty diagnostics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a completed HTTP call.
    pub fn record_status(&self, status: u16, elapsed_ms: u64, url: &str) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.hits += 1;
            inner.last_status = Some(status);
            inner.last_ms = Some(elapsed_ms);
            inner.last_url = Some(url.to_owned());
            inner.rate_limited = status == 429 || status == 503;
            inner.last_error = None;
        }
    }

    /// Records a transport failure.
    pub fn record_error(&self, error: &str, elapsed_ms: u64, url: &str) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.hits += 1;
            inner.last_status = Some(0);
            inner.last_ms = Some(elapsed_ms);
            inner.last_url = Some(url.to_owned());
            inner.rate_limited = false;
            inner.last_error = Some(error.to_owned());
        }
    }

    /// Returns a copy of the current diagnostics.
    #[must_use]
    pub fn snapshot(&self) -> GeocoderStatsSnapshot {
        self.inner
            .lock()
            .map(|inner| inner.clone())
            .unwrap_or_default()
    }
}

/// Paces outgoing provider calls to a minimum inter-request gap.
///
/// Injected into the geocoder adapters instead of a module-level
/// timestamp so tests can pick a gap deterministically. The lock
/// serializes concurrent callers, which also covers the multiple
/// sequential calls one keystroke can fan out into.
#[derive(Debug)]
pub struct SearchThrottle {
    gap: Duration,
    last_call: tokio::sync::Mutex<Option<Instant>>,
}

impl SearchThrottle {
    /// Default minimum gap between provider calls.
    pub const DEFAULT_GAP: Duration = Duration::from_millis(250);

    /// Creates a throttle with the given minimum gap.
    #[must_use]
    pub fn new(gap: Duration) -> Self {
        Self {
            gap,
            last_call: tokio::sync::Mutex::new(None),
        }
    }

    /// Waits until the gap since the previous call has elapsed, then
    /// stamps the current call.
    pub async fn pace(&self) {
        let mut last_call = self.last_call.lock().await;
        if let Some(previous) = *last_call {
            let ready_at = previous + self.gap;
            let now = Instant::now();
            if ready_at > now {
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last_call = Some(Instant::now());
    }
}

impl Default for SearchThrottle {
    fn default() -> Self {
        Self::new(Self::DEFAULT_GAP)
    }
}

/// Monotonic ticket counter used to discard stale search responses.
///
/// Every dispatched search takes a ticket; a response is delivered only
/// when its ticket is still the latest issued, so a slow early response
/// can never overwrite a fast later one.
#[derive(Debug, Default)]
pub struct SearchSequence {
    latest: AtomicU64,
}

impl SearchSequence {
    /// Creates a sequence starting at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues the next ticket.
    pub fn begin(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Returns whether a ticket is still the latest issued.
    #[must_use]
    pub fn is_current(&self, ticket: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{GeocoderStats, SearchSequence, SearchThrottle};

    #[test]
    fn sequence_invalidates_older_tickets() {
        let sequence = SearchSequence::new();
        let first = sequence.begin();
        assert!(sequence.is_current(first));

        let second = sequence.begin();
        assert!(!sequence.is_current(first));
        assert!(sequence.is_current(second));
    }

    #[test]
    fn stats_flag_rate_limit_statuses() {
        let stats = GeocoderStats::new();
        stats.record_status(429, 120, "https://example.test/api");
        assert!(stats.snapshot().rate_limited);

        stats.record_status(200, 80, "https://example.test/api");
        let snapshot = stats.snapshot();
        assert!(!snapshot.rate_limited);
        assert_eq!(snapshot.hits, 2);
        assert_eq!(snapshot.last_status, Some(200));
    }

    #[test]
    fn stats_record_transport_errors() {
        let stats = GeocoderStats::new();
        stats.record_error("connection refused", 40, "https://example.test/api");
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.last_status, Some(0));
        assert_eq!(snapshot.last_error.as_deref(), Some("connection refused"));
    }

    #[tokio::test(start_paused = true)]
    async fn throttle_enforces_the_minimum_gap() {
        let throttle = SearchThrottle::new(Duration::from_millis(250));
        let started = tokio::time::Instant::now();

        throttle.pace().await;
        throttle.pace().await;

        assert!(started.elapsed() >= Duration::from_millis(250));
    }

    #[tokio::test(start_paused = true)]
    async fn throttle_does_not_delay_spaced_calls() {
        let throttle = SearchThrottle::new(Duration::from_millis(100));

        throttle.pace().await;
        tokio::time::sleep(Duration::from_millis(150)).await;

        let before = tokio::time::Instant::now();
        throttle.pace().await;
        assert_eq!(before.elapsed(), Duration::ZERO);
    }
}

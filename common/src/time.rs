//! Time utilities and constants for the xrate service.

use chrono::{DateTime, Duration, Utc};

/// Service timing and sizing constants.
pub mod constants {
    use super::Duration;

    /// Snapshot expiration window (5 minutes).
    pub fn cache_expiration_window() -> Duration {
        Duration::minutes(5)
    }

    /// Upstream request timeout (10 seconds).
    pub fn upstream_timeout() -> Duration {
        Duration::seconds(10)
    }

    /// Maximum conversion records kept per user.
    pub const HISTORY_LIMIT: usize = 20;

    /// Pivot currency used when a caller names none.
    pub const DEFAULT_BASE_CURRENCY: &str = "USD";

    /// User id recorded when the caller supplies none.
    pub const ANONYMOUS_USER: &str = "anonymous";
}

/// Age of a timestamp relative to now.
pub fn age_of(timestamp: DateTime<Utc>) -> Duration {
    Utc::now().signed_duration_since(timestamp)
}

/// Check whether a timestamp is older than the given window.
pub fn is_older_than(timestamp: DateTime<Utc>, window: Duration) -> bool {
    age_of(timestamp) > window
}

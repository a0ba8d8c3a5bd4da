
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::warn;

const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Per-client sliding-window request counter.
///
/// State is process-local; windows are created lazily on a client's first
/// request and pruned lazily on each check.
pub struct RateLimiter {
    max_per_window: u32,
    window: Duration,
    windows: Mutex<HashMap<String, Vec<Instant>>>,
}

impl RateLimiter {
    #[inline]
    pub fn new(max_per_window: u32) -> Self {
        Self {
            max_per_window,
            window: DEFAULT_WINDOW,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Override the trailing window length. Mainly for tests.
    #[inline]
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Check and record a request for `client_id`.
    ///
    /// The prune+check+record sequence runs under one lock so two concurrent
    /// requests cannot both pass a boundary check. A rejected request is not
    /// recorded and does not extend the client's window.
    #[inline]
    pub fn allow(&self, client_id: &str) -> bool {
        let now = Instant::now();
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let timestamps = windows.entry(client_id.to_string()).or_default();
        timestamps.retain(|t| now.duration_since(*t) < self.window);

        if timestamps.len() >= self.max_per_window as usize {
            warn!("Rate limit exceeded for client: {}", client_id);
            return false;
        }

        timestamps.push(now);
        true
    }

    /// Number of distinct clients currently tracked.
    #[inline]
    pub fn tracked_clients(&self) -> usize {
        self.windows
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }
}

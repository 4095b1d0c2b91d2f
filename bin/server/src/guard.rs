//! IP-based transport guard for the HTTP server.
//!
//! A coarse per-IP request ceiling that shields the process from floods
//! before any request body is read. It is independent of the per-client
//! feed limits the library enforces: this layer counts raw requests over
//! seconds, the feed limits count accepted submissions over an hour.
//!
//! Each IP gets a fixed counting window. Stale entries are swept
//! opportunistically during checks.

use axum::{
    body::Body,
    http::{Request, Response, StatusCode},
    response::IntoResponse,
};
use std::collections::HashMap;
use std::future::Future;
use std::net::IpAddr;
use std::pin::Pin;
use std::sync::{Arc, RwLock};
use std::task::{Context, Poll};
use std::time::{Duration, Instant};
use tower::{Layer, Service};
use tracing::warn;

use crate::client_ip;

/// Guard configuration.
#[derive(Clone, Copy, Debug)]
pub struct GuardConfig {
    /// Maximum requests per window.
    pub requests_per_window: u32,
    /// Counting window duration.
    pub window: Duration,
    /// Cleanup interval for stale entries.
    pub cleanup_interval: Duration,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            // 300 requests per 10 seconds
            requests_per_window: 300,
            window: Duration::from_secs(10),
            // Sweep stale entries every 5 minutes
            cleanup_interval: Duration::from_secs(300),
        }
    }
}

/// Request counter for a single IP within one window.
#[derive(Debug, Clone)]
struct WindowCounter {
    count: u32,
    window_start: Instant,
}

impl WindowCounter {
    fn new() -> Self {
        Self {
            count: 0,
            window_start: Instant::now(),
        }
    }

    /// Counts one request, returning false once the window is full.
    fn try_admit(&mut self, config: &GuardConfig) -> bool {
        if self.window_start.elapsed() > config.window {
            self.count = 0;
            self.window_start = Instant::now();
        }

        if self.count >= config.requests_per_window {
            return false;
        }
        self.count += 1;
        true
    }

    fn is_stale(&self, cleanup_interval: Duration) -> bool {
        self.window_start.elapsed() > cleanup_interval
    }
}

/// Shared guard state across all requests.
#[derive(Debug)]
struct GuardState {
    counters: HashMap<IpAddr, WindowCounter>,
    config: GuardConfig,
    last_cleanup: Instant,
}

impl GuardState {
    fn new(config: GuardConfig) -> Self {
        Self {
            counters: HashMap::new(),
            config,
            last_cleanup: Instant::now(),
        }
    }

    fn check(&mut self, ip: IpAddr) -> bool {
        if self.last_cleanup.elapsed() > self.config.cleanup_interval {
            self.sweep_stale_counters();
        }

        let config = self.config;
        self.counters
            .entry(ip)
            .or_insert_with(WindowCounter::new)
            .try_admit(&config)
    }

    fn sweep_stale_counters(&mut self) {
        let cleanup_interval = self.config.cleanup_interval;
        let before_count = self.counters.len();
        self.counters
            .retain(|_, counter| !counter.is_stale(cleanup_interval));
        let removed = before_count - self.counters.len();
        if removed > 0 {
            tracing::debug!("Swept {} stale transport guard counters", removed);
        }
        self.last_cleanup = Instant::now();
    }
}

/// Transport guard layer that wraps services.
#[derive(Clone)]
pub struct TransportGuardLayer {
    state: Arc<RwLock<GuardState>>,
}

impl TransportGuardLayer {
    pub fn with_config(config: GuardConfig) -> Self {
        Self {
            state: Arc::new(RwLock::new(GuardState::new(config))),
        }
    }

    /// Guard profile for read endpoints.
    pub fn for_reads() -> Self {
        Self::with_config(GuardConfig::default())
    }

    /// Guard profile for write endpoints, more restrictive.
    pub fn for_writes() -> Self {
        Self::with_config(GuardConfig {
            // 30 writes per 10 seconds
            requests_per_window: 30,
            window: Duration::from_secs(10),
            cleanup_interval: Duration::from_secs(300),
        })
    }
}

impl<S> Layer<S> for TransportGuardLayer {
    type Service = TransportGuardService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TransportGuardService {
            inner,
            state: self.state.clone(),
        }
    }
}

/// Guard service wrapper.
#[derive(Clone)]
pub struct TransportGuardService<S> {
    inner: S,
    state: Arc<RwLock<GuardState>>,
}

impl<S> Service<Request<Body>> for TransportGuardService<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let client_ip = client_ip::from_request(&req);

        // Deny when the IP cannot be determined; an unattributable request
        // could otherwise bypass the guard entirely.
        let (allowed, retry_after) = if let Some(ip) = client_ip {
            let mut state = self.state.write().unwrap_or_else(|poisoned| {
                warn!("Transport guard state was poisoned, recovering");
                poisoned.into_inner()
            });
            (state.check(ip), state.config.window.as_secs())
        } else {
            warn!("Could not determine client IP, denying request");
            (false, GuardConfig::default().window.as_secs())
        };

        if !allowed {
            if let Some(ip) = client_ip {
                warn!("Transport guard tripped for IP: {}", ip);
            }
            let response = (
                StatusCode::TOO_MANY_REQUESTS,
                [("Retry-After", retry_after.to_string())],
                "Rate limit exceeded. Please slow down.",
            )
                .into_response();
            return Box::pin(async move { Ok(response) });
        }

        let future = self.inner.call(req);
        Box::pin(future)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_counter_fills_up() {
        let config = GuardConfig {
            requests_per_window: 10,
            window: Duration::from_secs(60),
            cleanup_interval: Duration::from_secs(300),
        };

        let mut counter = WindowCounter::new();
        for _ in 0..10 {
            assert!(counter.try_admit(&config));
        }
        assert!(!counter.try_admit(&config));
    }

    #[test]
    fn test_window_counter_resets_after_window() {
        let config = GuardConfig {
            requests_per_window: 1,
            window: Duration::from_millis(10),
            cleanup_interval: Duration::from_secs(300),
        };

        let mut counter = WindowCounter::new();
        assert!(counter.try_admit(&config));
        assert!(!counter.try_admit(&config));

        std::thread::sleep(Duration::from_millis(20));
        assert!(counter.try_admit(&config));
    }

    #[test]
    fn test_guard_state_isolates_ips() {
        let config = GuardConfig {
            requests_per_window: 5,
            window: Duration::from_secs(60),
            cleanup_interval: Duration::from_secs(300),
        };

        let mut state = GuardState::new(config);
        let ip: IpAddr = "192.168.1.1".parse().unwrap();

        for _ in 0..5 {
            assert!(state.check(ip));
        }
        assert!(!state.check(ip));

        let other: IpAddr = "192.168.1.2".parse().unwrap();
        assert!(state.check(other));
    }
}

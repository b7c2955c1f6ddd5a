//! Rate limiting middleware
//!
//! Sliding-window rate limiting, applied to the whole API: each client is
//! allowed a fixed number of requests per rolling window (5 per 10 seconds
//! by default) and excess requests receive a fixed 429 rejection with a
//! `Retry-After` header.
//!
//! # Algorithm
//!
//! Per client, the limiter keeps the timestamps of requests inside the
//! current window. A request is allowed while fewer than `max_requests`
//! timestamps remain after expired ones are pruned; the retry hint is the
//! time until the oldest timestamp leaves the window.
//!
//! # Storage
//!
//! State lives in-process behind a mutex. The system is explicitly
//! single-node (no distributed coordination in scope), so no external store
//! is involved.
//!
//! # Client identity
//!
//! The first `X-Forwarded-For` entry when present, otherwise the socket
//! peer address.

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use std::collections::{HashMap, VecDeque};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::{app::AppState, error::ApiError};

/// Outcome of a rate-limit check
#[derive(Debug, Clone, Copy)]
pub struct RateLimitDecision {
    /// Whether the request is allowed
    pub allowed: bool,

    /// Seconds until a retry can succeed (0 when allowed)
    pub retry_after_seconds: u64,
}

/// Sliding-window request limiter keyed by client address
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    clients: Mutex<HashMap<IpAddr, VecDeque<Instant>>>,
}

impl RateLimiter {
    /// Creates a limiter allowing `max_requests` per `window` per client
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Checks and records a request from `client` at the current time
    pub fn check(&self, client: IpAddr) -> RateLimitDecision {
        self.check_at(client, Instant::now())
    }

    fn check_at(&self, client: IpAddr, now: Instant) -> RateLimitDecision {
        let mut clients = self.clients.lock().unwrap_or_else(|e| e.into_inner());

        let hits = clients.entry(client).or_default();

        // Drop timestamps that have left the rolling window.
        while hits
            .front()
            .is_some_and(|&t| now.duration_since(t) >= self.window)
        {
            hits.pop_front();
        }

        if hits.len() < self.max_requests {
            hits.push_back(now);
            RateLimitDecision {
                allowed: true,
                retry_after_seconds: 0,
            }
        } else {
            let oldest = *hits.front().expect("window is non-empty when full");
            let remaining = self.window.saturating_sub(now.duration_since(oldest));
            RateLimitDecision {
                allowed: false,
                retry_after_seconds: remaining.as_millis().div_ceil(1000).max(1) as u64,
            }
        }
    }
}

/// Rate limiting middleware layer
///
/// Rejects over-limit requests with 429 before they reach any handler.
pub async fn rate_limit_layer(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let client = client_ip(&req);

    let decision = state.rate_limiter.check(client);
    if !decision.allowed {
        return Err(ApiError::TooManyRequests {
            retry_after: decision.retry_after_seconds,
        });
    }

    Ok(next.run(req).await)
}

/// Resolves the client address a request is limited by
fn client_ip(req: &Request) -> IpAddr {
    if let Some(forwarded) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            if let Ok(ip) = first.trim().parse() {
                return ip;
            }
        }
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

//! Per-client request rate limiting
//!
//! Fixed window per client IP: the first request opens a window, each later
//! request inside it is counted, and once `max_requests` have been counted
//! the client gets 429 until the window closes. Counters are process-local.

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::http::HttpError;

/// Above this many tracked clients, closed windows are swept on insert
const SWEEP_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    opened_at: Instant,
}

#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    clients: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Count one request for `client`; `false` means it must be refused
    pub async fn try_acquire(&self, client: &str) -> bool {
        let now = Instant::now();
        let mut clients = self.clients.lock().await;

        if let Some(window) = clients.get_mut(client) {
            if now.duration_since(window.opened_at) < self.window {
                if window.count >= self.max_requests {
                    return false;
                }
                window.count += 1;
                return true;
            }
        }

        if clients.len() >= SWEEP_THRESHOLD {
            let limit = self.window;
            clients.retain(|_, w| now.duration_since(w.opened_at) < limit);
        }
        clients.insert(
            client.to_string(),
            Window {
                count: 1,
                opened_at: now,
            },
        );
        true
    }

    /// Number of clients with a tracked window
    pub async fn tracked_clients(&self) -> usize {
        self.clients.lock().await.len()
    }
}

/// Axum middleware enforcing the limiter
pub async fn enforce(State(limiter): State<Arc<RateLimiter>>, request: Request, next: Next) -> Response {
    let client = client_key(&request);
    if !limiter.try_acquire(&client).await {
        tracing::warn!("Rate limit exceeded for client {}", client);
        return HttpError::rate_limited().into_response();
    }
    next.run(request).await
}

/// Client IP when the server was started with connect info, else a shared bucket
fn client_key(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

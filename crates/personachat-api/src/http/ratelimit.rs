//! Per-client rate limiting middleware.
//!
//! The client key is the socket peer address, falling back to `"unknown"`.
//! Behind a trusted reverse proxy (`rate_limit.trust_proxy_headers`), the
//! first `X-Forwarded-For` address or `X-Real-IP` is preferred instead.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use personachat_core::ratelimit::RateLimitDecision;

use super::error::AppError;
use crate::state::AppState;

pub const X_RATE_LIMIT_LIMIT: &str = "x-ratelimit-limit";
pub const X_RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
pub const X_RATE_LIMIT_RESET: &str = "x-ratelimit-reset";

/// Resolve the rate limit key for a request.
///
/// Forwarding headers are client-controlled, so they are only read when
/// `trust_proxy` is set.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy: bool) -> String {
    let forwarded = if trust_proxy { forwarded_client(headers) } else { None };
    if let Some(ip) = forwarded {
        return ip.to_string();
    }
    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn forwarded_client(headers: &HeaderMap) -> Option<&str> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    // X-Forwarded-For may list a proxy chain; the client is first.
    if let Some(ip) = header("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return Some(ip);
    }
    header("x-real-ip")
}

pub fn insert_rate_limit_headers(headers: &mut HeaderMap, decision: &RateLimitDecision) {
    for (name, value) in [
        (X_RATE_LIMIT_LIMIT, decision.limit.to_string()),
        (X_RATE_LIMIT_REMAINING, decision.remaining.to_string()),
        (X_RATE_LIMIT_RESET, decision.reset_at.to_string()),
    ] {
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.insert(name, value);
        }
    }
}

/// Count the request against its client's window; reject with 429 when
/// the window is exhausted.
pub async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let key = client_key(
        request.headers(),
        peer,
        state.config.rate_limit.trust_proxy_headers,
    );

    let decision = state.rate_limiter.check(&key);
    if !decision.allowed {
        warn!(client = %key, path = %request.uri().path(), "Rate limit exceeded");
        return AppError::RateLimited(decision).into_response();
    }

    let mut response = next.run(request).await;
    insert_rate_limit_headers(response.headers_mut(), &decision);
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn test_forwarded_for_takes_first_hop() {
        let h = headers(&[("x-forwarded-for", "203.0.113.7, 10.0.0.1"), ("x-real-ip", "10.0.0.2")]);
        assert_eq!(client_key(&h, None, true), "203.0.113.7");
    }

    #[test]
    fn test_real_ip_then_peer_then_unknown() {
        let h = headers(&[("x-real-ip", "198.51.100.4")]);
        assert_eq!(client_key(&h, None, true), "198.51.100.4");

        let peer: SocketAddr = "192.0.2.1:5555".parse().unwrap();
        assert_eq!(client_key(&HeaderMap::new(), Some(peer), true), "192.0.2.1");
        assert_eq!(client_key(&HeaderMap::new(), None, true), "unknown");
    }

    #[test]
    fn test_untrusted_headers_ignored() {
        let peer: SocketAddr = "192.0.2.1:5555".parse().unwrap();
        let h = headers(&[("x-forwarded-for", "203.0.113.7"), ("x-real-ip", "198.51.100.4")]);
        assert_eq!(client_key(&h, Some(peer), false), "192.0.2.1");
        assert_eq!(client_key(&h, None, false), "unknown");
    }

    #[test]
    fn test_headers_written() {
        let decision = RateLimitDecision {
            allowed: true,
            limit: 100,
            remaining: 42,
            reset_at: 1_700_000_000,
            retry_after_secs: 30,
        };
        let mut map = HeaderMap::new();
        insert_rate_limit_headers(&mut map, &decision);
        assert_eq!(map[X_RATE_LIMIT_LIMIT], "100");
        assert_eq!(map[X_RATE_LIMIT_REMAINING], "42");
        assert_eq!(map[X_RATE_LIMIT_RESET], "1700000000");
    }
}

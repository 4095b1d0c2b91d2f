//! Client address resolution.
//!
//! **Security Note**: X-Forwarded-For and X-Real-IP headers are only trusted
//! when the `TRUST_PROXY_HEADERS` environment variable is set to "true" or
//! "1". This prevents clients from spoofing their address when the server is
//! directly exposed.
//!
//! Resolution order:
//! 1. X-Forwarded-For header (first IP in chain) - only if TRUST_PROXY_HEADERS
//! 2. X-Real-IP header - only if TRUST_PROXY_HEADERS
//! 3. Connection peer address (always trusted)

use axum::http::{HeaderMap, Request};
use std::net::{IpAddr, SocketAddr};

fn trust_proxy_headers() -> bool {
    std::env::var("TRUST_PROXY_HEADERS")
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
        .unwrap_or(false)
}

/// Reads a client IP from proxy headers, when those are trusted.
fn from_headers(headers: &HeaderMap) -> Option<IpAddr> {
    if !trust_proxy_headers() {
        return None;
    }

    if let Some(forwarded) = headers.get("x-forwarded-for") {
        if let Ok(forwarded_str) = forwarded.to_str() {
            // First IP in the chain is the original client.
            if let Some(first_ip) = forwarded_str.split(',').next() {
                if let Ok(ip) = first_ip.trim().parse::<IpAddr>() {
                    return Some(ip);
                }
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(real_ip_str) = real_ip.to_str() {
            if let Ok(ip) = real_ip_str.trim().parse::<IpAddr>() {
                return Some(ip);
            }
        }
    }

    None
}

/// Resolves the client IP for a raw request, used by the transport guard.
pub fn from_request<B>(req: &Request<B>) -> Option<IpAddr> {
    if let Some(ip) = from_headers(req.headers()) {
        return Some(ip);
    }

    req.extensions()
        .get::<axum::extract::ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip())
}

/// Resolves the client address for handlers, falling back to the connection
/// peer.
pub fn resolve(headers: &HeaderMap, peer: SocketAddr) -> String {
    from_headers(headers)
        .unwrap_or_else(|| peer.ip())
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer() -> SocketAddr {
        "192.0.2.1:50000".parse().unwrap()
    }

    #[test]
    fn test_peer_address_used_without_proxy_trust() {
        std::env::remove_var("TRUST_PROXY_HEADERS");

        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.9".parse().unwrap());

        // The spoofable header is ignored.
        assert_eq!(resolve(&headers, peer()), "192.0.2.1");
    }

    #[test]
    fn test_plain_resolution() {
        std::env::remove_var("TRUST_PROXY_HEADERS");
        assert_eq!(resolve(&HeaderMap::new(), peer()), "192.0.2.1");
    }
}

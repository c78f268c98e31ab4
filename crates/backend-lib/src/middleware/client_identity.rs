//! Caller identity used as the rate-limit key.
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, FromRef, FromRequestParts},
    http::{request::Parts, HeaderMap},
};

use crate::AppState;

const FORWARDED_FOR: &str = "x-forwarded-for";
const REAL_IP: &str = "x-real-ip";
const UNKNOWN: &str = "unknown";

/// Client address as seen by the server.
///
/// The socket peer is the identity. Forwarding headers are only read when
/// the peer is one of the configured trusted proxies; then the client is
/// the right-most `X-Forwarded-For` hop that is not itself a trusted
/// proxy, or `X-Real-IP` when no forwarded chain is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity(pub String);

impl ClientIdentity {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn resolve(headers: &HeaderMap, peer: Option<SocketAddr>, trusted_proxies: &[IpAddr]) -> Self {
        let Some(peer_ip) = peer.map(|addr| addr.ip()) else {
            return ClientIdentity(UNKNOWN.to_string());
        };
        if !trusted_proxies.contains(&peer_ip) {
            return ClientIdentity(peer_ip.to_string());
        }

        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let client = match header(FORWARDED_FOR) {
            Some(chain) => forwarded_client(chain, trusted_proxies),
            None => header(REAL_IP).and_then(|v| v.parse::<IpAddr>().ok()),
        };
        ClientIdentity(client.unwrap_or(peer_ip).to_string())
    }

    pub(crate) fn from_parts(parts: &Parts, trusted_proxies: &[IpAddr]) -> Self {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Self::resolve(&parts.headers, peer, trusted_proxies)
    }
}

/// Walk the chain from the nearest hop; the first untrusted address is the client
fn forwarded_client(chain: &str, trusted_proxies: &[IpAddr]) -> Option<IpAddr> {
    for hop in chain.rsplit(',').map(str::trim).filter(|hop| !hop.is_empty()) {
        let ip = hop.parse::<IpAddr>().ok()?;
        if !trusted_proxies.contains(&ip) {
            return Some(ip);
        }
    }
    None
}

impl<S> FromRequestParts<S> for ClientIdentity
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app = Arc::<AppState>::from_ref(state);
        Ok(Self::from_parts(parts, &app.settings.rate_limit.trusted_proxies))
    }
}

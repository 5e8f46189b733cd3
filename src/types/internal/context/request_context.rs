use std::net::IpAddr;

use poem::Request;
use poem::http::header;
use poem_openapi::auth::{Bearer, BearerAuthorization};

/// Client facts taken from an HTTP request
///
/// Used for session bookkeeping, rate limiting and authentication.
#[derive(Clone, Default, PartialEq)]
pub struct RequestContext {
    /// IP address of the client making the request
    pub ip_address: Option<IpAddr>,

    /// User-Agent header, stored on the session row
    pub user_agent: Option<String>,

    /// Bearer token presented with the request, if any
    pub bearer: Option<String>,
}

impl RequestContext {
    /// Create a RequestContext from an incoming HTTP request
    ///
    /// Forwarding headers are read only when `trust_proxy_headers` is set;
    /// otherwise the peer address identifies the client.
    pub fn from_request(req: &Request, trust_proxy_headers: bool) -> Self {
        Self {
            ip_address: Self::extract_ip_address(req, trust_proxy_headers),
            user_agent: req
                .header(header::USER_AGENT)
                .map(|ua| ua.to_string()),
            bearer: Bearer::from_request(req).ok().map(|b| b.token),
        }
    }

    /// Context with no client facts, for internal callers and tests
    pub fn for_system() -> Self {
        Self::default()
    }

    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    /// Client key used for rate limiting and session records
    pub fn client_key(&self) -> String {
        self.ip_address
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Extract the client IP address
    ///
    /// Behind a trusted proxy, X-Forwarded-For then X-Real-IP win when they
    /// parse; the peer address is the fallback in every case.
    fn extract_ip_address(req: &Request, trust_proxy_headers: bool) -> Option<IpAddr> {
        let peer = req.remote_addr().as_socket_addr().map(|addr| addr.ip());
        if !trust_proxy_headers {
            return peer;
        }

        let forwarded = req
            .header("X-Forwarded-For")
            .and_then(|value| value.split(',').next())
            .and_then(|ip| ip.trim().parse().ok());
        let real_ip = req
            .header("X-Real-IP")
            .and_then(|value| value.trim().parse().ok());

        forwarded.or(real_ip).or(peer)
    }
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("ip_address", &self.ip_address)
            .field("user_agent", &self.user_agent)
            .field("bearer", &self.bearer.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

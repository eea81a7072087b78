use crate::core::error::AppError;
use crate::features::rate_limits::RateLimiter;
use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use base64::prelude::*;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::Span;
use uuid::Uuid;

/// Request ID generator using UUID v7 (time-ordered)
#[derive(Clone, Copy)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Custom MakeSpan that includes request_id in the tracing span
#[derive(Clone, Debug)]
pub struct MakeSpanWithRequestId;

impl<B> tower_http::trace::MakeSpan<B> for MakeSpanWithRequestId {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> Span {
        let request_id = request
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");

        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    }
}

pub fn basic_auth_middleware(
    valid_credentials: Arc<String>,
) -> impl Fn(
    Request,
    Next,
)
    -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, Response>> + Send>>
       + Clone {
    move |req: Request, next: Next| {
        let credentials = valid_credentials.clone();
        Box::pin(async move {
            let auth_header = req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|header| header.to_str().ok());

            if let Some(auth_header) = auth_header {
                if let Some(encoded) = auth_header.strip_prefix("Basic ") {
                    if let Ok(decoded) = BASE64_STANDARD.decode(encoded) {
                        if let Ok(creds) = String::from_utf8(decoded) {
                            if creds == *credentials {
                                return Ok(next.run(req).await);
                            }
                        }
                    }
                }
            }

            let mut response = Response::new(Body::from("Unauthorized"));
            *response.status_mut() = StatusCode::UNAUTHORIZED;
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Basic realm=\"metrics\""),
            );

            Err(response)
        })
    }
}

/// Per-source webhook limit together with the proxies allowed to name the source
#[derive(Clone)]
pub struct SourceRateLimit {
    limiter: Arc<dyn RateLimiter>,
    trusted_proxies: Arc<Vec<IpAddr>>,
}

impl SourceRateLimit {
    pub fn new(limiter: Arc<dyn RateLimiter>, trusted_proxies: Vec<IpAddr>) -> Self {
        Self {
            limiter,
            trusted_proxies: Arc::new(trusted_proxies),
        }
    }
}

/// Address a request came from.
///
/// This is the TCP peer. When the peer is a trusted proxy, the right-most
/// `X-Forwarded-For` hop that is not itself a trusted proxy is used instead.
pub fn source_address(req: &Request, trusted_proxies: &[IpAddr]) -> String {
    let Some(peer) = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
    else {
        return "unknown".to_string();
    };

    if !trusted_proxies.contains(&peer) {
        return peer.to_string();
    }

    let hops: Vec<&str> = req
        .headers()
        .get_all("x-forwarded-for")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|hop| !hop.is_empty())
        .collect();

    hops.into_iter()
        .rev()
        .find(|hop| {
            hop.parse::<IpAddr>()
                .map_or(true, |addr| !trusted_proxies.contains(&addr))
        })
        .map(str::to_string)
        .unwrap_or_else(|| peer.to_string())
}

/// Per-source-address sliding-window limit for public endpoints
pub async fn source_rate_limit_middleware(
    State(limit): State<SourceRateLimit>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let source = source_address(&req, &limit.trusted_proxies);

    if !limit.limiter.allow(&source).await? {
        tracing::warn!("Rate limit exceeded for source {}", source);
        return Err(AppError::RateLimitExceeded(
            "Too many requests, slow down".to_string(),
        ));
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROXY: [u8; 4] = [10, 0, 0, 2];

    fn request_from(peer: [u8; 4], forwarded: Option<&str>) -> Request {
        let mut builder = Request::builder();
        if let Some(forwarded) = forwarded {
            builder = builder.header("x-forwarded-for", forwarded);
        }
        let mut req = builder.body(Body::empty()).unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from((peer, 4242))));
        req
    }

    fn trusted() -> Vec<IpAddr> {
        vec![IpAddr::from(PROXY)]
    }

    #[test]
    fn test_untrusted_peer_ignores_forwarded_header() {
        let req = request_from([198, 51, 100, 4], Some("203.0.113.7"));
        assert_eq!(source_address(&req, &trusted()), "198.51.100.4");
        assert_eq!(source_address(&req, &[]), "198.51.100.4");
    }

    #[test]
    fn test_trusted_proxy_reports_right_most_untrusted_hop() {
        let req = request_from(PROXY, Some("1.1.1.1, 203.0.113.7"));
        assert_eq!(source_address(&req, &trusted()), "203.0.113.7");

        let chained = request_from(PROXY, Some("203.0.113.7, 10.0.0.2"));
        assert_eq!(source_address(&chained, &trusted()), "203.0.113.7");
    }

    #[test]
    fn test_trusted_proxy_without_header_is_the_source() {
        let req = request_from(PROXY, None);
        assert_eq!(source_address(&req, &trusted()), "10.0.0.2");
    }

    #[test]
    fn test_forwarded_header_alone_is_not_a_source() {
        let req = Request::builder()
            .header("x-forwarded-for", "203.0.113.7")
            .body(Body::empty())
            .unwrap();
        assert_eq!(source_address(&req, &trusted()), "unknown");
    }
}

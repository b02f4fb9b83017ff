//! Security middleware, listed outermost first as the router layers them

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::{self, Body},
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::Response,
};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use super::AppState;
use crate::error::AppError;
use crate::security::{detect_threat, Admission, SecurityEventKind, Threat};

const GENERAL_RATE_LIMIT: &str = "general";

/// Client address resolved once per request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

/// Socket peer, else the first `X-Forwarded-For` entry, else `unknown`
pub fn resolve_client_ip(request: &Request) -> String {
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "unknown".to_string())
}

fn client_ip(request: &Request) -> String {
    match request.extensions().get::<ClientIp>() {
        Some(ClientIp(ip)) => ip.clone(),
        None => resolve_client_ip(request),
    }
}

/// Apply the rate-limit budget for `identifier` and record rejections
pub fn enforce_rate_limit(state: &AppState, identifier: &str, ip: &str) -> Result<(), AppError> {
    if state.security.allow(identifier, ip) {
        return Ok(());
    }

    state.security.log.record(
        SecurityEventKind::RateLimitExceeded,
        json!({ "identifier": identifier, "ip": ip }),
    );
    Err(AppError::TooManyRequests("Rate limit exceeded"))
}

/// Tag the request with an id and client address, and log start and end
pub async fn monitor(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let request_id = Uuid::new_v4();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let ip = resolve_client_ip(&request);
    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    request.extensions_mut().insert(ClientIp(ip.clone()));

    info!(%request_id, %method, %path, client_ip = %ip, %user_agent, "Request started");
    let started = Instant::now();

    let mut response = next.run(request).await;

    let status = response.status();
    info!(
        %request_id,
        %method,
        %path,
        status = status.as_u16(),
        duration_ms = started.elapsed().as_millis() as u64,
        client_ip = %ip,
        "Request completed"
    );

    if status == StatusCode::NOT_FOUND && path.contains("..") {
        state.security.log.record(
            SecurityEventKind::PathTraversalAttempt,
            json!({ "path": path, "ip": ip }),
        );
    }

    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

/// Static hardening headers plus the Content-Security-Policy
pub async fn security_headers(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    let policy = &state.config.security;
    let headers = response.headers_mut();

    for (name, value) in &policy.headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            headers.insert(name, value);
        }
    }

    if let Ok(csp) = HeaderValue::from_str(&policy.content_security_policy()) {
        headers.insert(header::CONTENT_SECURITY_POLICY, csp);
    }

    response
}

/// Refuse IPs that open too many connections
pub async fn track_connections(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = client_ip(&request);

    match state.security.connections.admit(&ip) {
        Admission::Allowed => Ok(next.run(request).await),
        Admission::Blocked => {
            state
                .security
                .log
                .record(SecurityEventKind::DdosBlocked, json!({ "ip": ip, "blocked": true }));
            Err(AppError::TooManyRequests("Too many requests"))
        }
        Admission::NewlyBlocked { connections } => {
            state.security.log.record(
                SecurityEventKind::DdosBlocked,
                json!({ "ip": ip, "connections": connections }),
            );
            Err(AppError::TooManyRequests("Too many connections"))
        }
    }
}

/// Body size and content type checks
pub async fn validate_input(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let max_body_size = state.config.security.max_body_size;

    let content_length = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(0);

    if content_length > max_body_size as u64 {
        state.security.log.record(
            SecurityEventKind::InputValidationFailed,
            json!({ "reason": "Request too large", "size": content_length }),
        );
        return Err(AppError::PayloadTooLarge);
    }

    if matches!(*request.method(), Method::POST | Method::PUT) {
        let content_type = request
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if !content_type.contains("application/json")
            && !content_type.contains("multipart/form-data")
        {
            state.security.log.record(
                SecurityEventKind::InputValidationFailed,
                json!({ "reason": "Invalid content type", "contentType": content_type }),
            );
            return Err(AppError::bad_request("Invalid content type"));
        }
    }

    Ok(next.run(request).await)
}

/// Scan the body and query for SQL injection and XSS patterns
///
/// The body is buffered (bounded by `max_body_size`) and handed on unchanged.
pub async fn inspect_input(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = client_ip(&request);
    let (parts, body) = request.into_parts();

    let max_body_size = state.config.security.max_body_size;
    let bytes = match body::to_bytes(body, max_body_size).await {
        Ok(bytes) => bytes,
        Err(_) => {
            state.security.log.record(
                SecurityEventKind::InputValidationFailed,
                json!({ "reason": "Request too large", "limit": max_body_size, "ip": ip }),
            );
            return Err(AppError::PayloadTooLarge);
        }
    };

    let query: BTreeMap<String, String> = parts
        .uri
        .query()
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default();

    let mut scanned = body_text(&bytes);
    scanned.push_str(&serde_json::to_string(&query).map_err(anyhow::Error::from)?);

    if let Some(finding) = detect_threat(&scanned) {
        let kind = match finding.threat {
            Threat::SqlInjection => SecurityEventKind::SqlInjectionAttempt,
            Threat::Xss => SecurityEventKind::XssAttempt,
        };
        state
            .security
            .log
            .record(kind, json!({ "pattern": finding.pattern, "ip": ip }));
        return Err(AppError::bad_request("Invalid input detected"));
    }

    Ok(next
        .run(Request::from_parts(parts, Body::from(bytes)))
        .await)
}

/// JSON bodies are scanned in their compact serialized form; anything else
/// (multipart, malformed JSON) scans as an empty object
fn body_text(bytes: &[u8]) -> String {
    serde_json::from_slice::<Value>(bytes)
        .map(|value| value.to_string())
        .unwrap_or_else(|_| "{}".to_string())
}

/// Budget shared by every route
pub async fn general_rate_limit(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = client_ip(&request);
    enforce_rate_limit(&state, GENERAL_RATE_LIMIT, &ip)?;
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> axum::http::request::Builder {
        axum::http::Request::builder().uri("/api/health")
    }

    #[test]
    fn test_client_ip_prefers_socket_peer() {
        let mut req = request()
            .header("x-forwarded-for", "203.0.113.9")
            .body(Body::empty())
            .unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([10, 1, 2, 3], 5000))));

        assert_eq!(resolve_client_ip(&req), "10.1.2.3");
    }

    #[test]
    fn test_client_ip_forwarded_for() {
        let req = request()
            .header("x-forwarded-for", " 203.0.113.9 , 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(resolve_client_ip(&req), "203.0.113.9");

        let req = request().body(Body::empty()).unwrap();
        assert_eq!(resolve_client_ip(&req), "unknown");
    }

    #[test]
    fn test_tagged_ip_wins() {
        let mut req = request()
            .header("x-forwarded-for", "203.0.113.9")
            .body(Body::empty())
            .unwrap();
        req.extensions_mut().insert(ClientIp("198.51.100.7".to_string()));

        assert_eq!(client_ip(&req), "198.51.100.7");
    }

    #[test]
    fn test_body_text() {
        assert_eq!(body_text(b""), "{}");
        assert_eq!(body_text(b"{ \"a\" : 1 }"), r#"{"a":1}"#);
        assert_eq!(body_text(b"not json"), "{}");
        assert_eq!(
            body_text(b"--XyZ\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\n1\r\n--XyZ--"),
            "{}"
        );
    }
}

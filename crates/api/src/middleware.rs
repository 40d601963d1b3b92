use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use letmebuy_auth::{Actor, JwtValidator};

use crate::app::errors::json_error;
use crate::context::CurrentActor;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
}

/// Resolve the optional bearer token into a [`CurrentActor`].
///
/// No `Authorization` header means an anonymous caller; a header that is
/// malformed, badly signed or expired is rejected with 401.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let actor = match extract_bearer(req.headers()) {
        Ok(None) => None,
        Ok(Some(token)) => match state.jwt.validate(token, Utc::now()) {
            Ok(claims) => Some(Actor::from(&claims)),
            Err(e) => {
                debug!(error = %e, "bearer token rejected");
                return json_error(StatusCode::UNAUTHORIZED, "invalid_token", e.to_string());
            }
        },
        Err(message) => return json_error(StatusCode::UNAUTHORIZED, "invalid_token", message),
    };

    req.extensions_mut().insert(CurrentActor::new(actor));
    next.run(req).await
}

fn extract_bearer(headers: &HeaderMap) -> Result<Option<&str>, &'static str> {
    let Some(header) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let header = header
        .to_str()
        .map_err(|_| "authorization header is not valid ASCII")?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or("authorization header must use the Bearer scheme")?
        .trim();
    if token.is_empty() {
        return Err("bearer token is empty");
    }

    Ok(Some(token))
}

/// One span per request, tagged with a fresh UUIDv7 echoed back in `x-request-id`.
pub async fn request_span(req: axum::http::Request<axum::body::Body>, next: Next) -> Response {
    let request_id = Uuid::now_v7();
    let span = info_span!(
        "request",
        method = %req.method(),
        path = %req.uri().path(),
        %request_id
    );

    async move {
        let started = Instant::now();
        let mut response = next.run(req).await;
        info!(
            status = response.status().as_u16(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "request completed"
        );
        if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        response
    }
    .instrument(span)
    .await
}

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use letmebuy_auth::{AccessError, PasswordError};
use letmebuy_core::{DomainError, Outcome};
use letmebuy_infra::GatewayError;

/// Handlers return the error branch as a ready response so `?` short-circuits.
pub type ApiResult = Result<Response, Response>;

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Map a CRUD outcome; `ok` renders the success value.
pub fn outcome_to_response<T>(
    result: Result<Outcome<T>, GatewayError>,
    ok: impl FnOnce(T) -> Response,
) -> Response {
    match result {
        Ok(Outcome::Success(value)) => ok(value),
        Ok(Outcome::NotFound) => json_error(StatusCode::NOT_FOUND, "not_found", "resource not found"),
        Ok(Outcome::Conflict(reason)) => {
            json_error(StatusCode::BAD_REQUEST, "integrity_violation", reason)
        }
        Ok(Outcome::Unauthorized) => json_error(StatusCode::FORBIDDEN, "access_denied", "access denied"),
        Err(e) => gateway_error_to_response(e),
    }
}

pub fn gateway_error_to_response(err: GatewayError) -> Response {
    match err {
        GatewayError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "resource not found"),
        GatewayError::IntegrityViolation(reason) => {
            json_error(StatusCode::BAD_REQUEST, "integrity_violation", reason)
        }
        GatewayError::Backend(reason) => {
            error!(%reason, "storage backend failure");
            internal_error()
        }
    }
}

pub fn access_error_to_response(err: AccessError) -> Response {
    match err {
        AccessError::Unauthenticated => {
            json_error(StatusCode::UNAUTHORIZED, "unauthenticated", err.to_string())
        }
        AccessError::Forbidden { .. } => {
            json_error(StatusCode::FORBIDDEN, "access_denied", err.to_string())
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
    }
}

pub fn password_error_to_response(err: PasswordError) -> Response {
    error!(error = %err, "password hashing failed");
    internal_error()
}

fn internal_error() -> Response {
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        "an unexpected error occurred",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcomes_map_to_statuses() {
        let ok = |_: ()| StatusCode::OK.into_response();
        let status = |r: Result<Outcome<()>, GatewayError>| outcome_to_response(r, ok).status();

        assert_eq!(status(Ok(Outcome::Success(()))), StatusCode::OK);
        assert_eq!(status(Ok(Outcome::NotFound)), StatusCode::NOT_FOUND);
        assert_eq!(status(Ok(Outcome::Conflict("in use".into()))), StatusCode::BAD_REQUEST);
        assert_eq!(status(Ok(Outcome::Unauthorized)), StatusCode::FORBIDDEN);
        assert_eq!(status(Err(GatewayError::backend("down"))), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn access_errors_distinguish_missing_and_insufficient_credentials() {
        assert_eq!(
            access_error_to_response(AccessError::Unauthenticated).status(),
            StatusCode::UNAUTHORIZED
        );
        let forbidden = AccessError::Forbidden {
            operation: "delete",
            kind: letmebuy_core::ResourceKind::Product,
            required: vec!["ADMIN".into()],
        };
        assert_eq!(access_error_to_response(forbidden).status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn domain_errors_are_client_errors() {
        assert_eq!(
            domain_error_to_response(DomainError::validation("name must not be blank")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            domain_error_to_response(DomainError::invalid_id("ProductId: must be positive")).status(),
            StatusCode::BAD_REQUEST
        );
    }
}

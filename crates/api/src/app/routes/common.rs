//! Shared steps of every resource handler: policy, id parsing, validation, rendering.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

use letmebuy_auth::{check_access, AccessError, Actor, Operation};
use letmebuy_core::{DomainError, Entity, Outcome, Page, PageRequest, ResourceKind, Validate};
use letmebuy_infra::GatewayError;

use crate::app::{dto::{self, PageParams}, errors};
use crate::context::CurrentActor;

pub fn allow(actor: &CurrentActor, operation: Operation, kind: ResourceKind) -> Result<(), Response> {
    check_access(actor.get(), operation, kind).map_err(errors::access_error_to_response)
}

pub fn require_actor(actor: &CurrentActor) -> Result<&Actor, Response> {
    actor
        .get()
        .ok_or_else(|| errors::access_error_to_response(AccessError::Unauthenticated))
}

pub fn parse_id<I>(raw: &str) -> Result<I, Response>
where
    I: core::str::FromStr<Err = DomainError>,
{
    raw.parse().map_err(errors::domain_error_to_response)
}

pub fn validated<T: Validate>(input: T) -> Result<T, Response> {
    input.validate().map_err(errors::domain_error_to_response)?;
    Ok(input)
}

pub fn page_request<E: Entity>(params: &PageParams) -> Result<PageRequest, Response> {
    params.to_request::<E>().map_err(errors::domain_error_to_response)
}

pub fn page_response<E>(
    result: Result<Outcome<Page<E>>, GatewayError>,
    to_json: impl FnMut(E) -> Value,
) -> Response {
    errors::outcome_to_response(result, |page| {
        (StatusCode::OK, Json(dto::page_to_json(page, to_json))).into_response()
    })
}

pub fn entity_response<E>(
    result: Result<Outcome<E>, GatewayError>,
    to_json: impl FnOnce(E) -> Value,
) -> Response {
    errors::outcome_to_response(result, |entity| (StatusCode::OK, Json(to_json(entity))).into_response())
}

/// 201 with a `Location` pointing at the new record under `base`.
pub fn created_response<E: Entity>(
    result: Result<Outcome<E>, GatewayError>,
    base: &str,
    to_json: impl FnOnce(E) -> Value,
) -> Response {
    errors::outcome_to_response(result, |entity| {
        let location = entity
            .id()
            .and_then(|id| HeaderValue::from_str(&format!("{base}/{id}")).ok());
        let body = Json(to_json(entity));
        match location {
            Some(location) => (StatusCode::CREATED, [(header::LOCATION, location)], body).into_response(),
            None => (StatusCode::CREATED, body).into_response(),
        }
    })
}

pub fn deleted_response(result: Result<Outcome<()>, GatewayError>) -> Response {
    errors::outcome_to_response(result, |()| StatusCode::NO_CONTENT.into_response())
}

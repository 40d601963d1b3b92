use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use crate::app::{errors::ApiResult, routes::common};
use crate::context::CurrentActor;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(actor): Extension<CurrentActor>) -> ApiResult {
    let actor = common::require_actor(&actor)?;
    Ok(Json(serde_json::json!({
        "id": actor.id(),
        "roles": actor.roles().labels(),
        "admin": actor.is_admin(),
    }))
    .into_response())
}

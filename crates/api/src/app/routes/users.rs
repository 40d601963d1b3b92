use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    routing::get,
    Json, Router,
};

use letmebuy_auth::{hash_password, Operation, User, UserFilter};
use letmebuy_core::{ResourceKind, UserId};

use crate::app::{
    dto,
    errors::{self, ApiResult},
    routes::common,
    services::AppServices,
};
use crate::context::CurrentActor;

const KIND: ResourceKind = ResourceKind::User;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<CurrentActor>,
    Query(params): Query<dto::PageParams>,
    Query(query): Query<dto::UserQuery>,
) -> ApiResult {
    common::allow(&actor, Operation::List, KIND)?;
    let page = common::page_request::<User>(&params)?;
    let filter = UserFilter::from(query);
    let result = services.users.find_all_paged(&page, &filter).await;
    Ok(common::page_response(result, dto::user_to_json))
}

/// Any authenticated caller may ask; only the owner or an admin gets the record.
pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<CurrentActor>,
    Path(id): Path<String>,
) -> ApiResult {
    common::allow(&actor, Operation::Read, KIND)?;
    let id: UserId = common::parse_id(&id)?;
    let result = services.users.find_by_id(actor.get(), id).await;
    Ok(common::entity_response(result, dto::user_to_json))
}

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<CurrentActor>,
    Json(body): Json<dto::CreateUserRequest>,
) -> ApiResult {
    common::allow(&actor, Operation::Create, KIND)?;
    body.check_password().map_err(errors::domain_error_to_response)?;

    let password_hash = hash_password(&body.password).map_err(errors::password_error_to_response)?;
    let input = common::validated(body.into_new_user(password_hash))?;

    let result = services.users.create(input).await;
    Ok(common::created_response(result, "/users", dto::user_to_json))
}

/// Owners may edit their own profile; roles only change when an admin asks.
pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<CurrentActor>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateUserRequest>,
) -> ApiResult {
    common::allow(&actor, Operation::Update, KIND)?;
    let id: UserId = common::parse_id(&id)?;
    let input = common::validated(body.into_update(actor.is_admin()))?;
    let result = services.users.update(actor.get(), id, input).await;
    Ok(common::entity_response(result, dto::user_to_json))
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<CurrentActor>,
    Path(id): Path<String>,
) -> ApiResult {
    common::allow(&actor, Operation::Delete, KIND)?;
    let id: UserId = common::parse_id(&id)?;
    Ok(common::deleted_response(services.users.delete(id).await))
}

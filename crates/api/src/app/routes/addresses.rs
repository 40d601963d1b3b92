use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    routing::get,
    Json, Router,
};

use letmebuy_auth::Operation;
use letmebuy_core::{AddressId, ResourceKind};
use letmebuy_customers::{Address, AddressFilter, AddressInput};

use crate::app::{dto, errors::ApiResult, routes::common, services::AppServices};
use crate::context::CurrentActor;

const KIND: ResourceKind = ResourceKind::Address;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_addresses).post(create_address))
        .route("/:id", get(get_address).put(update_address).delete(delete_address))
}

pub async fn list_addresses(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<CurrentActor>,
    Query(params): Query<dto::PageParams>,
    Query(query): Query<dto::AddressQuery>,
) -> ApiResult {
    common::allow(&actor, Operation::List, KIND)?;
    let page = common::page_request::<Address>(&params)?;
    let filter = AddressFilter::from(query);
    let result = services.addresses.find_all_paged(&page, &filter).await;
    Ok(common::page_response(result, dto::address_to_json))
}

pub async fn get_address(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<CurrentActor>,
    Path(id): Path<String>,
) -> ApiResult {
    common::allow(&actor, Operation::Read, KIND)?;
    let id: AddressId = common::parse_id(&id)?;
    let result = services.addresses.find_by_id(actor.get(), id).await;
    Ok(common::entity_response(result, dto::address_to_json))
}

pub async fn create_address(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<CurrentActor>,
    Json(body): Json<dto::AddressRequest>,
) -> ApiResult {
    common::allow(&actor, Operation::Create, KIND)?;
    let input = common::validated(AddressInput::from(body))?;
    let result = services.addresses.create(input).await;
    Ok(common::created_response(result, "/addresses", dto::address_to_json))
}

pub async fn update_address(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<CurrentActor>,
    Path(id): Path<String>,
    Json(body): Json<dto::AddressRequest>,
) -> ApiResult {
    common::allow(&actor, Operation::Update, KIND)?;
    let id: AddressId = common::parse_id(&id)?;
    let input = common::validated(AddressInput::from(body))?;
    let result = services.addresses.update(actor.get(), id, input).await;
    Ok(common::entity_response(result, dto::address_to_json))
}

pub async fn delete_address(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<CurrentActor>,
    Path(id): Path<String>,
) -> ApiResult {
    common::allow(&actor, Operation::Delete, KIND)?;
    let id: AddressId = common::parse_id(&id)?;
    Ok(common::deleted_response(services.addresses.delete(id).await))
}

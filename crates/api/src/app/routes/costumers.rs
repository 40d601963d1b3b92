use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    routing::get,
    Json, Router,
};

use letmebuy_auth::Operation;
use letmebuy_core::{CostumerId, ResourceKind};
use letmebuy_customers::{Costumer, CostumerFilter, CostumerInput};

use crate::app::{dto, errors::ApiResult, routes::common, services::AppServices};
use crate::context::CurrentActor;

const KIND: ResourceKind = ResourceKind::Costumer;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_costumers).post(create_costumer))
        .route("/:id", get(get_costumer).put(update_costumer).delete(delete_costumer))
}

pub async fn list_costumers(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<CurrentActor>,
    Query(params): Query<dto::PageParams>,
    Query(query): Query<dto::CostumerQuery>,
) -> ApiResult {
    common::allow(&actor, Operation::List, KIND)?;
    let page = common::page_request::<Costumer>(&params)?;
    let filter = CostumerFilter::from(query);
    let result = services.costumers.find_all_paged(&page, &filter).await;
    Ok(common::page_response(result, dto::costumer_to_json))
}

pub async fn get_costumer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<CurrentActor>,
    Path(id): Path<String>,
) -> ApiResult {
    common::allow(&actor, Operation::Read, KIND)?;
    let id: CostumerId = common::parse_id(&id)?;
    let result = services.costumers.find_by_id(actor.get(), id).await;
    Ok(common::entity_response(result, dto::costumer_to_json))
}

pub async fn create_costumer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<CurrentActor>,
    Json(body): Json<dto::CostumerRequest>,
) -> ApiResult {
    common::allow(&actor, Operation::Create, KIND)?;
    let input = common::validated(CostumerInput::from(body))?;
    let result = services.costumers.create(input).await;
    Ok(common::created_response(result, "/costumers", dto::costumer_to_json))
}

pub async fn update_costumer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<CurrentActor>,
    Path(id): Path<String>,
    Json(body): Json<dto::CostumerRequest>,
) -> ApiResult {
    common::allow(&actor, Operation::Update, KIND)?;
    let id: CostumerId = common::parse_id(&id)?;
    let input = common::validated(CostumerInput::from(body))?;
    let result = services.costumers.update(actor.get(), id, input).await;
    Ok(common::entity_response(result, dto::costumer_to_json))
}

/// Costumers with addresses or orders cannot be deleted.
pub async fn delete_costumer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<CurrentActor>,
    Path(id): Path<String>,
) -> ApiResult {
    common::allow(&actor, Operation::Delete, KIND)?;
    let id: CostumerId = common::parse_id(&id)?;
    Ok(common::deleted_response(services.costumers.delete(id).await))
}

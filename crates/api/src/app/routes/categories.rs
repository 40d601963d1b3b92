use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    routing::get,
    Json, Router,
};

use letmebuy_auth::Operation;
use letmebuy_core::{CategoryId, ResourceKind};
use letmebuy_catalog::{Category, CategoryFilter, CategoryInput};

use crate::app::{dto, errors::ApiResult, routes::common, services::AppServices};
use crate::context::CurrentActor;

const KIND: ResourceKind = ResourceKind::Category;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route("/:id", get(get_category).put(update_category).delete(delete_category))
}

pub async fn list_categories(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<CurrentActor>,
    Query(params): Query<dto::PageParams>,
    Query(query): Query<dto::CategoryQuery>,
) -> ApiResult {
    common::allow(&actor, Operation::List, KIND)?;
    let page = common::page_request::<Category>(&params)?;
    let filter = CategoryFilter::from(query);
    let result = services.categories.find_all_paged(&page, &filter).await;
    Ok(common::page_response(result, dto::category_to_json))
}

pub async fn get_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<CurrentActor>,
    Path(id): Path<String>,
) -> ApiResult {
    common::allow(&actor, Operation::Read, KIND)?;
    let id: CategoryId = common::parse_id(&id)?;
    let result = services.categories.find_by_id(actor.get(), id).await;
    Ok(common::entity_response(result, dto::category_to_json))
}

pub async fn create_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<CurrentActor>,
    Json(body): Json<dto::CategoryRequest>,
) -> ApiResult {
    common::allow(&actor, Operation::Create, KIND)?;
    let input = common::validated(CategoryInput::from(body))?;
    let result = services.categories.create(input).await;
    Ok(common::created_response(result, "/categories", dto::category_to_json))
}

pub async fn update_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<CurrentActor>,
    Path(id): Path<String>,
    Json(body): Json<dto::CategoryRequest>,
) -> ApiResult {
    common::allow(&actor, Operation::Update, KIND)?;
    let id: CategoryId = common::parse_id(&id)?;
    let input = common::validated(CategoryInput::from(body))?;
    let result = services.categories.update(actor.get(), id, input).await;
    Ok(common::entity_response(result, dto::category_to_json))
}

pub async fn delete_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<CurrentActor>,
    Path(id): Path<String>,
) -> ApiResult {
    common::allow(&actor, Operation::Delete, KIND)?;
    let id: CategoryId = common::parse_id(&id)?;
    Ok(common::deleted_response(services.categories.delete(id).await))
}

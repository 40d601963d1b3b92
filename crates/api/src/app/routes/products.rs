use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    response::Response,
    routing::get,
    Json, Router,
};

use letmebuy_auth::Operation;
use letmebuy_catalog::{FeedbackFilter, FeedbackSummary, Product, ProductFilter, ProductInput};
use letmebuy_core::page::MAX_PAGE_SIZE;
use letmebuy_core::{Entity, Outcome, Page, PageRequest, ProductId, ResourceKind, Sort};

use crate::app::{dto, errors::{self, ApiResult}, routes::common, services::AppServices};
use crate::context::CurrentActor;

const KIND: ResourceKind = ResourceKind::Product;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/:id", get(get_product).put(update_product).delete(delete_product))
}

/// Walks every review of one product, a full page at a time.
async fn feedback_summary(
    services: &AppServices,
    product_id: ProductId,
) -> Result<FeedbackSummary, Response> {
    let filter = FeedbackFilter { product_id: Some(product_id) };
    let mut request = PageRequest::new(Some(0), Some(MAX_PAGE_SIZE)).with_sort(Sort::asc("id"));
    let mut summary = FeedbackSummary::default();
    loop {
        let page = services
            .feedbacks
            .find_all_paged(&request, &filter)
            .await
            .map_err(errors::gateway_error_to_response)?
            .success()
            .unwrap_or_else(|| Page::empty(&request));
        page.content.iter().for_each(|feedback| summary.add(feedback));
        if page.is_empty() || u64::from(request.page) + 1 >= page.total_pages {
            return Ok(summary);
        }
        request.page += 1;
    }
}

async fn feedback_summaries(
    services: &AppServices,
    products: &[Product],
) -> Result<BTreeMap<ProductId, FeedbackSummary>, Response> {
    let mut summaries = BTreeMap::new();
    for product_id in products.iter().filter_map(|product| product.id()) {
        summaries.insert(product_id, feedback_summary(services, product_id).await?);
    }
    Ok(summaries)
}

/// Public catalog listing, filterable by `category_id` and `name`.
/// Each product carries its review count and average rating.
pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<CurrentActor>,
    Query(params): Query<dto::PageParams>,
    Query(query): Query<dto::ProductQuery>,
) -> ApiResult {
    common::allow(&actor, Operation::List, KIND)?;
    let page = common::page_request::<Product>(&params)?;
    let filter = ProductFilter::from(query);
    let result = services.products.find_all_paged(&page, &filter).await;
    let summaries = match &result {
        Ok(Outcome::Success(found)) => feedback_summaries(&services, &found.content).await?,
        _ => BTreeMap::new(),
    };
    Ok(common::page_response(result, |product| {
        let summary = product
            .id()
            .and_then(|id| summaries.get(&id).copied())
            .unwrap_or_default();
        dto::product_with_feedback_to_json(product, summary)
    }))
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<CurrentActor>,
    Path(id): Path<String>,
) -> ApiResult {
    common::allow(&actor, Operation::Read, KIND)?;
    let id: ProductId = common::parse_id(&id)?;
    let result = services.products.find_by_id(actor.get(), id).await;
    let summary = match &result {
        Ok(Outcome::Success(_)) => feedback_summary(&services, id).await?,
        _ => FeedbackSummary::default(),
    };
    Ok(common::entity_response(result, |product| {
        dto::product_with_feedback_to_json(product, summary)
    }))
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<CurrentActor>,
    Json(body): Json<dto::ProductRequest>,
) -> ApiResult {
    common::allow(&actor, Operation::Create, KIND)?;
    let input = common::validated(ProductInput::from(body))?;
    let result = services.products.create(input).await;
    Ok(common::created_response(result, "/products", dto::product_to_json))
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<CurrentActor>,
    Path(id): Path<String>,
    Json(body): Json<dto::ProductRequest>,
) -> ApiResult {
    common::allow(&actor, Operation::Update, KIND)?;
    let id: ProductId = common::parse_id(&id)?;
    let input = common::validated(ProductInput::from(body))?;
    let result = services.products.update(actor.get(), id, input).await;
    Ok(common::entity_response(result, dto::product_to_json))
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<CurrentActor>,
    Path(id): Path<String>,
) -> ApiResult {
    common::allow(&actor, Operation::Delete, KIND)?;
    let id: ProductId = common::parse_id(&id)?;
    Ok(common::deleted_response(services.products.delete(id).await))
}

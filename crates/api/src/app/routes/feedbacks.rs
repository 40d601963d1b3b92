use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    routing::get,
    Json, Router,
};

use letmebuy_auth::Operation;
use letmebuy_catalog::{Feedback, FeedbackFilter, FeedbackUpdate};
use letmebuy_core::{FeedbackId, ResourceKind};

use crate::app::{dto, errors::ApiResult, routes::common, services::AppServices};
use crate::context::CurrentActor;

const KIND: ResourceKind = ResourceKind::Feedback;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_feedbacks).post(create_feedback))
        .route("/:id", get(get_feedback).put(update_feedback).delete(delete_feedback))
}

pub async fn list_feedbacks(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<CurrentActor>,
    Query(params): Query<dto::PageParams>,
    Query(query): Query<dto::FeedbackQuery>,
) -> ApiResult {
    common::allow(&actor, Operation::List, KIND)?;
    let page = common::page_request::<Feedback>(&params)?;
    let filter = FeedbackFilter::from(query);
    let result = services.feedbacks.find_all_paged(&page, &filter).await;
    Ok(common::page_response(result, dto::feedback_to_json))
}

pub async fn get_feedback(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<CurrentActor>,
    Path(id): Path<String>,
) -> ApiResult {
    common::allow(&actor, Operation::Read, KIND)?;
    let id: FeedbackId = common::parse_id(&id)?;
    let result = services.feedbacks.find_by_id(actor.get(), id).await;
    Ok(common::entity_response(result, dto::feedback_to_json))
}

/// The review is attributed to the caller, never to a user named in the body.
pub async fn create_feedback(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<CurrentActor>,
    Json(body): Json<dto::CreateFeedbackRequest>,
) -> ApiResult {
    common::allow(&actor, Operation::Create, KIND)?;
    let author = common::require_actor(&actor)?.id();
    let input = common::validated(body.into_new_feedback(author))?;
    let result = services.feedbacks.create(input).await;
    Ok(common::created_response(result, "/feedbacks", dto::feedback_to_json))
}

pub async fn update_feedback(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<CurrentActor>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateFeedbackRequest>,
) -> ApiResult {
    common::allow(&actor, Operation::Update, KIND)?;
    let id: FeedbackId = common::parse_id(&id)?;
    let input = common::validated(FeedbackUpdate::from(body))?;
    let result = services.feedbacks.update(actor.get(), id, input).await;
    Ok(common::entity_response(result, dto::feedback_to_json))
}

pub async fn delete_feedback(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<CurrentActor>,
    Path(id): Path<String>,
) -> ApiResult {
    common::allow(&actor, Operation::Delete, KIND)?;
    let id: FeedbackId = common::parse_id(&id)?;
    Ok(common::deleted_response(services.feedbacks.delete(id).await))
}

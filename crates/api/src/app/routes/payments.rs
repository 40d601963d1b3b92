use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    routing::get,
    Json, Router,
};

use letmebuy_auth::Operation;
use letmebuy_core::{PaymentId, ResourceKind};
use letmebuy_sales::{Payment, PaymentFilter, PaymentInput};

use crate::app::{dto, errors::ApiResult, routes::common, services::AppServices};
use crate::context::CurrentActor;

const KIND: ResourceKind = ResourceKind::Payment;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_payments).post(create_payment))
        .route("/:id", get(get_payment).put(update_payment).delete(delete_payment))
}

pub async fn list_payments(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<CurrentActor>,
    Query(params): Query<dto::PageParams>,
    Query(query): Query<dto::PaymentQuery>,
) -> ApiResult {
    common::allow(&actor, Operation::List, KIND)?;
    let page = common::page_request::<Payment>(&params)?;
    let filter = PaymentFilter::from(query);
    let result = services.payments.find_all_paged(&page, &filter).await;
    Ok(common::page_response(result, dto::payment_to_json))
}

pub async fn get_payment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<CurrentActor>,
    Path(id): Path<String>,
) -> ApiResult {
    common::allow(&actor, Operation::Read, KIND)?;
    let id: PaymentId = common::parse_id(&id)?;
    let result = services.payments.find_by_id(actor.get(), id).await;
    Ok(common::entity_response(result, dto::payment_to_json))
}

/// One payment per order; a second one for the same order is an integrity violation.
pub async fn create_payment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<CurrentActor>,
    Json(body): Json<dto::PaymentRequest>,
) -> ApiResult {
    common::allow(&actor, Operation::Create, KIND)?;
    let input = common::validated(PaymentInput::from(body))?;
    let result = services.payments.create(input).await;
    Ok(common::created_response(result, "/payments", dto::payment_to_json))
}

pub async fn update_payment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<CurrentActor>,
    Path(id): Path<String>,
    Json(body): Json<dto::PaymentRequest>,
) -> ApiResult {
    common::allow(&actor, Operation::Update, KIND)?;
    let id: PaymentId = common::parse_id(&id)?;
    let input = common::validated(PaymentInput::from(body))?;
    let result = services.payments.update(actor.get(), id, input).await;
    Ok(common::entity_response(result, dto::payment_to_json))
}

pub async fn delete_payment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<CurrentActor>,
    Path(id): Path<String>,
) -> ApiResult {
    common::allow(&actor, Operation::Delete, KIND)?;
    let id: PaymentId = common::parse_id(&id)?;
    Ok(common::deleted_response(services.payments.delete(id).await))
}

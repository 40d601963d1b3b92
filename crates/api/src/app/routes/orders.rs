use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};

use letmebuy_auth::Operation;
use letmebuy_core::{OrderId, Outcome, ResourceKind};
use letmebuy_sales::{Order, OrderFilter, OrderItem};

use crate::app::{dto, errors::{self, ApiResult}, routes::common, services::AppServices};
use crate::context::CurrentActor;

const KIND: ResourceKind = ResourceKind::Order;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/:id", get(get_order).put(update_order).delete(delete_order))
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<CurrentActor>,
    Query(params): Query<dto::PageParams>,
    Query(query): Query<dto::OrderQuery>,
) -> ApiResult {
    common::allow(&actor, Operation::List, KIND)?;
    let page = common::page_request::<Order>(&params)?;
    let filter = OrderFilter::from(query);
    let result = services.orders.find_all_paged(&page, &filter).await;
    Ok(common::page_response(result, dto::order_to_json))
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<CurrentActor>,
    Path(id): Path<String>,
) -> ApiResult {
    common::allow(&actor, Operation::Read, KIND)?;
    let id: OrderId = common::parse_id(&id)?;
    let result = services.orders.find_by_id(actor.get(), id).await;
    Ok(common::entity_response(result, dto::order_to_json))
}

/// Price every line from its product's current price.
async fn priced_items(
    services: &AppServices,
    lines: &[dto::OrderLineRequest],
) -> Result<Vec<OrderItem>, Response> {
    let mut items = Vec::with_capacity(lines.len());
    for line in lines {
        let product = match services.products.find_by_id(None, line.product_id).await {
            Ok(Outcome::Success(product)) => product,
            Ok(_) => {
                return Err(errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "integrity_violation",
                    format!("product {} does not exist", line.product_id),
                ));
            }
            Err(e) => return Err(errors::gateway_error_to_response(e)),
        };
        items.push(OrderItem {
            product_id: line.product_id,
            quantity: line.quantity,
            unit_price_cents: product.price_cents,
        });
    }
    Ok(items)
}

/// A new order always starts out waiting for payment, whatever status is sent.
pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<CurrentActor>,
    Json(body): Json<dto::OrderRequest>,
) -> ApiResult {
    common::allow(&actor, Operation::Create, KIND)?;
    let items = priced_items(&services, &body.items).await?;
    let input = common::validated(body.into_input(items))?;
    let result = services.orders.create(input).await;
    Ok(common::created_response(result, "/orders", dto::order_to_json))
}

/// Lines are repriced; the status may only move forward.
pub async fn update_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<CurrentActor>,
    Path(id): Path<String>,
    Json(body): Json<dto::OrderRequest>,
) -> ApiResult {
    common::allow(&actor, Operation::Update, KIND)?;
    let id: OrderId = common::parse_id(&id)?;
    if let Some(next) = body.status {
        match services.orders.find_by_id(actor.get(), id).await {
            Ok(Outcome::Success(current)) => current
                .status
                .check_transition(next)
                .map_err(errors::domain_error_to_response)?,
            // Missing orders are reported by the update itself.
            Ok(_) => {}
            Err(e) => return Err(errors::gateway_error_to_response(e)),
        }
    }
    let items = priced_items(&services, &body.items).await?;
    let input = common::validated(body.into_input(items))?;
    let result = services.orders.update(actor.get(), id, input).await;
    Ok(common::entity_response(result, dto::order_to_json))
}

pub async fn delete_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<CurrentActor>,
    Path(id): Path<String>,
) -> ApiResult {
    common::allow(&actor, Operation::Delete, KIND)?;
    let id: OrderId = common::parse_id(&id)?;
    Ok(common::deleted_response(services.orders.delete(id).await))
}

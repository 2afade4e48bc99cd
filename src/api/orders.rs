use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::{with_deadline, ApiError, AppState, Authenticated, MaybeAuthenticated};
use crate::domain::order::{AddItemInput, OrderError, OrderStatus, RemoveUnitOutcome};

// Request bodies keep every field optional so a missing field is reported
// with its own message instead of a generic deserialization error.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    item_id: Option<Uuid>,
    quantity: Option<i64>,
    order_id: Option<Uuid>,
    postal_address: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveItemRequest {
    order_id: Option<Uuid>,
    item_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostalAddressRequest {
    order_id: Option<Uuid>,
    postal_address: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderIdRequest {
    order_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeStatusRequest {
    order_id: Option<Uuid>,
    status: Option<String>,
}

fn order_id(raw: Option<Uuid>) -> Result<Uuid, ApiError> {
    raw.ok_or_else(|| ApiError::bad_request("ORDER_ID_REQUIRED", "Order id is required!"))
}

fn item_id(raw: Option<Uuid>) -> Result<Uuid, ApiError> {
    raw.ok_or_else(|| ApiError::bad_request("ITEM_REQUIRED", "No items added"))
}

/// POST /orders/create-order
pub async fn create_order(
    state: web::Data<AppState>,
    Authenticated(principal): Authenticated,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let item_id = item_id(body.item_id)?;
    // Absent quantity is reported like a zero quantity.
    let quantity = body.quantity.ok_or(OrderError::InvalidQuantity(0))?;

    let input = AddItemInput {
        order_id: body.order_id,
        item_id,
        quantity,
        postal_address: body.postal_address,
    };
    let order = with_deadline(state.request_timeout, state.engine.add_item(&principal, input)).await?;
    Ok(HttpResponse::Ok().json(order))
}

/// PATCH /orders/remove-item
pub async fn remove_item(
    state: web::Data<AppState>,
    Authenticated(principal): Authenticated,
    body: web::Json<RemoveItemRequest>,
) -> Result<HttpResponse, ApiError> {
    let order_id = order_id(body.order_id)?;
    let item_id = item_id(body.item_id)?;

    let outcome = with_deadline(
        state.request_timeout,
        state.engine.remove_unit(&principal, order_id, item_id),
    )
    .await?;

    Ok(match outcome {
        RemoveUnitOutcome::Updated(order) => HttpResponse::Ok().json(order),
        RemoveUnitOutcome::Deleted { order_id } => HttpResponse::Ok().json(json!({
            "message": "Order deleted as there are no items left",
            "orderId": order_id,
        })),
    })
}

/// PATCH /orders/edit-postalAddress
pub async fn edit_postal_address(
    state: web::Data<AppState>,
    Authenticated(principal): Authenticated,
    body: web::Json<PostalAddressRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let order_id = order_id(body.order_id)?;
    let postal_address = body.postal_address.ok_or(OrderError::MissingPostalAddress)?;

    let order = with_deadline(
        state.request_timeout,
        state.engine.set_postal_address(&principal, order_id, &postal_address),
    )
    .await?;
    Ok(HttpResponse::Ok().json(order))
}

/// PATCH /orders/confirm-order-user
pub async fn confirm(
    state: web::Data<AppState>,
    Authenticated(principal): Authenticated,
    body: web::Json<OrderIdRequest>,
) -> Result<HttpResponse, ApiError> {
    let order_id = order_id(body.order_id)?;

    let order = with_deadline(state.request_timeout, state.engine.confirm(&principal, order_id)).await?;
    Ok(HttpResponse::Ok().json(order))
}

/// PATCH /orders/change-status-admin
pub async fn change_status(
    state: web::Data<AppState>,
    Authenticated(principal): Authenticated,
    body: web::Json<ChangeStatusRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let order_id = order_id(body.order_id)?;
    let status = body
        .status
        .ok_or_else(|| ApiError::bad_request("STATUS_REQUIRED", "Status is required!"))?;
    let target = OrderStatus::parse(status.trim()).ok_or_else(|| {
        ApiError::bad_request("INVALID_TARGET_STATUS", format!("Unknown order status: {}", status))
    })?;

    let order = with_deadline(
        state.request_timeout,
        state.engine.advance(&principal, order_id, target),
    )
    .await?;
    Ok(HttpResponse::Ok().json(order))
}

/// DELETE /orders/delete-order
pub async fn delete_order(
    state: web::Data<AppState>,
    Authenticated(principal): Authenticated,
    body: web::Json<OrderIdRequest>,
) -> Result<HttpResponse, ApiError> {
    let order_id = order_id(body.order_id)?;

    with_deadline(state.request_timeout, state.engine.delete_order(&principal, order_id)).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Order deleted successfully" })))
}

/// POST /orders/find-orderById
pub async fn find_by_id(
    state: web::Data<AppState>,
    Authenticated(principal): Authenticated,
    body: web::Json<OrderIdRequest>,
) -> Result<HttpResponse, ApiError> {
    let order_id = order_id(body.order_id)?;

    let order = with_deadline(state.request_timeout, state.engine.get_by_id(&principal, order_id)).await?;
    Ok(HttpResponse::Ok().json(order))
}

/// GET /orders
pub async fn list_all(
    state: web::Data<AppState>,
    MaybeAuthenticated(principal): MaybeAuthenticated,
) -> Result<HttpResponse, ApiError> {
    let orders = with_deadline(state.request_timeout, state.engine.list_all(principal.as_ref())).await?;
    Ok(HttpResponse::Ok().json(orders))
}

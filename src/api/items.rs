use actix_web::{web, HttpResponse};
use serde_json::json;
use uuid::Uuid;

use super::{with_deadline, ApiError, AppState, Authenticated};
use crate::domain::catalog::{ItemPatch, NewItem};

/// GET /items
pub async fn list(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let items = with_deadline(state.request_timeout, state.catalog.list()).await?;
    Ok(HttpResponse::Ok().json(items))
}

/// GET /items/{id}
pub async fn get(state: web::Data<AppState>, id: web::Path<Uuid>) -> Result<HttpResponse, ApiError> {
    let item = with_deadline(state.request_timeout, state.catalog.get(id.into_inner())).await?;
    Ok(HttpResponse::Ok().json(item))
}

/// POST /items/add (admin)
pub async fn add(
    state: web::Data<AppState>,
    Authenticated(principal): Authenticated,
    body: web::Json<NewItem>,
) -> Result<HttpResponse, ApiError> {
    let item = with_deadline(
        state.request_timeout,
        state.catalog.create(&principal, body.into_inner()),
    )
    .await?;
    Ok(HttpResponse::Ok().json(item))
}

/// PATCH /items/update/{id} (admin)
pub async fn update(
    state: web::Data<AppState>,
    Authenticated(principal): Authenticated,
    id: web::Path<Uuid>,
    body: web::Json<ItemPatch>,
) -> Result<HttpResponse, ApiError> {
    let item = with_deadline(
        state.request_timeout,
        state.catalog.update(&principal, id.into_inner(), body.into_inner()),
    )
    .await?;
    Ok(HttpResponse::Ok().json(item))
}

/// DELETE /items/delete/{id} (admin)
pub async fn delete(
    state: web::Data<AppState>,
    Authenticated(principal): Authenticated,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    with_deadline(state.request_timeout, state.catalog.delete(&principal, id.into_inner())).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Item deleted successfully" })))
}

// ============================================================================
// HTTP API
// ============================================================================
//
// actix-web surface over the order engine and the catalog:
//
//   /orders/...     cart, confirmation, admin status changes, lookup
//   /items/...      catalog reads (public) and admin maintenance
//   /users/profile  echo of the authenticated principal
//
// Every handler runs the domain call under the configured request deadline.
//
// ============================================================================

mod auth;
mod error;
mod items;
mod orders;
mod users;

use actix_web::error::{JsonPayloadError, PathError};
use actix_web::{web, HttpRequest};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::catalog::CatalogService;
use crate::domain::order::OrderEngine;
use crate::identity::TokenService;

pub use auth::{Authenticated, MaybeAuthenticated};
pub use error::ApiError;

/// Shared by every worker
pub struct AppState {
    pub engine: Arc<OrderEngine>,
    pub catalog: Arc<CatalogService>,
    pub tokens: Arc<TokenService>,
    pub request_timeout: Duration,
}

/// Register all API routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .app_data(web::PathConfig::default().error_handler(path_error))
        .service(
            web::scope("/orders")
                .route("", web::get().to(orders::list_all))
                .route("/create-order", web::post().to(orders::create_order))
                .route("/remove-item", web::patch().to(orders::remove_item))
                .route("/edit-postalAddress", web::patch().to(orders::edit_postal_address))
                .route("/confirm-order-user", web::patch().to(orders::confirm))
                .route("/change-status-admin", web::patch().to(orders::change_status))
                .route("/delete-order", web::delete().to(orders::delete_order))
                .route("/find-orderById", web::post().to(orders::find_by_id)),
        )
        .service(
            web::scope("/items")
                .route("", web::get().to(items::list))
                .route("/add", web::post().to(items::add))
                .route("/update/{id}", web::patch().to(items::update))
                .route("/delete/{id}", web::delete().to(items::delete))
                .route("/{id}", web::get().to(items::get)),
        )
        .service(web::scope("/users").route("/profile", web::get().to(users::profile)));
}

/// Run `work` under the request deadline.
///
/// Expiry drops `work` wherever it is. A compare-and-swap that already landed
/// stays committed, so the 503 only says the outcome is unknown.
pub(crate) async fn with_deadline<T, E, F>(limit: Duration, work: F) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, E>>,
    ApiError: From<E>,
{
    match tokio::time::timeout(limit, work).await {
        Ok(result) => result.map_err(ApiError::from),
        Err(_) => {
            tracing::warn!(timeout_ms = limit.as_millis() as u64, "Request deadline exceeded");
            Err(ApiError::timeout())
        }
    }
}

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::bad_request("INVALID_BODY", format!("Validation failed: {}", err)).into()
}

fn path_error(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::bad_request("INVALID_PATH", format!("Validation failed: {}", err)).into()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deadline_expiry_reports_unknown_outcome() {
        let slow = async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<_, ApiError>(())
        };

        let err = with_deadline(Duration::from_millis(10), slow).await.unwrap_err();
        assert_eq!(err.status(), actix_web::http::StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.code(), "TIMEOUT");
        assert!(err.to_string().contains("outcome is unknown"));
    }

    #[tokio::test]
    async fn test_deadline_passes_result_through() {
        let quick = async { Ok::<_, ApiError>(7) };
        assert_eq!(with_deadline(Duration::from_secs(1), quick).await.unwrap(), 7);
    }
}

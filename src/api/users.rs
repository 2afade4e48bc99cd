use actix_web::HttpResponse;

use super::Authenticated;

/// GET /users/profile
pub async fn profile(Authenticated(principal): Authenticated) -> HttpResponse {
    HttpResponse::Ok().json(principal)
}

use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::http::StatusCode;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};

use super::{ApiError, AppState};
use crate::identity::{bearer_token, AuthError, Principal};

/// Extractor for routes that require a verified bearer token
#[derive(Debug, Clone, Copy)]
pub struct Authenticated(pub Principal);

/// Extractor for routes where the token is optional. A token that is present
/// but fails verification is still rejected.
#[derive(Debug, Clone, Copy)]
pub struct MaybeAuthenticated(pub Option<Principal>);

impl FromRequest for Authenticated {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = match authorization(req) {
            Some(header) => resolve(req, header),
            None => Err(AuthError::MissingToken.into()),
        };
        ready(result.map(Authenticated))
    }
}

impl FromRequest for MaybeAuthenticated {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = match authorization(req) {
            Some(header) => resolve(req, header).map(Some),
            None => Ok(None),
        };
        ready(result.map(MaybeAuthenticated))
    }
}

fn authorization(req: &HttpRequest) -> Option<&str> {
    // Non-ASCII header values are treated like an empty credential.
    req.headers()
        .get(AUTHORIZATION)
        .map(|value| value.to_str().unwrap_or_default())
}

fn resolve(req: &HttpRequest, header: &str) -> Result<Principal, ApiError> {
    let Some(state) = req.app_data::<web::Data<AppState>>() else {
        tracing::error!("AppState missing from app data");
        return Err(ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "MISCONFIGURED",
            "Internal server error",
        ));
    };

    let principal = state.tokens.verify(bearer_token(header)?).map_err(|e| {
        tracing::debug!(error = %e, "Bearer token rejected");
        e
    })?;
    Ok(principal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::Harness;
    use actix_web::{test, App, HttpResponse};
    use uuid::Uuid;

    async fn whoami(Authenticated(principal): Authenticated) -> HttpResponse {
        HttpResponse::Ok().json(principal)
    }

    async fn maybe(MaybeAuthenticated(principal): MaybeAuthenticated) -> HttpResponse {
        HttpResponse::Ok().json(principal.map(|p| p.user_id))
    }

    #[actix_web::test]
    async fn test_valid_token_resolves_principal() {
        let harness = Harness::new();
        let user = Principal::user(Uuid::new_v4());
        let app = test::init_service(
            App::new()
                .app_data(harness.state.clone())
                .route("/whoami", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header((AUTHORIZATION, harness.bearer(&user)))
            .to_request();
        let body: Principal = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, user);
    }

    #[actix_web::test]
    async fn test_missing_and_invalid_tokens_are_rejected() {
        let harness = Harness::new();
        let app = test::init_service(
            App::new()
                .app_data(harness.state.clone())
                .route("/whoami", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get().uri("/whoami").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "No token provided");

        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header((AUTHORIZATION, "Bearer not-a-jwt"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], "INVALID_TOKEN");
    }

    #[actix_web::test]
    async fn test_token_from_another_secret_is_rejected() {
        let harness = Harness::new();
        let foreign = crate::identity::TokenService::new("other-secret", std::time::Duration::from_secs(60));
        let token = foreign.issue(&Principal::admin(Uuid::new_v4())).unwrap();
        let app = test::init_service(
            App::new()
                .app_data(harness.state.clone())
                .route("/whoami", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header((AUTHORIZATION, format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_optional_token() {
        let harness = Harness::new();
        let user = Principal::user(Uuid::new_v4());
        let app = test::init_service(
            App::new()
                .app_data(harness.state.clone())
                .route("/maybe", web::get().to(maybe)),
        )
        .await;

        let req = test::TestRequest::get().uri("/maybe").to_request();
        let body: Option<Uuid> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, None);

        let req = test::TestRequest::get()
            .uri("/maybe")
            .insert_header((AUTHORIZATION, harness.bearer(&user)))
            .to_request();
        let body: Option<Uuid> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, Some(user.user_id));

        let req = test::TestRequest::get()
            .uri("/maybe")
            .insert_header((AUTHORIZATION, "garbage"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::auth::extractors::Principal;
use crate::auth::token::TokenService;
use crate::error::AppError;

/// Bearer-token gate.
///
/// Wrap any scope or resource that needs an authenticated caller. The middleware reads
/// `web::Data<TokenService>` from app data, verifies `Authorization: Bearer <token>`, and
/// either forwards the request with a [`Principal`] in its extensions or answers `401`
/// itself. It has no other side effects.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match authenticate(&req) {
            Ok(principal) => {
                req.extensions_mut().insert(principal);
                let fut = self.service.call(req);
                Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
            }
            Err(app_err) => {
                let response = req.error_response(app_err).map_into_right_body();
                Box::pin(async move { Ok(response) })
            }
        }
    }
}

fn authenticate(req: &ServiceRequest) -> Result<Principal, AppError> {
    let token = bearer_token(req.headers().get(header::AUTHORIZATION))?;
    let tokens = req
        .app_data::<web::Data<TokenService>>()
        .ok_or_else(|| AppError::Internal("TokenService is not registered as app data".into()))?;
    tokens.verify(token)
}

/// Extracts the token from a `Bearer <token>` header value. Any other shape is rejected.
fn bearer_token(value: Option<&header::HeaderValue>) -> Result<&str, AppError> {
    let value = value.ok_or_else(|| AppError::Unauthorized("Missing token".into()))?;
    let value = value
        .to_str()
        .map_err(|_| AppError::Unauthorized("Malformed Authorization header".into()))?;
    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(AppError::Unauthorized(
            "Authorization header must use the Bearer scheme".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::HeaderValue;
    use actix_web::{test as actix_test, App, HttpResponse};
    use chrono::Duration;
    use uuid::Uuid;

    #[test]
    fn test_bearer_token_forms() {
        assert!(matches!(bearer_token(None), Err(AppError::Unauthorized(_))));

        let ok = HeaderValue::from_static("Bearer abc.def.ghi");
        assert_eq!(bearer_token(Some(&ok)).unwrap(), "abc.def.ghi");

        for bad in ["Basic dXNlcjpwYXNz", "bearer abc", "Bearer ", "Token abc", "abc"] {
            let value = HeaderValue::from_static(bad);
            assert!(
                matches!(bearer_token(Some(&value)), Err(AppError::Unauthorized(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }

    async fn whoami(principal: Principal) -> HttpResponse {
        HttpResponse::Ok().body(principal.user_id.to_string())
    }

    #[actix_rt::test]
    async fn test_middleware_attaches_principal_or_rejects() {
        let tokens = TokenService::new("middleware-secret", Duration::hours(1));
        let user_id = Uuid::new_v4();
        let token = tokens.issue(user_id).unwrap();

        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(tokens))
                .service(
                    web::resource("/whoami")
                        .wrap(AuthMiddleware)
                        .route(web::get().to(whoami)),
                ),
        )
        .await;

        let req = actix_test::TestRequest::get()
            .uri("/whoami")
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        assert_eq!(actix_test::read_body(resp).await, user_id.to_string());

        let req = actix_test::TestRequest::get().uri("/whoami").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["error"], "Missing token");
    }
}

use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::error::AppError;

/// The authenticated identity of the current request.
///
/// `AuthMiddleware` inserts it into the request extensions after the bearer token verifies;
/// handlers take it as an explicit argument and pass `user_id` down to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
}

impl FromRequest for Principal {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<Principal>().copied() {
            Some(principal) => ready(Ok(principal)),
            // Only reachable on a route that was mounted without `AuthMiddleware`.
            None => ready(Err(AppError::Unauthorized("Not authenticated".to_string()).into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::dev::Payload;
    use actix_web::http::StatusCode;
    use actix_web::test;

    #[actix_rt::test]
    async fn test_principal_extractor_success() {
        let user_id = Uuid::new_v4();
        let req = test::TestRequest::default().to_http_request();
        req.extensions_mut().insert(Principal { user_id });

        let mut payload = Payload::None;
        let principal = Principal::from_request(&req, &mut payload).await.unwrap();
        assert_eq!(principal.user_id, user_id);
    }

    #[actix_rt::test]
    async fn test_principal_extractor_failure() {
        let req = test::TestRequest::default().to_http_request();

        let mut payload = Payload::None;
        let err = Principal::from_request(&req, &mut payload)
            .await
            .unwrap_err();
        assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);
    }
}

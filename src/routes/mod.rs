pub mod auth;
pub mod docs;
pub mod health;
pub mod tasks;

use actix_web::{middleware::DefaultHeaders, web};

use crate::auth::AuthMiddleware;
use crate::validation::{json_config, query_config};

/// Registers every route of the API.
///
/// `/api/tasks` and `/api/auth/me` sit behind `AuthMiddleware`; everything else is public.
/// Unmatched paths fall through to a JSON 404.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .service(health::index)
        .service(health::health)
        .service(docs::openapi_json)
        .service(docs::swagger_ui)
        .service(
            web::scope("/api/auth")
                .service(auth::register)
                .service(auth::login)
                .service(
                    web::resource("/me")
                        .wrap(AuthMiddleware)
                        .route(web::get().to(auth::me)),
                ),
        )
        .service(
            web::scope("/api/tasks")
                .wrap(AuthMiddleware)
                .service(tasks::list_tasks)
                .service(tasks::create_task)
                .service(tasks::get_task)
                .service(tasks::update_task)
                .service(tasks::delete_task),
        )
        .default_service(web::to(health::not_found));
}

/// Headers added to every response: no MIME sniffing, no framing, no referrer leakage.
pub fn security_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("X-Content-Type-Options", "nosniff"))
        .add(("X-Frame-Options", "DENY"))
        .add(("Referrer-Policy", "no-referrer"))
}

//! OpenAPI document and the Swagger UI page that renders it.

use actix_web::{get, HttpResponse, Responder};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::{
    auth::{AuthResponse, LoginRequest, MeResponse, RegisterRequest},
    error::ErrorBody,
    models::{CreateTaskRequest, Task, TaskPriority, TaskStatus, UpdateTaskRequest, User},
    routes::tasks::{MessageResponse, TaskListResponse, TaskResponse},
};

/// Registers the `bearerAuth` scheme referenced by the protected paths.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearerAuth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Token returned by /api/auth/register or /api/auth/login."))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Task API",
        version = "1.0.0",
        description = "Per-user task records behind bearer-token authentication.\n\nSend `Authorization: Bearer <token>` on every `/api/tasks` request and on `/api/auth/me`."
    ),
    paths(
        crate::routes::health::health,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::me,
        crate::routes::tasks::list_tasks,
        crate::routes::tasks::create_task,
        crate::routes::tasks::get_task,
        crate::routes::tasks::update_task,
        crate::routes::tasks::delete_task,
    ),
    components(schemas(
        User,
        Task,
        TaskStatus,
        TaskPriority,
        CreateTaskRequest,
        UpdateTaskRequest,
        LoginRequest,
        RegisterRequest,
        AuthResponse,
        MeResponse,
        TaskResponse,
        TaskListResponse,
        MessageResponse,
        ErrorBody,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Auth", description = "Registration, login and the current user"),
        (name = "Tasks", description = "CRUD over the authenticated user's tasks")
    )
)]
pub struct ApiDoc;

const SWAGGER_UI: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <title>Task API Docs</title>
  <link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/swagger-ui-dist@5/swagger-ui.css" />
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="https://cdn.jsdelivr.net/npm/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
  <script>
    window.onload = () => {
      window.ui = SwaggerUIBundle({ url: "/api-docs.json", dom_id: "#swagger-ui" });
    };
  </script>
</body>
</html>
"##;

/// The generated OpenAPI document.
#[get("/api-docs.json")]
pub async fn openapi_json() -> impl Responder {
    HttpResponse::Ok().json(ApiDoc::openapi())
}

/// Swagger UI pointed at `/api-docs.json`.
#[get("/docs")]
pub async fn swagger_ui() -> impl Responder {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(SWAGGER_UI)
}

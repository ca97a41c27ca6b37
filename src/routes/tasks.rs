use crate::{
    auth::Principal,
    error::{AppError, ErrorBody},
    models::{CreateTaskRequest, Task, TaskPriority, TaskQuery, TaskStatus, UpdateTaskRequest},
    store::TaskStore,
    validation::{parse_id, ValidatedJson},
};
use actix_web::{delete, get, post, route, web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// `{ "task": ... }` envelope.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskResponse {
    pub task: Task,
}

/// `{ "tasks": [...], "count": n }` envelope.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskListResponse {
    pub count: usize,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Retrieves the authenticated user's tasks.
///
/// ## Query Parameters:
/// - `status` (optional): `pending`, `in_progress` or `done`.
/// - `priority` (optional): `low`, `medium` or `high`.
/// - `sort` (optional): `title`, `status`, `priority`, `createdAt` or `updatedAt`,
///   prefixed with `-` for descending order. Defaults to `-createdAt`.
///
/// ## Responses:
/// - `200 OK`: `{ tasks, count }`.
/// - `400 Bad Request`: unknown filter value or sort field.
/// - `401 Unauthorized`: missing or invalid bearer token.
#[utoipa::path(
    get,
    path = "/api/tasks",
    tag = "Tasks",
    security(("bearerAuth" = [])),
    params(
        ("status" = Option<TaskStatus>, Query, description = "Filter by status"),
        ("priority" = Option<TaskPriority>, Query, description = "Filter by priority"),
        ("sort" = Option<String>, Query, description = "Sort field (prefix with - for desc, e.g. -createdAt)")
    ),
    responses(
        (status = 200, description = "List of tasks", body = TaskListResponse),
        (status = 400, description = "Invalid filter or sort", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    )
)]
#[get("")]
pub async fn list_tasks(
    store: web::Data<dyn TaskStore>,
    principal: Principal,
    query: web::Query<TaskQuery>,
) -> Result<impl Responder, AppError> {
    let filter = query.into_inner().into_filter()?;
    let tasks = store.list_tasks(principal.user_id, &filter).await?;

    Ok(HttpResponse::Ok().json(TaskListResponse {
        count: tasks.len(),
        tasks,
    }))
}

/// Creates a task owned by the authenticated user.
///
/// The owner is always the caller; a `user` field in the body is ignored.
#[utoipa::path(
    post,
    path = "/api/tasks",
    tag = "Tasks",
    security(("bearerAuth" = [])),
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created", body = TaskResponse),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    )
)]
#[post("")]
pub async fn create_task(
    store: web::Data<dyn TaskStore>,
    principal: Principal,
    body: ValidatedJson<CreateTaskRequest>,
) -> Result<impl Responder, AppError> {
    let new_task = body.into_inner().into_new_task()?;
    let task = store.insert_task(principal.user_id, new_task).await?;

    Ok(HttpResponse::Created().json(TaskResponse { task }))
}

/// Retrieves one of the authenticated user's tasks.
///
/// A task owned by someone else is reported exactly like a missing one.
#[utoipa::path(
    get,
    path = "/api/tasks/{id}",
    tag = "Tasks",
    security(("bearerAuth" = [])),
    params(("id" = String, Path, description = "Task id (UUID)")),
    responses(
        (status = 200, description = "Task data", body = TaskResponse),
        (status = 400, description = "Invalid ID format", body = ErrorBody),
        (status = 404, description = "Task not found", body = ErrorBody)
    )
)]
#[get("/{id}")]
pub async fn get_task(
    store: web::Data<dyn TaskStore>,
    principal: Principal,
    task_id: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let id = parse_id(&task_id)?;
    let task = store
        .find_task(principal.user_id, id)
        .await?
        .ok_or_else(|| AppError::not_found("Task"))?;

    Ok(HttpResponse::Ok().json(TaskResponse { task }))
}

/// Updates the fields present in the body and leaves the rest unchanged.
///
/// Served for both `PATCH` and `PUT`.
#[utoipa::path(
    patch,
    path = "/api/tasks/{id}",
    tag = "Tasks",
    security(("bearerAuth" = [])),
    params(("id" = String, Path, description = "Task id (UUID)")),
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "Task updated", body = TaskResponse),
        (status = 400, description = "Validation error or invalid ID format", body = ErrorBody),
        (status = 404, description = "Task not found", body = ErrorBody)
    )
)]
#[route("/{id}", method = "PATCH", method = "PUT")]
pub async fn update_task(
    store: web::Data<dyn TaskStore>,
    principal: Principal,
    task_id: web::Path<String>,
    body: ValidatedJson<UpdateTaskRequest>,
) -> Result<impl Responder, AppError> {
    let id = parse_id(&task_id)?;
    let patch = body.into_inner().into_patch()?;
    let task = store
        .update_task(principal.user_id, id, patch)
        .await?
        .ok_or_else(|| AppError::not_found("Task"))?;

    Ok(HttpResponse::Ok().json(TaskResponse { task }))
}

/// Deletes one of the authenticated user's tasks.
#[utoipa::path(
    delete,
    path = "/api/tasks/{id}",
    tag = "Tasks",
    security(("bearerAuth" = [])),
    params(("id" = String, Path, description = "Task id (UUID)")),
    responses(
        (status = 200, description = "Task deleted", body = MessageResponse),
        (status = 400, description = "Invalid ID format", body = ErrorBody),
        (status = 404, description = "Task not found", body = ErrorBody)
    )
)]
#[delete("/{id}")]
pub async fn delete_task(
    store: web::Data<dyn TaskStore>,
    principal: Principal,
    task_id: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let id = parse_id(&task_id)?;
    if !store.delete_task(principal.user_id, id).await? {
        return Err(AppError::not_found("Task"));
    }

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Task deleted".to_string(),
    }))
}

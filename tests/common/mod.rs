#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use actix_http::Request;
use actix_web::{
    body::MessageBody,
    dev::{Service, ServiceResponse},
    test, web, App,
};
use async_trait::async_trait;
use chrono::Duration;
use serde_json::json;
use uuid::Uuid;

use task_api::{
    auth::{AuthResponse, CredentialStore, TokenService},
    config::MIN_BCRYPT_COST,
    models::{NewTask, Task, TaskFilter, TaskPatch},
    routes,
    store::{MemoryStore, TaskStore, UserStore},
    AppError,
};

pub const SECRET: &str = "integration-test-secret";

/// Stores and token service shared by one test app.
pub struct TestState {
    pub store: Arc<MemoryStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub tokens: TokenService,
}

impl TestState {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            tasks: store.clone(),
            store,
            tokens: TokenService::new(SECRET, Duration::days(7)),
        }
    }

    /// Routes task operations through `tasks` instead of the shared memory store.
    pub fn with_tasks(tasks: Arc<dyn TaskStore>) -> Self {
        Self {
            tasks,
            ..Self::new()
        }
    }
}

pub async fn init_app(
    state: &TestState,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>
{
    let users: Arc<dyn UserStore> = state.store.clone();
    let tasks: web::Data<dyn TaskStore> = web::Data::from(state.tasks.clone());

    test::init_service(
        App::new()
            .app_data(web::Data::new(state.tokens.clone()))
            .app_data(web::Data::new(CredentialStore::new(users, MIN_BCRYPT_COST)))
            .app_data(tasks)
            .wrap(routes::security_headers())
            .configure(routes::config),
    )
    .await
}

/// Registers a user through the API and returns the response body.
pub async fn register<S, B>(app: &S, name: &str, email: &str, password: &str) -> AuthResponse
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({ "name": name, "email": email, "password": password }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), 201, "registration of {email} failed");
    test::read_body_json(resp).await
}

/// Creates a task for `token` and returns it.
pub async fn create_task<S, B>(app: &S, token: &str, body: serde_json::Value) -> Task
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/tasks")
        .insert_header(bearer(token))
        .set_json(body)
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), 201, "task creation failed");
    let body: serde_json::Value = test::read_body_json(resp).await;
    serde_json::from_value(body["task"].clone()).unwrap()
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

/// Counts every call that reaches the task store.
#[derive(Default)]
pub struct CountingTasks {
    inner: MemoryStore,
    calls: AtomicUsize,
}

impl CountingTasks {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl TaskStore for CountingTasks {
    async fn list_tasks(&self, owner: Uuid, filter: &TaskFilter) -> Result<Vec<Task>, AppError> {
        self.hit();
        self.inner.list_tasks(owner, filter).await
    }

    async fn find_task(&self, owner: Uuid, id: Uuid) -> Result<Option<Task>, AppError> {
        self.hit();
        self.inner.find_task(owner, id).await
    }

    async fn insert_task(&self, owner: Uuid, task: NewTask) -> Result<Task, AppError> {
        self.hit();
        self.inner.insert_task(owner, task).await
    }

    async fn update_task(
        &self,
        owner: Uuid,
        id: Uuid,
        patch: TaskPatch,
    ) -> Result<Option<Task>, AppError> {
        self.hit();
        self.inner.update_task(owner, id, patch).await
    }

    async fn delete_task(&self, owner: Uuid, id: Uuid) -> Result<bool, AppError> {
        self.hit();
        self.inner.delete_task(owner, id).await
    }
}

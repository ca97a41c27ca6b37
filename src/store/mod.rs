//! Persistence seams.
//!
//! Handlers talk to `UserStore` and `TaskStore` trait objects. Every task method takes the
//! owner's id and filters on the `{id, owner}` pair inside a single statement; there is no
//! way to reach a task through these traits without naming its owner.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{NewTask, NewUser, Task, TaskFilter, TaskPatch, User, UserRecord};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user. Fails with `AppError::Conflict` if the email is taken.
    async fn insert_user(&self, user: NewUser) -> Result<User, AppError>;

    /// Looks a user up by normalized email, hash included.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// All of `owner`'s tasks matching `filter`, in `filter.sort` order.
    async fn list_tasks(&self, owner: Uuid, filter: &TaskFilter) -> Result<Vec<Task>, AppError>;

    async fn find_task(&self, owner: Uuid, id: Uuid) -> Result<Option<Task>, AppError>;

    async fn insert_task(&self, owner: Uuid, task: NewTask) -> Result<Task, AppError>;

    /// Applies `patch` to the task if `owner` owns it. `None` when absent or not owned.
    async fn update_task(
        &self,
        owner: Uuid,
        id: Uuid,
        patch: TaskPatch,
    ) -> Result<Option<Task>, AppError>;

    /// Returns whether a task owned by `owner` was deleted.
    async fn delete_task(&self, owner: Uuid, id: Uuid) -> Result<bool, AppError>;
}

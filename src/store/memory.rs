use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{TaskStore, UserStore};
use crate::error::AppError;
use crate::models::{NewTask, NewUser, Task, TaskFilter, TaskPatch, User, UserRecord};

/// In-process store with the same semantics as `PgStore`.
///
/// Used by the test suite and by the server when no `DATABASE_URL` is configured.
/// Contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, UserRecord>>,
    tasks: RwLock<HashMap<Uuid, Task>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn task_count(&self) -> usize {
        self.tasks.read().await.len()
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        if users.values().any(|existing| existing.email == user.email) {
            return Err(AppError::conflict("email"));
        }
        let record = user.into_record();
        let created = record.clone().into_user();
        users.insert(record.id, record);
        Ok(created)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError> {
        let users = self.users.read().await;
        Ok(users.values().find(|user| user.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned().map(UserRecord::into_user))
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn list_tasks(&self, owner: Uuid, filter: &TaskFilter) -> Result<Vec<Task>, AppError> {
        let tasks = self.tasks.read().await;
        let mut matching: Vec<Task> = tasks
            .values()
            .filter(|task| task.user_id == owner && filter.matches(task))
            .cloned()
            .collect();
        matching.sort_by(|a, b| filter.sort.compare(a, b));
        Ok(matching)
    }

    async fn find_task(&self, owner: Uuid, id: Uuid) -> Result<Option<Task>, AppError> {
        let tasks = self.tasks.read().await;
        Ok(tasks.get(&id).filter(|task| task.user_id == owner).cloned())
    }

    async fn insert_task(&self, owner: Uuid, task: NewTask) -> Result<Task, AppError> {
        let task = Task::new(task, owner);
        self.tasks.write().await.insert(task.id, task.clone());
        Ok(task)
    }

    async fn update_task(
        &self,
        owner: Uuid,
        id: Uuid,
        patch: TaskPatch,
    ) -> Result<Option<Task>, AppError> {
        let mut tasks = self.tasks.write().await;
        match tasks.get_mut(&id).filter(|task| task.user_id == owner) {
            Some(task) => {
                patch.apply(task);
                Ok(Some(task.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_task(&self, owner: Uuid, id: Uuid) -> Result<bool, AppError> {
        let mut tasks = self.tasks.write().await;
        let owned = tasks.get(&id).map_or(false, |task| task.user_id == owner);
        if owned {
            tasks.remove(&id);
        }
        Ok(owned)
    }
}

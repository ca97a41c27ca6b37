use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::validation::{validate_priority, validate_status};

/// Represents the status of a task.
/// Corresponds to the `task_status` SQL enum; variant order is the sort order.
#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task is yet to be started.
    #[default]
    Pending,
    /// Task is currently being worked on.
    InProgress,
    /// Task is completed.
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "in_progress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            _ => Err("must be one of pending, in_progress, done".to_string()),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents the priority of a task.
/// Corresponds to the `task_priority` SQL enum; variant order is the sort order.
#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

impl FromStr for TaskPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            _ => Err("must be one of low, medium, high".to_string()),
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents a task entity as stored in the database and returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier for the task (UUID v4).
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    /// Owning user. Set from the authenticated principal, never from client input.
    #[serde(rename = "user")]
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Builds a new task owned by `owner`, stamping id and timestamps.
    pub fn new(input: NewTask, owner: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            status: input.status,
            priority: input.priority,
            user_id: owner,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Body of `POST /api/tasks`.
///
/// Enum fields arrive as strings so that a bad value is reported alongside every other
/// violation instead of aborting deserialization. Unknown fields, including `user`,
/// are ignored.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTaskRequest {
    #[schema(example = "Buy groceries")]
    #[validate(
        required(message = "Title is required"),
        length(min = 1, max = 200, message = "Title must be between 1 and 200 characters")
    )]
    pub title: Option<String>,

    #[schema(example = "Milk, eggs, bread")]
    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,

    #[schema(value_type = Option<TaskStatus>)]
    #[validate(custom = "validate_status")]
    pub status: Option<String>,

    #[schema(value_type = Option<TaskPriority>)]
    #[validate(custom = "validate_priority")]
    pub priority: Option<String>,
}

impl CreateTaskRequest {
    /// Converts a validated request into a `NewTask`, applying defaults.
    pub fn into_new_task(self) -> Result<NewTask, AppError> {
        let title = self
            .title
            .ok_or_else(|| AppError::Validation(vec!["title: Title is required".into()]))?;
        Ok(NewTask {
            title,
            description: self.description,
            status: parse_field("status", self.status)?.unwrap_or_default(),
            priority: parse_field("priority", self.priority)?.unwrap_or_default(),
        })
    }
}

/// Body of `PATCH /api/tasks/{id}`. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,

    #[schema(value_type = Option<TaskStatus>)]
    #[validate(custom = "validate_status")]
    pub status: Option<String>,

    #[schema(value_type = Option<TaskPriority>)]
    #[validate(custom = "validate_priority")]
    pub priority: Option<String>,
}

impl UpdateTaskRequest {
    pub fn into_patch(self) -> Result<TaskPatch, AppError> {
        Ok(TaskPatch {
            title: self.title,
            description: self.description,
            status: parse_field("status", self.status)?,
            priority: parse_field("priority", self.priority)?,
        })
    }
}

fn parse_field<T: FromStr<Err = String>>(
    field: &str,
    raw: Option<String>,
) -> Result<Option<T>, AppError> {
    raw.map(|value| value.parse::<T>())
        .transpose()
        .map_err(|message| AppError::Validation(vec![format!("{}: {}", field, message)]))
}

/// Fully-typed fields of a task about to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
}

/// The subset of fields an update changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
}

impl TaskPatch {
    /// Applies present fields to `task` and advances `updated_at`.
    pub fn apply(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = Some(description);
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        task.updated_at = Utc::now().max(task.updated_at);
    }
}

/// Query parameters of `GET /api/tasks`.
///
/// Filters arrive as raw strings; an empty value (`?status=`) means no filter.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TaskQuery {
    pub status: Option<String>,
    pub priority: Option<String>,
    /// Sort key, optionally prefixed with `-` for descending order (e.g. `-createdAt`).
    pub sort: Option<String>,
}

impl TaskQuery {
    pub fn into_filter(self) -> Result<TaskFilter, AppError> {
        let sort = match self.sort.as_deref() {
            Some(raw) if !raw.trim().is_empty() => raw.parse()?,
            _ => TaskSort::default(),
        };
        Ok(TaskFilter {
            status: parse_field("status", non_empty(self.status))?,
            priority: parse_field("priority", non_empty(self.priority))?,
            sort,
        })
    }
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.filter(|value| !value.trim().is_empty())
}

/// Equality filters plus ordering for listing a user's tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub sort: TaskSort,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        self.status.map_or(true, |status| task.status == status)
            && self.priority.map_or(true, |priority| task.priority == priority)
    }
}

/// Fields a task list may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Title,
    Status,
    Priority,
    CreatedAt,
    UpdatedAt,
}

impl SortKey {
    /// Column name in the `tasks` table.
    pub fn column(&self) -> &'static str {
        match self {
            SortKey::Title => "title COLLATE \"C\"",
            SortKey::Status => "status",
            SortKey::Priority => "priority",
            SortKey::CreatedAt => "created_at",
            SortKey::UpdatedAt => "updated_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskSort {
    pub key: SortKey,
    pub descending: bool,
}

impl Default for TaskSort {
    fn default() -> Self {
        Self {
            key: SortKey::CreatedAt,
            descending: true,
        }
    }
}

impl FromStr for TaskSort {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        let (descending, name) = match raw.strip_prefix('-') {
            Some(name) => (true, name),
            None => (false, raw),
        };
        let key = match name {
            "title" => SortKey::Title,
            "status" => SortKey::Status,
            "priority" => SortKey::Priority,
            "createdAt" | "created_at" => SortKey::CreatedAt,
            "updatedAt" | "updated_at" => SortKey::UpdatedAt,
            _ => {
                return Err(AppError::Validation(vec![format!(
                    "sort: unsupported sort field `{}`; expected one of title, status, priority, createdAt, updatedAt",
                    name
                )]))
            }
        };
        Ok(TaskSort { key, descending })
    }
}

impl TaskSort {
    /// Orders two tasks the same way the SQL `ORDER BY <column>, id` clause does.
    ///
    /// Titles compare byte-wise, which is why `SortKey::Title` sorts with the `"C"` collation.
    pub fn compare(&self, a: &Task, b: &Task) -> Ordering {
        let ordering = match self.key {
            SortKey::Title => a.title.cmp(&b.title),
            SortKey::Status => a.status.cmp(&b.status),
            SortKey::Priority => a.priority.cmp(&b.priority),
            SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
            SortKey::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        };
        let ordering = if self.descending {
            ordering.reverse()
        } else {
            ordering
        };
        ordering.then_with(|| a.id.cmp(&b.id))
    }
}

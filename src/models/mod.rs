pub mod task;
pub mod user;

pub use task::{
    CreateTaskRequest, NewTask, SortKey, Task, TaskFilter, TaskPatch, TaskPriority, TaskQuery,
    TaskSort, TaskStatus, UpdateTaskRequest,
};
pub use user::{normalize_email, NewUser, User, UserRecord};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use super::{TaskStore, UserStore};
use crate::error::AppError;
use crate::models::{NewTask, NewUser, Task, TaskFilter, TaskPatch, User, UserRecord};

const TASK_COLUMNS: &str =
    "id, title, description, status, priority, user_id, created_at, updated_at";

/// PostgreSQL-backed store. Schema lives in `migrations/`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("migration failed: {}", e)))
    }

    /// Removes every task and user. Used by the seed binary.
    pub async fn reset(&self) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM tasks").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM users").execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Builds the list query. Only whitelisted column names from `SortKey` reach the SQL text;
/// filter values are always bound.
fn list_sql(filter: &TaskFilter) -> String {
    let mut sql = format!("SELECT {} FROM tasks WHERE user_id = $1", TASK_COLUMNS);
    let mut param_count = 2;

    if filter.status.is_some() {
        sql.push_str(&format!(" AND status = ${}", param_count));
        param_count += 1;
    }
    if filter.priority.is_some() {
        sql.push_str(&format!(" AND priority = ${}", param_count));
    }

    let direction = if filter.sort.descending { "DESC" } else { "ASC" };
    sql.push_str(&format!(
        " ORDER BY {} {}, id ASC",
        filter.sort.key.column(),
        direction
    ));
    sql
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, AppError> {
        let record = user.into_record();
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (id, email, name, password_hash, created_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, email, name, created_at",
        )
        .bind(record.id)
        .bind(&record.email)
        .bind(&record.name)
        .bind(&record.password_hash)
        .bind(record.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, email, name, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, name, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn list_tasks(&self, owner: Uuid, filter: &TaskFilter) -> Result<Vec<Task>, AppError> {
        let sql = list_sql(filter);
        let mut query = sqlx::query_as::<_, Task>(&sql).bind(owner);
        if let Some(status) = filter.status {
            query = query.bind(status);
        }
        if let Some(priority) = filter.priority {
            query = query.bind(priority);
        }
        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn find_task(&self, owner: Uuid, id: Uuid) -> Result<Option<Task>, AppError> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE id = $1 AND user_id = $2",
            TASK_COLUMNS
        );
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    async fn insert_task(&self, owner: Uuid, task: NewTask) -> Result<Task, AppError> {
        let task = Task::new(task, owner);
        let sql = format!(
            "INSERT INTO tasks ({cols}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {cols}",
            cols = TASK_COLUMNS
        );
        let created = sqlx::query_as::<_, Task>(&sql)
            .bind(task.id)
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.status)
            .bind(task.priority)
            .bind(task.user_id)
            .bind(task.created_at)
            .bind(task.updated_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn update_task(
        &self,
        owner: Uuid,
        id: Uuid,
        patch: TaskPatch,
    ) -> Result<Option<Task>, AppError> {
        // One statement: the ownership predicate and the write cannot be separated.
        let sql = format!(
            "UPDATE tasks SET
                 title = COALESCE($3, title),
                 description = COALESCE($4, description),
                 status = COALESCE($5, status),
                 priority = COALESCE($6, priority),
                 updated_at = GREATEST($7, updated_at)
             WHERE id = $1 AND user_id = $2
             RETURNING {}",
            TASK_COLUMNS
        );
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .bind(owner)
            .bind(patch.title)
            .bind(patch.description)
            .bind(patch.status)
            .bind(patch.priority)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    async fn delete_task(&self, owner: Uuid, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TaskPriority, TaskStatus};

    #[test]
    fn test_list_sql_default_order() {
        let sql = list_sql(&TaskFilter::default());
        assert!(sql.ends_with("WHERE user_id = $1 ORDER BY created_at DESC, id ASC"));
    }

    #[test]
    fn test_list_sql_numbers_parameters() {
        let filter = TaskFilter {
            status: Some(TaskStatus::Done),
            priority: Some(TaskPriority::High),
            sort: "title".parse().unwrap(),
        };
        let sql = list_sql(&filter);
        assert!(sql.contains("AND status = $2 AND priority = $3"));
        assert!(sql.ends_with(r#"ORDER BY title COLLATE "C" ASC, id ASC"#));

        let filter = TaskFilter {
            priority: Some(TaskPriority::Low),
            ..Default::default()
        };
        assert!(list_sql(&filter).contains("AND priority = $2"));
    }

    // Needs a live database; run with `DATABASE_URL=... cargo test -- --ignored`.
    #[ignore]
    #[actix_rt::test]
    async fn test_ownership_scoped_roundtrip() {
        dotenv::dotenv().ok();
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL not set");
        let store = PgStore::connect(&url).await.unwrap();
        store.migrate().await.unwrap();

        let owner = store
            .insert_user(NewUser {
                email: format!("pg-{}@example.com", Uuid::new_v4()),
                name: "Owner".into(),
                password_hash: "x".into(),
            })
            .await
            .unwrap();
        let task = store
            .insert_task(
                owner.id,
                NewTask {
                    title: "Buy groceries".into(),
                    description: None,
                    status: TaskStatus::Pending,
                    priority: TaskPriority::Medium,
                },
            )
            .await
            .unwrap();

        let stranger = Uuid::new_v4();
        assert!(store.find_task(stranger, task.id).await.unwrap().is_none());
        assert!(!store.delete_task(stranger, task.id).await.unwrap());
        assert!(store.delete_task(owner.id, task.id).await.unwrap());

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(owner.id)
            .execute(store.pool())
            .await
            .unwrap();
    }
}

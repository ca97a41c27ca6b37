//! Resets the database and loads a demo user with a handful of tasks.
//!
//! Requires `DATABASE_URL`. Log in afterwards as `demo@example.com` / `demo123456`.

use std::sync::Arc;

use env_logger::Env;

use task_api::{
    auth::CredentialStore,
    models::{NewTask, TaskPriority, TaskStatus},
    store::{PgStore, TaskStore},
    AppError,
};

const DEMO_EMAIL: &str = "demo@example.com";
const DEMO_PASSWORD: &str = "demo123456";

const SAMPLE_TASKS: [(&str, TaskStatus, TaskPriority); 6] = [
    ("Setup project structure", TaskStatus::Done, TaskPriority::High),
    ("Implement user authentication", TaskStatus::Done, TaskPriority::High),
    ("Build task CRUD endpoints", TaskStatus::InProgress, TaskPriority::High),
    ("Write API documentation", TaskStatus::InProgress, TaskPriority::Medium),
    ("Add input validation", TaskStatus::Pending, TaskPriority::Medium),
    ("Deploy to production", TaskStatus::Pending, TaskPriority::Low),
];

async fn seed() -> Result<(), AppError> {
    let url = std::env::var("DATABASE_URL")
        .map_err(|_| AppError::Internal("DATABASE_URL must be set to seed".to_string()))?;

    let store = Arc::new(PgStore::connect(&url).await?);
    store.migrate().await?;
    log::info!("Connected to Postgres");

    store.reset().await?;

    let credentials = CredentialStore::new(store.clone(), bcrypt::DEFAULT_COST);
    let user = credentials
        .register(DEMO_EMAIL, "Demo User", DEMO_PASSWORD)
        .await?;
    log::info!("Created demo user ({} / {})", DEMO_EMAIL, DEMO_PASSWORD);

    for (title, status, priority) in SAMPLE_TASKS {
        store
            .insert_task(
                user.id,
                NewTask {
                    title: title.to_string(),
                    description: None,
                    status,
                    priority,
                },
            )
            .await?;
    }
    log::info!("Created {} sample tasks", SAMPLE_TASKS.len());

    Ok(())
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    env_logger::init_from_env(Env::new().default_filter_or("info"));

    if let Err(e) = seed().await {
        log::error!("Seeding failed: {}", e);
        std::process::exit(1);
    }
    log::info!("Done!");
}

use std::io;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;

use task_api::{
    auth::{CredentialStore, TokenService},
    routes,
    store::{MemoryStore, PgStore, TaskStore, UserStore},
    AppError, Config,
};

/// Postgres when `DATABASE_URL` is set, the in-memory store otherwise.
async fn open_stores(
    config: &Config,
) -> Result<(Arc<dyn UserStore>, Arc<dyn TaskStore>), AppError> {
    match &config.database_url {
        Some(url) => {
            let store = Arc::new(PgStore::connect(url).await?);
            store.migrate().await?;
            log::info!("Connected to Postgres and applied migrations");
            let users: Arc<dyn UserStore> = store.clone();
            let tasks: Arc<dyn TaskStore> = store;
            Ok((users, tasks))
        }
        None => {
            log::warn!("DATABASE_URL not set; data lives in memory and is lost on restart");
            let store = Arc::new(MemoryStore::new());
            let users: Arc<dyn UserStore> = store.clone();
            let tasks: Arc<dyn TaskStore> = store;
            Ok((users, tasks))
        }
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(Env::new().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    log::debug!("Loaded {:?}", config);

    let (users, tasks) = open_stores(&config)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;

    let tokens = web::Data::new(TokenService::new(&config.jwt_secret, config.jwt_ttl));
    let credentials = web::Data::new(CredentialStore::new(users, config.bcrypt_cost));
    let tasks: web::Data<dyn TaskStore> = web::Data::from(tasks);

    log::info!("Starting task API at {}", config.server_url());
    log::info!("API docs at {}/docs", config.server_url());

    HttpServer::new(move || {
        App::new()
            .app_data(tokens.clone())
            .app_data(credentials.clone())
            .app_data(tasks.clone())
            .wrap(routes::security_headers())
            .wrap(Cors::permissive())
            .wrap(Logger::default())
            .configure(routes::config)
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}

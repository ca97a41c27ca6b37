#![doc = "The `task_api` library crate."]
#![doc = ""]
#![doc = "Domain models, authentication, persistence, routing configuration and error handling"]
#![doc = "for the task API. The `task-api` binary builds the HTTP server from these pieces and"]
#![doc = "the `seed` binary uses the same stores to load demo data."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod store;
pub mod validation;

pub use crate::config::Config;
pub use crate::error::AppError;

pub mod catalog;
pub mod config;
pub mod database;
pub mod docs;
pub mod error;
pub mod handlers;
pub mod intake;
pub mod models;
pub mod repositories;
pub mod response;
pub mod routes;
pub mod services;
pub mod storage;

pub use config::Config;
pub use error::{AppError, AppResult};

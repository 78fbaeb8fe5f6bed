#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for animal chipping areas.
//!
//! Serves area management and per-area movement analytics over a
//! `SQLite` database. Every route except `/health` requires HTTP Basic
//! credentials; area writes are restricted to admins.

pub mod auth;
pub mod error;
mod handlers;

use std::path::PathBuf;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use chipping_database::db;
use chipping_database::store::SqlStore;
use chipping_server_models::ApiError;

/// Runtime settings read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// `SQLite` database file (`DATABASE_PATH`).
    pub db_path: PathBuf,
    /// Listen address (`BIND_ADDR`).
    pub bind_addr: String,
    /// Listen port (`PORT`).
    pub port: u16,
    /// Appended to passwords before hashing (`PASSWORD_SALT`).
    pub password_salt: String,
}

impl ServerConfig {
    /// Reads the configuration, falling back to defaults for unset or
    /// unparseable values.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            db_path: db::db_path_from_env(),
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            password_salt: std::env::var("PASSWORD_SALT").unwrap_or_default(),
        }
    }
}

/// Shared application state.
pub struct AppState {
    /// Area, movement, and account storage.
    pub store: SqlStore,
    /// Appended to passwords before verification.
    pub password_salt: String,
}

/// Registers every route plus JSON error bodies for extractor failures.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        let message = err.to_string();
        actix_web::error::InternalError::from_response(
            err,
            actix_web::HttpResponse::BadRequest().json(ApiError::new(message)),
        )
        .into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        let message = err.to_string();
        actix_web::error::InternalError::from_response(
            err,
            actix_web::HttpResponse::BadRequest().json(ApiError::new(message)),
        )
        .into()
    }))
    .route("/health", web::get().to(handlers::health))
    .route("/areas", web::post().to(handlers::add_area))
    .route("/areas/{id}", web::get().to(handlers::area))
    .route("/areas/{id}", web::put().to(handlers::replace_area))
    .route("/areas/{id}", web::delete().to(handlers::remove_area))
    .route("/areas/{id}/analytics", web::get().to(handlers::area_analytics));
}

/// Starts the chipping API server.
///
/// Opens the database (creating the schema if needed) and starts the
/// Actix-Web HTTP server. The caller provides the async runtime.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
///
/// # Panics
///
/// Panics if the database cannot be opened.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: ServerConfig) -> std::io::Result<()> {
    log::info!("Opening database at {}...", config.db_path.display());
    let db_conn = db::open_db(&config.db_path)
        .await
        .expect("Failed to open database");

    let state = web::Data::new(AppState {
        store: SqlStore::new(db_conn),
        password_salt: config.password_salt,
    });

    log::info!("Starting server on {}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((config.bind_addr, config.port))?
    .run()
    .await
}

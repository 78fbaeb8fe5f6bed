//! Database lifecycle: open, schema creation, and environment config.

use std::path::{Path, PathBuf};

use switchy_database::Database;
use switchy_database_connection::init_sqlite_rusqlite;

use crate::DbError;

/// Database file used when `DATABASE_PATH` is not set.
pub const DEFAULT_DB_PATH: &str = "data/chipping.db";

/// Resolves the database path from the `DATABASE_PATH` environment
/// variable.
#[must_use]
pub fn db_path_from_env() -> PathBuf {
    std::env::var("DATABASE_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map_or_else(|| PathBuf::from(DEFAULT_DB_PATH), PathBuf::from)
}

/// Opens the database at the path named by `DATABASE_PATH`.
///
/// # Errors
///
/// Returns [`DbError`] if the database cannot be opened or the schema
/// DDL fails.
pub async fn connect_from_env() -> Result<Box<dyn Database>, DbError> {
    let path = db_path_from_env();
    log::info!("Opening database at {}", path.display());
    open_db(&path).await
}

/// Opens (or creates) the `SQLite` database at the given path and ensures
/// all tables exist.
///
/// # Errors
///
/// Returns [`DbError`] if the database file cannot be created or the schema
/// DDL fails.
pub async fn open_db(path: &Path) -> Result<Box<dyn Database>, DbError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let db = init_sqlite_rusqlite(Some(path)).map_err(|e| DbError::Connection {
        message: e.to_string(),
    })?;

    ensure_schema(db.as_ref()).await?;

    Ok(db)
}

/// Creates all tables if they don't already exist.
///
/// Timestamps are stored as text in the fixed-width format produced by
/// [`crate::format_timestamp`].
#[allow(clippy::too_many_lines)]
pub async fn ensure_schema(db: &dyn Database) -> Result<(), DbError> {
    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS accounts (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name    TEXT NOT NULL,
            last_name     TEXT NOT NULL,
            email         TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            role          TEXT NOT NULL
        )",
    )
    .await?;

    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS location_points (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            latitude  REAL NOT NULL,
            longitude REAL NOT NULL,
            UNIQUE(latitude, longitude)
        )",
    )
    .await?;

    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS animal_types (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            type_label TEXT NOT NULL UNIQUE
        )",
    )
    .await?;

    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS animals (
            id                   INTEGER PRIMARY KEY AUTOINCREMENT,
            weight               REAL NOT NULL,
            length               REAL NOT NULL,
            height               REAL NOT NULL,
            gender               TEXT NOT NULL,
            life_status          TEXT NOT NULL DEFAULT 'ALIVE',
            chipped_at           TEXT NOT NULL,
            chipper_id           INTEGER NOT NULL REFERENCES accounts(id),
            chipping_location_id INTEGER NOT NULL REFERENCES location_points(id),
            death_at             TEXT
        )",
    )
    .await?;

    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS animal_type_animals (
            animal_id      INTEGER NOT NULL REFERENCES animals(id) ON DELETE CASCADE,
            animal_type_id INTEGER NOT NULL REFERENCES animal_types(id),
            PRIMARY KEY (animal_id, animal_type_id)
        )",
    )
    .await?;

    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS visited_locations (
            id                INTEGER PRIMARY KEY AUTOINCREMENT,
            animal_id         INTEGER NOT NULL REFERENCES animals(id) ON DELETE CASCADE,
            location_point_id INTEGER NOT NULL REFERENCES location_points(id),
            visited_at        TEXT NOT NULL
        )",
    )
    .await?;

    db.exec_raw(
        "CREATE INDEX IF NOT EXISTS idx_visited_locations_animal
         ON visited_locations (animal_id, visited_at)",
    )
    .await?;

    db.exec_raw(
        "CREATE INDEX IF NOT EXISTS idx_visited_locations_visited_at
         ON visited_locations (visited_at)",
    )
    .await?;

    db.exec_raw(
        "CREATE INDEX IF NOT EXISTS idx_animals_chipped_at
         ON animals (chipped_at)",
    )
    .await?;

    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS areas (
            id   INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        )",
    )
    .await?;

    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS area_points (
            area_id   INTEGER NOT NULL REFERENCES areas(id) ON DELETE CASCADE,
            position  INTEGER NOT NULL,
            latitude  REAL NOT NULL,
            longitude REAL NOT NULL,
            PRIMARY KEY (area_id, position)
        )",
    )
    .await?;

    // SQLite has foreign keys off by default
    db.exec_raw("PRAGMA foreign_keys = ON").await?;

    Ok(())
}

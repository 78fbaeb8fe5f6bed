//! Query functions for areas, animal movements, and accounts.
//!
//! All statements are raw parameterized SQL. Placeholders are numbered in
//! order of first appearance.

use std::collections::BTreeMap;

use chipping_analytics_models::{AnimalType, ChippedAnimal, VisitedLocation};
use chipping_area_models::{Area, AreaDraft};
use chipping_database_models::{Account, LocationPoint, NewAccount, Role};
use chipping_geometry_models::GeoPoint;
use chrono::{DateTime, Utc};
use moosicbox_json_utils::database::ToValue as _;
use switchy_database::{Database, DatabaseValue, Row};

use crate::{DbError, format_timestamp, parse_timestamp};

const VISIT_COLUMNS: &str = "v.id, v.animal_id, v.location_point_id, v.visited_at, \
                             lp.latitude, lp.longitude";

fn conversion(name: &str, e: impl std::fmt::Display) -> DbError {
    DbError::Conversion {
        message: format!("Failed to read column '{name}': {e}"),
    }
}

fn int_column(row: &Row, name: &str) -> Result<i64, DbError> {
    row.to_value::<i64>(name).map_err(|e| conversion(name, e))
}

fn real_column(row: &Row, name: &str) -> Result<f64, DbError> {
    row.to_value::<f64>(name).map_err(|e| conversion(name, e))
}

fn text_column(row: &Row, name: &str) -> Result<String, DbError> {
    row.to_value::<String>(name).map_err(|e| conversion(name, e))
}

fn point_columns(row: &Row) -> Result<GeoPoint, DbError> {
    Ok(GeoPoint::new(
        real_column(row, "latitude")?,
        real_column(row, "longitude")?,
    ))
}

fn returned_id(rows: &[Row], what: &str) -> Result<i64, DbError> {
    let row = rows.first().ok_or_else(|| DbError::Conversion {
        message: format!("No id returned for {what}"),
    })?;
    int_column(row, "id")
}

fn ts(at: DateTime<Utc>) -> DatabaseValue {
    DatabaseValue::String(format_timestamp(at))
}

// ---------------------------------------------------------------------------
// Areas
// ---------------------------------------------------------------------------

async fn load_area_points(db: &dyn Database, area_id: i64) -> Result<Vec<GeoPoint>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT latitude, longitude FROM area_points
             WHERE area_id = $1
             ORDER BY position",
            &[DatabaseValue::Int64(area_id)],
        )
        .await?;

    rows.iter().map(point_columns).collect()
}

async fn area_from_row(db: &dyn Database, row: &Row) -> Result<Area, DbError> {
    let id: i64 = int_column(row, "id")?;
    Ok(Area {
        id,
        name: text_column(row, "name")?,
        area_points: load_area_points(db, id).await?,
    })
}

/// Fetches one area with its ordered boundary.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub async fn get_area(db: &dyn Database, id: i64) -> Result<Option<Area>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT id, name FROM areas WHERE id = $1",
            &[DatabaseValue::Int64(id)],
        )
        .await?;

    match rows.first() {
        Some(row) => Ok(Some(area_from_row(db, row).await?)),
        None => Ok(None),
    }
}

/// Fetches one area by exact name.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub async fn get_area_by_name(db: &dyn Database, name: &str) -> Result<Option<Area>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT id, name FROM areas WHERE name = $1",
            &[DatabaseValue::String(name.to_string())],
        )
        .await?;

    match rows.first() {
        Some(row) => Ok(Some(area_from_row(db, row).await?)),
        None => Ok(None),
    }
}

/// Fetches every area, ordered by id, with boundaries loaded in one pass.
///
/// # Errors
///
/// Returns [`DbError`] if a query fails.
pub async fn list_areas(db: &dyn Database) -> Result<Vec<Area>, DbError> {
    let area_rows = db
        .query_raw_params("SELECT id, name FROM areas ORDER BY id", &[])
        .await?;
    let point_rows = db
        .query_raw_params(
            "SELECT area_id, latitude, longitude FROM area_points
             ORDER BY area_id, position",
            &[],
        )
        .await?;

    let mut points: BTreeMap<i64, Vec<GeoPoint>> = BTreeMap::new();
    for row in &point_rows {
        let area_id: i64 = int_column(row, "area_id")?;
        points.entry(area_id).or_default().push(point_columns(row)?);
    }

    area_rows
        .iter()
        .map(|row| -> Result<Area, DbError> {
            let id = int_column(row, "id")?;
            Ok(Area {
                id,
                name: text_column(row, "name")?,
                area_points: points.remove(&id).unwrap_or_default(),
            })
        })
        .collect()
}

async fn write_area_points(
    db: &dyn Database,
    area_id: i64,
    points: &[GeoPoint],
) -> Result<(), DbError> {
    for (position, point) in points.iter().enumerate() {
        let position = i64::try_from(position).map_err(|e| DbError::Conversion {
            message: format!("Area point position out of range: {e}"),
        })?;
        db.exec_raw_params(
            "INSERT INTO area_points (area_id, position, latitude, longitude)
             VALUES ($1, $2, $3, $4)",
            &[
                DatabaseValue::Int64(area_id),
                DatabaseValue::Int64(position),
                DatabaseValue::Real64(point.latitude),
                DatabaseValue::Real64(point.longitude),
            ],
        )
        .await?;
    }
    Ok(())
}

async fn insert_area_rows(db: &dyn Database, draft: &AreaDraft) -> Result<i64, DbError> {
    let rows = db
        .query_raw_params(
            "INSERT INTO areas (name) VALUES ($1) RETURNING id",
            &[DatabaseValue::String(draft.name.clone())],
        )
        .await?;
    let id = returned_id(&rows, "area")?;
    write_area_points(db, id, &draft.area_points).await?;
    Ok(id)
}

async fn replace_area_rows(
    db: &dyn Database,
    id: i64,
    draft: &AreaDraft,
) -> Result<bool, DbError> {
    let updated = db
        .exec_raw_params(
            "UPDATE areas SET name = $1 WHERE id = $2",
            &[
                DatabaseValue::String(draft.name.clone()),
                DatabaseValue::Int64(id),
            ],
        )
        .await?;
    if updated == 0 {
        return Ok(false);
    }

    db.exec_raw_params(
        "DELETE FROM area_points WHERE area_id = $1",
        &[DatabaseValue::Int64(id)],
    )
    .await?;
    write_area_points(db, id, &draft.area_points).await?;
    Ok(true)
}

/// Returns the error that aborted a transaction. A failing rollback is
/// logged and does not replace it.
fn abort_with<T, E: std::fmt::Display>(
    operation: &str,
    rollback: Result<(), E>,
    error: DbError,
) -> Result<T, DbError> {
    if let Err(rollback_err) = rollback {
        log::error!("Rollback after failed {operation} also failed: {rollback_err}");
    }
    Err(error)
}

/// Inserts an area and its boundary in one transaction.
///
/// # Errors
///
/// Returns [`DbError`] if any statement fails. Nothing is written in that
/// case.
pub async fn insert_area(db: &dyn Database, draft: &AreaDraft) -> Result<Area, DbError> {
    let txn = db.begin_transaction().await?;

    match insert_area_rows(txn.as_ref(), draft).await {
        Ok(id) => {
            txn.commit().await?;
            Ok(draft.clone().into_area(id))
        }
        Err(e) => abort_with("area insert", txn.rollback().await, e),
    }
}

/// Replaces an area's name and full boundary in one transaction.
///
/// Returns `None` if no area has this id.
///
/// # Errors
///
/// Returns [`DbError`] if any statement fails. The previous boundary is
/// kept in that case.
pub async fn replace_area(
    db: &dyn Database,
    id: i64,
    draft: &AreaDraft,
) -> Result<Option<Area>, DbError> {
    let txn = db.begin_transaction().await?;

    match replace_area_rows(txn.as_ref(), id, draft).await {
        Ok(true) => {
            txn.commit().await?;
            Ok(Some(draft.clone().into_area(id)))
        }
        Ok(false) => {
            txn.rollback().await?;
            Ok(None)
        }
        Err(e) => abort_with("area replace", txn.rollback().await, e),
    }
}

/// Deletes an area and its boundary. Returns `false` if it did not exist.
///
/// # Errors
///
/// Returns [`DbError`] if a statement fails.
pub async fn delete_area(db: &dyn Database, id: i64) -> Result<bool, DbError> {
    let txn = db.begin_transaction().await?;

    let result = async {
        txn.exec_raw_params(
            "DELETE FROM area_points WHERE area_id = $1",
            &[DatabaseValue::Int64(id)],
        )
        .await?;
        let deleted = txn
            .exec_raw_params("DELETE FROM areas WHERE id = $1", &[DatabaseValue::Int64(id)])
            .await?;
        Ok::<_, DbError>(deleted > 0)
    }
    .await;

    match result {
        Ok(deleted) => {
            txn.commit().await?;
            Ok(deleted)
        }
        Err(e) => abort_with("area delete", txn.rollback().await, e),
    }
}

// ---------------------------------------------------------------------------
// Movements
// ---------------------------------------------------------------------------

fn visit_from_row(row: &Row) -> Result<VisitedLocation, DbError> {
    let visited_at: String = text_column(row, "visited_at")?;
    Ok(VisitedLocation {
        id: int_column(row, "id")?,
        animal_id: int_column(row, "animal_id")?,
        location_point_id: int_column(row, "location_point_id")?,
        visited_at: parse_timestamp(&visited_at)?,
        point: point_columns(row)?,
    })
}

fn chipped_from_row(row: &Row) -> Result<ChippedAnimal, DbError> {
    let chipped_at: String = text_column(row, "chipped_at")?;
    Ok(ChippedAnimal {
        animal_id: int_column(row, "id")?,
        chipped_at: parse_timestamp(&chipped_at)?,
        chipping_location_id: int_column(row, "chipping_location_id")?,
    })
}

/// The latest visit of each animal strictly before `before`.
///
/// Ties on timestamp go to the higher visit id.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or a row cannot be decoded.
pub async fn last_visits_before(
    db: &dyn Database,
    before: DateTime<Utc>,
) -> Result<Vec<VisitedLocation>, DbError> {
    let sql = format!(
        "SELECT {VISIT_COLUMNS}
         FROM visited_locations v
         JOIN location_points lp ON lp.id = v.location_point_id
         WHERE v.id = (
             SELECT v2.id FROM visited_locations v2
             WHERE v2.animal_id = v.animal_id AND v2.visited_at < $1
             ORDER BY v2.visited_at DESC, v2.id DESC
             LIMIT 1
         )
         ORDER BY v.animal_id"
    );
    let rows = db.query_raw_params(&sql, &[ts(before)]).await?;
    rows.iter().map(visit_from_row).collect()
}

/// Every visit within `[start, end]`, ascending by timestamp then id.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or a row cannot be decoded.
pub async fn visits_between(
    db: &dyn Database,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<VisitedLocation>, DbError> {
    let sql = format!(
        "SELECT {VISIT_COLUMNS}
         FROM visited_locations v
         JOIN location_points lp ON lp.id = v.location_point_id
         WHERE v.visited_at >= $1 AND v.visited_at <= $2
         ORDER BY v.visited_at, v.id"
    );
    let rows = db.query_raw_params(&sql, &[ts(start), ts(end)]).await?;
    rows.iter().map(visit_from_row).collect()
}

/// Animals with no visit records at all, chipped strictly before `before`.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or a row cannot be decoded.
pub async fn unvisited_animals_chipped_before(
    db: &dyn Database,
    before: DateTime<Utc>,
) -> Result<Vec<ChippedAnimal>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT a.id, a.chipped_at, a.chipping_location_id
             FROM animals a
             WHERE a.chipped_at < $1
               AND NOT EXISTS (
                   SELECT 1 FROM visited_locations v WHERE v.animal_id = a.id
               )
             ORDER BY a.id",
            &[ts(before)],
        )
        .await?;
    rows.iter().map(chipped_from_row).collect()
}

/// Animals chipped within `[start, end]`.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or a row cannot be decoded.
pub async fn animals_chipped_between(
    db: &dyn Database,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<ChippedAnimal>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT id, chipped_at, chipping_location_id
             FROM animals
             WHERE chipped_at >= $1 AND chipped_at <= $2
             ORDER BY id",
            &[ts(start), ts(end)],
        )
        .await?;
    rows.iter().map(chipped_from_row).collect()
}

/// Looks up a location point by id.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub async fn get_location_point(
    db: &dyn Database,
    id: i64,
) -> Result<Option<LocationPoint>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT id, latitude, longitude FROM location_points WHERE id = $1",
            &[DatabaseValue::Int64(id)],
        )
        .await?;

    rows.first()
        .map(|row| -> Result<LocationPoint, DbError> {
            Ok(LocationPoint {
                id: int_column(row, "id")?,
                point: point_columns(row)?,
            })
        })
        .transpose()
}

/// Types assigned to an animal, ordered by type id.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub async fn get_animal_types(
    db: &dyn Database,
    animal_id: i64,
) -> Result<Vec<AnimalType>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT t.id, t.type_label
             FROM animal_type_animals ata
             JOIN animal_types t ON t.id = ata.animal_type_id
             WHERE ata.animal_id = $1
             ORDER BY t.id",
            &[DatabaseValue::Int64(animal_id)],
        )
        .await?;

    rows.iter()
        .map(|row| -> Result<AnimalType, DbError> {
            Ok(AnimalType {
                id: int_column(row, "id")?,
                label: text_column(row, "type_label")?,
            })
        })
        .collect()
}

/// Returns the id of the location point at these coordinates, creating it
/// if needed.
///
/// # Errors
///
/// Returns [`DbError`] if the statement fails.
pub async fn upsert_location_point(db: &dyn Database, point: GeoPoint) -> Result<i64, DbError> {
    let rows = db
        .query_raw_params(
            "INSERT INTO location_points (latitude, longitude) VALUES ($1, $2)
             ON CONFLICT (latitude, longitude) DO UPDATE SET latitude = excluded.latitude
             RETURNING id",
            &[
                DatabaseValue::Real64(point.latitude),
                DatabaseValue::Real64(point.longitude),
            ],
        )
        .await?;
    returned_id(&rows, "location point")
}

/// Returns the id of the animal type with this label, creating it if
/// needed.
///
/// # Errors
///
/// Returns [`DbError`] if the statement fails.
pub async fn upsert_animal_type(db: &dyn Database, label: &str) -> Result<i64, DbError> {
    let rows = db
        .query_raw_params(
            "INSERT INTO animal_types (type_label) VALUES ($1)
             ON CONFLICT (type_label) DO UPDATE SET type_label = excluded.type_label
             RETURNING id",
            &[DatabaseValue::String(label.to_string())],
        )
        .await?;
    returned_id(&rows, "animal type")
}

/// Body measurements and identity of an animal to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAnimal {
    /// Weight in kilograms.
    pub weight: f64,
    /// Length in metres.
    pub length: f64,
    /// Height in metres.
    pub height: f64,
    /// `MALE`, `FEMALE`, or `OTHER`.
    pub gender: String,
    /// When the animal was chipped.
    pub chipped_at: DateTime<Utc>,
    /// Account that chipped it.
    pub chipper_id: i64,
    /// Where it was chipped.
    pub chipping_location_id: i64,
}

/// Inserts an animal and returns its id.
///
/// # Errors
///
/// Returns [`DbError`] if the statement fails.
pub async fn insert_animal(db: &dyn Database, animal: &NewAnimal) -> Result<i64, DbError> {
    let rows = db
        .query_raw_params(
            "INSERT INTO animals (
                weight, length, height, gender, chipped_at, chipper_id, chipping_location_id
             ) VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING id",
            &[
                DatabaseValue::Real64(animal.weight),
                DatabaseValue::Real64(animal.length),
                DatabaseValue::Real64(animal.height),
                DatabaseValue::String(animal.gender.clone()),
                ts(animal.chipped_at),
                DatabaseValue::Int64(animal.chipper_id),
                DatabaseValue::Int64(animal.chipping_location_id),
            ],
        )
        .await?;
    returned_id(&rows, "animal")
}

/// Tags an animal with a type. Re-tagging is a no-op.
///
/// # Errors
///
/// Returns [`DbError`] if the statement fails.
pub async fn assign_animal_type(
    db: &dyn Database,
    animal_id: i64,
    animal_type_id: i64,
) -> Result<(), DbError> {
    db.exec_raw_params(
        "INSERT INTO animal_type_animals (animal_id, animal_type_id) VALUES ($1, $2)
         ON CONFLICT (animal_id, animal_type_id) DO NOTHING",
        &[
            DatabaseValue::Int64(animal_id),
            DatabaseValue::Int64(animal_type_id),
        ],
    )
    .await?;
    Ok(())
}

/// Records an animal visiting a location point and returns the visit id.
///
/// # Errors
///
/// Returns [`DbError`] if the statement fails.
pub async fn insert_visit(
    db: &dyn Database,
    animal_id: i64,
    location_point_id: i64,
    visited_at: DateTime<Utc>,
) -> Result<i64, DbError> {
    let rows = db
        .query_raw_params(
            "INSERT INTO visited_locations (animal_id, location_point_id, visited_at)
             VALUES ($1, $2, $3)
             RETURNING id",
            &[
                DatabaseValue::Int64(animal_id),
                DatabaseValue::Int64(location_point_id),
                ts(visited_at),
            ],
        )
        .await?;
    returned_id(&rows, "visit")
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// Looks up an account by login email.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or the stored role is unknown.
pub async fn get_account_by_email(
    db: &dyn Database,
    email: &str,
) -> Result<Option<Account>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT id, first_name, last_name, email, password_hash, role
             FROM accounts WHERE email = $1",
            &[DatabaseValue::String(email.to_string())],
        )
        .await?;

    let Some(row) = rows.first() else {
        return Ok(None);
    };

    let role: String = text_column(row, "role")?;
    let role = role.parse::<Role>().map_err(|_| DbError::Conversion {
        message: format!("Unknown role '{role}'"),
    })?;

    Ok(Some(Account {
        id: int_column(row, "id")?,
        first_name: text_column(row, "first_name")?,
        last_name: text_column(row, "last_name")?,
        email: text_column(row, "email")?,
        password_hash: text_column(row, "password_hash")?,
        role,
    }))
}

/// Inserts an account unless the email is already taken.
///
/// Returns the new id, or `None` if an account with this email exists.
///
/// # Errors
///
/// Returns [`DbError`] if the statement fails.
pub async fn insert_account(
    db: &dyn Database,
    account: &NewAccount,
) -> Result<Option<i64>, DbError> {
    let rows = db
        .query_raw_params(
            "INSERT INTO accounts (first_name, last_name, email, password_hash, role)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (email) DO NOTHING
             RETURNING id",
            &[
                DatabaseValue::String(account.first_name.clone()),
                DatabaseValue::String(account.last_name.clone()),
                DatabaseValue::String(account.email.clone()),
                DatabaseValue::String(account.password_hash.clone()),
                DatabaseValue::String(account.role.as_ref().to_string()),
            ],
        )
        .await?;

    rows.first().map(|row| int_column(row, "id")).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_rollback_keeps_the_statement_error() {
        let result: Result<(), DbError> = abort_with(
            "area insert",
            Err("disk I/O error"),
            DbError::Conversion {
                message: "UNIQUE constraint failed: areas.name".to_string(),
            },
        );

        let err = result.unwrap_err();
        assert!(matches!(err, DbError::Conversion { .. }));
        assert!(err.to_string().contains("UNIQUE constraint failed"));
    }

    #[test]
    fn clean_rollback_returns_the_statement_error() {
        let result: Result<bool, DbError> = abort_with(
            "area delete",
            Ok::<(), String>(()),
            DbError::Connection {
                message: "closed".to_string(),
            },
        );

        assert!(matches!(result, Err(DbError::Connection { .. })));
    }
}

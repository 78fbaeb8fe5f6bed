#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Database row types.
//!
//! These are the shapes of accounts and location points as stored. Area,
//! visit, and chipping records have their own model crates because the
//! core logic consumes them directly.

use chipping_geometry_models::GeoPoint;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Account role, gating write access.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Full access, including area management.
    Admin,
    /// Registers animals and their movements.
    Chipper,
    /// Read-only access.
    User,
}

/// An account row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Primary key.
    pub id: i64,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Login email, unique.
    pub email: String,
    /// bcrypt hash of the salted password.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Access role.
    pub role: Role,
}

/// Fields needed to insert an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Login email.
    pub email: String,
    /// bcrypt hash of the salted password.
    pub password_hash: String,
    /// Access role.
    pub role: Role,
}

/// A location point row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationPoint {
    /// Primary key.
    pub id: i64,
    /// Coordinates.
    #[serde(flatten)]
    pub point: GeoPoint,
}

//! HTTP Basic authentication and role checks.
//!
//! Passwords are salted with the configured `PASSWORD_SALT` before bcrypt
//! hashing and verification.

use std::sync::LazyLock;

use actix_web::{HttpRequest, http::header, web};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chipping_database::queries;
use chipping_database_models::{Account, Role};

use crate::AppState;
use crate::error::ServerError;

/// Decoded `Authorization: Basic` credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Login email.
    pub email: String,
    /// Plain-text password.
    pub password: String,
}

/// Parses an `Authorization` header value of the form
/// `Basic base64(email:password)`.
///
/// Returns `None` for any other scheme or malformed payload.
#[must_use]
pub fn parse_basic(value: &str) -> Option<Credentials> {
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (email, password) = decoded.split_once(':')?;

    if email.is_empty() {
        return None;
    }

    Some(Credentials {
        email: email.to_string(),
        password: password.to_string(),
    })
}

/// Hashes a password with the default bcrypt cost.
///
/// # Errors
///
/// Returns [`bcrypt::BcryptError`] if hashing fails.
pub fn hash_password(password: &str, salt: &str) -> Result<String, bcrypt::BcryptError> {
    hash_password_with_cost(password, salt, bcrypt::DEFAULT_COST)
}

/// Hashes a password with an explicit bcrypt cost.
///
/// # Errors
///
/// Returns [`bcrypt::BcryptError`] if hashing fails or the cost is out of
/// range.
pub fn hash_password_with_cost(
    password: &str,
    salt: &str,
    cost: u32,
) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(format!("{password}{salt}"), cost)
}

/// Checks a password against a stored hash. A malformed hash never
/// verifies.
#[must_use]
pub fn verify_password(password: &str, salt: &str, hash: &str) -> bool {
    bcrypt::verify(format!("{password}{salt}"), hash).unwrap_or(false)
}

/// Hash checked when the email matches no account. Uses the default cost
/// so a miss takes as long as a real check.
static UNKNOWN_ACCOUNT_HASH: LazyLock<String> = LazyLock::new(|| {
    bcrypt::hash("unknown-account", bcrypt::DEFAULT_COST).unwrap_or_else(|e| {
        log::error!("Failed to build the unknown-account hash: {e}");
        String::new()
    })
});

/// Resolves the account behind the request's Basic credentials.
///
/// # Errors
///
/// Returns [`ServerError::Unauthorized`] if the header is missing or
/// malformed, the email is unknown, or the password does not match.
pub async fn authenticate(req: &HttpRequest, state: &AppState) -> Result<Account, ServerError> {
    let credentials = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_basic)
        .ok_or(ServerError::Unauthorized)?;

    let account = queries::get_account_by_email(state.store.db(), &credentials.email).await?;

    // Unknown emails still pay for a bcrypt verify so timing does not
    // reveal which accounts exist.
    let hash = account
        .as_ref()
        .map_or_else(|| UNKNOWN_ACCOUNT_HASH.clone(), |a| a.password_hash.clone());
    let salt = state.password_salt.clone();
    let password = credentials.password;
    let verified = web::block(move || verify_password(&password, &salt, &hash)).await?;

    let Some(account) = account else {
        log::debug!("Unknown account {}", credentials.email);
        return Err(ServerError::Unauthorized);
    };

    if !verified {
        log::debug!("Bad password for account {}", account.id);
        return Err(ServerError::Unauthorized);
    }

    Ok(account)
}

/// Fails unless the account has one of `allowed`.
///
/// # Errors
///
/// Returns [`ServerError::Forbidden`] if the role is not allowed.
pub fn require_role(account: &Account, allowed: &[Role]) -> Result<(), ServerError> {
    if allowed.contains(&account.role) {
        Ok(())
    } else {
        log::debug!(
            "Account {} with role {} denied (needs one of {allowed:?})",
            account.id,
            account.role
        );
        Err(ServerError::Forbidden)
    }
}

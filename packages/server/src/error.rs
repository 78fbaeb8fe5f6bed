//! Mapping of domain failures to HTTP responses.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use chipping_analytics::AnalyticsError;
use chipping_analytics_models::IntervalError;
use chipping_area::{AreaError, ErrorKind};
use chipping_database::DbError;
use chipping_server_models::ApiError;
use thiserror::Error;

/// Every failure a handler can surface.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Credentials are missing or do not match an account.
    #[error("Authentication required")]
    Unauthorized,

    /// The account's role may not perform this operation.
    #[error("Insufficient permissions")]
    Forbidden,

    /// Malformed request input outside the domain validators.
    #[error("{0}")]
    BadRequest(String),

    /// Area validation or lifecycle failure.
    #[error(transparent)]
    Area(#[from] AreaError),

    /// Analytics computation failure.
    #[error(transparent)]
    Analytics(#[from] AnalyticsError),

    /// Query dates are malformed or out of order.
    #[error(transparent)]
    Interval(#[from] IntervalError),

    /// Direct database access failed.
    #[error(transparent)]
    Database(#[from] DbError),

    /// Password hashing failed.
    #[error("Password hashing error: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    /// A blocking task was cancelled.
    #[error("Blocking task failed: {0}")]
    Blocking(#[from] actix_web::error::BlockingError),
}

const fn kind_status(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::BadRequest(_) | Self::Interval(_) => StatusCode::BAD_REQUEST,
            Self::Area(e) => kind_status(e.kind()),
            Self::Analytics(e) => kind_status(e.kind()),
            Self::Database(_) | Self::Hash(_) | Self::Blocking(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        let message = if status.is_server_error() {
            log::error!("Request failed: {self}");
            "Internal server error".to_string()
        } else {
            log::debug!("Request rejected ({status}): {self}");
            self.to_string()
        };

        let mut response = HttpResponse::build(status);
        if status == StatusCode::UNAUTHORIZED {
            response.insert_header(("WWW-Authenticate", "Basic realm=\"chipping\""));
        }
        response.json(ApiError::new(message))
    }
}

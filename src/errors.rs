use axum::http::StatusCode;
use thiserror::Error;
use tracing::error;

use crate::chain::ChainError;

/// Handler error: status plus a plain-text message.
pub type ApiError = (StatusCode, String);

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("{0}")]
    Conflict(String),

    #[error("not found")]
    NotFound,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RepoError {
    /// Maps a sqlx error, turning unique violations into `Conflict`.
    ///
    /// `constraints` pairs a constraint name with the message to report.
    pub fn from_sqlx(e: sqlx::Error, constraints: &[(&str, &str)]) -> Self {
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() {
                let msg = db
                    .constraint()
                    .and_then(|c| constraints.iter().find(|(name, _)| *name == c))
                    .map(|(_, msg)| msg.to_string())
                    .unwrap_or_else(|| "Duplicate record".to_string());
                return Self::Conflict(msg);
            }
        }
        if let sqlx::Error::RowNotFound = e {
            return Self::NotFound;
        }
        Self::Other(e.into())
    }
}

pub fn bad_request(msg: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, msg.into())
}

pub fn not_found(msg: impl Into<String>) -> ApiError {
    (StatusCode::NOT_FOUND, msg.into())
}

pub fn internal<E: std::fmt::Display>(e: E) -> ApiError {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

/// `NotFound` becomes 404 with `what`; other errors keep their category.
pub fn repo_error(e: RepoError, what: &str) -> ApiError {
    match e {
        RepoError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        RepoError::NotFound => not_found(format!("{what} not found")),
        RepoError::Other(e) => {
            error!(error = %e, "store error");
            internal(e)
        }
    }
}

/// Chain failures surface as a generic message; the cause goes to the log.
pub fn chain_error(e: ChainError, action: &str) -> ApiError {
    if e.is_client_error() {
        return bad_request(e.to_string());
    }
    error!(error = %e, action, "chain call failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Failed to {action}"),
    )
}

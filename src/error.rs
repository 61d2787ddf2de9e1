//! Error types for the tally service.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::net::Ipv4Addr;
use thiserror::Error;

use crate::metrics::{REJECTED_TOTAL, STORAGE_ERRORS};
use crate::models::ErrorBody;

/// Failures of the record store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode or decode snapshot: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("address {0} is already recorded")]
    AlreadyExists(Ipv4Addr),

    #[error("address {0} is not recorded")]
    NotFound(Ipv4Addr),
}

/// Why a submitted address was refused.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressProblem {
    #[error("IP address required")]
    Missing,

    #[error("Invalid IPv4 address: {0}")]
    Malformed(String),
}

/// Failures surfaced to callers of the processor and aggregator.
#[derive(Debug, Error)]
pub enum TallyError {
    #[error("{0}")]
    InvalidAddress(AddressProblem),

    #[error("malformed request: {0}")]
    BadRequest(String),

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, TallyError>;

impl IntoResponse for TallyError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            TallyError::InvalidAddress(_) | TallyError::BadRequest(_) => {
                REJECTED_TOTAL.inc();
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            TallyError::Storage(e) => {
                STORAGE_ERRORS.inc();
                tracing::error!(error = %e, "storage failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "Storage error".to_string())
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

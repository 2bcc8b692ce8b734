use axum::http::StatusCode;
use thiserror::Error;
use tracing::{error, warn};

use crate::diet::DietError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Diet(#[from] DietError),

    #[error("{0}")]
    Invalid(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Diet(e) => match e {
                DietError::NotFound(_) => StatusCode::NOT_FOUND,
                DietError::OutOfRange { .. }
                | DietError::InvalidQuantity(_)
                | DietError::MissingTarget(_)
                | DietError::InvalidMacros(_) => StatusCode::BAD_REQUEST,
                DietError::AlreadyFinalized(_)
                | DietError::NotFinalized(_)
                | DietError::FoodInUse { .. }
                | DietError::Blacklisted(_) => StatusCode::CONFLICT,
            },
            ServiceError::Invalid(_) => StatusCode::BAD_REQUEST,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Map a failure onto the handler rejection, logging it on the way out.
pub fn reject(err: ServiceError) -> (StatusCode, String) {
    let status = err.status();
    if status.is_server_error() {
        error!(error = ?err, "request failed");
    } else {
        warn!(%status, error = %err, "request rejected");
    }
    (status, err.to_string())
}

impl From<DietError> for (StatusCode, String) {
    fn from(err: DietError) -> Self {
        reject(ServiceError::Diet(err))
    }
}

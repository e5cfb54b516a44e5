//! Mapping of controller errors onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::failover::FailoverError;

/// JSON error body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError(pub FailoverError);

impl From<FailoverError> for ApiError {
    fn from(err: FailoverError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            FailoverError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            FailoverError::StaleState { .. }
            | FailoverError::NoBackupAvailable
            | FailoverError::SwitchInProgress
            | FailoverError::Cancelled => StatusCode::CONFLICT,
            FailoverError::Activation { .. } => StatusCode::BAD_GATEWAY,
            FailoverError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Admin request failed");
        }
        let body = ErrorBody {
            error: self.0.kind().to_string(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::failover::ValidationError;

    #[test]
    fn test_status_mapping() {
        let err = ApiError(FailoverError::Validation(ValidationError::CooldownOutOfRange {
            value: 5,
            min: 10,
            max: 120,
        }));
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(ApiError(FailoverError::NoBackupAvailable).status(), StatusCode::CONFLICT);
    }
}

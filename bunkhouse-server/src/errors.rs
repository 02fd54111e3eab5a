use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use bunkhouse_core::{AdmissionError, DatabaseError};

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{resource}:{identifier} not found")]
    NotFound {
        resource: &'static str,
        identifier: &'static str,
    },
    #[error("{resource} with {field} of value {value} already exists")]
    Conflict {
        resource: &'static str,
        field: &'static str,
        value: String,
    },
    #[error("No beds are available for the requested dates")]
    NoAvailability,
    #[error("The bed is no longer available, please retry")]
    AdmissionRace,
    #[error("{0}")]
    Validation(String),
    #[error("Unknown internal error: {0}")]
    Unknown(String),
}

impl ServerError {
    fn as_status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NoAvailability => StatusCode::CONFLICT,
            Self::AdmissionRace => StatusCode::CONFLICT,
            Self::Conflict {
                resource: _,
                field: _,
                value: _,
            } => StatusCode::CONFLICT,
            Self::NotFound {
                resource: _,
                identifier: _,
            } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Failures always leave the server as `{"success": false, "message": ...}`,
/// never as a bare protocol-level error
#[derive(Debug, Serialize)]
struct FailureBody {
    success: bool,
    message: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let body = FailureBody {
            success: false,
            message: self.to_string(),
        };

        (self.as_status_code(), Json(body)).into_response()
    }
}

impl From<AdmissionError> for ServerError {
    fn from(value: AdmissionError) -> Self {
        match value {
            AdmissionError::NoBedAvailable => Self::NoAvailability,
            AdmissionError::Contention => Self::AdmissionRace,
            AdmissionError::Db(e) => e.into(),
        }
    }
}

impl From<DatabaseError> for ServerError {
    fn from(value: DatabaseError) -> Self {
        match value {
            DatabaseError::NotFound {
                resource,
                identifier,
            } => Self::NotFound {
                resource,
                identifier,
            },
            DatabaseError::Conflict {
                resource,
                field,
                value,
            } => Self::Conflict {
                resource,
                field,
                value,
            },
            e => Self::Unknown(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admission_outcomes_map_to_conflict_statuses() {
        let no_beds: ServerError = AdmissionError::NoBedAvailable.into();
        let race: ServerError = AdmissionError::Contention.into();

        assert_eq!(no_beds.as_status_code(), StatusCode::CONFLICT);
        assert_eq!(race.as_status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn database_errors_keep_their_taxonomy() {
        let not_found: ServerError = DatabaseError::NotFound {
            resource: "reservation",
            identifier: "id",
        }
        .into();
        assert_eq!(not_found.as_status_code(), StatusCode::NOT_FOUND);

        let conflict: ServerError = DatabaseError::Conflict {
            resource: "guest",
            field: "id_number",
            value: "X99".to_string(),
        }
        .into();
        assert_eq!(conflict.as_status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn validation_failures_are_bad_requests() {
        let error = ServerError::Validation("Check-out must be after check-in".to_string());

        assert_eq!(error.as_status_code(), StatusCode::BAD_REQUEST);
    }
}

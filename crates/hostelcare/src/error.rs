use crate::complaints::legacy::LegacyImportError;
use crate::complaints::{ComplaintAction, ComplaintStatus, Ineligibility};
use crate::config::ConfigError;
use crate::identity::{AuthError, ProfileError};
use crate::ids::{RoomId, UserId};
use crate::store::RepositoryError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use std::fmt;

/// Failures surfaced by desk operations. Every variant is recoverable by the
/// caller and maps onto a 4xx response, except storage and export faults.
#[derive(Debug, thiserror::Error)]
pub enum HostelError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Authorization(String),
    #[error("{0}")]
    Unauthenticated(String),
    #[error("worker {worker} cannot take this complaint: {reason}")]
    IneligibleWorker {
        worker: UserId,
        reason: Ineligibility,
    },
    #[error("cannot {action} a complaint that is {from}")]
    InvalidTransition {
        from: ComplaintStatus,
        action: ComplaintAction,
    },
    #[error("{0} not found")]
    NotFound(String),
    #[error("room {room} is full ({occupants}/{capacity} occupants)")]
    RoomFull {
        room: RoomId,
        occupants: usize,
        capacity: u32,
    },
    #[error("storage failure: {0}")]
    Repository(#[from] RepositoryError),
    #[error("export failed: {0}")]
    Export(#[from] csv::Error),
}

/// Wire shape of every error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub kind: &'static str,
    pub detail: String,
}

impl HostelError {
    pub fn kind(&self) -> &'static str {
        match self {
            HostelError::Validation(_) => "validation",
            HostelError::Authorization(_) => "authorization",
            HostelError::Unauthenticated(_) => "unauthenticated",
            HostelError::IneligibleWorker { .. } => "ineligible_worker",
            HostelError::InvalidTransition { .. } => "invalid_transition",
            HostelError::NotFound(_) => "not_found",
            HostelError::RoomFull { .. } => "room_full",
            HostelError::Repository(_) => "storage",
            HostelError::Export(_) => "export",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            HostelError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            HostelError::Authorization(_) => StatusCode::FORBIDDEN,
            HostelError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            HostelError::IneligibleWorker { .. }
            | HostelError::InvalidTransition { .. }
            | HostelError::RoomFull { .. } => StatusCode::CONFLICT,
            HostelError::NotFound(_) => StatusCode::NOT_FOUND,
            HostelError::Repository(_) | HostelError::Export(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            kind: self.kind(),
            detail: self.to_string(),
        }
    }
}

impl From<ProfileError> for HostelError {
    fn from(value: ProfileError) -> Self {
        Self::Validation(value.to_string())
    }
}

impl From<AuthError> for HostelError {
    fn from(value: AuthError) -> Self {
        match value {
            AuthError::Repository(err) => Self::Repository(err),
            other => Self::Unauthenticated(other.to_string()),
        }
    }
}

impl IntoResponse for HostelError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(self.body())).into_response()
    }
}

/// Process-level failures for the service binary.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Import(LegacyImportError),
    Desk(HostelError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Import(err) => write!(f, "legacy import error: {}", err),
            AppError::Desk(err) => write!(f, "desk error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Import(err) => Some(err),
            AppError::Desk(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Desk(err) => err.into_response(),
            AppError::Import(err) => {
                let body = Json(json!({ "kind": "validation", "detail": err.to_string() }));
                (StatusCode::BAD_REQUEST, body).into_response()
            }
            other => {
                let body = Json(json!({ "kind": "internal", "detail": other.to_string() }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<LegacyImportError> for AppError {
    fn from(value: LegacyImportError) -> Self {
        Self::Import(value)
    }
}

impl From<HostelError> for AppError {
    fn from(value: HostelError) -> Self {
        Self::Desk(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_errors_render_kind_and_detail() {
        let err = HostelError::InvalidTransition {
            from: ComplaintStatus::Resolved,
            action: ComplaintAction::Resolve,
        };
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        let body = err.body();
        assert_eq!(body.kind, "invalid_transition");
        assert_eq!(body.detail, "cannot resolve a complaint that is resolved");
    }

    #[test]
    fn auth_failures_become_unauthenticated() {
        let err = HostelError::from(AuthError::InvalidCredentials);
        assert_eq!(err.kind(), "unauthenticated");
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn storage_failures_are_server_errors() {
        let err = HostelError::from(RepositoryError::Unavailable("offline".to_string()));
        assert_eq!(err.kind(), "storage");
        assert!(err.status_code().is_server_error());
    }
}

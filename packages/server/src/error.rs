//! Mapping domain errors onto HTTP responses.

use actix_web::error::BlockingError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use relief_map_alert::AlertError;
use relief_map_database::DbError;
use relief_map_report::{ReportError, TransitionError};
use relief_map_server_models::ApiErrorBody;
use relief_map_user::UserError;
use relief_map_user_models::UniqueField;
use thiserror::Error;

/// Error returned by every handler.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed request.
    #[error("{message}")]
    Validation {
        field: Option<String>,
        message: String,
    },

    /// Missing, expired, or unknown session token.
    #[error("Authentication required")]
    Unauthenticated,

    /// Login failed.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Caller's role does not permit the action.
    #[error("{message}")]
    Forbidden { message: String },

    /// Unknown resource.
    #[error("{message}")]
    NotFound { message: String },

    /// Report state does not allow the command.
    #[error("{message}")]
    InvalidTransition { message: String },

    /// Registration collides with an existing account.
    #[error("{} already registered", .field.label())]
    Duplicate { field: UniqueField },

    /// Worker is too far from the site.
    #[error("{message}")]
    Proximity {
        distance_meters: f64,
        max_distance_meters: f64,
        message: String,
    },

    /// Anything the caller cannot fix. Details are logged, not returned.
    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    const fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::Forbidden { .. } => "FORBIDDEN",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::Duplicate { .. } => "DUPLICATE_REGISTRATION",
            Self::Proximity { .. } => "PROXIMITY",
            Self::Internal => "INTERNAL_ERROR",
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthenticated | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::InvalidTransition { .. } | Self::Duplicate { .. } | Self::Proximity { .. } => {
                StatusCode::CONFLICT
            }
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let (field, distance_meters, max_distance_meters) = match self {
            Self::Validation { field, .. } => (field.clone(), None, None),
            Self::Duplicate { field } => (Some(field.to_string()), None, None),
            Self::Proximity {
                distance_meters,
                max_distance_meters,
                ..
            } => (None, Some(*distance_meters), Some(*max_distance_meters)),
            _ => (None, None, None),
        };

        HttpResponse::build(self.status_code()).json(ApiErrorBody {
            error: self.kind().to_string(),
            message: self.to_string(),
            field,
            distance_meters,
            max_distance_meters,
        })
    }
}

fn internal(e: &dyn std::error::Error) -> ApiError {
    log::error!("Storage failure: {e}");
    ApiError::Internal
}

impl From<BlockingError> for ApiError {
    fn from(e: BlockingError) -> Self {
        log::error!("Blocking task failed: {e}");
        Self::Internal
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Duplicate { field } => Self::Duplicate { field },
            DbError::NotFound { .. } => Self::NotFound {
                message: e.to_string(),
            },
            other => internal(&other),
        }
    }
}

impl From<TransitionError> for ApiError {
    fn from(e: TransitionError) -> Self {
        let message = e.to_string();
        match e {
            TransitionError::InvalidTransition { .. } => Self::InvalidTransition { message },
            TransitionError::Proximity {
                distance_meters,
                max_distance_meters,
            } => Self::Proximity {
                distance_meters,
                max_distance_meters,
                message,
            },
            TransitionError::Validation { field, .. } => Self::Validation {
                field: Some(field.to_string()),
                message,
            },
            TransitionError::Forbidden { .. } => Self::Forbidden { message },
        }
    }
}

impl From<ReportError> for ApiError {
    fn from(e: ReportError) -> Self {
        let message = e.to_string();
        match e {
            ReportError::Validation { field, .. } => Self::Validation {
                field: Some(field.to_string()),
                message,
            },
            ReportError::Forbidden { .. } => Self::Forbidden { message },
            ReportError::NotFound { .. } => Self::NotFound { message },
            ReportError::Transition(e) => e.into(),
            ReportError::Database(e) => e.into(),
        }
    }
}

impl From<UserError> for ApiError {
    fn from(e: UserError) -> Self {
        let message = e.to_string();
        match e {
            UserError::Validation { field, .. } => Self::Validation {
                field: Some(field.to_string()),
                message,
            },
            UserError::Duplicate { field } => Self::Duplicate { field },
            UserError::InvalidCredentials => Self::InvalidCredentials,
            UserError::Forbidden { .. } => Self::Forbidden { message },
            UserError::Hash { .. } => internal(&e),
            UserError::Database(e) => e.into(),
        }
    }
}

impl From<AlertError> for ApiError {
    fn from(e: AlertError) -> Self {
        let message = e.to_string();
        match e {
            AlertError::Validation { field, .. } => Self::Validation {
                field: Some(field.to_string()),
                message,
            },
            AlertError::Forbidden { .. } => Self::Forbidden { message },
            AlertError::NotFound { .. } => Self::NotFound { message },
            AlertError::Database(e) => e.into(),
        }
    }
}

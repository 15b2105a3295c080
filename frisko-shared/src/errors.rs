use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::types::ApiErrorResponse;

/// Application error codes following the pattern E{domain}{sequence}
///
/// Ranges:
/// - E0xxx: Shared/infrastructure errors
/// - E1xxx: Auth errors
/// - E2xxx: Catalog errors (profiles, products, favorites)
/// - E3xxx: Reservation errors
/// - E4xxx: Messaging errors
/// - E5xxx: Push/notification errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Shared (E0xxx)
    InternalError,
    ValidationError,
    NotFound,
    Unauthorized,
    Forbidden,
    ServiceUnavailable,
    BadRequest,

    // Auth (E1xxx)
    TokenExpired,
    TokenInvalid,

    // Catalog (E2xxx)
    ProfileNotFound,
    ProductNotFound,
    NotProductOwner,
    ProductOutOfStock,
    InvalidCategory,
    FavoriteNotFound,
    CannotFavoriteSelf,
    NotASeller,
    InvalidCoordinates,

    // Reservation (E3xxx)
    ReservationNotFound,
    InvalidTransition,
    NotReservationParty,
    InvalidQuantity,
    ConcurrentUpdate,
    CannotReserveOwnProduct,

    // Messaging (E4xxx)
    MessageNotFound,
    EmptyMessage,
    CannotMessageSelf,

    // Push (E5xxx)
    DeviceTokenNotFound,
    NoRecipients,
    PushProviderError,
}

impl ErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            // Shared
            Self::InternalError => "E0001",
            Self::ValidationError => "E0002",
            Self::NotFound => "E0003",
            Self::Unauthorized => "E0004",
            Self::Forbidden => "E0005",
            Self::ServiceUnavailable => "E0006",
            Self::BadRequest => "E0007",

            // Auth
            Self::TokenExpired => "E1001",
            Self::TokenInvalid => "E1002",

            // Catalog
            Self::ProfileNotFound => "E2001",
            Self::ProductNotFound => "E2002",
            Self::NotProductOwner => "E2003",
            Self::ProductOutOfStock => "E2004",
            Self::InvalidCategory => "E2005",
            Self::FavoriteNotFound => "E2006",
            Self::CannotFavoriteSelf => "E2007",
            Self::NotASeller => "E2008",
            Self::InvalidCoordinates => "E2009",

            // Reservation
            Self::ReservationNotFound => "E3001",
            Self::InvalidTransition => "E3002",
            Self::NotReservationParty => "E3003",
            Self::InvalidQuantity => "E3004",
            Self::ConcurrentUpdate => "E3005",
            Self::CannotReserveOwnProduct => "E3006",

            // Messaging
            Self::MessageNotFound => "E4001",
            Self::EmptyMessage => "E4002",
            Self::CannotMessageSelf => "E4003",

            // Push
            Self::DeviceTokenNotFound => "E5001",
            Self::NoRecipients => "E5002",
            Self::PushProviderError => "E5003",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InternalError | Self::ServiceUnavailable | Self::PushProviderError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::ValidationError | Self::BadRequest | Self::InvalidCategory
            | Self::InvalidQuantity | Self::EmptyMessage | Self::InvalidCoordinates
            | Self::NoRecipients => StatusCode::BAD_REQUEST,
            Self::NotFound | Self::ProfileNotFound | Self::ProductNotFound
            | Self::FavoriteNotFound | Self::ReservationNotFound | Self::MessageNotFound
            | Self::DeviceTokenNotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized | Self::TokenExpired | Self::TokenInvalid => {
                StatusCode::UNAUTHORIZED
            }
            Self::Forbidden | Self::NotProductOwner | Self::NotReservationParty
            | Self::CannotFavoriteSelf | Self::CannotMessageSelf | Self::NotASeller
            | Self::CannotReserveOwnProduct => StatusCode::FORBIDDEN,
            Self::ConcurrentUpdate | Self::InvalidTransition
            | Self::ProductOutOfStock => StatusCode::CONFLICT,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Known {
        code: ErrorCode,
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(code: ErrorCode, message: impl Into<String>, details: serde_json::Value) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            AppError::Known { code, message, details } => {
                let status = code.status_code();
                let mut resp = ApiErrorResponse::new(code.code(), message);
                if let Some(d) = details {
                    resp = resp.with_details(d.clone());
                }
                (status, resp)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorResponse::new("E0001", "internal server error"),
                )
            }
            AppError::Database(err) => {
                tracing::error!(error = %err, "database error");
                match err {
                    diesel::result::Error::NotFound => (
                        StatusCode::NOT_FOUND,
                        ApiErrorResponse::new("E0003", "resource not found"),
                    ),
                    _ => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiErrorResponse::new("E0001", "database error"),
                    ),
                }
            }
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ApiErrorResponse::new("E0002", msg),
            ),
        };

        (status, Json(error_response)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

use actix_web::error::BlockingError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use log::error;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures raised below the route layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Category not found")]
    CategoryNotFound,
    #[error("Article not found")]
    ArticleNotFound,
    #[error("Article {0} already exists")]
    DuplicateSlug(String),
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("blocking task was canceled")]
    Canceled,
}

impl From<BlockingError<ServiceError>> for ServiceError {
    fn from(err: BlockingError<ServiceError>) -> Self {
        match err {
            BlockingError::Error(err) => err,
            BlockingError::Canceled => ServiceError::Canceled,
        }
    }
}

/// Errors as the client sees them. Every variant renders `{"message": ...}`.
#[derive(Debug, Error, PartialEq)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error("{0}")]
    Internal(String),
    /// A 500 whose cause stays on the response for development builds.
    #[error("{message}")]
    Unexpected { message: String, cause: String },
}

/// Attached to the extensions of a 500 response; only rendered when the
/// error detail middleware is active.
#[derive(Debug, Clone)]
pub struct ErrorCause {
    pub message: String,
    pub detail: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_owned(),
        }
    }
}

impl ApiError {
    /// Maps domain errors to their status and collapses everything else to a
    /// 500 carrying `fallback`. The underlying cause is logged and kept off the
    /// body unless the error detail middleware puts it back.
    pub fn from_service(err: ServiceError, fallback: &str) -> Self {
        match err {
            ServiceError::CategoryNotFound => ApiError::NotFound("Category not found".to_owned()),
            ServiceError::ArticleNotFound => ApiError::NotFound("Article not found".to_owned()),
            ServiceError::DuplicateSlug(_) => {
                ApiError::Conflict("Article with this slug already exists".to_owned())
            }
            other => {
                error!("{}: {}", fallback, other);
                ApiError::Unexpected {
                    message: fallback.to_owned(),
                    cause: other.to_string(),
                }
            }
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) | ApiError::Unexpected { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut resp =
            HttpResponse::build(self.status_code()).json(MessageResponse::new(&self.to_string()));
        if let ApiError::Unexpected { message, cause } = self {
            resp.extensions_mut().insert(ErrorCause {
                message: message.clone(),
                detail: cause.clone(),
            });
        }
        resp
    }
}

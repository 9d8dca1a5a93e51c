use axum::{response::IntoResponse, Json};
use http::StatusCode;
use serde_json::json;
use tracing::error;

pub type ApiResult<T, E = ApiError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("You do not have permission to perform this action.")]
    PermissionDenied,

    #[error("Not found: {0}")]
    ResourceNotFound(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error(transparent)]
    Database(bookstore_dal::Error),
}

impl From<bookstore_dal::Error> for ApiError {
    fn from(error: bookstore_dal::Error) -> Self {
        match error {
            bookstore_dal::Error::RecordNotFound(what) => ApiError::ResourceNotFound(what),
            bookstore_dal::Error::InvalidCredentials => ApiError::InvalidCredentials,
            bookstore_dal::Error::DatabaseError(bookstore_dal::SqlxError::RowNotFound) => {
                ApiError::ResourceNotFound("Record".to_string())
            }
            other => ApiError::Database(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            ApiError::InvalidQuery(_) | ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PermissionDenied => StatusCode::FORBIDDEN,
            ApiError::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::InternalError(_) | ApiError::Database(_) => {
                error!("Internal error: {}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({"detail": self.to_string()}))).into_response()
    }
}

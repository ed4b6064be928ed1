use crate::utils::response::ApiResponse;
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::fmt;

/// Domain failure taxonomy. Status-code mapping and envelope rendering
/// happen in one place, via the `ResponseError` impl at the API boundary.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    DuplicateEmail,
    InvalidCredentials,
    NotFound(String),
    InvalidId,
    Database(String),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(msg) => write!(f, "{}", msg),
            AppError::DuplicateEmail => write!(f, "User already exists, you can login"),
            AppError::InvalidCredentials => write!(f, "Auth failed: email or password is wrong"),
            AppError::NotFound(msg) => write!(f, "{}", msg),
            AppError::InvalidId => write!(f, "Invalid user ID"),
            AppError::Database(msg) => write!(f, "Database error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    /// Message exposed to clients. Store and internal failures collapse to a
    /// generic message; the specifics only go to the log.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Database(_) | AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidId => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DuplicateEmail => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code() == StatusCode::INTERNAL_SERVER_ERROR {
            log::error!("❌ {}", self);
        }
        HttpResponse::build(self.status_code())
            .json(ApiResponse::<()>::failure(self.public_message()))
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

/// E11000: the unique index on `email` rejected a racing insert.
pub fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        *err.kind,
        mongodb::error::ErrorKind::Write(mongodb::error::WriteFailure::WriteError(ref write_err))
            if write_err.code == 11000
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_mapping() {
        assert_eq!(
            AppError::Validation("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::InvalidId.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::InvalidCredentials.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::NotFound("missing".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(AppError::DuplicateEmail.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::Database("down".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_details_not_exposed() {
        let err = AppError::Database("connection refused at 10.0.0.5".into());
        assert_eq!(err.public_message(), "Internal server error");
    }

    #[test]
    fn test_invalid_credentials_single_message() {
        // Unknown email and wrong password must be indistinguishable.
        assert_eq!(
            AppError::InvalidCredentials.to_string(),
            "Auth failed: email or password is wrong"
        );
    }

    #[test]
    fn test_error_response_uses_envelope() {
        let body = AppError::DuplicateEmail.error_response();
        assert_eq!(body.status(), StatusCode::CONFLICT);
    }
}

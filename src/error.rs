use actix_web::body::BoxBody;
use actix_web::error::BlockingError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use chrono::NaiveDateTime;
use diesel::result::DatabaseErrorKind;
use serde::{Deserialize, Serialize};

use crate::catalog::LookupError;

pub type Result<T> = std::result::Result<T, DataError>;

#[derive(thiserror::Error, Debug)]
pub enum DataError {
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i32 },
    #[error("Movie lookup failed: {0}")]
    Lookup(#[from] LookupError),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Movie {movie_id} does not belong to user {user_id}")]
    NotOwner { user_id: i32, movie_id: i32 },
    #[error("Storage failure: {0}")]
    Storage(diesel::result::Error),
    #[error("Couldn't get db connection from pool: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("Blocking task failed")]
    Blocking(#[from] BlockingError),
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl DataError {
    pub fn user_not_found(id: i32) -> Self {
        DataError::NotFound { entity: "User", id }
    }

    pub fn movie_not_found(id: i32) -> Self {
        DataError::NotFound { entity: "Movie", id }
    }

    pub fn review_not_found(id: i32) -> Self {
        DataError::NotFound { entity: "Review", id }
    }

    fn get_error_code(&self) -> String {
        match self {
            DataError::Validation(_) => "VAL-00400".to_string(),
            DataError::NotFound { .. } => "NF-00404".to_string(),
            DataError::Lookup(LookupError::NotFound(_)) => "LNF-00404".to_string(),
            DataError::Lookup(_) => "LU-00502".to_string(),
            DataError::Conflict(_) => "CF-00409".to_string(),
            DataError::NotOwner { .. } => "NO-00403".to_string(),
            DataError::Storage(_) => "DE-00500".to_string(),
            DataError::Pool(_) => "PL-00500".to_string(),
            DataError::Blocking(_) => "BL-00500".to_string(),
            DataError::Internal(_) => "IE-00500".to_string(),
        }
    }
}

impl From<diesel::result::Error> for DataError {
    fn from(value: diesel::result::Error) -> Self {
        match value {
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                DataError::Conflict(info.message().to_string())
            }
            other => DataError::Storage(other),
        }
    }
}

impl From<validator::ValidationErrors> for DataError {
    fn from(value: validator::ValidationErrors) -> Self {
        DataError::Validation(value.to_string())
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub message: String,
    pub status: u16,
    pub timestamp: NaiveDateTime,
    pub internal_code: String,
}

impl From<&DataError> for ErrorResponse {
    fn from(value: &DataError) -> Self {
        Self {
            message: value.to_string(),
            status: value.status_code().as_u16(),
            timestamp: chrono::Utc::now().naive_utc(),
            internal_code: value.get_error_code(),
        }
    }
}

impl ResponseError for DataError {
    fn status_code(&self) -> StatusCode {
        match &self {
            DataError::Validation(_) => StatusCode::BAD_REQUEST,
            DataError::NotFound { .. } => StatusCode::NOT_FOUND,
            DataError::Lookup(LookupError::NotFound(_)) => StatusCode::NOT_FOUND,
            DataError::Lookup(_) => StatusCode::BAD_GATEWAY,
            DataError::Conflict(_) => StatusCode::CONFLICT,
            DataError::NotOwner { .. } => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse<BoxBody> {
        if self.status_code().is_server_error() {
            log::error!("{}", self);
        }
        HttpResponse::build(self.status_code()).json(ErrorResponse::from(self))
    }
}

use std::fmt;
use std::fmt::Formatter;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use crate::file_loader::UploadError;
use crate::manager_forecast::errors::ForecastError;
use crate::manager_meteo::errors::MeteoError;
use crate::manager_pse::errors::PseError;
use crate::store::StoreError;

/// Error that aborts process startup.
#[derive(Debug)]
pub struct UnrecoverableError(pub String);
impl fmt::Display for UnrecoverableError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "UnrecoverableError: {}", self.0)
    }
}
impl From<&str> for UnrecoverableError {
    fn from(e: &str) -> Self { UnrecoverableError(e.to_string()) }
}
impl From<std::io::Error> for UnrecoverableError {
    fn from(e: std::io::Error) -> Self { UnrecoverableError(e.to_string()) }
}

/// Request-level error, rendered as a JSON body with a `detail` message.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Upstream(String),
    Internal(String),
}

#[derive(Serialize)]
struct Detail {
    detail: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(e) => write!(f, "bad request: {}", e),
            ApiError::Upstream(e)   => write!(f, "upstream error: {}", e),
            ApiError::Internal(e)   => write!(f, "internal error: {}", e),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(_)   => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_)   => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let detail = match self {
            ApiError::BadRequest(e) | ApiError::Upstream(e) | ApiError::Internal(e) => e.clone(),
        };
        HttpResponse::build(self.status_code()).json(Detail { detail })
    }
}

impl From<MeteoError> for ApiError {
    fn from(e: MeteoError) -> Self { ApiError::Upstream(e.to_string()) }
}
impl From<PseError> for ApiError {
    fn from(e: PseError) -> Self { ApiError::Upstream(e.to_string()) }
}
impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self { ApiError::Internal(e.to_string()) }
}
impl From<ForecastError> for ApiError {
    fn from(e: ForecastError) -> Self { ApiError::BadRequest(e.to_string()) }
}
impl From<UploadError> for ApiError {
    fn from(e: UploadError) -> Self { ApiError::BadRequest(e.to_string()) }
}
impl From<std::io::Error> for ApiError {
    fn from(e: std::io::Error) -> Self { ApiError::Internal(e.to_string()) }
}
impl From<actix_web::error::BlockingError> for ApiError {
    fn from(e: actix_web::error::BlockingError) -> Self { ApiError::Internal(e.to_string()) }
}

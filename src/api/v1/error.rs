use crate::api::v1::handler::ApiResponse;
use crate::application_port::*;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use tracing::warn;
use warp::filters::body::BodyDeserializeError;
use warp::http::StatusCode;
use warp::{Rejection, reject};

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let code = if let Some(code) = err.find::<ApiErrorCode>() {
        *code
    } else if err.is_not_found() {
        ApiErrorCode::NotFound
    } else if err.find::<BodyDeserializeError>().is_some()
        || err.find::<reject::LengthRequired>().is_some()
        || err.find::<reject::PayloadTooLarge>().is_some()
        || err.find::<reject::UnsupportedMediaType>().is_some()
    {
        ApiErrorCode::BadRequest
    } else if err.find::<reject::MethodNotAllowed>().is_some() {
        ApiErrorCode::MethodNotAllowed
    } else {
        ApiErrorCode::internal(format!("unhandled rejection: {:?}", err))
    };

    let json = warp::reply::json(&ApiResponse::<()>::err(code, code.to_string()));
    Ok(warp::reply::with_status(json, code.status()))
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
pub enum ApiErrorCode {
    #[error("Authorization header must be 'Bearer <token>'")]
    MalformedHeader,
    #[error("Authentication required")]
    Unauthenticated,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("User not found")]
    UserNotFound,
    #[error("Email already registered")]
    EmailTaken,
    #[error("Malformed request")]
    BadRequest,
    #[error("Not found")]
    NotFound,
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Session store unavailable")]
    StoreUnavailable,
    #[error("Internal error")]
    InternalError,
}

impl ApiErrorCode {
    pub fn internal<E: std::fmt::Display>(error: E) -> ApiErrorCode {
        warn!("Internal error: {}", error);
        ApiErrorCode::InternalError
    }

    /// Only infrastructure failures are 5xx; every auth failure is a 401.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::MalformedHeader
            | ApiErrorCode::Unauthenticated
            | ApiErrorCode::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiErrorCode::UserNotFound | ApiErrorCode::NotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::EmailTaken => StatusCode::CONFLICT,
            ApiErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ApiErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiErrorCode::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl reject::Reject for ApiErrorCode {}

impl From<AuthError> for ApiErrorCode {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::Unauthenticated => ApiErrorCode::Unauthenticated,
            AuthError::InvalidCredentials => ApiErrorCode::InvalidCredentials,
            AuthError::UserNotFound => ApiErrorCode::UserNotFound,
            AuthError::EmailTaken => ApiErrorCode::EmailTaken,
            AuthError::InvalidInput(_) => ApiErrorCode::BadRequest,
            AuthError::StoreUnavailable(e) | AuthError::Issuance(e) => {
                warn!("Session store failure: {}", e);
                ApiErrorCode::StoreUnavailable
            }
            AuthError::InternalError(e) => ApiErrorCode::internal(e),
        }
    }
}

//! JSON envelope and rejection handling shared by all routes

use serde::Serialize;
use std::convert::Infallible;
use warp::http::StatusCode;
use warp::reply::{Json, WithStatus};
use warp::{Rejection, Reply};

use crate::error::{AccountsError, AuthError};

/// Reply type returned by every handler
pub type ApiReply = WithStatus<Json>;

/// Response envelope: `{ "success": .., "message": .., "data": .. }`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
}

/// Successful reply carrying data
pub fn success<T: Serialize>(status: StatusCode, message: &str, data: T) -> ApiReply {
    let body = ApiResponse {
        success: true,
        message: message.to_string(),
        data: Some(data),
    };
    warp::reply::with_status(warp::reply::json(&body), status)
}

/// Failed reply with a caller-safe message
pub fn failure(status: StatusCode, message: &str) -> ApiReply {
    let body: ApiResponse<()> = ApiResponse {
        success: false,
        message: message.to_string(),
        data: None,
    };
    warp::reply::with_status(warp::reply::json(&body), status)
}

/// Domain error carried through warp's rejection system
#[derive(Debug)]
pub struct ApiRejection(pub AccountsError);

impl warp::reject::Reject for ApiRejection {}

/// Wrap any domain error into a rejection
pub fn reject(err: impl Into<AccountsError>) -> Rejection {
    warp::reject::custom(ApiRejection(err.into()))
}

/// HTTP status for a domain error
pub fn status_for(err: &AccountsError) -> StatusCode {
    match err {
        AccountsError::Auth(AuthError::Forbidden) => StatusCode::FORBIDDEN,
        AccountsError::Auth(AuthError::MissingSecret) => StatusCode::INTERNAL_SERVER_ERROR,
        AccountsError::Auth(_) | AccountsError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        AccountsError::NotFound(_) => StatusCode::NOT_FOUND,
        AccountsError::Conflict(_) => StatusCode::CONFLICT,
        AccountsError::ValidationError(_) => StatusCode::BAD_REQUEST,
        AccountsError::ConfigError(_) | AccountsError::StorageError(_) | AccountsError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Recover every rejection into the JSON envelope
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, message) = if let Some(ApiRejection(e)) = err.find::<ApiRejection>() {
        let status = status_for(e);
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            log::error!("Request failed: {}", e);
        } else {
            log::debug!("Request rejected ({}): {}", status, e);
        }
        (status, e.public_message())
    } else if err.find::<warp::filters::body::BodyDeserializeError>().is_some() {
        (StatusCode::BAD_REQUEST, "Invalid request body".to_string())
    } else if err.find::<warp::reject::InvalidQuery>().is_some() {
        (StatusCode::BAD_REQUEST, "Invalid query string".to_string())
    } else if err.find::<warp::reject::InvalidHeader>().is_some() {
        (StatusCode::BAD_REQUEST, "Invalid header".to_string())
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large".to_string())
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        (StatusCode::LENGTH_REQUIRED, "Content-Length required".to_string())
    } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        (StatusCode::UNSUPPORTED_MEDIA_TYPE, "Unsupported media type".to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_string())
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found".to_string())
    } else {
        log::error!("Unhandled rejection: {:?}", err);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
    };

    Ok(failure(status, &message))
}

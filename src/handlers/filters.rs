//! Reusable warp filters: shared state, JSON bodies and the auth pipeline

use serde::de::DeserializeOwned;
use std::convert::Infallible;
use warp::{Filter, Rejection};

use crate::auth::gate::{authorize, Decision, Requirement};
use crate::auth::user::User;
use crate::constants::MAX_BODY_BYTES;
use crate::core::AppState;
use crate::error::AuthError;
use crate::handlers::response::reject;
use crate::security_logger::{log_event, SecurityEvent};

// Helper function to include application state in request
pub fn with_state(state: AppState) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

/// Size-limited JSON body
pub fn json_body<T>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone
where
    T: DeserializeOwned + Send,
{
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

/// Resolve the `Authorization` header to an active user or reject with 401
pub fn authenticated(state: AppState) -> impl Filter<Extract = (User,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization")
        .and(with_state(state))
        .and_then(|header: Option<String>, state: AppState| async move {
            state
                .authenticator
                .authenticate(header.as_deref())
                .await
                .map_err(reject)
        })
}

/// Authenticated user that also meets `requirement`, else 401/403
pub fn authorized(
    state: AppState,
    requirement: Requirement,
) -> impl Filter<Extract = (User,), Error = Rejection> + Clone {
    authenticated(state).and_then(move |user: User| {
        let requirement = requirement.clone();
        async move {
            match authorize(Some(&user), &requirement) {
                Decision::Allow => Ok(user),
                Decision::Deny(denial) => {
                    log_event(&SecurityEvent::PermissionDenied {
                        user_id: user.id,
                        requirement: requirement.to_string(),
                    });
                    Err(reject(AuthError::from(denial)))
                }
            }
        }
    })
}

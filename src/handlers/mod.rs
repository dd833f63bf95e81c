//! Request handlers for the different API endpoints

pub mod auth;
pub mod filters;
pub mod response;
pub mod roles;
pub mod users;

use std::convert::Infallible;
use warp::{Filter, Reply};

use crate::constants::API_PATH;
use crate::core::AppState;
use crate::security::with_api_security_headers;

// Re-export the rejection handler
pub use response::handle_rejection;

/// Every route of the service, with rejections recovered into JSON
pub fn routes(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .map(|| warp::reply::json(&serde_json::json!({ "status": "ok" })));

    let api = warp::path(API_PATH).and(
        auth::routes(state.clone())
            .or(users::routes(state.clone()))
            .or(roles::routes(state)),
    );

    health
        .or(api)
        .recover(handle_rejection)
        .map(with_api_security_headers)
        .with(warp::log("rusty_accounts::http"))
}

//! Registration and login endpoints

use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use crate::core::dto::{LoginRequest, RegisterRequest};
use crate::core::AppState;
use crate::handlers::filters::{json_body, with_state};
use crate::handlers::response::{reject, success, ApiReply};

/// POST auth/register and POST auth/login, mounted under the API prefix
pub fn routes(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let register = warp::path!("auth" / "register")
        .and(warp::post())
        .and(json_body::<RegisterRequest>())
        .and(with_state(state.clone()))
        .and_then(register);

    let login = warp::path!("auth" / "login")
        .and(warp::post())
        .and(json_body::<LoginRequest>())
        .and(with_state(state))
        .and_then(login);

    register.or(login)
}

pub async fn register(request: RegisterRequest, state: AppState) -> Result<ApiReply, Rejection> {
    let response = state.accounts.register(request).await.map_err(reject)?;
    Ok(success(StatusCode::CREATED, "User registered successfully", response))
}

pub async fn login(request: LoginRequest, state: AppState) -> Result<ApiReply, Rejection> {
    let response = state.accounts.login(request).await.map_err(reject)?;
    Ok(success(StatusCode::OK, "Login successful", response))
}

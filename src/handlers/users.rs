//! Profile and user administration endpoints

use uuid::Uuid;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use crate::auth::gate::Requirement;
use crate::auth::user::User;
use crate::core::dto::{AdminUpdateUserRequest, CreateUserRequest, PageQuery, UpdateProfileRequest};
use crate::core::AppState;
use crate::handlers::filters::{authenticated, authorized, json_body, with_state};
use crate::handlers::response::{reject, success, ApiReply};

pub fn routes(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let me = warp::path!("users" / "me");
    let collection = warp::path!("users");
    let member = warp::path!("users" / Uuid);

    let get_me = me
        .and(warp::get())
        .and(authenticated(state.clone()))
        .and(with_state(state.clone()))
        .and_then(get_profile);

    let put_me = me
        .and(warp::put())
        .and(authenticated(state.clone()))
        .and(json_body::<UpdateProfileRequest>())
        .and(with_state(state.clone()))
        .and_then(update_profile);

    let list = collection
        .and(warp::get())
        .and(authorized(state.clone(), Requirement::admin()))
        .and(warp::query::<PageQuery>())
        .and(with_state(state.clone()))
        .and_then(list_users);

    let create = collection
        .and(warp::post())
        .and(authorized(state.clone(), Requirement::admin()))
        .and(json_body::<CreateUserRequest>())
        .and(with_state(state.clone()))
        .and_then(create_user);

    let get_one = member
        .and(warp::get())
        .and(authorized(state.clone(), Requirement::admin()))
        .and(with_state(state.clone()))
        .and_then(get_user);

    let update_one = member
        .and(warp::put())
        .and(authorized(state.clone(), Requirement::admin()))
        .and(json_body::<AdminUpdateUserRequest>())
        .and(with_state(state.clone()))
        .and_then(update_user);

    let delete_one = member
        .and(warp::delete())
        .and(authorized(state.clone(), Requirement::admin()))
        .and(with_state(state))
        .and_then(delete_user);

    get_me
        .or(put_me)
        .or(list)
        .or(create)
        .or(get_one)
        .or(update_one)
        .or(delete_one)
}

pub async fn get_profile(user: User, state: AppState) -> Result<ApiReply, Rejection> {
    let profile = state.accounts.profile(&user);
    Ok(success(StatusCode::OK, "Profile retrieved", profile))
}

pub async fn update_profile(
    user: User,
    request: UpdateProfileRequest,
    state: AppState,
) -> Result<ApiReply, Rejection> {
    let profile = state
        .accounts
        .update_profile(&user, request)
        .await
        .map_err(reject)?;
    Ok(success(StatusCode::OK, "Profile updated", profile))
}

pub async fn list_users(_admin: User, query: PageQuery, state: AppState) -> Result<ApiReply, Rejection> {
    let page = state.accounts.list_users(query).await.map_err(reject)?;
    Ok(success(StatusCode::OK, "Users retrieved", page))
}

pub async fn create_user(
    admin: User,
    request: CreateUserRequest,
    state: AppState,
) -> Result<ApiReply, Rejection> {
    let profile = state
        .accounts
        .create_user(&admin, request)
        .await
        .map_err(reject)?;
    log::info!("User {} created account {}", admin.id, profile.id);
    Ok(success(StatusCode::CREATED, "User created", profile))
}

pub async fn get_user(id: Uuid, _admin: User, state: AppState) -> Result<ApiReply, Rejection> {
    let profile = state.accounts.get_user(id).await.map_err(reject)?;
    Ok(success(StatusCode::OK, "User retrieved", profile))
}

pub async fn update_user(
    id: Uuid,
    admin: User,
    request: AdminUpdateUserRequest,
    state: AppState,
) -> Result<ApiReply, Rejection> {
    let profile = state
        .accounts
        .update_user(&admin, id, request)
        .await
        .map_err(reject)?;
    log::info!("User {} updated account {}", admin.id, id);
    Ok(success(StatusCode::OK, "User updated", profile))
}

pub async fn delete_user(id: Uuid, admin: User, state: AppState) -> Result<ApiReply, Rejection> {
    state.accounts.delete_user(id).await.map_err(reject)?;
    log::info!("User {} deactivated account {}", admin.id, id);
    Ok(success(StatusCode::OK, "User deleted", serde_json::json!({ "id": id })))
}

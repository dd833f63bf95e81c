//! Role and permission administration endpoints

use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use crate::auth::gate::Requirement;
use crate::auth::user::User;
use crate::constants::PERM_ROLES_MANAGE;
use crate::core::dto::{CreatePermissionRequest, CreateRoleRequest};
use crate::core::AppState;
use crate::handlers::filters::{authorized, json_body, with_state};
use crate::handlers::response::{reject, success, ApiReply};

pub fn routes(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let gate = || authorized(state.clone(), Requirement::permission(PERM_ROLES_MANAGE));
    let roles = warp::path!("roles");
    let grant = warp::path!("roles" / String / "permissions" / String);
    let permissions = warp::path!("permissions");

    let list_roles_route = roles
        .and(warp::get())
        .and(gate())
        .and(with_state(state.clone()))
        .and_then(list_roles);

    let create_role_route = roles
        .and(warp::post())
        .and(gate())
        .and(json_body::<CreateRoleRequest>())
        .and(with_state(state.clone()))
        .and_then(create_role);

    let grant_route = grant
        .and(warp::put())
        .and(gate())
        .and(with_state(state.clone()))
        .and_then(grant_permission);

    let revoke_route = grant
        .and(warp::delete())
        .and(gate())
        .and(with_state(state.clone()))
        .and_then(revoke_permission);

    let list_permissions_route = permissions
        .and(warp::get())
        .and(gate())
        .and(with_state(state.clone()))
        .and_then(list_permissions);

    let create_permission_route = permissions
        .and(warp::post())
        .and(gate())
        .and(json_body::<CreatePermissionRequest>())
        .and(with_state(state.clone()))
        .and_then(create_permission);

    list_roles_route
        .or(create_role_route)
        .or(grant_route)
        .or(revoke_route)
        .or(list_permissions_route)
        .or(create_permission_route)
}

pub async fn list_roles(_user: User, state: AppState) -> Result<ApiReply, Rejection> {
    let roles = state.accounts.list_roles().await.map_err(reject)?;
    Ok(success(StatusCode::OK, "Roles retrieved", roles))
}

pub async fn create_role(
    _user: User,
    request: CreateRoleRequest,
    state: AppState,
) -> Result<ApiReply, Rejection> {
    let role = state.accounts.create_role(request).await.map_err(reject)?;
    Ok(success(StatusCode::CREATED, "Role created", role))
}

pub async fn grant_permission(
    role: String,
    permission: String,
    _user: User,
    state: AppState,
) -> Result<ApiReply, Rejection> {
    let role = state
        .accounts
        .grant_permission(&role, &permission)
        .await
        .map_err(reject)?;
    Ok(success(StatusCode::OK, "Permission granted", role))
}

pub async fn revoke_permission(
    role: String,
    permission: String,
    _user: User,
    state: AppState,
) -> Result<ApiReply, Rejection> {
    let role = state
        .accounts
        .revoke_permission(&role, &permission)
        .await
        .map_err(reject)?;
    Ok(success(StatusCode::OK, "Permission revoked", role))
}

pub async fn list_permissions(_user: User, state: AppState) -> Result<ApiReply, Rejection> {
    let permissions = state.accounts.list_permissions().await.map_err(reject)?;
    Ok(success(StatusCode::OK, "Permissions retrieved", permissions))
}

pub async fn create_permission(
    _user: User,
    request: CreatePermissionRequest,
    state: AppState,
) -> Result<ApiReply, Rejection> {
    let permission = state
        .accounts
        .create_permission(request)
        .await
        .map_err(reject)?;
    Ok(success(StatusCode::CREATED, "Permission created", permission))
}

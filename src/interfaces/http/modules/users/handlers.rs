//! User management API handlers
//!
//! Thin wrappers over [`AccountService`]; all rules live in the
//! application layer.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use tracing::debug;

use super::dto::{ListUsersParams, ManagedUserRequest, UserDto};
use crate::application::identity::AccountService;
use crate::interfaces::http::authorization::USERS_PATH;
use crate::interfaces::http::common::{
    alert_headers, location_header, pagination_headers, ApiError, ApiQuery, ApiResponse, MessageResponse, ValidatedJson,
};
use crate::shared::PageRequest;

/// User handler state
#[derive(Clone)]
pub struct UserHandlerState {
    pub accounts: Arc<AccountService>,
}

#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "Users",
    security(("bearer_auth" = [])),
    request_body = ManagedUserRequest,
    responses(
        (status = 201, description = "User created", body = UserDto),
        (status = 400, description = "ID already set or invalid body"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Requires ROLE_ADMIN"),
        (status = 409, description = "Login or email already in use")
    )
)]
pub async fn create_user(
    State(state): State<UserHandlerState>,
    ValidatedJson(request): ValidatedJson<ManagedUserRequest>,
) -> Result<(StatusCode, HeaderMap, Json<UserDto>), ApiError> {
    debug!(login = %request.login, "REST request to create user");
    let account = state.accounts.create(request.into()).await?;

    let mut headers = alert_headers("userManagement.created", &account.login);
    if let Some(location) = location_header(USERS_PATH, &account.login) {
        headers.insert(header::LOCATION, location);
    }

    Ok((StatusCode::CREATED, headers, Json(UserDto::from(account))))
}

#[utoipa::path(
    put,
    path = "/api/v1/users",
    tag = "Users",
    security(("bearer_auth" = [])),
    request_body = ManagedUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserDto),
        (status = 400, description = "ID missing, unknown ID or invalid body"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Requires ROLE_ADMIN"),
        (status = 409, description = "Login or email used by another account")
    )
)]
pub async fn update_user(
    State(state): State<UserHandlerState>,
    ValidatedJson(request): ValidatedJson<ManagedUserRequest>,
) -> Result<(HeaderMap, Json<UserDto>), ApiError> {
    debug!(login = %request.login, "REST request to update user");
    let account = state.accounts.update(request.into()).await?;

    let headers = alert_headers("userManagement.updated", &account.login);
    Ok((headers, Json(UserDto::from(account))))
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "Users",
    params(ListUsersParams),
    responses(
        (status = 200, description = "One page of users; see X-Total-Count and Link", body = Vec<UserDto>),
        (status = 400, description = "Unsupported sort property or malformed query")
    )
)]
pub async fn list_users(
    State(state): State<UserHandlerState>,
    ApiQuery(params): ApiQuery<ListUsersParams>,
) -> Result<(HeaderMap, Json<Vec<UserDto>>), ApiError> {
    let request = PageRequest::new(params.page, params.size, params.sort.as_deref())?;
    let page = state.accounts.list_page(&request).await?;

    let headers = pagination_headers(USERS_PATH, &request, &page);
    let items = page.items.into_iter().map(UserDto::from).collect();
    Ok((headers, Json(items)))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{login}",
    tag = "Users",
    params(("login" = String, Path, description = "Account login")),
    responses(
        (status = 200, description = "User details", body = UserDto),
        (status = 400, description = "No account with this login")
    )
)]
pub async fn get_user(
    State(state): State<UserHandlerState>,
    Path(login): Path<String>,
) -> Result<Json<UserDto>, ApiError> {
    let account = state.accounts.get_by_login(&login).await?;
    Ok(Json(UserDto::from(account)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/users/{login}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("login" = String, Path, description = "Account login")),
    responses(
        (status = 200, description = "User deleted (or did not exist)", body = ApiResponse<MessageResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Requires ROLE_ADMIN")
    )
)]
pub async fn delete_user(
    State(state): State<UserHandlerState>,
    Path(login): Path<String>,
) -> Result<(HeaderMap, Json<ApiResponse<MessageResponse>>), ApiError> {
    debug!(login = %login, "REST request to delete user");
    state.accounts.delete_by_login(&login).await?;

    let headers = alert_headers("userManagement.deleted", &login);
    Ok((
        headers,
        Json(ApiResponse::success(MessageResponse::new(format!(
            "User '{}' deleted",
            login
        )))),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/{login}/reset-password",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("login" = String, Path, description = "Account login")),
    responses(
        (status = 200, description = "New password generated and emailed", body = ApiResponse<MessageResponse>),
        (status = 400, description = "No account with this login"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Requires ROLE_ADMIN")
    )
)]
pub async fn reset_password(
    State(state): State<UserHandlerState>,
    Path(login): Path<String>,
) -> Result<(HeaderMap, Json<ApiResponse<MessageResponse>>), ApiError> {
    let account = state.accounts.get_by_login(&login).await?;
    state.accounts.reset_password(&account).await?;

    let headers = alert_headers("userManagement.passwordReset", &login);
    Ok((
        headers,
        Json(ApiResponse::success(MessageResponse::new(
            "A new password was sent to the account email",
        ))),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/authorities",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Role vocabulary", body = Vec<String>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Requires ROLE_ADMIN")
    )
)]
pub async fn list_authorities(
    State(state): State<UserHandlerState>,
) -> Result<Json<Vec<String>>, ApiError> {
    let authorities = state.accounts.list_authorities().await?;
    Ok(Json(
        authorities.iter().map(|a| a.as_str().to_string()).collect(),
    ))
}

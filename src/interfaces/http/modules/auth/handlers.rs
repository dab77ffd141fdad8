//! Authentication and activation handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue},
    Json,
};

use super::dto::{LoginRequest, LoginResponse};
use crate::application::identity::{AccountService, AuthenticationService};
use crate::interfaces::http::common::{ApiError, ValidatedJson};
use crate::interfaces::http::modules::users::UserDto;

/// Auth state
#[derive(Clone)]
pub struct AuthHandlerState {
    pub authentication: Arc<AuthenticationService>,
    pub accounts: Arc<AccountService>,
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Successful login", body = LoginResponse),
        (status = 400, description = "Invalid body"),
        (status = 401, description = "Invalid credentials or account not activated")
    )
)]
pub async fn login(
    State(state): State<AuthHandlerState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<(HeaderMap, Json<LoginResponse>), ApiError> {
    let token = state
        .authentication
        .authenticate(&request.login, &request.password)
        .await?;

    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&format!("{} {}", token.token_type, token.token)) {
        headers.insert(header::AUTHORIZATION, value);
    }

    Ok((headers, Json(LoginResponse::from(token))))
}

#[utoipa::path(
    get,
    path = "/api/v1/user/activation/{key}",
    tag = "Authentication",
    params(("key" = String, Path, description = "Activation key from the activation email")),
    responses(
        (status = 200, description = "Account activated", body = UserDto),
        (status = 400, description = "Unknown activation key")
    )
)]
pub async fn activate_account(
    State(state): State<AuthHandlerState>,
    Path(key): Path<String>,
) -> Result<Json<UserDto>, ApiError> {
    let account = state.accounts.activate(&key).await?;
    Ok(Json(UserDto::from(account)))
}

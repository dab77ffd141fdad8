//! Authentication DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::identity::TokenResponse;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 50, message = "login is required"))]
    pub login: String,
    #[validate(length(min = 1, max = 100, message = "password is required"))]
    pub password: String,
}

/// `{"token": "...", "type": "Bearer"}`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    #[serde(rename = "type")]
    pub token_type: String,
}

impl From<TokenResponse> for LoginResponse {
    fn from(t: TokenResponse) -> Self {
        Self {
            token: t.token,
            token_type: t.token_type.to_string(),
        }
    }
}

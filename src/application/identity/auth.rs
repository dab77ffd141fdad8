//! Credential check and token issuance

use std::sync::Arc;

use tracing::{info, warn};

use crate::application::ports::PasswordEncoder;
use crate::domain::{normalize_identifier, AccountRepositoryInterface, DomainError, DomainResult};
use crate::infrastructure::crypto::{create_token, JwtConfig};
use crate::shared::InfraError;

pub const BEARER: &str = "Bearer";

/// Access token plus its fixed type label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: &'static str,
}

impl TokenResponse {
    pub fn bearer(token: String) -> Self {
        Self {
            token,
            token_type: BEARER,
        }
    }
}

pub struct AuthenticationService {
    accounts: Arc<dyn AccountRepositoryInterface>,
    encoder: Arc<dyn PasswordEncoder>,
    jwt_config: JwtConfig,
}

impl AuthenticationService {
    pub fn new(
        accounts: Arc<dyn AccountRepositoryInterface>,
        encoder: Arc<dyn PasswordEncoder>,
        jwt_config: JwtConfig,
    ) -> Self {
        Self {
            accounts,
            encoder,
            jwt_config,
        }
    }

    pub fn jwt_config(&self) -> &JwtConfig {
        &self.jwt_config
    }

    /// Check login and password and issue a signed token.
    /// Only activated accounts may log in.
    pub async fn authenticate(&self, login: &str, password: &str) -> DomainResult<TokenResponse> {
        let login = normalize_identifier(login);
        let Some(account) = self.accounts.find_by_login(&login).await? else {
            return Err(DomainError::Unauthorized("Invalid credentials".into()));
        };

        if !self.encoder.matches(password, &account.password_hash) {
            warn!(login = %login, "Rejected login: bad password");
            return Err(DomainError::Unauthorized("Invalid credentials".into()));
        }

        if !account.activated {
            return Err(DomainError::Unauthorized(format!(
                "Account '{}' was not activated",
                account.login
            )));
        }

        let token = create_token(&account, &self.jwt_config)
            .map_err(|e| InfraError::Crypto(format!("Failed to create token: {}", e)))?;

        info!(account_id = account.id, login = %account.login, "Login succeeded");
        Ok(TokenResponse::bearer(token))
    }
}

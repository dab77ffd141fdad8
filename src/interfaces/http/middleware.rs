//! Bearer-token identity resolution

use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};

use crate::domain::Authority;
use crate::infrastructure::crypto::{verify_token, JwtConfig, TokenClaims};
use crate::interfaces::http::common::ApiError;
use crate::shared::DomainError;

/// Authentication state containing the JWT config
#[derive(Clone)]
pub struct AuthState {
    pub jwt_config: JwtConfig,
}

/// Caller identity taken from a verified token, stored in request extensions
#[derive(Clone, Debug)]
pub struct AuthenticatedAccount {
    pub account_id: i64,
    pub login: String,
    pub authorities: Vec<Authority>,
}

impl AuthenticatedAccount {
    pub fn from_claims(claims: TokenClaims) -> Self {
        Self {
            account_id: claims.account_id,
            authorities: claims.parsed_authorities(),
            login: claims.sub,
        }
    }

    pub fn has_authority(&self, authority: Authority) -> bool {
        self.authorities.contains(&authority)
    }
}

/// Authentication error types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    ExpiredToken,
    InsufficientPermissions,
}

impl From<AuthError> for DomainError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::MissingToken => {
                DomainError::Unauthorized("Missing authentication token".into())
            }
            AuthError::InvalidToken => {
                DomainError::Unauthorized("Invalid authentication token".into())
            }
            AuthError::ExpiredToken => DomainError::Unauthorized("Token has expired".into()),
            AuthError::InsufficientPermissions => {
                DomainError::Forbidden("Insufficient permissions".into())
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError(self.into()).into_response()
    }
}

fn extract_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolve the caller from the `Authorization` header.
///
/// `Ok(None)` when no header is present; an unusable header is an error.
pub fn resolve_identity(
    headers: &HeaderMap,
    jwt_config: &JwtConfig,
) -> Result<Option<AuthenticatedAccount>, AuthError> {
    let Some(auth_header) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let token = auth_header
        .to_str()
        .ok()
        .and_then(extract_token)
        .ok_or(AuthError::InvalidToken)?;

    let claims = verify_token(token, jwt_config).map_err(|e| {
        if matches!(e.kind(), jsonwebtoken::errors::ErrorKind::ExpiredSignature) {
            AuthError::ExpiredToken
        } else {
            AuthError::InvalidToken
        }
    })?;

    if claims.is_expired() {
        return Err(AuthError::ExpiredToken);
    }

    Ok(Some(AuthenticatedAccount::from_claims(claims)))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use axum::http::HeaderValue;
    use chrono::Utc;

    use super::*;
    use crate::domain::Account;
    use crate::infrastructure::crypto::create_token;

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "middleware-secret".into(),
            expiration_hours: 1,
            issuer: "account-service".into(),
        }
    }

    fn admin() -> Account {
        Account {
            id: 7,
            login: "admin".into(),
            email: "admin@localhost".into(),
            password_hash: "hash".into(),
            first_name: None,
            last_name: None,
            lang_key: "en".into(),
            activated: true,
            activation_key: None,
            authorities: BTreeSet::from([Authority::Admin, Authority::User]),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn no_header_is_anonymous() {
        assert!(resolve_identity(&HeaderMap::new(), &config()).unwrap().is_none());
    }

    #[test]
    fn valid_token_yields_identity() {
        let token = create_token(&admin(), &config()).unwrap();
        let identity = resolve_identity(&headers(&format!("Bearer {}", token)), &config())
            .unwrap()
            .unwrap();

        assert_eq!(identity.account_id, 7);
        assert_eq!(identity.login, "admin");
        assert!(identity.has_authority(Authority::Admin));
    }

    #[test]
    fn malformed_or_foreign_tokens_are_rejected() {
        assert_eq!(
            resolve_identity(&headers("Basic abc"), &config()).unwrap_err(),
            AuthError::InvalidToken
        );

        let other = JwtConfig {
            secret: "another-secret".into(),
            ..config()
        };
        let token = create_token(&admin(), &other).unwrap();
        assert_eq!(
            resolve_identity(&headers(&format!("Bearer {}", token)), &config()).unwrap_err(),
            AuthError::InvalidToken
        );
    }

    #[test]
    fn auth_errors_map_to_unauthorized_and_forbidden() {
        use axum::http::StatusCode;

        for e in [AuthError::MissingToken, AuthError::InvalidToken, AuthError::ExpiredToken] {
            assert!(matches!(DomainError::from(e), DomainError::Unauthorized(_)));
            assert_eq!(e.into_response().status(), StatusCode::UNAUTHORIZED);
        }

        let forbidden = AuthError::InsufficientPermissions;
        assert!(matches!(DomainError::from(forbidden), DomainError::Forbidden(_)));
        assert_eq!(forbidden.into_response().status(), StatusCode::FORBIDDEN);
    }
}

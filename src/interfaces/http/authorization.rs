//! Route access control
//!
//! Every route is looked up by method and matched route template in a
//! static table before its handler runs. Routes are registered with their
//! full paths so the matched template is the one written here.

use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::{Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use super::middleware::{resolve_identity, AuthError, AuthState};
use crate::domain::Authority;

/// Who may call a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    Role(Authority),
}

pub const USERS_PATH: &str = "/api/v1/users";
pub const USER_PATH: &str = "/api/v1/users/{login}";
pub const USER_RESET_PASSWORD_PATH: &str = "/api/v1/users/{login}/reset-password";
pub const AUTHORITIES_PATH: &str = "/api/v1/users/authorities";
pub const LOGIN_PATH: &str = "/api/v1/auth/login";
pub const ACTIVATION_PATH: &str = "/api/v1/user/activation/{key}";
pub const HEALTH_PATH: &str = "/health";

const ADMIN: Access = Access::Role(Authority::Admin);

/// `(method, route template) → access`
pub const ACCESS_POLICY: &[(&str, &str, Access)] = &[
    ("POST", USERS_PATH, ADMIN),
    ("PUT", USERS_PATH, ADMIN),
    ("GET", USERS_PATH, Access::Public),
    ("GET", AUTHORITIES_PATH, ADMIN),
    ("GET", USER_PATH, Access::Public),
    ("DELETE", USER_PATH, ADMIN),
    ("POST", USER_RESET_PASSWORD_PATH, ADMIN),
    ("POST", LOGIN_PATH, Access::Public),
    ("GET", ACTIVATION_PATH, Access::Public),
    ("GET", HEALTH_PATH, Access::Public),
];

/// Access rule for a route. Unlisted API routes require authentication;
/// anything else is public.
pub fn required_access(method: &Method, route: &str) -> Access {
    // HEAD is served by the GET handler
    let method = if *method == Method::HEAD {
        "GET"
    } else {
        method.as_str()
    };

    ACCESS_POLICY
        .iter()
        .find(|(m, r, _)| *m == method && *r == route)
        .map(|(_, _, access)| *access)
        .unwrap_or_else(|| {
            if route.starts_with("/api/") {
                Access::Authenticated
            } else {
                Access::Public
            }
        })
}

/// Evaluate the access table for the matched route; on success the caller's
/// identity (if any) is stored in request extensions.
pub async fn access_control_middleware(
    State(auth_state): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let access = required_access(request.method(), &route);

    let identity = match resolve_identity(request.headers(), &auth_state.jwt_config) {
        Ok(identity) => identity,
        // A bad token on a public route is ignored
        Err(_) if access == Access::Public => None,
        Err(e) => return e.into_response(),
    };

    match (access, &identity) {
        (Access::Public, _) => {}
        (_, None) => return AuthError::MissingToken.into_response(),
        (Access::Authenticated, Some(_)) => {}
        (Access::Role(authority), Some(account)) => {
            if !account.has_authority(authority) {
                debug!(login = %account.login, route = %route, "Missing {}", authority);
                return AuthError::InsufficientPermissions.into_response();
            }
        }
    }

    if let Some(account) = identity {
        request.extensions_mut().insert(account);
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_lookup_uses_method_and_template() {
        assert_eq!(required_access(&Method::GET, USERS_PATH), Access::Public);
        assert_eq!(required_access(&Method::POST, USERS_PATH), ADMIN);
        assert_eq!(required_access(&Method::HEAD, USER_PATH), Access::Public);
        assert_eq!(required_access(&Method::DELETE, USER_PATH), ADMIN);
        assert_eq!(required_access(&Method::GET, AUTHORITIES_PATH), ADMIN);
    }

    #[test]
    fn unlisted_routes_fall_back_by_prefix() {
        assert_eq!(
            required_access(&Method::PATCH, USERS_PATH),
            Access::Authenticated
        );
        assert_eq!(required_access(&Method::GET, "/metrics"), Access::Public);
    }
}

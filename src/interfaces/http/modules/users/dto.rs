//! User management DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::domain::{Account, AccountDraft};

/// Characters allowed in a login besides ASCII letters and digits
const LOGIN_SPECIAL_CHARS: &str = "_.@-!$&*+=?^`{|}~";

fn validate_login(login: &str) -> Result<(), ValidationError> {
    let valid = login
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || LOGIN_SPECIAL_CHARS.contains(c));
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("login_pattern")
            .with_message("login contains unsupported characters".into()))
    }
}

/// Account as exposed over the API. Never carries the password hash or the
/// activation key.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: i64,
    pub login: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub activated: bool,
    pub lang_key: String,
    pub created_date: DateTime<Utc>,
    pub last_modified_date: DateTime<Utc>,
    /// e.g. `["ROLE_ADMIN", "ROLE_USER"]`
    pub authorities: Vec<String>,
}

impl From<Account> for UserDto {
    fn from(a: Account) -> Self {
        Self {
            id: a.id,
            authorities: a.authorities.iter().map(|r| r.as_str().to_string()).collect(),
            login: a.login,
            first_name: a.first_name,
            last_name: a.last_name,
            email: a.email,
            activated: a.activated,
            lang_key: a.lang_key,
            created_date: a.created_at,
            last_modified_date: a.updated_at,
        }
    }
}

/// Create / update request. `id` must be absent on create and present on update.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManagedUserRequest {
    pub id: Option<i64>,
    #[validate(
        length(min = 1, max = 50, message = "login must be 1-50 characters"),
        custom(function = "validate_login")
    )]
    pub login: String,
    #[validate(
        email(message = "invalid email format"),
        length(min = 5, max = 254, message = "email must be 5-254 characters")
    )]
    pub email: String,
    /// Optional; a random password is generated on create when absent
    #[validate(length(min = 4, max = 100, message = "password must be 4-100 characters"))]
    pub password: Option<String>,
    #[validate(length(max = 50, message = "firstName must be at most 50 characters"))]
    pub first_name: Option<String>,
    #[validate(length(max = 50, message = "lastName must be at most 50 characters"))]
    pub last_name: Option<String>,
    #[validate(length(min = 2, max = 10, message = "langKey must be 2-10 characters"))]
    pub lang_key: Option<String>,
    #[serde(default)]
    pub activated: bool,
    #[serde(default)]
    pub authorities: Vec<String>,
}

impl From<ManagedUserRequest> for AccountDraft {
    fn from(r: ManagedUserRequest) -> Self {
        Self {
            id: r.id,
            login: r.login,
            email: r.email,
            password: r.password,
            first_name: r.first_name,
            last_name: r.last_name,
            lang_key: r.lang_key,
            activated: r.activated,
            authorities: r.authorities,
        }
    }
}

/// List users query parameters
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListUsersParams {
    /// Zero-based page index (default 0)
    pub page: Option<u64>,
    /// Page size, 1-100 (default 20)
    pub size: Option<u64>,
    /// `property[,asc|desc]`; one of id, login, email, firstName, lastName, createdAt
    pub sort: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(login: &str, email: &str) -> ManagedUserRequest {
        ManagedUserRequest {
            id: None,
            login: login.into(),
            email: email.into(),
            password: None,
            first_name: None,
            last_name: None,
            lang_key: None,
            activated: false,
            authorities: vec![],
        }
    }

    #[test]
    fn accepts_plain_and_email_style_logins() {
        assert!(request("alice", "a@x.com").validate().is_ok());
        assert!(request("alice.smith@corp", "a@x.com").validate().is_ok());
    }

    #[test]
    fn rejects_bad_login_and_email() {
        assert!(request("", "a@x.com").validate().is_err());
        assert!(request("has space", "a@x.com").validate().is_err());
        assert!(request("alice", "not-an-email").validate().is_err());
    }

    #[test]
    fn camel_case_body_is_accepted() {
        let body: ManagedUserRequest = serde_json::from_str(
            r#"{"login":"alice","email":"a@x.com","firstName":"Alice","langKey":"fr","authorities":["ROLE_USER"]}"#,
        )
        .unwrap();
        assert_eq!(body.first_name.as_deref(), Some("Alice"));
        assert_eq!(body.lang_key.as_deref(), Some("fr"));
        assert!(!body.activated);
    }
}

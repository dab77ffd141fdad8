use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::shared::DomainError;

/// Locale assigned when a caller does not pick one
pub const DEFAULT_LANG_KEY: &str = "en";

/// Role vocabulary. Stored by name in the `authorities` reference table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Authority {
    Admin,
    User,
}

impl Authority {
    pub const ALL: [Authority; 2] = [Authority::Admin, Authority::User];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ROLE_ADMIN",
            Self::User => "ROLE_USER",
        }
    }
}

impl fmt::Display for Authority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Authority {
    type Err = DomainError;

    /// Accepts `ROLE_ADMIN` as well as the short form `admin`, any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        match upper.strip_prefix("ROLE_").unwrap_or(&upper) {
            "ADMIN" => Ok(Self::Admin),
            "USER" => Ok(Self::User),
            _ => Err(DomainError::Validation(format!("Unknown authority '{}'", s))),
        }
    }
}

/// Persisted account
#[derive(Clone, Debug, PartialEq)]
pub struct Account {
    pub id: i64,
    pub login: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub lang_key: String,
    pub activated: bool,
    pub activation_key: Option<String>,
    pub authorities: BTreeSet<Authority>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn has_authority(&self, authority: Authority) -> bool {
        self.authorities.contains(&authority)
    }
}

/// Logins and emails are compared case-insensitively and persisted lower-cased.
pub fn normalize_identifier(value: &str) -> String {
    value.trim().to_lowercase()
}

//! First-start administrator

use std::collections::BTreeSet;

use tracing::{info, warn};

use crate::application::ports::PasswordEncoder;
use crate::config::AdminConfig;
use crate::domain::{
    normalize_identifier, Account, AccountRepositoryInterface, Authority, DomainResult, NewAccount,
    DEFAULT_LANG_KEY,
};

/// Create an activated administrator when the account store is empty.
/// Returns the created account, or `None` when accounts already exist.
pub async fn ensure_default_admin(
    accounts: &dyn AccountRepositoryInterface,
    encoder: &dyn PasswordEncoder,
    admin: &AdminConfig,
) -> DomainResult<Option<Account>> {
    if accounts.count().await? > 0 {
        return Ok(None);
    }

    let account = accounts
        .insert(NewAccount {
            login: normalize_identifier(&admin.login),
            email: normalize_identifier(&admin.email),
            password_hash: encoder.encode(&admin.password)?,
            first_name: Some("Administrator".to_string()),
            last_name: None,
            lang_key: DEFAULT_LANG_KEY.to_string(),
            activated: true,
            activation_key: None,
            authorities: BTreeSet::from([Authority::Admin, Authority::User]),
        })
        .await?;

    info!(login = %account.login, "Created default administrator");
    if admin.password == AdminConfig::default().password {
        warn!("Default administrator uses the built-in password; change it");
    }
    Ok(Some(account))
}

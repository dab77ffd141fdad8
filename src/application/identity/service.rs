//! Account lifecycle: creation, update, lookup, deletion, activation and
//! password reset.
//!
//! All account business rules live here. HTTP handlers are thin wrappers
//! that delegate to [`AccountService`].

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::application::notifications::{DeliveryOutcome, NotificationService};
use crate::application::ports::PasswordEncoder;
use crate::domain::{
    normalize_identifier, Account, AccountDraft, AccountRepositoryInterface, Authority,
    AuthorityRepositoryInterface, DomainError, DomainResult, NewAccount, DEFAULT_LANG_KEY,
};
use crate::shared::random::{generate_activation_key, generate_password};
use crate::shared::{PageRequest, PaginatedResult};

/// Orchestrates every account use-case.
///
/// Collaborators are injected so the service stays decoupled from the
/// concrete persistence, hashing and mail layers.
pub struct AccountService {
    accounts: Arc<dyn AccountRepositoryInterface>,
    authorities: Arc<dyn AuthorityRepositoryInterface>,
    encoder: Arc<dyn PasswordEncoder>,
    notifications: Arc<NotificationService>,
}

impl AccountService {
    pub fn new(
        accounts: Arc<dyn AccountRepositoryInterface>,
        authorities: Arc<dyn AuthorityRepositoryInterface>,
        encoder: Arc<dyn PasswordEncoder>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            accounts,
            authorities,
            encoder,
            notifications,
        }
    }

    // ── Commands ────────────────────────────────────────────────

    /// Create a new account and send it an activation email.
    ///
    /// The uniqueness checks run before the insert without a surrounding
    /// transaction; a concurrent duplicate is caught by the unique indexes
    /// and reported with the same conflict error.
    pub async fn create(&self, draft: AccountDraft) -> DomainResult<Account> {
        if draft.id.is_some() {
            return Err(DomainError::IdentityAlreadyAssigned);
        }

        let login = normalize_identifier(&draft.login);
        let email = normalize_identifier(&draft.email);

        if self.accounts.exists_by_login(&login).await? {
            return Err(DomainError::LoginConflict);
        }
        if self.accounts.exists_by_email(&email).await? {
            return Err(DomainError::EmailConflict);
        }

        let authorities = self.resolve_authorities(&draft.authorities).await?;
        let raw_password = match draft.password {
            Some(password) => password,
            None => generate_password(),
        };

        let account = self
            .accounts
            .insert(NewAccount {
                login,
                email,
                password_hash: self.encoder.encode(&raw_password)?,
                first_name: draft.first_name,
                last_name: draft.last_name,
                lang_key: draft.lang_key.unwrap_or_else(|| DEFAULT_LANG_KEY.to_string()),
                activated: draft.activated,
                activation_key: Some(generate_activation_key()),
                authorities,
            })
            .await?;

        info!(account_id = account.id, login = %account.login, "Account created");
        metrics::counter!("accounts_created_total").increment(1);

        let outcome = self.notifications.send_activation_email(&account).await;
        debug!(login = %account.login, outcome = outcome.as_str(), "Activation email processed");

        Ok(account)
    }

    /// Replace every mutable field of an existing account.
    ///
    /// The password is only changed when the draft carries one. No email is
    /// sent.
    pub async fn update(&self, draft: AccountDraft) -> DomainResult<Account> {
        let id = draft.id.ok_or(DomainError::IdentityMissing)?;

        let login = normalize_identifier(&draft.login);
        let email = normalize_identifier(&draft.email);

        if let Some(owner) = self.accounts.find_by_email_ignore_case(&email).await? {
            if owner.id != id {
                return Err(DomainError::EmailConflict);
            }
        }
        if let Some(owner) = self.accounts.find_by_login(&login).await? {
            if owner.id != id {
                return Err(DomainError::LoginConflict);
            }
        }

        let mut account = self
            .accounts
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found("id", id.to_string()))?;

        account.login = login;
        account.email = email;
        account.first_name = draft.first_name;
        account.last_name = draft.last_name;
        account.lang_key = draft.lang_key.unwrap_or_else(|| DEFAULT_LANG_KEY.to_string());
        account.activated = draft.activated;
        account.authorities = self.resolve_authorities(&draft.authorities).await?;
        if let Some(password) = draft.password.as_deref() {
            account.password_hash = self.encoder.encode(password)?;
        }

        let updated = self
            .accounts
            .update(account)
            .await?
            .ok_or_else(|| not_found("id", id.to_string()))?;

        info!(account_id = updated.id, login = %updated.login, "Account updated");
        Ok(updated)
    }

    /// Delete an account and its authority links. A missing login is a no-op.
    pub async fn delete_by_login(&self, login: &str) -> DomainResult<()> {
        if self.accounts.delete_by_login(login).await? {
            info!(login, "Account deleted");
        } else {
            debug!(login, "Delete requested for unknown login");
        }
        Ok(())
    }

    /// Give the account a fresh random password and mail it the plaintext.
    /// The plaintext is never returned.
    pub async fn reset_password(&self, account: &Account) -> DomainResult<()> {
        let password = generate_password();

        let mut updated = account.clone();
        updated.password_hash = self.encoder.encode(&password)?;
        let updated = self
            .accounts
            .update(updated)
            .await?
            .ok_or_else(|| not_found("id", account.id.to_string()))?;

        info!(account_id = updated.id, login = %updated.login, "Password reset");

        let outcome = self.notifications.send_password_email(&updated, &password).await;
        if let DeliveryOutcome::Failed(reason) = &outcome {
            debug!(login = %updated.login, %reason, "Password email not delivered");
        }
        Ok(())
    }

    /// Activate the account owning `key` and clear the key.
    pub async fn activate(&self, key: &str) -> DomainResult<Account> {
        let mut account = self
            .accounts
            .find_by_activation_key(key)
            .await?
            .ok_or_else(|| not_found("activation_key", key.to_string()))?;

        account.activated = true;
        account.activation_key = None;

        let account = self
            .accounts
            .update(account)
            .await?
            .ok_or_else(|| not_found("activation_key", key.to_string()))?;

        info!(account_id = account.id, login = %account.login, "Account activated");
        Ok(account)
    }

    /// Delete accounts that were never activated and were created before
    /// `cutoff`. Returns how many were removed.
    pub async fn remove_not_activated_before(&self, cutoff: DateTime<Utc>) -> DomainResult<usize> {
        let stale = self.accounts.find_not_activated_created_before(cutoff).await?;

        let mut removed = 0;
        for account in stale {
            if self.accounts.delete_by_login(&account.login).await? {
                debug!(login = %account.login, "Deleted non-activated account");
                removed += 1;
            }
        }

        if removed > 0 {
            info!(removed, "Purged non-activated accounts");
            metrics::counter!("accounts_purged_total").increment(removed as u64);
        }
        Ok(removed)
    }

    // ── Queries ─────────────────────────────────────────────────

    pub async fn list_page(&self, page: &PageRequest) -> DomainResult<PaginatedResult<Account>> {
        self.accounts.find_page(page).await
    }

    pub async fn get_by_login(&self, login: &str) -> DomainResult<Account> {
        self.accounts
            .find_by_login(login)
            .await?
            .ok_or_else(|| not_found("login", login.to_string()))
    }

    pub async fn count(&self) -> DomainResult<u64> {
        self.accounts.count().await
    }

    pub async fn list_authorities(&self) -> DomainResult<Vec<Authority>> {
        self.authorities.find_all().await
    }

    // ── Helpers ─────────────────────────────────────────────────

    /// Resolve authority names against the authority store. An empty list
    /// yields `ROLE_USER`.
    async fn resolve_authorities(&self, names: &[String]) -> DomainResult<BTreeSet<Authority>> {
        if names.is_empty() {
            return Ok(BTreeSet::from([Authority::User]));
        }

        let mut resolved = BTreeSet::new();
        for name in names {
            let authority = self
                .authorities
                .find_by_name(name)
                .await?
                .ok_or_else(|| DomainError::Validation(format!("Unknown authority '{}'", name)))?;
            resolved.insert(authority);
        }
        Ok(resolved)
    }
}

fn not_found(field: &'static str, value: String) -> DomainError {
    DomainError::NotFound {
        entity: "Account",
        field,
        value,
    }
}

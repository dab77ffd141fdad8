use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{Account, Authority, NewAccount};
use crate::shared::{DomainResult, PageRequest, PaginatedResult};

/// Persistence of account records.
///
/// Lookups by login are exact; lookups and existence checks by email ignore
/// case. Unique indexes on login and email back the service-level checks and
/// surface as `LoginConflict` / `EmailConflict`.
#[async_trait]
pub trait AccountRepositoryInterface: Send + Sync {
    async fn find_by_id(&self, id: i64) -> DomainResult<Option<Account>>;
    async fn find_by_login(&self, login: &str) -> DomainResult<Option<Account>>;
    async fn find_by_email_ignore_case(&self, email: &str) -> DomainResult<Option<Account>>;
    async fn find_by_activation_key(&self, key: &str) -> DomainResult<Option<Account>>;

    async fn exists_by_login(&self, login: &str) -> DomainResult<bool>;
    async fn exists_by_email(&self, email: &str) -> DomainResult<bool>;
    async fn count(&self) -> DomainResult<u64>;

    async fn find_page(&self, page: &PageRequest) -> DomainResult<PaginatedResult<Account>>;
    async fn find_not_activated_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> DomainResult<Vec<Account>>;

    /// Insert a new account together with its authorities.
    async fn insert(&self, account: NewAccount) -> DomainResult<Account>;

    /// Replace every mutable field of the account with the given id.
    /// Returns `None` when no such account exists.
    async fn update(&self, account: Account) -> DomainResult<Option<Account>>;

    /// Delete the account and its authority links. Returns whether a row was removed.
    async fn delete_by_login(&self, login: &str) -> DomainResult<bool>;
}

/// Read-only access to the role reference data
#[async_trait]
pub trait AuthorityRepositoryInterface: Send + Sync {
    async fn find_by_name(&self, name: &str) -> DomainResult<Option<Authority>>;
    async fn find_all(&self) -> DomainResult<Vec<Authority>>;
}

//! In-memory account store for development and testing

use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::domain::{
    Account, AccountRepositoryInterface, Authority, AuthorityRepositoryInterface, DomainError,
    DomainResult, NewAccount,
};
use crate::shared::{PageRequest, PaginatedResult, SortDirection, SortField};

/// DashMap-backed account store.
///
/// Mirrors the database's unique indexes: inserting or updating into a taken
/// login or email fails with the matching conflict error.
pub struct InMemoryAccountRepository {
    accounts: DashMap<i64, Account>,
    id_counter: AtomicI64,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
            id_counter: AtomicI64::new(1),
        }
    }

    fn find_where(&self, predicate: impl Fn(&Account) -> bool) -> Option<Account> {
        self.accounts
            .iter()
            .find(|e| predicate(e.value()))
            .map(|e| e.value().clone())
    }

    fn check_unique(&self, id: Option<i64>, login: &str, email: &str) -> DomainResult<()> {
        for entry in self.accounts.iter() {
            let other = entry.value();
            if Some(other.id) == id {
                continue;
            }
            if other.login == login {
                return Err(DomainError::LoginConflict);
            }
            if other.email.eq_ignore_ascii_case(email) {
                return Err(DomainError::EmailConflict);
            }
        }
        Ok(())
    }
}

impl Default for InMemoryAccountRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn compare(a: &Account, b: &Account, field: SortField) -> CmpOrdering {
    match field {
        SortField::Id => a.id.cmp(&b.id),
        SortField::Login => a.login.cmp(&b.login),
        SortField::Email => a.email.cmp(&b.email),
        SortField::FirstName => a.first_name.cmp(&b.first_name),
        SortField::LastName => a.last_name.cmp(&b.last_name),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
    }
}

#[async_trait]
impl AccountRepositoryInterface for InMemoryAccountRepository {
    async fn find_by_id(&self, id: i64) -> DomainResult<Option<Account>> {
        Ok(self.accounts.get(&id).map(|a| a.clone()))
    }

    async fn find_by_login(&self, login: &str) -> DomainResult<Option<Account>> {
        Ok(self.find_where(|a| a.login == login))
    }

    async fn find_by_email_ignore_case(&self, email: &str) -> DomainResult<Option<Account>> {
        Ok(self.find_where(|a| a.email.eq_ignore_ascii_case(email)))
    }

    async fn find_by_activation_key(&self, key: &str) -> DomainResult<Option<Account>> {
        Ok(self.find_where(|a| a.activation_key.as_deref() == Some(key)))
    }

    async fn exists_by_login(&self, login: &str) -> DomainResult<bool> {
        Ok(self.find_where(|a| a.login.eq_ignore_ascii_case(login)).is_some())
    }

    async fn exists_by_email(&self, email: &str) -> DomainResult<bool> {
        Ok(self.find_where(|a| a.email.eq_ignore_ascii_case(email)).is_some())
    }

    async fn count(&self) -> DomainResult<u64> {
        Ok(self.accounts.len() as u64)
    }

    async fn find_page(&self, page: &PageRequest) -> DomainResult<PaginatedResult<Account>> {
        let mut all: Vec<Account> = self.accounts.iter().map(|e| e.value().clone()).collect();
        all.sort_by(|a, b| {
            let ord = compare(a, b, page.sort.field).then(a.id.cmp(&b.id));
            match page.sort.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        });

        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.size as usize)
            .collect();

        Ok(PaginatedResult::new(items, total, page.page, page.size))
    }

    async fn find_not_activated_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> DomainResult<Vec<Account>> {
        Ok(self
            .accounts
            .iter()
            .filter(|e| !e.activated && e.created_at < cutoff)
            .map(|e| e.value().clone())
            .collect())
    }

    async fn insert(&self, account: NewAccount) -> DomainResult<Account> {
        self.check_unique(None, &account.login, &account.email)?;

        let id = self.id_counter.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let stored = Account {
            id,
            login: account.login,
            email: account.email,
            password_hash: account.password_hash,
            first_name: account.first_name,
            last_name: account.last_name,
            lang_key: account.lang_key,
            activated: account.activated,
            activation_key: account.activation_key,
            authorities: account.authorities,
            created_at: now,
            updated_at: now,
        };
        self.accounts.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, mut account: Account) -> DomainResult<Option<Account>> {
        self.check_unique(Some(account.id), &account.login, &account.email)?;

        let Some(mut existing) = self.accounts.get_mut(&account.id) else {
            return Ok(None);
        };
        account.created_at = existing.created_at;
        account.updated_at = Utc::now();
        *existing = account.clone();
        Ok(Some(account))
    }

    async fn delete_by_login(&self, login: &str) -> DomainResult<bool> {
        let id = self.find_where(|a| a.login == login).map(|a| a.id);
        Ok(id.and_then(|id| self.accounts.remove(&id)).is_some())
    }
}

/// Fixed role vocabulary, as seeded by the authorities migration
#[derive(Debug, Default, Clone)]
pub struct InMemoryAuthorityRepository;

impl InMemoryAuthorityRepository {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AuthorityRepositoryInterface for InMemoryAuthorityRepository {
    async fn find_by_name(&self, name: &str) -> DomainResult<Option<Authority>> {
        Ok(Authority::ALL.into_iter().find(|a| a.as_str() == name))
    }

    async fn find_all(&self) -> DomainResult<Vec<Authority>> {
        Ok(Authority::ALL.to_vec())
    }
}

//! SeaORM account and authority repositories

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use tracing::warn;

use crate::domain::{
    Account, AccountRepositoryInterface, Authority, AuthorityRepositoryInterface, DomainError,
    DomainResult, NewAccount,
};
use crate::infrastructure::database::entities::{account, account_authority, authority};
use crate::shared::{PageRequest, PaginatedResult, SortDirection, SortField};

pub struct SeaOrmAccountRepository {
    db: DatabaseConnection,
}

impl SeaOrmAccountRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

/// Unique-index violations become the matching conflict; everything else is
/// a storage failure.
fn db_err(e: DbErr) -> DomainError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            if detail.to_lowercase().contains("email") {
                DomainError::EmailConflict
            } else {
                DomainError::LoginConflict
            }
        }
        _ => DomainError::Storage(format!("Database error: {}", e)),
    }
}

fn model_to_domain(model: account::Model, authorities: BTreeSet<Authority>) -> Account {
    Account {
        id: model.id,
        login: model.login,
        email: model.email,
        password_hash: model.password_hash,
        first_name: model.first_name,
        last_name: model.last_name,
        lang_key: model.lang_key,
        activated: model.activated,
        activation_key: model.activation_key,
        authorities,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

fn sort_column(field: SortField) -> account::Column {
    match field {
        SortField::Id => account::Column::Id,
        SortField::Login => account::Column::Login,
        SortField::Email => account::Column::Email,
        SortField::FirstName => account::Column::FirstName,
        SortField::LastName => account::Column::LastName,
        SortField::CreatedAt => account::Column::CreatedAt,
    }
}

/// Load authority links for a batch of accounts
async fn load_authorities<C: ConnectionTrait>(
    db: &C,
    account_ids: &[i64],
) -> Result<HashMap<i64, BTreeSet<Authority>>, DbErr> {
    let mut by_account: HashMap<i64, BTreeSet<Authority>> = HashMap::new();
    if account_ids.is_empty() {
        return Ok(by_account);
    }

    let links = account_authority::Entity::find()
        .filter(account_authority::Column::AccountId.is_in(account_ids.iter().copied()))
        .all(db)
        .await?;

    for link in links {
        match link.authority_name.parse::<Authority>() {
            Ok(authority) => {
                by_account.entry(link.account_id).or_default().insert(authority);
            }
            Err(_) => warn!(
                account_id = link.account_id,
                authority = %link.authority_name,
                "Ignoring unknown authority link"
            ),
        }
    }
    Ok(by_account)
}

async fn hydrate<C: ConnectionTrait>(
    db: &C,
    models: Vec<account::Model>,
) -> Result<Vec<Account>, DbErr> {
    let ids: Vec<i64> = models.iter().map(|m| m.id).collect();
    let mut authorities = load_authorities(db, &ids).await?;
    Ok(models
        .into_iter()
        .map(|m| {
            let roles = authorities.remove(&m.id).unwrap_or_default();
            model_to_domain(m, roles)
        })
        .collect())
}

async fn hydrate_one<C: ConnectionTrait>(
    db: &C,
    model: Option<account::Model>,
) -> Result<Option<Account>, DbErr> {
    match model {
        Some(model) => Ok(hydrate(db, vec![model]).await?.pop()),
        None => Ok(None),
    }
}

async fn replace_authorities<C: ConnectionTrait>(
    db: &C,
    account_id: i64,
    authorities: &BTreeSet<Authority>,
) -> Result<(), DbErr> {
    account_authority::Entity::delete_many()
        .filter(account_authority::Column::AccountId.eq(account_id))
        .exec(db)
        .await?;

    if authorities.is_empty() {
        return Ok(());
    }

    let links = authorities.iter().map(|a| account_authority::ActiveModel {
        account_id: Set(account_id),
        authority_name: Set(a.as_str().to_string()),
    });
    account_authority::Entity::insert_many(links)
        .exec_without_returning(db)
        .await?;
    Ok(())
}

fn lower_eq(column: account::Column, value: &str) -> sea_orm::sea_query::SimpleExpr {
    Expr::expr(Func::lower(Expr::col((account::Entity, column)))).eq(value.to_lowercase())
}

// ── Repository implementation ───────────────────────────────────

#[async_trait]
impl AccountRepositoryInterface for SeaOrmAccountRepository {
    async fn find_by_id(&self, id: i64) -> DomainResult<Option<Account>> {
        let model = account::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        hydrate_one(&self.db, model).await.map_err(db_err)
    }

    async fn find_by_login(&self, login: &str) -> DomainResult<Option<Account>> {
        let model = account::Entity::find()
            .filter(account::Column::Login.eq(login))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        hydrate_one(&self.db, model).await.map_err(db_err)
    }

    async fn find_by_email_ignore_case(&self, email: &str) -> DomainResult<Option<Account>> {
        let model = account::Entity::find()
            .filter(lower_eq(account::Column::Email, email))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        hydrate_one(&self.db, model).await.map_err(db_err)
    }

    async fn find_by_activation_key(&self, key: &str) -> DomainResult<Option<Account>> {
        let model = account::Entity::find()
            .filter(account::Column::ActivationKey.eq(key))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        hydrate_one(&self.db, model).await.map_err(db_err)
    }

    async fn exists_by_login(&self, login: &str) -> DomainResult<bool> {
        let count = account::Entity::find()
            .filter(lower_eq(account::Column::Login, login))
            .count(&self.db)
            .await
            .map_err(db_err)?;
        Ok(count > 0)
    }

    async fn exists_by_email(&self, email: &str) -> DomainResult<bool> {
        let count = account::Entity::find()
            .filter(lower_eq(account::Column::Email, email))
            .count(&self.db)
            .await
            .map_err(db_err)?;
        Ok(count > 0)
    }

    async fn count(&self) -> DomainResult<u64> {
        account::Entity::find().count(&self.db).await.map_err(db_err)
    }

    async fn find_page(&self, page: &PageRequest) -> DomainResult<PaginatedResult<Account>> {
        let column = sort_column(page.sort.field);
        let query = match page.sort.direction {
            SortDirection::Asc => account::Entity::find()
                .order_by_asc(column)
                .order_by_asc(account::Column::Id),
            SortDirection::Desc => account::Entity::find()
                .order_by_desc(column)
                .order_by_desc(account::Column::Id),
        };

        let total = account::Entity::find()
            .count(&self.db)
            .await
            .map_err(db_err)?;

        let models = query
            .offset(page.offset())
            .limit(page.size)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let items = hydrate(&self.db, models).await.map_err(db_err)?;
        Ok(PaginatedResult::new(items, total, page.page, page.size))
    }

    async fn find_not_activated_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> DomainResult<Vec<Account>> {
        let models = account::Entity::find()
            .filter(account::Column::Activated.eq(false))
            .filter(account::Column::CreatedAt.lt(cutoff))
            .all(&self.db)
            .await
            .map_err(db_err)?;
        hydrate(&self.db, models).await.map_err(db_err)
    }

    async fn insert(&self, new_account: NewAccount) -> DomainResult<Account> {
        let now = Utc::now();
        let txn = self.db.begin().await.map_err(db_err)?;

        let model = account::ActiveModel {
            login: Set(new_account.login),
            email: Set(new_account.email),
            password_hash: Set(new_account.password_hash),
            first_name: Set(new_account.first_name),
            last_name: Set(new_account.last_name),
            lang_key: Set(new_account.lang_key),
            activated: Set(new_account.activated),
            activation_key: Set(new_account.activation_key),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        replace_authorities(&txn, model.id, &new_account.authorities)
            .await
            .map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;

        Ok(model_to_domain(model, new_account.authorities))
    }

    async fn update(&self, updated: Account) -> DomainResult<Option<Account>> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let Some(existing) = account::Entity::find_by_id(updated.id)
            .one(&txn)
            .await
            .map_err(db_err)?
        else {
            return Ok(None);
        };

        let mut active: account::ActiveModel = existing.into();
        active.login = Set(updated.login);
        active.email = Set(updated.email);
        active.password_hash = Set(updated.password_hash);
        active.first_name = Set(updated.first_name);
        active.last_name = Set(updated.last_name);
        active.lang_key = Set(updated.lang_key);
        active.activated = Set(updated.activated);
        active.activation_key = Set(updated.activation_key);
        active.updated_at = Set(Utc::now());

        let model = active.update(&txn).await.map_err(db_err)?;
        replace_authorities(&txn, model.id, &updated.authorities)
            .await
            .map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;

        Ok(Some(model_to_domain(model, updated.authorities)))
    }

    async fn delete_by_login(&self, login: &str) -> DomainResult<bool> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let Some(existing) = account::Entity::find()
            .filter(account::Column::Login.eq(login))
            .one(&txn)
            .await
            .map_err(db_err)?
        else {
            return Ok(false);
        };

        account_authority::Entity::delete_many()
            .filter(account_authority::Column::AccountId.eq(existing.id))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        account::Entity::delete_by_id(existing.id)
            .exec(&txn)
            .await
            .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        Ok(true)
    }
}

// ── Authorities ─────────────────────────────────────────────────

pub struct SeaOrmAuthorityRepository {
    db: DatabaseConnection,
}

impl SeaOrmAuthorityRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuthorityRepositoryInterface for SeaOrmAuthorityRepository {
    async fn find_by_name(&self, name: &str) -> DomainResult<Option<Authority>> {
        let model = authority::Entity::find_by_id(name.to_string())
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.and_then(|m| m.name.parse().ok()))
    }

    async fn find_all(&self) -> DomainResult<Vec<Authority>> {
        let models = authority::Entity::find()
            .order_by_asc(authority::Column::Name)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().filter_map(|m| m.name.parse().ok()).collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::infrastructure::database::{init_database, DatabaseConfig};
    use crate::shared::Sort;

    async fn repos() -> (SeaOrmAccountRepository, SeaOrmAuthorityRepository, DatabaseConnection) {
        let db = init_database(&DatabaseConfig::in_memory()).await.unwrap();
        (
            SeaOrmAccountRepository::new(db.clone()),
            SeaOrmAuthorityRepository::new(db.clone()),
            db,
        )
    }

    fn new_account(login: &str, email: &str) -> NewAccount {
        NewAccount {
            login: login.into(),
            email: email.into(),
            password_hash: "$2b$04$hash".into(),
            first_name: Some("First".into()),
            last_name: None,
            lang_key: "en".into(),
            activated: false,
            activation_key: Some(format!("{:0>20}", login.len())),
            authorities: BTreeSet::from([Authority::User]),
        }
    }

    #[tokio::test]
    async fn insert_assigns_id_and_persists_authorities() {
        let (accounts, _, _) = repos().await;
        let mut candidate = new_account("alice", "alice@x.com");
        candidate.authorities = BTreeSet::from([Authority::Admin, Authority::User]);

        let created = accounts.insert(candidate).await.unwrap();
        assert!(created.id > 0);

        let loaded = accounts.find_by_login("alice").await.unwrap().unwrap();
        assert_eq!(loaded.id, created.id);
        assert_eq!(loaded.authorities, BTreeSet::from([Authority::Admin, Authority::User]));
        assert_eq!(loaded.first_name.as_deref(), Some("First"));
    }

    #[tokio::test]
    async fn email_lookup_ignores_case_login_lookup_does_not() {
        let (accounts, _, _) = repos().await;
        accounts.insert(new_account("alice", "alice@x.com")).await.unwrap();

        assert!(accounts
            .find_by_email_ignore_case("ALICE@X.COM")
            .await
            .unwrap()
            .is_some());
        assert!(accounts.exists_by_email("Alice@x.com").await.unwrap());
        assert!(accounts.exists_by_login("ALICE").await.unwrap());
        assert!(accounts.find_by_login("ALICE").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unique_indexes_map_to_conflicts() {
        let (accounts, _, _) = repos().await;
        accounts.insert(new_account("alice", "alice@x.com")).await.unwrap();

        let err = accounts
            .insert(new_account("alice", "other@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::LoginConflict));

        let err = accounts
            .insert(new_account("bob", "alice@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::EmailConflict));

        assert_eq!(accounts.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn update_replaces_fields_and_authorities() {
        let (accounts, _, _) = repos().await;
        let mut account = accounts.insert(new_account("alice", "alice@x.com")).await.unwrap();

        account.last_name = Some("Liddell".into());
        account.activated = true;
        account.activation_key = None;
        account.authorities = BTreeSet::from([Authority::Admin]);
        accounts.update(account.clone()).await.unwrap().unwrap();

        let loaded = accounts.find_by_id(account.id).await.unwrap().unwrap();
        assert_eq!(loaded.last_name.as_deref(), Some("Liddell"));
        assert!(loaded.activated);
        assert!(loaded.activation_key.is_none());
        assert_eq!(loaded.authorities, BTreeSet::from([Authority::Admin]));
        assert_eq!(loaded.created_at, account.created_at);

        let mut ghost = loaded;
        ghost.id = 4242;
        assert!(accounts.update(ghost).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_removes_account_and_links() {
        let (accounts, _, db) = repos().await;
        accounts.insert(new_account("alice", "alice@x.com")).await.unwrap();

        assert!(accounts.delete_by_login("alice").await.unwrap());
        assert!(!accounts.delete_by_login("alice").await.unwrap());

        let links = account_authority::Entity::find().count(&db).await.unwrap();
        assert_eq!(links, 0);
    }

    #[tokio::test]
    async fn pages_follow_requested_order() {
        let (accounts, _, _) = repos().await;
        for login in ["carol", "alice", "bob"] {
            accounts
                .insert(new_account(login, &format!("{}@x.com", login)))
                .await
                .unwrap();
        }

        let page = PageRequest {
            page: 1,
            size: 2,
            sort: Sort {
                field: SortField::Login,
                direction: SortDirection::Asc,
            },
        };
        let result = accounts.find_page(&page).await.unwrap();
        assert_eq!(result.total, 3);
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].login, "carol");
        assert_eq!(result.items[0].authorities, BTreeSet::from([Authority::User]));
    }

    #[tokio::test]
    async fn stale_unactivated_accounts_are_listed() {
        let (accounts, _, _) = repos().await;
        accounts.insert(new_account("alice", "alice@x.com")).await.unwrap();
        let mut bob = accounts.insert(new_account("bob", "bob@x.com")).await.unwrap();
        bob.activated = true;
        accounts.update(bob).await.unwrap();

        let stale = accounts
            .find_not_activated_created_before(Utc::now() + Duration::seconds(5))
            .await
            .unwrap();
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].login, "alice");

        let none = accounts
            .find_not_activated_created_before(Utc::now() - Duration::days(1))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn authorities_are_seeded() {
        let (_, authorities, _) = repos().await;
        assert_eq!(
            authorities.find_all().await.unwrap(),
            vec![Authority::Admin, Authority::User]
        );
        assert_eq!(
            authorities.find_by_name("ROLE_ADMIN").await.unwrap(),
            Some(Authority::Admin)
        );
        assert!(authorities.find_by_name("ROLE_ROOT").await.unwrap().is_none());
    }
}

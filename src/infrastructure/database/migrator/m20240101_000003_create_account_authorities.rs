//! Create account_authorities join table migration

use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_accounts::Accounts;
use super::m20240101_000002_create_authorities::Authorities;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AccountAuthorities::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AccountAuthorities::AccountId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AccountAuthorities::AuthorityName)
                            .string_len(50)
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(AccountAuthorities::AccountId)
                            .col(AccountAuthorities::AuthorityName),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_account_authorities_account_id")
                            .from(AccountAuthorities::Table, AccountAuthorities::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_account_authorities_authority_name")
                            .from(AccountAuthorities::Table, AccountAuthorities::AuthorityName)
                            .to(Authorities::Table, Authorities::Name),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AccountAuthorities::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum AccountAuthorities {
    Table,
    AccountId,
    AuthorityName,
}

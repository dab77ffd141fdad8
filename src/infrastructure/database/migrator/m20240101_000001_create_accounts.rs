//! Create accounts table migration

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Accounts::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Accounts::Login)
                            .string_len(50)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Accounts::Email)
                            .string_len(254)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Accounts::PasswordHash).string_len(60).not_null())
                    .col(ColumnDef::new(Accounts::FirstName).string_len(50).null())
                    .col(ColumnDef::new(Accounts::LastName).string_len(50).null())
                    .col(
                        ColumnDef::new(Accounts::LangKey)
                            .string_len(10)
                            .not_null()
                            .default("en"),
                    )
                    .col(
                        ColumnDef::new(Accounts::Activated)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Accounts::ActivationKey).string_len(20).null())
                    .col(
                        ColumnDef::new(Accounts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Accounts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Activation link lookup
        manager
            .create_index(
                Index::create()
                    .name("idx_accounts_activation_key")
                    .table(Accounts::Table)
                    .col(Accounts::ActivationKey)
                    .to_owned(),
            )
            .await?;

        // Janitor scan
        manager
            .create_index(
                Index::create()
                    .name("idx_accounts_activated_created_at")
                    .table(Accounts::Table)
                    .col(Accounts::Activated)
                    .col(Accounts::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Accounts {
    Table,
    Id,
    Login,
    Email,
    PasswordHash,
    FirstName,
    LastName,
    LangKey,
    Activated,
    ActivationKey,
    CreatedAt,
    UpdatedAt,
}

//! Create authorities table and seed the role vocabulary

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const SEEDED_AUTHORITIES: [&str; 2] = ["ROLE_ADMIN", "ROLE_USER"];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Authorities::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Authorities::Name)
                            .string_len(50)
                            .not_null()
                            .primary_key(),
                    )
                    .to_owned(),
            )
            .await?;

        let mut seed = Query::insert();
        seed.into_table(Authorities::Table).columns([Authorities::Name]);
        for name in SEEDED_AUTHORITIES {
            seed.values([name.into()])
                .map_err(|e| DbErr::Migration(e.to_string()))?;
        }
        manager.exec_stmt(seed).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Authorities::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Authorities {
    Table,
    Name,
}

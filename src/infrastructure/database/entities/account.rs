//! Account entity for database

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub login: String,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub lang_key: String,
    pub activated: bool,
    pub activation_key: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::account_authority::Entity")]
    AccountAuthorities,
}

impl Related<super::account_authority::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AccountAuthorities.def()
    }
}

impl Related<super::authority::Entity> for Entity {
    fn to() -> RelationDef {
        super::account_authority::Relation::Authority.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::account_authority::Relation::Account.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

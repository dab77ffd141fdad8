//! Database entities module

pub mod account;
pub mod account_authority;
pub mod authority;

pub use account::Entity as AccountEntity;
pub use account_authority::Entity as AccountAuthorityEntity;
pub use authority::Entity as AuthorityEntity;

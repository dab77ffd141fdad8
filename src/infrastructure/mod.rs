//! Infrastructure layer: database, crypto, mail and in-memory storage

pub mod crypto;
pub mod database;
pub mod mail;
pub mod storage;

pub use database::{init_database, DatabaseConfig, SeaOrmAccountRepository, SeaOrmAuthorityRepository};
pub use mail::build_mail_sender;
pub use storage::{InMemoryAccountRepository, InMemoryAuthorityRepository};

pub mod account;

// Re-export commonly used types
pub use account::{
    normalize_identifier, Account, AccountDraft, AccountRepositoryInterface, Authority,
    AuthorityRepositoryInterface, NewAccount, DEFAULT_LANG_KEY,
};

// Re-export DomainError from shared for convenience
pub use crate::shared::{DomainError, DomainResult};

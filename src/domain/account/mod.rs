//! Account aggregate
//!
//! Contains the Account entity, the role vocabulary, DTOs and the
//! repository interfaces.

pub mod model;
pub mod repository;

mod dto;

pub use model::{normalize_identifier, Account, Authority, DEFAULT_LANG_KEY};

pub use dto::{AccountDraft, NewAccount};

pub use repository::{AccountRepositoryInterface, AuthorityRepositoryInterface};

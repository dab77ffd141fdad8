use std::collections::BTreeSet;

use super::Authority;

/// Account as submitted by a caller, for creation or full replacement.
#[derive(Debug, Clone, Default)]
pub struct AccountDraft {
    /// Must be absent on creation and present on update
    pub id: Option<i64>,
    pub login: String,
    pub email: String,
    /// Raw password; hashed before it reaches the store
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub lang_key: Option<String>,
    pub activated: bool,
    /// Authority names, resolved against the authority store
    pub authorities: Vec<String>,
}

/// Account row to insert; the store assigns the id and audit timestamps.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub login: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub lang_key: String,
    pub activated: bool,
    pub activation_key: Option<String>,
    pub authorities: BTreeSet<Authority>,
}

//! Account lookup collaborator.
//!
//! Accounts are owned by the persistence layer; this core only reads them.
//! The in-memory implementation backs tests and embedded deployments.

use crate::models::Account;
use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_email(&self, email_address: &str) -> Option<Account>;

    async fn find_by_id(&self, account_id: Uuid) -> Option<Account>;
}

/// Immutable in-memory account store. Email lookup is case-insensitive.
pub struct InMemoryAccountStore {
    by_id: HashMap<Uuid, Account>,
    by_email: HashMap<String, Uuid>,
}

impl InMemoryAccountStore {
    pub fn new(accounts: impl IntoIterator<Item = Account>) -> Self {
        let mut by_id = HashMap::new();
        let mut by_email = HashMap::new();
        for account in accounts {
            by_email.insert(account.email_address.to_lowercase(), account.account_id);
            by_id.insert(account.account_id, account);
        }
        Self { by_id, by_email }
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn find_by_email(&self, email_address: &str) -> Option<Account> {
        let id = self.by_email.get(&email_address.to_lowercase())?;
        self.by_id.get(id).cloned()
    }

    async fn find_by_id(&self, account_id: Uuid) -> Option<Account> {
        self.by_id.get(&account_id).cloned()
    }
}

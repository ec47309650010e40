//! Account persistence.
//!
//! [`AccountStore`] is the seam between the login flow and whatever holds
//! the account rows. [`MemoryAccountStore`] keeps them in a `DashMap` and is
//! what the server uses, seeded from configuration.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::account::{Account, LockoutState, Profile};
use crate::error::{CoreError, CoreResult};

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_num(&self, num: &str) -> CoreResult<Option<Account>>;

    async fn get(&self, id: u64) -> CoreResult<Option<Account>>;

    /// Replaces the lockout fields only if they still equal `expected`.
    ///
    /// Returns `false` when another request changed them first.
    async fn swap_lockout(
        &self,
        id: u64,
        expected: LockoutState,
        next: LockoutState,
    ) -> CoreResult<bool>;

    async fn update_profile(&self, id: u64, profile: Profile) -> CoreResult<()>;

    async fn update_password(&self, id: u64, passwd: String) -> CoreResult<()>;
}

#[derive(Debug, Default)]
pub struct MemoryAccountStore {
    rows: DashMap<u64, Account>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_accounts(accounts: impl IntoIterator<Item = Account>) -> Self {
        let store = Self::new();
        for account in accounts {
            store.insert(account);
        }
        store
    }

    pub fn insert(&self, account: Account) {
        tracing::debug!("Account loaded: id={}, num={}", account.id, account.num);
        self.rows.insert(account.id, account);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn missing(id: u64) -> CoreError {
        CoreError::NotFound(format!("account {id}"))
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn find_by_num(&self, num: &str) -> CoreResult<Option<Account>> {
        Ok(self
            .rows
            .iter()
            .find(|entry| entry.num == num)
            .map(|entry| entry.value().clone()))
    }

    async fn get(&self, id: u64) -> CoreResult<Option<Account>> {
        Ok(self.rows.get(&id).map(|entry| entry.value().clone()))
    }

    async fn swap_lockout(
        &self,
        id: u64,
        expected: LockoutState,
        next: LockoutState,
    ) -> CoreResult<bool> {
        // get_mut holds the shard write lock for the compare and the write
        let mut row = self.rows.get_mut(&id).ok_or_else(|| Self::missing(id))?;
        if row.lockout != expected {
            return Ok(false);
        }
        row.lockout = next;
        Ok(true)
    }

    async fn update_profile(&self, id: u64, profile: Profile) -> CoreResult<()> {
        let mut row = self.rows.get_mut(&id).ok_or_else(|| Self::missing(id))?;
        row.profile = profile;
        Ok(())
    }

    async fn update_password(&self, id: u64, passwd: String) -> CoreResult<()> {
        let mut row = self.rows.get_mut(&id).ok_or_else(|| Self::missing(id))?;
        row.passwd = passwd;
        Ok(())
    }
}

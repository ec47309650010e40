use std::sync::Arc;
use std::time::Instant;

use quill_core::{Account, AccountStore, Authenticator, Content, LoginLimiter, MemoryAccountStore};

use crate::auth::password::StoredPassword;
use crate::config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub accounts: Arc<dyn AccountStore>,
    pub authenticator: Arc<Authenticator>,
    /// Shared by every login request; see `LoginLimiter`.
    pub login_limiter: Arc<LoginLimiter>,
    pub content: Arc<Content>,
    pub started_at: Instant,
}

impl AppState {
    /// Builds the state from configuration with the in-memory account store.
    pub fn new(config: ServerConfig) -> anyhow::Result<Self> {
        let store = Arc::new(MemoryAccountStore::with_accounts(
            config.accounts.iter().map(Account::from),
        ));
        Self::with_store(config, store)
    }

    pub fn with_store(config: ServerConfig, accounts: Arc<dyn AccountStore>) -> anyhow::Result<Self> {
        let (rate, burst) = config.login.rate()?;
        let authenticator = Authenticator::new(
            accounts.clone(),
            Arc::new(StoredPassword),
            config.login.policy(),
            config.auth.captcha_key.clone(),
        );

        Ok(Self {
            config: Arc::new(config),
            accounts,
            authenticator: Arc::new(authenticator),
            login_limiter: Arc::new(LoginLimiter::new(rate, burst)),
            content: Arc::new(Content::new()),
            started_at: Instant::now(),
        })
    }
}

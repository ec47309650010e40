use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::time::Duration;

use quill_core::{Account, LockoutPolicy, Profile};
use serde::Deserialize;

/// An admin account seeded at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
    pub id: u64,
    pub num: String,
    /// Plain text or an argon2 PHC string (see the `hash_password` binary).
    pub passwd: String,
    #[serde(default)]
    pub role: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
}

impl From<&AccountConfig> for Account {
    fn from(seed: &AccountConfig) -> Self {
        Account {
            role: seed.role,
            profile: Profile {
                name: seed.name.clone(),
                phone: seed.phone.clone(),
                email: seed.email.clone(),
            },
            ..Account::new(seed.id, seed.num.clone(), seed.passwd.clone())
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub login: LoginConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub tls: TlsConfig,
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub token_secret: String,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: u64,
    #[serde(default = "default_captcha_key")]
    pub captcha_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginConfig {
    #[serde(default = "default_rate_per_second")]
    pub rate_per_second: u32,
    #[serde(default = "default_burst")]
    pub burst: u32,
    #[serde(default = "default_wait_timeout_secs")]
    pub wait_timeout_secs: u64,
    #[serde(default = "default_max_failures")]
    pub max_failures: u32,
    #[serde(default = "default_lock_minutes")]
    pub lock_minutes: u32,
    #[serde(default)]
    pub reset_failures_on_success: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_upload_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_url_prefix")]
    pub url_prefix: String,
    #[serde(default = "default_max_size_mb")]
    pub max_size_mb: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TlsConfig {
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: String::new(),
            token_ttl_hours: default_token_ttl_hours(),
            captcha_key: default_captcha_key(),
        }
    }
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            rate_per_second: default_rate_per_second(),
            burst: default_burst(),
            wait_timeout_secs: default_wait_timeout_secs(),
            max_failures: default_max_failures(),
            lock_minutes: default_lock_minutes(),
            reset_failures_on_success: false,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: default_upload_dir(),
            url_prefix: default_url_prefix(),
            max_size_mb: default_max_size_mb(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            auth: AuthConfig::default(),
            login: LoginConfig::default(),
            upload: UploadConfig::default(),
            tls: TlsConfig::default(),
            accounts: Vec::new(),
        }
    }
}

/// One year.
const MAX_TOKEN_TTL_HOURS: u64 = 24 * 365;

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8085))
}
fn default_token_ttl_hours() -> u64 { 72 }
fn default_captcha_key() -> String { "v.c.o.d.e".to_string() }
fn default_rate_per_second() -> u32 { 20 }
fn default_burst() -> u32 { 5 }
fn default_wait_timeout_secs() -> u64 { 5 }
fn default_max_failures() -> u32 { 5 }
fn default_lock_minutes() -> u32 { 5 }
fn default_upload_dir() -> PathBuf { PathBuf::from("static/upload") }
fn default_url_prefix() -> String { "/static/upload".to_string() }
fn default_max_size_mb() -> usize { 20 }

impl LoginConfig {
    pub fn policy(&self) -> LockoutPolicy {
        LockoutPolicy {
            max_failures: self.max_failures,
            lock_minutes: self.lock_minutes,
            reset_on_success: self.reset_failures_on_success,
        }
    }

    pub fn rate(&self) -> anyhow::Result<(NonZeroU32, NonZeroU32)> {
        let rate = NonZeroU32::new(self.rate_per_second)
            .ok_or_else(|| anyhow::anyhow!("login.rate_per_second must be positive"))?;
        let burst = NonZeroU32::new(self.burst)
            .ok_or_else(|| anyhow::anyhow!("login.burst must be positive"))?;
        Ok((rate, burst))
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }
}

impl ServerConfig {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = std::env::var("QUILL_CONFIG").map(PathBuf::from).ok();

        let mut config = if let Some(path) = config_path {
            let contents = std::fs::read_to_string(&path)?;
            toml::from_str(&contents)?
        } else {
            ServerConfig::default()
        };

        if let Ok(secret) = std::env::var("QUILL_TOKEN_SECRET") {
            config.auth.token_secret = secret;
        }
        if let Ok(key) = std::env::var("QUILL_CAPTCHA_KEY") {
            config.auth.captcha_key = key;
        }
        if let Ok(dir) = std::env::var("QUILL_UPLOAD_DIR") {
            config.upload.dir = PathBuf::from(dir);
        }
        if let Ok(addr) = std::env::var("QUILL_BIND_ADDR") {
            config.bind_addr = addr.parse()?;
        }
        if let Ok(cert) = std::env::var("QUILL_TLS_CERT") {
            config.tls.cert_path = Some(cert);
        }
        if let Ok(key) = std::env::var("QUILL_TLS_KEY") {
            config.tls.key_path = Some(key);
        }

        if config.auth.token_secret.is_empty() {
            config.auth.token_secret = uuid::Uuid::new_v4().to_string();
            tracing::warn!(
                "No token secret configured. Generated random secret (sessions end on restart)."
            );
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        const WEAK_SECRETS: &[&str] = &["secret", "password", "change-me", "token-secret"];
        if WEAK_SECRETS.iter().any(|&w| self.auth.token_secret == w) {
            anyhow::bail!(
                "Token secret matches a known weak/placeholder value. \
                 Set a strong random secret via QUILL_TOKEN_SECRET."
            );
        }
        if self.auth.token_secret.len() < 32 {
            tracing::warn!("Token secret is shorter than 32 characters.");
        }
        if self.auth.token_ttl_hours == 0 || self.auth.token_ttl_hours > MAX_TOKEN_TTL_HOURS {
            anyhow::bail!("auth.token_ttl_hours must be between 1 and {MAX_TOKEN_TTL_HOURS}");
        }

        self.login.rate()?;
        if self.login.max_failures == 0 {
            anyhow::bail!("login.max_failures must be positive");
        }

        let mut seen = std::collections::HashSet::new();
        for account in &self.accounts {
            if !seen.insert(account.id) {
                anyhow::bail!("duplicate account id {}", account.id);
            }
        }
        if self.accounts.is_empty() {
            tracing::warn!("No accounts configured; nobody can log in.");
        }
        Ok(())
    }
}

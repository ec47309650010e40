//! Quill core library: authentication and content logic for the blog
//! admin backend, independent of the HTTP layer.
//!
//! # Modules
//!
//! - [`account`]: Admin accounts, profile fields and lockout bookkeeping.
//! - [`lockout`]: The failed-password lockout state machine ([`LockoutPolicy`]).
//! - [`captcha`]: Stateless HMAC captcha issue/verify.
//! - [`limiter`]: Process-wide login token bucket ([`LoginLimiter`]).
//! - [`login`]: Login orchestration ([`Authenticator`]).
//! - [`store`]: Account persistence seam and its in-memory implementation.
//! - [`content`]: Dictionary, category, tag, post and page collections.
//! - [`error`]: Unified error type ([`CoreError`]) and result alias ([`CoreResult`]).

pub mod account;
pub mod captcha;
pub mod content;
pub mod error;
pub mod limiter;
pub mod lockout;
pub mod login;
pub mod store;

pub use account::{Account, Failures, LockoutState, Profile};
pub use captcha::Captcha;
pub use content::{Article, Category, Collection, Content, Dict, Global, Record, Tag};
pub use error::{CoreError, CoreResult};
pub use limiter::LoginLimiter;
pub use lockout::{LockoutPolicy, Transition};
pub use login::{Authenticator, LoginAttempt, PasswordCheck, PlainPassword};
pub use store::{AccountStore, MemoryAccountStore};

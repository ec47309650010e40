//! Error types for `quill-core`.
//!
//! All fallible operations in the core library return [`CoreResult<T>`],
//! which is an alias for `Result<T, CoreError>`.

/// Unified error type for login, account and content operations.
///
/// The display text of each variant is what an admin client sees, so
/// credential failures deliberately share one message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// The login limiter did not yield a token before the deadline.
    #[error("too many concurrent logins, please wait")]
    RateLimited,

    /// The request body was malformed or failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The captcha code does not match its signature.
    #[error("please enter the correct captcha")]
    InvalidCaptcha,

    /// Unknown account or otherwise unusable login name.
    #[error("account or password incorrect")]
    BadCredentials,

    /// Password mismatch below the lockout threshold.
    #[error("wrong password, {remaining} attempts remaining")]
    WrongPassword { remaining: u32 },

    /// The account is locked for at least another `minutes` minutes.
    #[error("login locked, please retry in {minutes} minutes")]
    LockedOut { minutes: i64 },

    /// A record addressed by id does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The operation would break a reference between records.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The backing store failed.
    #[error("store error: {0}")]
    Persistence(String),

    /// A failure that is neither the caller's nor the store's.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Convenience alias used throughout `quill-core`.
pub type CoreResult<T> = Result<T, CoreError>;

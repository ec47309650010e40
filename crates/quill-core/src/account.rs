//! Admin accounts and their login bookkeeping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored value of the failure counter while an account is locked.
pub const LOCKED_SENTINEL: i32 = -1;

/// Consecutive failed-password counter.
///
/// Persisted as an `i32` where [`LOCKED_SENTINEL`] marks a locked account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum Failures {
    Count(u32),
    Locked,
}

impl Default for Failures {
    fn default() -> Self {
        Failures::Count(0)
    }
}

impl From<Failures> for i32 {
    fn from(f: Failures) -> Self {
        match f {
            Failures::Count(n) => i32::try_from(n).unwrap_or(i32::MAX),
            Failures::Locked => LOCKED_SENTINEL,
        }
    }
}

impl TryFrom<i32> for Failures {
    type Error = String;

    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        match raw {
            LOCKED_SENTINEL => Ok(Failures::Locked),
            n if n >= 0 => Ok(Failures::Count(n as u32)),
            n => Err(format!("invalid failure count: {n}")),
        }
    }
}

/// The part of an account the login flow reads and writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockoutState {
    pub failures: Failures,
    /// Last failure, lock event or successful login.
    pub last_attempt_at: Option<DateTime<Utc>>,
}

/// Editable profile fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub phone: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: u64,
    pub num: String,
    /// Plain text or an argon2 PHC string; never serialized outward.
    #[serde(skip_serializing, default)]
    pub passwd: String,
    pub role: u32,
    #[serde(flatten)]
    pub profile: Profile,
    #[serde(flatten)]
    pub lockout: LockoutState,
}

impl Account {
    pub fn new(id: u64, num: impl Into<String>, passwd: impl Into<String>) -> Self {
        Self {
            id,
            num: num.into(),
            passwd: passwd.into(),
            role: 0,
            profile: Profile::default(),
            lockout: LockoutState::default(),
        }
    }

    pub fn is_locked(&self) -> bool {
        self.lockout.failures == Failures::Locked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_serialize_as_sentinel() {
        assert_eq!(serde_json::to_string(&Failures::Locked).unwrap(), "-1");
        assert_eq!(serde_json::to_string(&Failures::Count(3)).unwrap(), "3");
    }

    #[test]
    fn failures_reject_other_negatives() {
        assert!(serde_json::from_str::<Failures>("-2").is_err());
        assert_eq!(
            serde_json::from_str::<Failures>("-1").unwrap(),
            Failures::Locked
        );
    }

    #[test]
    fn account_json_omits_password() {
        let mut account = Account::new(1, "admin", "secret");
        account.profile.name = "Admin".to_string();
        let json = serde_json::to_value(&account).unwrap();
        assert!(json.get("passwd").is_none());
        assert_eq!(json["num"], "admin");
        assert_eq!(json["name"], "Admin");
        assert_eq!(json["failures"], 0);
    }

    #[test]
    fn new_account_is_unlocked() {
        let account = Account::new(7, "editor", "pw");
        assert!(!account.is_locked());
        assert_eq!(account.lockout.last_attempt_at, None);
    }
}

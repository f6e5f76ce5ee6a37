//! Leaderboard user identity and nickname.

use std::fmt;

use chrono::{DateTime, Timelike, Utc};
use mockable::Clock;

/// Maximum length, in characters, of a user id.
pub const USER_ID_MAX: usize = 30;
/// Maximum length, in characters, of a nickname.
pub const NICKNAME_MAX: usize = 30;

/// Validation errors for user fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    /// The user id was empty.
    #[error("user id must not be empty")]
    EmptyId,
    /// The user id exceeded [`USER_ID_MAX`] characters.
    #[error("user id must be at most {max} characters")]
    IdTooLong { max: usize },
    /// The nickname was blank.
    #[error("nickname must not be blank")]
    BlankNickname,
    /// The nickname exceeded [`NICKNAME_MAX`] characters.
    #[error("nickname must be at most {max} characters")]
    NicknameTooLong { max: usize },
}

/// Caller-chosen opaque user identifier.
///
/// # Examples
/// ```
/// use leaderboard::domain::UserId;
///
/// assert!(UserId::new("player-one").is_ok());
/// assert!(UserId::new("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UserId(String);

impl UserId {
    /// Validate and construct a [`UserId`].
    pub fn new(id: impl Into<String>) -> Result<Self, UserValidationError> {
        let id = id.into();
        if id.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if id.chars().count() > USER_ID_MAX {
            return Err(UserValidationError::IdTooLong { max: USER_ID_MAX });
        }
        Ok(Self(id))
    }

    /// Resolve an id used for lookup; ids that could never be stored yield
    /// `None`.
    #[must_use]
    pub fn lookup(raw: &str) -> Option<Self> {
        Self::new(raw).ok()
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Display name shown on boards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nickname(String);

impl Nickname {
    /// Validate and construct a [`Nickname`].
    pub fn new(nickname: impl Into<String>) -> Result<Self, UserValidationError> {
        let nickname = nickname.into();
        if nickname.trim().is_empty() {
            return Err(UserValidationError::BlankNickname);
        }
        if nickname.chars().count() > NICKNAME_MAX {
            return Err(UserValidationError::NicknameTooLong { max: NICKNAME_MAX });
        }
        Ok(Self(nickname))
    }

    /// Placeholder nickname for users registered without one.
    ///
    /// Takes the form `user_<microseconds>` where the digits are the
    /// sub-second part of the clock's current time.
    #[must_use]
    pub fn placeholder(clock: &dyn Clock) -> Self {
        Self::placeholder_at(clock.utc())
    }

    fn placeholder_at(now: DateTime<Utc>) -> Self {
        let micros = now.nanosecond() % 1_000_000_000 / 1_000;
        Self(format!("user_{micros:06}"))
    }
}

impl AsRef<str> for Nickname {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Nickname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Registered leaderboard user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Stable identifier.
    pub id: UserId,
    /// Current display name.
    pub nickname: Nickname,
    /// Registration instant.
    pub created_at: DateTime<Utc>,
}

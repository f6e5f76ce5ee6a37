//! Score entries keyed by `(app, score name, user)`.

use std::fmt;

use crate::domain::{AppId, Nickname, UserId};

/// Maximum length, in characters, of a score name.
pub const SCORE_NAME_MAX: usize = 30;

/// Validation errors for score names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScoreNameValidationError {
    /// The name was empty.
    #[error("score name must not be empty")]
    Empty,
    /// The name exceeded [`SCORE_NAME_MAX`] characters.
    #[error("score name must be at most {max} characters")]
    TooLong { max: usize },
}

/// Name of one leaderboard within an app, such as `arcade`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScoreName(String);

impl ScoreName {
    /// Validate and construct a [`ScoreName`].
    pub fn new(name: impl Into<String>) -> Result<Self, ScoreNameValidationError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ScoreNameValidationError::Empty);
        }
        if name.chars().count() > SCORE_NAME_MAX {
            return Err(ScoreNameValidationError::TooLong {
                max: SCORE_NAME_MAX,
            });
        }
        Ok(Self(name))
    }

    /// Resolve a name used for lookup; names that could never be stored
    /// yield `None`.
    #[must_use]
    pub fn lookup(raw: &str) -> Option<Self> {
        Self::new(raw).ok()
    }
}

impl AsRef<str> for ScoreName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ScoreName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One leaderboard: all entries sharing an app and a score name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BoardKey {
    /// Owning app.
    pub app_id: AppId,
    /// Score name within the app.
    pub score_name: ScoreName,
}

/// Composite identity of a single score entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScoreKey {
    /// Owning app.
    pub app_id: AppId,
    /// Score name within the app.
    pub score_name: ScoreName,
    /// Entrant.
    pub user_id: UserId,
}

impl ScoreKey {
    /// The leaderboard this entry belongs to.
    #[must_use]
    pub fn board(&self) -> BoardKey {
        BoardKey {
            app_id: self.app_id,
            score_name: self.score_name.clone(),
        }
    }
}

/// A user's value under one score name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserScore {
    /// Score name.
    pub score_name: ScoreName,
    /// Current value.
    pub value: i32,
}

/// One row of a top-K board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardEntry {
    /// Entrant.
    pub user_id: UserId,
    /// Entrant's nickname at read time.
    pub nickname: Nickname,
    /// Entrant's value.
    pub value: i32,
}

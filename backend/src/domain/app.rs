//! Tenant apps that own leaderboards.

use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

/// Maximum length, in characters, of an app name.
pub const APP_NAME_MAX: usize = 30;

/// Validation errors for app fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AppValidationError {
    /// The id was not a UUID.
    #[error("app id must be a UUID")]
    InvalidId,
    /// The name was blank.
    #[error("app name must not be blank")]
    BlankName,
    /// The name exceeded [`APP_NAME_MAX`] characters.
    #[error("app name must be at most {max} characters")]
    NameTooLong { max: usize },
}

/// Server-issued app identifier.
///
/// Accepts both the hyphenated and the simple (32 hex digit) UUID forms.
///
/// # Examples
/// ```
/// use leaderboard::domain::AppId;
///
/// let hyphenated: AppId = "b3edf18d-7856-48ad-bc46-ea65043c97d9".parse().expect("uuid");
/// let simple: AppId = "b3edf18d785648adbc46ea65043c97d9".parse().expect("uuid");
/// assert_eq!(hyphenated, simple);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AppId(Uuid);

impl AppId {
    /// Generate a fresh random identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl FromStr for AppId {
    type Err = AppValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| AppValidationError::InvalidId)
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Human readable app name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppName(String);

impl AppName {
    /// Validate and construct an [`AppName`].
    pub fn new(name: impl Into<String>) -> Result<Self, AppValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AppValidationError::BlankName);
        }
        if name.chars().count() > APP_NAME_MAX {
            return Err(AppValidationError::NameTooLong { max: APP_NAME_MAX });
        }
        Ok(Self(name))
    }
}

impl AsRef<str> for AppName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for AppName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A tenant app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct App {
    /// Stable identifier.
    pub id: AppId,
    /// Display name.
    pub name: AppName,
}

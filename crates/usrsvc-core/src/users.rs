use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account status as stored in `users.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    /// Set by the stale-account routine; never reverted automatically.
    Demoted,
}

impl UserStatus {
    #[must_use]
    pub fn as_i16(self) -> i16 {
        match self {
            UserStatus::Active => 1,
            UserStatus::Demoted => 2,
        }
    }

    #[must_use]
    pub fn from_i16(value: i16) -> Option<Self> {
        match value {
            1 => Some(UserStatus::Active),
            2 => Some(UserStatus::Demoted),
            _ => None,
        }
    }
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserStatus::Active => write!(f, "active"),
            UserStatus::Demoted => write!(f, "demoted"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub status: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Returns the typed status, or `None` for a code this build does not know.
    #[must_use]
    pub fn status(&self) -> Option<UserStatus> {
        UserStatus::from_i16(self.status)
    }
}

//! Group permission levels.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A member's permission level in a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    /// Group owner.
    Owner,
    /// Group administrator.
    Administrator,
    /// Regular member.
    Member,
}

impl Permission {
    /// Returns `true` for owners and administrators.
    pub fn is_admin(self) -> bool {
        matches!(self, Self::Owner | Self::Administrator)
    }

    /// Returns the wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "OWNER",
            Self::Administrator => "ADMINISTRATOR",
            Self::Member => "MEMBER",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

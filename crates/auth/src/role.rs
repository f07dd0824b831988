//! Privilege levels carried by a session.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Privilege level of an authenticated user.
///
/// The set is closed and ordered (`Viewer` lowest, `Administrator` highest).
/// The session only carries the role; evaluating it against operations is a
/// concern of the routes that care.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Viewer,
    Editor,
    Owner,
    Administrator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Viewer => "viewer",
            Role::Editor => "editor",
            Role::Owner => "owner",
            Role::Administrator => "administrator",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct ParseRoleError(String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "viewer" => Ok(Role::Viewer),
            "editor" => Ok(Role::Editor),
            "owner" => Ok(Role::Owner),
            "administrator" => Ok(Role::Administrator),
            other => Err(ParseRoleError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_are_ordered_low_to_high() {
        assert!(Role::Viewer < Role::Editor);
        assert!(Role::Editor < Role::Owner);
        assert!(Role::Owner < Role::Administrator);
    }

    #[test]
    fn roles_round_trip_through_strings() {
        for role in [Role::Viewer, Role::Editor, Role::Owner, Role::Administrator] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("superuser".parse::<Role>().is_err());
    }
}

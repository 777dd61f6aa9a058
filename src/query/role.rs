//! Effective Database Role
//!
//! The role a request runs under (as supplied by the `X-Database-Role`
//! header upstream). It is part of every cache key.

use std::fmt;

use crate::error::{CacheError, Result};

/// Longest accepted role name.
pub const MAX_ROLE_LENGTH: usize = 64;

/// A validated role name; empty means the connection's default role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DatabaseRole(String);

impl DatabaseRole {
    /// Validates a role name: a letter followed by letters, digits or
    /// underscores, at most 64 characters. An empty string selects the
    /// default role.
    pub fn parse(name: &str) -> Result<Self> {
        if name.is_empty() {
            return Ok(Self::default());
        }

        let mut chars = name.chars();
        let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
        let rest_valid = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

        if !starts_with_letter || !rest_valid || name.len() > MAX_ROLE_LENGTH {
            return Err(CacheError::InvalidRole(name.to_string()));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when no explicit role was requested.
    pub fn is_default(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DatabaseRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_default() {
            f.write_str("<default>")
        } else {
            f.write_str(&self.0)
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_roles() {
        assert_eq!(DatabaseRole::parse("reader").unwrap().as_str(), "reader");
        assert_eq!(DatabaseRole::parse("App_Role2").unwrap().as_str(), "App_Role2");
        assert!(DatabaseRole::parse(&"r".repeat(MAX_ROLE_LENGTH)).is_ok());
    }

    #[test]
    fn test_empty_role_is_default() {
        let role = DatabaseRole::parse("").unwrap();
        assert!(role.is_default());
        assert_eq!(role, DatabaseRole::default());
        assert_eq!(role.to_string(), "<default>");
    }

    #[test]
    fn test_invalid_roles() {
        for name in [
            "1role",
            "_role",
            "role-name",
            "role\"; DROP TABLE t; --",
            "rôle",
            " reader",
        ] {
            assert!(
                matches!(DatabaseRole::parse(name), Err(CacheError::InvalidRole(_))),
                "{} should be rejected",
                name
            );
        }
        assert!(DatabaseRole::parse(&"r".repeat(MAX_ROLE_LENGTH + 1)).is_err());
    }
}

//! User accounts (the entities behind sign-in).

use serde::{Deserialize, Serialize};

use boltline_auth::Role;
use boltline_core::{DomainError, DomainResult};

/// A user account.
///
/// `password_hash` is a PHC string (argon2); it is persisted with the record
/// but must never appear in API responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub username: String,
    pub display_name: String,
    pub role: Role,
    pub password_hash: String,
}

impl UserAccount {
    pub fn validate(&self) -> DomainResult<()> {
        if self.username.trim().is_empty() {
            return Err(DomainError::validation("username cannot be empty"));
        }
        if self.username.chars().any(char::is_whitespace) {
            return Err(DomainError::validation("username cannot contain whitespace"));
        }
        if self.password_hash.is_empty() {
            return Err(DomainError::validation("password hash cannot be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_account() -> UserAccount {
        UserAccount {
            username: "ayse".to_string(),
            display_name: "Ayşe Demir".to_string(),
            role: Role::Editor,
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
        }
    }

    #[test]
    fn valid_accounts_pass_validation() {
        assert!(valid_account().validate().is_ok());
    }

    #[test]
    fn usernames_with_whitespace_are_rejected() {
        let mut account = valid_account();
        account.username = "ayse demir".to_string();
        assert!(matches!(
            account.validate(),
            Err(DomainError::Validation(_))
        ));
    }
}

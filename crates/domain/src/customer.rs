//! Customer records.

use serde::{Deserialize, Serialize};

use boltline_core::{DomainError, DomainResult};

/// A customer of the business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    pub contact_email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

impl Customer {
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("customer name cannot be empty"));
        }
        if let Some(email) = &self.contact_email {
            if !email.contains('@') {
                return Err(DomainError::validation("contact_email is not an email address"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_customer() -> Customer {
        Customer {
            name: "Meridian Fastening GmbH".to_string(),
            contact_email: Some("purchasing@meridian.example".to_string()),
            phone: None,
            address: None,
            notes: None,
        }
    }

    #[test]
    fn valid_customers_pass_validation() {
        assert!(valid_customer().validate().is_ok());
    }

    #[test]
    fn blank_names_are_rejected() {
        let mut customer = valid_customer();
        customer.name = "   ".to_string();
        assert!(matches!(
            customer.validate(),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn non_email_contacts_are_rejected() {
        let mut customer = valid_customer();
        customer.contact_email = Some("not-an-email".to_string());
        assert!(matches!(
            customer.validate(),
            Err(DomainError::Validation(_))
        ));
    }
}

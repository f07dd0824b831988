//! Screw (fastener) catalog records.

use serde::{Deserialize, Serialize};

use boltline_core::{DomainError, DomainResult};

/// A fastener stocked by the business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Screw {
    /// Catalog designation, e.g. "DIN 912 M6x30 A2".
    pub designation: String,
    pub material: Option<String>,
    pub size: Option<String>,
    /// Units on hand.
    pub stock: i64,
    pub unit_price_cents: i64,
}

impl Screw {
    pub fn validate(&self) -> DomainResult<()> {
        if self.designation.trim().is_empty() {
            return Err(DomainError::validation("designation cannot be empty"));
        }
        if self.stock < 0 {
            return Err(DomainError::validation("stock cannot be negative"));
        }
        if self.unit_price_cents < 0 {
            return Err(DomainError::validation("unit price cannot be negative"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_screw() -> Screw {
        Screw {
            designation: "DIN 912 M6x30 A2".to_string(),
            material: Some("stainless A2".to_string()),
            size: Some("M6x30".to_string()),
            stock: 1200,
            unit_price_cents: 14,
        }
    }

    #[test]
    fn valid_screws_pass_validation() {
        assert!(valid_screw().validate().is_ok());
    }

    #[test]
    fn negative_stock_is_rejected() {
        let mut screw = valid_screw();
        screw.stock = -1;
        assert!(matches!(screw.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn blank_designations_are_rejected() {
        let mut screw = valid_screw();
        screw.designation = String::new();
        assert!(matches!(screw.validate(), Err(DomainError::Validation(_))));
    }
}

//! # Customers
//!
//! The customer directory keyed by phone number, and the snapshot an
//! invoice copies from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::validation::{validate_optional_text, validate_phone, validate_required_text, ValidationResult};

/// A customer in the directory. Phone numbers are unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: i64,
    pub phone: String,
    pub name: String,
    pub address: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a customer.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewCustomer {
    pub phone: String,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
}

impl NewCustomer {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_phone(&self.phone)?;
        validate_required_text("name", &self.name, 200)?;
        validate_optional_text("address", self.address.as_deref(), 500)
    }

    /// Copy with surrounding whitespace removed.
    pub fn normalized(&self) -> NewCustomer {
        NewCustomer {
            phone: self.phone.trim().to_string(),
            name: self.name.trim().to_string(),
            address: self
                .address
                .as_deref()
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string),
        }
    }
}

/// Partial customer update. Absent fields are left unchanged.
///
/// Invoices keep the name, phone and address they were issued with.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct UpdateCustomer {
    pub phone: Option<String>,
    pub name: Option<String>,
    pub address: Option<String>,
    pub is_active: Option<bool>,
}

impl UpdateCustomer {
    pub fn validate(&self) -> ValidationResult<()> {
        if let Some(phone) = &self.phone {
            validate_phone(phone)?;
        }
        if let Some(name) = &self.name {
            validate_required_text("name", name, 200)?;
        }
        validate_optional_text("address", self.address.as_deref(), 500)
    }

    /// Applies the present fields to a stored customer.
    pub fn apply(&self, customer: &mut Customer) {
        if let Some(phone) = &self.phone {
            customer.phone = phone.trim().to_string();
        }
        if let Some(name) = &self.name {
            customer.name = name.trim().to_string();
        }
        if let Some(address) = &self.address {
            let address = address.trim();
            customer.address = (!address.is_empty()).then(|| address.to_string());
        }
        if let Some(active) = self.is_active {
            customer.is_active = active;
        }
    }
}

/// Customer fields copied onto an invoice header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerSnapshot {
    pub id: Option<i64>,
    pub phone: String,
    pub name: String,
    pub address: Option<String>,
}

impl CustomerSnapshot {
    /// A customer not (yet) linked to a directory entry.
    pub fn walk_in(phone: impl Into<String>, name: impl Into<String>) -> Self {
        CustomerSnapshot {
            id: None,
            phone: phone.into(),
            name: name.into(),
            address: None,
        }
    }

    /// Directory values, overridden by whatever the request supplied.
    pub fn from_directory(
        customer: &Customer,
        phone: Option<&str>,
        name: Option<&str>,
        address: Option<&str>,
    ) -> Self {
        let pick = |given: Option<&str>, stored: &str| {
            given
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .unwrap_or(stored)
                .to_string()
        };

        CustomerSnapshot {
            id: Some(customer.id),
            phone: pick(phone, &customer.phone),
            name: pick(name, &customer.name),
            address: address
                .map(str::to_string)
                .or_else(|| customer.address.clone()),
        }
    }
}

/// Query for the directory listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct CustomerQuery {
    /// Matches name or phone.
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored() -> Customer {
        let now = Utc::now();
        Customer {
            id: 5,
            phone: "0901234567".into(),
            name: "Cô Lan".into(),
            address: Some("12 Lê Lợi".into()),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_update_applies_present_fields() {
        let mut customer = stored();
        let update = UpdateCustomer {
            name: Some(" Cô Lan Anh ".into()),
            address: Some("   ".into()),
            ..UpdateCustomer::default()
        };
        assert!(update.validate().is_ok());
        update.apply(&mut customer);

        assert_eq!(customer.name, "Cô Lan Anh");
        assert_eq!(customer.phone, "0901234567");
        assert_eq!(customer.address, None);
        assert!(customer.is_active);

        let bad = UpdateCustomer {
            phone: Some("not a phone".into()),
            ..UpdateCustomer::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_snapshot_prefers_request_values() {
        let snap = CustomerSnapshot::from_directory(&stored(), None, Some("Lan (shop)"), None);
        assert_eq!(snap.id, Some(5));
        assert_eq!(snap.phone, "0901234567");
        assert_eq!(snap.name, "Lan (shop)");
        assert_eq!(snap.address.as_deref(), Some("12 Lê Lợi"));
    }

    #[test]
    fn test_snapshot_ignores_blank_overrides() {
        let snap = CustomerSnapshot::from_directory(&stored(), Some("  "), Some(""), None);
        assert_eq!(snap.phone, "0901234567");
        assert_eq!(snap.name, "Cô Lan");
    }

    #[test]
    fn test_new_customer_normalized() {
        let c = NewCustomer {
            phone: " 0901 ".into(),
            name: " An ".into(),
            address: Some("   ".into()),
        }
        .normalized();
        assert_eq!(c.phone, "0901");
        assert_eq!(c.name, "An");
        assert_eq!(c.address, None);
    }

    #[test]
    fn test_new_customer_validation() {
        let c = NewCustomer {
            phone: "abc".into(),
            name: "An".into(),
            address: None,
        };
        assert!(c.validate().is_err());
    }
}

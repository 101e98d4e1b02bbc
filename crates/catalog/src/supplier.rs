use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockbook_core::{DomainError, DomainResult, SupplierId};

use crate::text;

/// A supplier of purchased stock.
///
/// `balance` is stored and returned but never recomputed from purchases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: SupplierId,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSupplier {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Partial update; `Some("")` clears an optional contact field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl NewSupplier {
    pub fn into_supplier(self, now: DateTime<Utc>) -> DomainResult<Supplier> {
        Ok(Supplier {
            id: SupplierId::new(),
            name: text::required("name", &self.name)?,
            phone: text::optional(self.phone.as_deref()),
            email: checked_email(self.email.as_deref())?,
            address: text::optional(self.address.as_deref()),
            balance: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        })
    }
}

impl Supplier {
    pub fn apply(&mut self, patch: SupplierPatch, now: DateTime<Utc>) -> DomainResult<()> {
        if let Some(name) = patch.name {
            self.name = text::required("name", &name)?;
        }
        if let Some(phone) = patch.phone {
            self.phone = text::optional(Some(&phone));
        }
        if let Some(email) = patch.email {
            self.email = checked_email(Some(&email))?;
        }
        if let Some(address) = patch.address {
            self.address = text::optional(Some(&address));
        }
        self.updated_at = now;
        Ok(())
    }
}

fn checked_email(value: Option<&str>) -> DomainResult<Option<String>> {
    let email = text::optional(value);
    if let Some(email) = &email {
        let well_formed = email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
        if !well_formed {
            return Err(DomainError::validation(format!("email '{email}' is not valid")));
        }
    }
    Ok(email)
}

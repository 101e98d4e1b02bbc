use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockbook_core::{DomainResult, ProductId, ensure_stock_kilos};

use crate::text;

/// A stocked product. `stock_kilos` is the current on-hand quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub stock_kilos: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Opening stock. Posted through the ledger, never written directly.
    #[serde(default)]
    pub stock_kilos: Option<Decimal>,
}

/// Partial update. Stock is deliberately absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    #[serde(default)]
    pub name: Option<String>,
    /// `Some("")` clears the description.
    #[serde(default)]
    pub description: Option<String>,
}

impl NewProduct {
    /// Validate and build a product with zero stock, returning the opening
    /// quantity that still has to be posted.
    pub fn into_product(self, now: DateTime<Utc>) -> DomainResult<(Product, Decimal)> {
        let name = text::required("name", &self.name)?;
        let opening = ensure_stock_kilos("stockKilos", self.stock_kilos.unwrap_or(Decimal::ZERO))?;

        let product = Product {
            id: ProductId::new(),
            name,
            description: text::optional(self.description.as_deref()),
            stock_kilos: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        };
        Ok((product, opening))
    }
}

impl Product {
    pub fn apply(&mut self, patch: ProductPatch, now: DateTime<Utc>) -> DomainResult<()> {
        if let Some(name) = patch.name {
            self.name = text::required("name", &name)?;
        }
        if let Some(description) = patch.description {
            self.description = text::optional(Some(&description));
        }
        self.updated_at = now;
        Ok(())
    }
}

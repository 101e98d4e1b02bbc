use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockbook_core::{DomainResult, PurchaseId, SaleId, SupplierId};

use crate::line::{LineInput, LineItem, price_lines};

/// Purchase request: stock coming in from a supplier.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPurchase {
    pub supplier_id: SupplierId,
    pub items: Vec<LineInput>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Sale request: stock going out.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSale {
    pub items: Vec<LineInput>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub id: PurchaseId,
    pub supplier_id: SupplierId,
    pub total: Decimal,
    pub recorded_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub items: Vec<LineItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: SaleId,
    pub total: Decimal,
    pub recorded_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub items: Vec<LineItem>,
}

impl NewPurchase {
    /// Validate and price the request into a header ready to persist.
    pub fn into_purchase(self, now: DateTime<Utc>) -> DomainResult<Purchase> {
        let priced = price_lines(&self.items)?;
        Ok(Purchase {
            id: PurchaseId::new(),
            supplier_id: self.supplier_id,
            total: priced.total,
            recorded_at: now,
            notes: clean_notes(self.notes),
            items: priced.items,
        })
    }
}

impl NewSale {
    pub fn into_sale(self, now: DateTime<Utc>) -> DomainResult<Sale> {
        let priced = price_lines(&self.items)?;
        Ok(Sale {
            id: SaleId::new(),
            total: priced.total,
            recorded_at: now,
            notes: clean_notes(self.notes),
            items: priced.items,
        })
    }
}

fn clean_notes(notes: Option<String>) -> Option<String> {
    notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
}

#[cfg(test)]
mod tests {
    use stockbook_core::{DomainError, ProductId};

    use super::*;

    #[test]
    fn sale_of_thirty_kilos_at_4000_totals_120000() {
        let sale = NewSale {
            items: vec![LineInput {
                product_id: ProductId::new(),
                kilos: Decimal::new(30, 0),
                unit_price: Decimal::new(4000, 0),
            }],
            notes: Some("  ".to_string()),
        }
        .into_sale(Utc::now())
        .unwrap();

        assert_eq!(sale.total, Decimal::new(120_000, 0));
        assert_eq!(sale.notes, None);
        assert_eq!(sale.items.len(), 1);
    }

    #[test]
    fn purchase_keeps_line_order() {
        let a = ProductId::new();
        let b = ProductId::new();
        let purchase = NewPurchase {
            supplier_id: SupplierId::new(),
            items: vec![
                LineInput { product_id: b, kilos: Decimal::ONE, unit_price: Decimal::ONE },
                LineInput { product_id: a, kilos: Decimal::ONE, unit_price: Decimal::ONE },
            ],
            notes: Some("factura 0042".to_string()),
        }
        .into_purchase(Utc::now())
        .unwrap();

        let order: Vec<_> = purchase.items.iter().map(|i| i.product_id).collect();
        assert_eq!(order, vec![b, a]);
        assert_eq!(purchase.notes.as_deref(), Some("factura 0042"));
    }

    #[test]
    fn purchase_without_items_is_invalid() {
        let err = NewPurchase {
            supplier_id: SupplierId::new(),
            items: vec![],
            notes: None,
        }
        .into_purchase(Utc::now())
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}

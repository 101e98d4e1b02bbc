//! Joined views returned by the read paths.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use stockbook_catalog::{Product, Supplier};
use stockbook_core::{PurchaseId, SaleId, SupplierId};
use stockbook_ledger::{LedgerEntry, LineItem, Purchase};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineView {
    #[serde(flatten)]
    pub line: LineItem,
    pub product: Product,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseView {
    pub id: PurchaseId,
    pub supplier_id: SupplierId,
    pub supplier: Supplier,
    pub total: Decimal,
    pub recorded_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub items: Vec<LineView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleView {
    pub id: SaleId,
    pub total: Decimal,
    pub recorded_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub items: Vec<LineView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntryView {
    #[serde(flatten)]
    pub entry: LedgerEntry,
    pub product: Product,
}

/// A supplier with its most recent purchases, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierDetail {
    #[serde(flatten)]
    pub supplier: Supplier,
    pub purchases: Vec<Purchase>,
}

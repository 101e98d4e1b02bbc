//! Kardex entries: the append-only trail of stock movements.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockbook_core::{LedgerEntryId, ProductId, PurchaseId, SaleId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "IN",
            Direction::Out => "OUT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "IN" => Some(Direction::In),
            "OUT" => Some(Direction::Out),
            _ => None,
        }
    }

    /// Stock delta for moving `kilos` in this direction.
    pub fn signed(&self, kilos: Decimal) -> Decimal {
        match self {
            Direction::In => kilos,
            Direction::Out => -kilos,
        }
    }
}

impl core::fmt::Display for Direction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What caused a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    Purchase(PurchaseId),
    Sale(SaleId),
    /// Opening stock declared when the product was created.
    Opening(ProductId),
}

impl Movement {
    pub fn direction(&self) -> Direction {
        match self {
            Movement::Purchase(_) | Movement::Opening(_) => Direction::In,
            Movement::Sale(_) => Direction::Out,
        }
    }

    pub fn reference(&self) -> String {
        match self {
            Movement::Purchase(id) => format!("PURCHASE-{id}"),
            Movement::Sale(id) => format!("SALE-{id}"),
            Movement::Opening(id) => format!("OPENING-{id}"),
        }
    }

    pub fn note(&self, kilos: Decimal) -> String {
        let kilos = kilos.normalize();
        match self {
            Movement::Purchase(_) => format!("Purchase of {kilos} kg"),
            Movement::Sale(_) => format!("Sale of {kilos} kg"),
            Movement::Opening(_) => format!("Opening balance of {kilos} kg"),
        }
    }
}

/// One immutable ledger row.
///
/// `balance_after` is the product's stock as read back right after this
/// movement was applied, inside the same unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub id: LedgerEntryId,
    pub product_id: ProductId,
    #[serde(rename = "type")]
    pub direction: Direction,
    pub kilos: Decimal,
    pub balance_after: Decimal,
    pub reference: String,
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn record(
        movement: Movement,
        product_id: ProductId,
        kilos: Decimal,
        balance_after: Decimal,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: LedgerEntryId::new(),
            product_id,
            direction: movement.direction(),
            kilos,
            balance_after,
            reference: movement.reference(),
            notes: Some(movement.note(kilos)),
            recorded_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sale_entry_is_outgoing_with_sale_reference() {
        let sale = SaleId::new();
        let entry = LedgerEntry::record(
            Movement::Sale(sale),
            ProductId::new(),
            Decimal::new(30, 0),
            Decimal::new(70, 0),
            Utc::now(),
        );
        assert_eq!(entry.direction, Direction::Out);
        assert_eq!(entry.reference, format!("SALE-{sale}"));
        assert_eq!(entry.notes.as_deref(), Some("Sale of 30 kg"));
    }

    #[test]
    fn note_drops_trailing_zeros() {
        let note = Movement::Purchase(PurchaseId::new()).note(Decimal::new(12500, 3));
        assert_eq!(note, "Purchase of 12.5 kg");
    }

    #[test]
    fn direction_is_serialized_as_type() {
        let entry = LedgerEntry::record(
            Movement::Opening(ProductId::new()),
            ProductId::new(),
            Decimal::ONE,
            Decimal::ONE,
            Utc::now(),
        );
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "IN");
        assert!(json.get("balanceAfter").is_some());
    }

    #[test]
    fn signed_delta_follows_direction() {
        assert_eq!(Direction::In.signed(Decimal::TWO), Decimal::TWO);
        assert_eq!(Direction::Out.signed(Decimal::TWO), -Decimal::TWO);
        assert_eq!(Direction::parse("OUT"), Some(Direction::Out));
        assert_eq!(Direction::parse("out"), None);
    }
}

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockbook_core::{DomainError, DomainResult, ProductId, ensure_kilos, ensure_unit_price};

/// One requested line of a purchase or sale, as submitted by a client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineInput {
    pub product_id: ProductId,
    pub kilos: Decimal,
    pub unit_price: Decimal,
}

/// A validated, priced line. `subtotal == kilos * unit_price` exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: ProductId,
    pub kilos: Decimal,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLines {
    pub items: Vec<LineItem>,
    pub total: Decimal,
}

/// Validate every line and compute subtotals and the header total.
///
/// Fails on the first invalid line; the error names its position.
pub fn price_lines(lines: &[LineInput]) -> DomainResult<PricedLines> {
    if lines.is_empty() {
        return Err(DomainError::validation("items must contain at least one line"));
    }

    let mut items = Vec::with_capacity(lines.len());
    let mut total = Decimal::ZERO;
    for (idx, line) in lines.iter().enumerate() {
        let kilos = ensure_kilos(&format!("items[{idx}].kilos"), line.kilos)?;
        let unit_price = ensure_unit_price(&format!("items[{idx}].unitPrice"), line.unit_price)?;
        let subtotal = kilos
            .checked_mul(unit_price)
            .ok_or_else(|| DomainError::validation(format!("items[{idx}] subtotal overflows")))?;
        total = total
            .checked_add(subtotal)
            .ok_or_else(|| DomainError::validation("total overflows"))?;

        items.push(LineItem {
            product_id: line.product_id,
            kilos,
            unit_price,
            subtotal,
        });
    }

    Ok(PricedLines { items, total })
}

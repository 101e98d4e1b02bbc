use rust_decimal::Decimal;

use stockbook_core::{DomainError, DomainResult, ProductId};

use crate::line::LineItem;

/// Requested kilos summed per product, in first-appearance order.
///
/// Two lines for the same product must be checked against stock together.
pub fn requested_per_product(items: &[LineItem]) -> Vec<(ProductId, Decimal)> {
    let mut totals: Vec<(ProductId, Decimal)> = Vec::new();
    for item in items {
        match totals.iter_mut().find(|(id, _)| *id == item.product_id) {
            Some((_, kilos)) => *kilos += item.kilos,
            None => totals.push((item.product_id, item.kilos)),
        }
    }
    totals
}

/// Fail with `InsufficientStock` when `requested` exceeds `available`.
pub fn ensure_available(product: &str, available: Decimal, requested: Decimal) -> DomainResult<()> {
    if available < requested {
        return Err(DomainError::insufficient_stock(product, available, requested));
    }
    Ok(())
}

/// Apply a signed delta to a stock level; `None` if the result would be negative.
pub fn apply_delta(stock: Decimal, delta: Decimal) -> Option<Decimal> {
    let next = stock.checked_add(delta)?;
    (next >= Decimal::ZERO).then_some(next)
}

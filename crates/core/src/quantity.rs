//! Guards for the exact-decimal quantities and prices handled by the ledger.
//!
//! Kilograms and prices are `rust_decimal::Decimal` everywhere; binary floats
//! never enter stock or money arithmetic.

use rust_decimal::Decimal;

use crate::error::{DomainError, DomainResult};

/// Smallest quantity a line item may move: one gram.
pub const MIN_KILOS: Decimal = Decimal::from_parts(1, 0, 0, false, 3);

/// Quantities are stored with gram precision.
pub const KILOS_SCALE: u32 = 3;

/// A line quantity must be at least [`MIN_KILOS`] and a whole number of grams.
pub fn ensure_kilos(field: &str, kilos: Decimal) -> DomainResult<Decimal> {
    if kilos < MIN_KILOS {
        return Err(DomainError::validation(format!(
            "{field} must be at least {MIN_KILOS} kg (got {kilos})"
        )));
    }
    ensure_gram_precision(field, kilos)
}

/// A stock level: non-negative, whole grams.
pub fn ensure_stock_kilos(field: &str, kilos: Decimal) -> DomainResult<Decimal> {
    ensure_non_negative(field, kilos)?;
    ensure_gram_precision(field, kilos)
}

fn ensure_gram_precision(field: &str, kilos: Decimal) -> DomainResult<Decimal> {
    if kilos.normalize().scale() > KILOS_SCALE {
        return Err(DomainError::validation(format!(
            "{field} cannot have more than {KILOS_SCALE} decimal places (got {kilos})"
        )));
    }
    Ok(kilos)
}

/// A unit price may be zero but never negative.
pub fn ensure_unit_price(field: &str, price: Decimal) -> DomainResult<Decimal> {
    ensure_non_negative(field, price)
}

pub fn ensure_non_negative(field: &str, value: Decimal) -> DomainResult<Decimal> {
    if value < Decimal::ZERO {
        return Err(DomainError::validation(format!(
            "{field} cannot be negative (got {value})"
        )));
    }
    Ok(value)
}

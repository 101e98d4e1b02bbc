//! `stockbook-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod quantity;

pub use error::{DomainError, DomainResult};
pub use id::{LedgerEntryId, ProductId, PurchaseId, SaleId, SupplierId, UserId};
pub use quantity::{
    KILOS_SCALE, MIN_KILOS, ensure_kilos, ensure_non_negative, ensure_stock_kilos, ensure_unit_price,
};

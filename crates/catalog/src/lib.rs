//! Catalog domain module: products and suppliers.
//!
//! Pure record types and validation (no IO, no HTTP, no storage). Product
//! stock is read here but only ever changed by the ledger engine.

pub mod product;
pub mod supplier;

mod text;

pub use product::{NewProduct, Product, ProductPatch};
pub use supplier::{NewSupplier, Supplier, SupplierPatch};

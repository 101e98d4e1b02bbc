//! Stock ledger domain module.
//!
//! Pure rules for purchases, sales and the kardex (stock movement history):
//! line validation and exact-decimal pricing, transaction headers, ledger
//! entries, stock sufficiency and the ledger query filter. Persistence and
//! atomicity live in `stockbook-infra`.

pub mod entry;
pub mod filter;
pub mod line;
pub mod stock;
pub mod transaction;

pub use entry::{Direction, LedgerEntry, Movement};
pub use filter::LedgerFilter;
pub use line::{LineInput, LineItem, PricedLines, price_lines};
pub use stock::{apply_delta, ensure_available, requested_per_product};
pub use transaction::{NewPurchase, NewSale, Purchase, Sale};

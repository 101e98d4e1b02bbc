//! Persistence boundary for the inventory.
//!
//! Reads go straight through [`InventoryStore`]. Every write that touches
//! stock goes through a [`UnitOfWork`]: its changes become visible on
//! [`UnitOfWork::commit`] and are discarded if it is dropped uncommitted.

pub mod in_memory;
pub mod postgres;

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use stockbook_auth::User;
use stockbook_catalog::{Product, Supplier};
use stockbook_core::{ProductId, PurchaseId, SaleId, SupplierId};
use stockbook_ledger::{LedgerEntry, LedgerFilter, Purchase, Sale};

pub use in_memory::InMemoryStore;
pub use postgres::PgStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage failure, as opposed to a domain rule failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error in {operation}: {source}")]
    Database {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("duplicate record: {0}")]
    Duplicate(String),

    #[error("corrupt row: {0}")]
    CorruptRow(String),
}

#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Open an atomic unit of work.
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>>;

    async fn product(&self, id: ProductId) -> StoreResult<Option<Product>>;
    /// All products, by name ascending.
    async fn products(&self) -> StoreResult<Vec<Product>>;
    /// The products among `ids` that exist, in no particular order.
    async fn products_by_ids(&self, ids: &[ProductId]) -> StoreResult<Vec<Product>>;
    /// Persist name/description changes. Never touches stock.
    async fn update_product(&self, product: &Product) -> StoreResult<bool>;

    async fn insert_supplier(&self, supplier: &Supplier) -> StoreResult<()>;
    async fn update_supplier(&self, supplier: &Supplier) -> StoreResult<bool>;
    async fn supplier(&self, id: SupplierId) -> StoreResult<Option<Supplier>>;
    /// All suppliers, by name ascending.
    async fn suppliers(&self) -> StoreResult<Vec<Supplier>>;
    async fn suppliers_by_ids(&self, ids: &[SupplierId]) -> StoreResult<Vec<Supplier>>;

    async fn purchase(&self, id: PurchaseId) -> StoreResult<Option<Purchase>>;
    /// Purchases newest first, optionally for one supplier and capped at `limit`.
    async fn purchases(
        &self,
        supplier_id: Option<SupplierId>,
        limit: Option<usize>,
    ) -> StoreResult<Vec<Purchase>>;

    async fn sale(&self, id: SaleId) -> StoreResult<Option<Sale>>;
    /// Sales newest first.
    async fn sales(&self) -> StoreResult<Vec<Sale>>;

    /// Ledger entries matching `filter`, newest first.
    async fn ledger_entries(&self, filter: &LedgerFilter) -> StoreResult<Vec<LedgerEntry>>;

    /// Fails with [`StoreError::Duplicate`] if the username is taken.
    async fn insert_user(&self, user: &User) -> StoreResult<()>;
    async fn user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
}

/// Writes that commit or roll back together.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Read a product as seen inside this unit of work.
    async fn product(&mut self, id: ProductId) -> StoreResult<Option<Product>>;

    async fn insert_product(&mut self, product: &Product) -> StoreResult<()>;
    /// Insert a purchase header and its lines in one write.
    async fn insert_purchase(&mut self, purchase: &Purchase) -> StoreResult<()>;
    async fn insert_sale(&mut self, sale: &Sale) -> StoreResult<()>;

    /// Add `delta` to a product's stock and return the new balance.
    ///
    /// Single conditional update: returns `None` (and changes nothing) if
    /// the product is missing or the result would be negative.
    async fn adjust_stock(&mut self, id: ProductId, delta: Decimal) -> StoreResult<Option<Decimal>>;

    async fn append_ledger_entry(&mut self, entry: &LedgerEntry) -> StoreResult<()>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;
}

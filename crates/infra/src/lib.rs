//! Infrastructure layer: stores, the ledger engine, services, config.

pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod query;
pub mod read_model;
pub mod seed;
pub mod store;

pub use auth::{AuthService, LoginOutcome};
pub use catalog::CatalogService;
pub use config::ServiceConfig;
pub use engine::LedgerEngine;
pub use error::{ServiceError, ServiceResult};
pub use query::LedgerQuery;
pub use read_model::{LedgerEntryView, LineView, PurchaseView, SaleView, SupplierDetail};
pub use store::{InMemoryStore, InventoryStore, PgStore, StoreError, StoreResult, UnitOfWork};
